/**
* filename : normalizer
* author : HAMA
* date: 2026. 10. 17.
* description: raw daemon transaction -> indexed Transaction
**/

use std::collections::HashMap;
use std::sync::Arc;

use log::{error, warn};
use rust_decimal::Decimal;

use crate::analyzer::utils::unix_now;
use crate::coin::model::{RawTransaction, RawVout};
use crate::respository::{Input, Output, Transaction, TransactionRepository};

/// Turns daemon transactions into `Transaction` rows, copying the parent
/// output's address and value into every input.
#[derive(Clone)]
pub struct TransactionNormalizer {
  repository: Arc<dyn TransactionRepository>,
}

impl TransactionNormalizer {
  pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
    Self { repository }
  }

  /// `in_flight` holds transactions of the block being ingested that are not
  /// persisted yet; it is consulted before the repository.
  pub async fn normalize(
    &self,
    raw: &RawTransaction,
    in_flight: Option<&HashMap<String, Transaction>>,
  ) -> Transaction {
    let inputs = self.parse_inputs(raw, in_flight).await;
    let outputs = parse_outputs(raw);

    let size = raw
      .size
      .or_else(|| raw.hex.as_ref().map(|hex| (hex.len() / 2) as u32))
      .unwrap_or(0);

    Transaction {
      id: raw.txid.clone(),
      block_number: None,
      block_hash: None,
      time: raw.time.unwrap_or_else(unix_now),
      size,
      inputs,
      outputs,
    }
  }

  async fn parse_inputs(
    &self,
    raw: &RawTransaction,
    in_flight: Option<&HashMap<String, Transaction>>,
  ) -> Vec<Input> {
    let mut inputs = Vec::new();
    for vin in raw.vin.iter().filter(|vin| !vin.is_coinbase()) {
      let (Some(parent_tx_id), Some(vout)) = (vin.txid.as_ref(), vin.vout) else {
        warn!("[Normalizer] {} has a vin without parent reference, skipping", raw.txid);
        continue;
      };
      inputs.push(Input {
        tx_id: raw.txid.clone(),
        parent_tx_id: parent_tx_id.clone(),
        vout,
        address: None,
        value: Decimal::ZERO,
      });
    }

    if inputs.is_empty() {
      return inputs;
    }

    // 부모 트랜잭션은 txid당 한 번만 조회
    let mut parents: HashMap<String, Option<Transaction>> = HashMap::new();
    for input in &inputs {
      if parents.contains_key(&input.parent_tx_id) {
        continue;
      }
      let parent = self.find_parent(&input.parent_tx_id, in_flight).await;
      parents.insert(input.parent_tx_id.clone(), parent);
    }

    for input in inputs.iter_mut() {
      let Some(Some(parent)) = parents.get(&input.parent_tx_id) else {
        error!("[Normalizer] Parent transaction not found: {} (spent by {})", input.parent_tx_id, raw.txid);
        continue;
      };
      match parent.output(input.vout) {
        Some(output) => {
          input.address = output.address.clone();
          input.value = output.value;
        }
        None => error!(
          "[Normalizer] Parent transaction {} has no output {}",
          input.parent_tx_id, input.vout
        ),
      }
    }
    inputs
  }

  async fn find_parent(
    &self,
    parent_tx_id: &str,
    in_flight: Option<&HashMap<String, Transaction>>,
  ) -> Option<Transaction> {
    if let Some(tx) = in_flight.and_then(|block| block.get(parent_tx_id)) {
      return Some(tx.clone());
    }
    match self.repository.find(parent_tx_id).await {
      Ok(found) => found,
      Err(e) => {
        error!("[Normalizer] Failed to look up parent {}: {}", parent_tx_id, e);
        None
      }
    }
  }
}

fn parse_outputs(raw: &RawTransaction) -> Vec<Output> {
  raw.vout.iter().map(|vout| to_output(&raw.txid, vout)).collect()
}

fn to_output(txid: &str, vout: &RawVout) -> Output {
  Output {
    tx_id: txid.to_string(),
    address: vout.script_pub_key.single_address(),
    value: vout.value,
    vout: vout.n,
  }
}
