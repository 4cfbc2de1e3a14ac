/**
* filename : address
* author : HAMA
* date: 2026. 10. 17.
* description: address balance / history and UTXO derivation from the local index
**/

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::analyzer::types::{AddressModel, AddressTransactionModel, OutputModel, UnspentOutput};
use crate::coin::ChainRpc;
use crate::respository::{Transaction, TransactionRepository};
use crate::types::AppError;

pub struct AddressAnalyzer {
  repository: Arc<dyn TransactionRepository>,
  rpc: Arc<dyn ChainRpc>,
}

impl AddressAnalyzer {
  pub fn new(repository: Arc<dyn TransactionRepository>, rpc: Arc<dyn ChainRpc>) -> Self {
    Self { repository, rpc }
  }

  /// Balance and per-transaction ledger view. `None` when nothing touches `address`.
  ///
  /// Transactions sitting in an orphaned block stay in the history with zero
  /// confirmations and the double-spend flag set.
  pub async fn find(&self, address: &str) -> Result<Option<AddressModel>, AppError> {
    let transactions = self.repository.find_by_address(address).await?;
    if transactions.is_empty() {
      return Ok(None);
    }

    let block_count = self.rpc.get_block_count().await?;
    let orphans = self.orphan_blocks(&transactions).await?;

    let mut model = AddressModel::new(address);
    for tx in &transactions {
      let mut row = AddressTransactionModel::new(tx, block_count);

      let mut inputs_from_address = Decimal::ZERO;
      for input in &tx.inputs {
        if input.address.as_deref() == Some(address) {
          model.total_sent += input.value;
          inputs_from_address += input.value;
        }
      }
      if inputs_from_address.is_zero() {
        for input in &tx.inputs {
          row.push_input(input.address.clone());
        }
      } else {
        // 이 주소가 자금을 댄 경우 자기 자신만 입력으로 표시
        row.push_input(Some(address.to_string()));
      }

      let coinstake = !inputs_from_address.is_zero() && tx.outputs.iter().any(|o| o.address.is_none());
      if coinstake {
        let own: Vec<Decimal> = tx
          .outputs
          .iter()
          .filter(|o| o.address.as_deref() == Some(address))
          .map(|o| o.value)
          .collect();
        if !own.is_empty() {
          let own_total: Decimal = own.iter().sum();
          model.total_received += own_total;
          row.outputs_value = own_total;
          row.outputs.push(OutputModel::new(Some(address.to_string()), own_total - inputs_from_address));
        }
      } else {
        let has_inputs = !inputs_from_address.is_zero();
        for output in &tx.outputs {
          let value = if output.address.as_deref() == Some(address) {
            model.total_received += output.value;
            output.value
          } else if has_inputs {
            -output.value
          } else {
            output.value
          };
          row.outputs.push(OutputModel::new(output.address.clone(), value));
          row.outputs_value += output.value;
        }
      }

      if tx.block_hash.as_ref().is_some_and(|hash| orphans.contains(hash)) {
        row.set_confirmations(-1);
      }
      model.transactions.push(row);
    }

    let surviving = without_orphans(&transactions, &orphans);
    model.unspent_outputs = unspent_from(address, &surviving);
    Ok(Some(model))
  }

  /// Outputs paid to `address` that no surviving input from `address` spends.
  pub async fn find_unspent(&self, address: &str) -> Result<Vec<UnspentOutput>, AppError> {
    let transactions = self.repository.find_by_address(address).await?;
    if transactions.is_empty() {
      return Ok(Vec::new());
    }

    let orphans = self.orphan_blocks(&transactions).await?;
    let surviving = without_orphans(&transactions, &orphans);
    Ok(unspent_from(address, &surviving))
  }

  /// `find_unspent` with each output's locking script hex filled in from the daemon.
  pub async fn find_unspent_with_pub_key(&self, address: &str) -> Result<Vec<UnspentOutput>, AppError> {
    let mut unspent = self.find_unspent(address).await?;
    if unspent.is_empty() {
      return Ok(unspent);
    }

    let mut txids: Vec<String> = Vec::new();
    for output in &unspent {
      if !txids.contains(&output.txid) {
        txids.push(output.txid.clone());
      }
    }
    let raw_transactions = self.rpc.get_raw_transactions(&txids).await?;
    let by_id: HashMap<&str, _> = raw_transactions.iter().map(|tx| (tx.txid.as_str(), tx)).collect();

    for output in unspent.iter_mut() {
      let script = by_id
        .get(output.txid.as_str())
        .and_then(|raw| raw.vout.iter().find(|v| v.n == output.vout))
        .map(|v| v.script_pub_key.hex.clone());
      if script.is_none() {
        warn!("[AddressAnalyzer] No script for {}:{}", output.txid, output.vout);
      }
      output.script_pub_key = script;
    }
    Ok(unspent)
  }

  /// Two transactions at the same height with different block hashes make
  /// both hashes suspects; a suspect the daemon reports with `-1`
  /// confirmations is orphaned.
  async fn orphan_blocks(&self, transactions: &[Transaction]) -> Result<HashSet<String>, AppError> {
    let mut first_hash: HashMap<u64, &str> = HashMap::new();
    let mut suspects: BTreeSet<String> = BTreeSet::new();

    for tx in transactions {
      let (Some(number), Some(hash)) = (tx.block_number, tx.block_hash.as_deref()) else {
        continue;
      };
      match first_hash.get(&number) {
        Some(seen) if *seen != hash => {
          suspects.insert(seen.to_string());
          suspects.insert(hash.to_string());
        }
        Some(_) => {}
        None => {
          first_hash.insert(number, hash);
        }
      }
    }

    if suspects.is_empty() {
      return Ok(HashSet::new());
    }

    debug!("[AddressAnalyzer] Checking {} suspected orphan blocks", suspects.len());
    let suspects: Vec<String> = suspects.into_iter().collect();
    let blocks = self.rpc.get_blocks(&suspects).await?;
    let orphans: HashSet<String> = blocks
      .into_iter()
      .filter(|block| block.confirmations == -1)
      .map(|block| block.hash)
      .collect();
    if !orphans.is_empty() {
      info!("[AddressAnalyzer] Orphaned blocks: {:?}", orphans);
    }
    Ok(orphans)
  }
}

fn without_orphans<'a>(transactions: &'a [Transaction], orphans: &HashSet<String>) -> Vec<&'a Transaction> {
  transactions
    .iter()
    .filter(|tx| match &tx.block_hash {
      Some(hash) => !orphans.contains(hash),
      None => true,
    })
    .collect()
}

fn unspent_from(address: &str, transactions: &[&Transaction]) -> Vec<UnspentOutput> {
  let spent: HashSet<(&str, u32)> = transactions
    .iter()
    .flat_map(|tx| tx.inputs.iter())
    .filter(|input| input.address.as_deref() == Some(address))
    .map(|input| (input.parent_tx_id.as_str(), input.vout))
    .collect();

  let mut seen: HashSet<(&str, u32)> = HashSet::new();
  let mut unspent = Vec::new();
  for tx in transactions {
    for output in tx.outputs.iter().filter(|o| o.address.as_deref() == Some(address)) {
      let key = (output.tx_id.as_str(), output.vout);
      if spent.contains(&key) || !seen.insert(key) {
        continue;
      }
      unspent.push(UnspentOutput {
        txid: output.tx_id.clone(),
        vout: output.vout,
        address: address.to_string(),
        amount: output.value,
        script_pub_key: None,
      });
    }
  }
  unspent
}
