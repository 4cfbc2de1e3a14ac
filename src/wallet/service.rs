/**
* filename : service
* author : HAMA
* date: 2026. 10. 17.
* description: build / sign / submit transactions through the daemon wallet RPCs
**/

use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analyzer::utils::{is_valid_address, is_valid_hex, is_valid_private_key};
use crate::analyzer::AddressAnalyzer;
use crate::coin::model::{OutPoint, PrevOut};
use crate::coin::ChainRpc;
use crate::service::TransactionService;
use crate::types::AppError;
use crate::wallet::coin_selection::{select_coins, transaction_fee, CoinSelection};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionRequest {
  pub address: String,
  pub destination_address: String,
  pub value: Decimal,
  #[serde(default)]
  pub private_key: Option<String>,
}

/// A created but unsigned transaction, with what a signer needs to sign it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsignedTransaction {
  pub hex: String,
  pub prevouts: Vec<PrevOut>,
}

pub struct WalletService {
  rpc: Arc<dyn ChainRpc>,
  addresses: Arc<AddressAnalyzer>,
  transactions: Arc<TransactionService>,
}

impl WalletService {
  pub fn new(rpc: Arc<dyn ChainRpc>, addresses: Arc<AddressAnalyzer>, transactions: Arc<TransactionService>) -> Self {
    Self { rpc, addresses, transactions }
  }

  /// Selects coins, creates, signs and submits. Returns the new txid.
  pub async fn create_transaction(&self, request: &CreateTransactionRequest) -> Result<String, AppError> {
    validate_request(request)?;
    let private_key = match request.private_key.as_deref() {
      Some(key) if is_valid_private_key(key) => key.to_string(),
      _ => return Err(AppError::Validation("Invalid private key".to_string())),
    };

    let unsigned = self.build(request).await?;
    let signed = self
      .rpc
      .sign_raw_transaction(&unsigned.hex, &unsigned.prevouts, &[private_key])
      .await?
      .ok_or_else(|| AppError::Rpc("Sign transaction error".to_string()))?;
    if !signed.complete {
      return Err(AppError::Rpc("Sign transaction error".to_string()));
    }

    let txid = self
      .rpc
      .send_raw_transaction(&signed.hex)
      .await?
      .ok_or_else(|| AppError::Rpc("Send transaction error".to_string()))?;
    info!("[Wallet] Sent {} from {} to {}: {}", request.value, request.address, request.destination_address, txid);
    Ok(txid)
  }

  /// Same selection and creation as `create_transaction`, stopping before signing.
  pub async fn create_unsigned_transaction(&self, request: &CreateTransactionRequest) -> Result<UnsignedTransaction, AppError> {
    validate_request(request)?;
    self.build(request).await
  }

  /// Submits a transaction signed elsewhere and pools it while the daemon
  /// still reports it unconfirmed.
  pub async fn send_raw_transaction(&self, hex: &str) -> Result<String, AppError> {
    if !is_valid_hex(hex) {
      return Err(AppError::Validation("Invalid transaction hex".to_string()));
    }

    let txid = self
      .rpc
      .send_raw_transaction(hex)
      .await?
      .ok_or_else(|| AppError::Rpc("Send transaction error".to_string()))?;

    match self.rpc.get_raw_transaction(&txid).await {
      Ok(Some(raw)) if raw.confirmations.unwrap_or(0) == 0 => {
        self.transactions.save_mempool_tx(&raw).await;
      }
      Ok(_) => {}
      Err(e) => warn!("[Wallet] Could not mirror {} into the mempool: {}", txid, e),
    }
    Ok(txid)
  }

  async fn build(&self, request: &CreateTransactionRequest) -> Result<UnsignedTransaction, AppError> {
    let unspent = self.addresses.find_unspent(&request.address).await?;
    let CoinSelection { selected, change, .. } = select_coins(&unspent, request.value, transaction_fee())?;

    let mut txids: Vec<String> = Vec::new();
    for output in &selected {
      if !txids.contains(&output.txid) {
        txids.push(output.txid.clone());
      }
    }
    let raw_transactions = self.rpc.get_raw_transactions(&txids).await?;
    let by_id: HashMap<&str, _> = raw_transactions.iter().map(|tx| (tx.txid.as_str(), tx)).collect();

    let mut inputs = Vec::with_capacity(selected.len());
    let mut prevouts = Vec::with_capacity(selected.len());
    for output in &selected {
      let script = by_id
        .get(output.txid.as_str())
        .and_then(|raw| raw.vout.iter().find(|v| v.n == output.vout))
        .map(|v| v.script_pub_key.hex.clone())
        .ok_or_else(|| AppError::Rpc(format!("Parent output {}:{} not available", output.txid, output.vout)))?;

      inputs.push(OutPoint { txid: output.txid.clone(), vout: output.vout });
      prevouts.push(PrevOut { txid: output.txid.clone(), vout: output.vout, script_pub_key: script });
    }

    let mut outputs: Vec<(String, Decimal)> = vec![(request.destination_address.clone(), request.value)];
    if change > Decimal::ZERO {
      // 잔돈은 보낸 주소로
      match outputs.iter_mut().find(|(address, _)| *address == request.address) {
        Some((_, amount)) => *amount += change,
        None => outputs.push((request.address.clone(), change)),
      }
    }

    let hex = self
      .rpc
      .create_raw_transaction(&inputs, &outputs)
      .await?
      .ok_or_else(|| AppError::Rpc("Create transaction error".to_string()))?;
    Ok(UnsignedTransaction { hex, prevouts })
  }
}

fn validate_request(request: &CreateTransactionRequest) -> Result<(), AppError> {
  if request.value <= Decimal::ZERO {
    return Err(AppError::Validation("Negative or zero value".to_string()));
  }
  if !is_valid_address(&request.address) {
    return Err(AppError::Validation("Invalid address".to_string()));
  }
  if !is_valid_address(&request.destination_address) {
    return Err(AppError::Validation("Invalid destination address".to_string()));
  }
  Ok(())
}
