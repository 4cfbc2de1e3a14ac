/**
* filename : transaction_service
* author : HAMA
* date: 2026. 10. 17.
* description: transaction queries and the two write paths (mempool / block)
**/

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, warn};

use crate::analyzer::types::{TransactionItemModel, TransactionModel};
use crate::analyzer::TransactionNormalizer;
use crate::coin::model::{RawBlock, RawTransaction};
use crate::coin::ChainRpc;
use crate::notification::NotificationSink;
use crate::respository::{MemPoolRepository, Transaction, TransactionRepository, TwoLevelRepository};
use crate::types::AppError;

pub struct TransactionService {
  repository: Arc<TwoLevelRepository>,
  rpc: Arc<dyn ChainRpc>,
  normalizer: TransactionNormalizer,
  notifier: Arc<dyn NotificationSink>,
}

impl TransactionService {
  pub fn new(
    repository: Arc<TwoLevelRepository>,
    rpc: Arc<dyn ChainRpc>,
    notifier: Arc<dyn NotificationSink>,
  ) -> Self {
    let normalizer = TransactionNormalizer::new(repository.clone());
    Self { repository, rpc, normalizer, notifier }
  }

  pub fn mem_pool(&self) -> &Arc<MemPoolRepository> {
    self.repository.mem_pool()
  }

  pub fn repository(&self) -> &Arc<TwoLevelRepository> {
    &self.repository
  }

  /// Normalizes and pools an unconfirmed transaction, notifying when it is new.
  /// Returns whether it was inserted.
  pub async fn save_mempool_tx(&self, raw: &RawTransaction) -> bool {
    let mem_pool = self.repository.mem_pool();
    if mem_pool.contains(&raw.txid).await {
      return false;
    }
    // tombstone 이 만료된 뒤 늦게 도착한 확정 트랜잭션
    match self.repository.confirmed().find(&raw.txid).await {
      Ok(Some(_)) => {
        debug!("[TransactionService] {} is already confirmed, not pooling", raw.txid);
        return false;
      }
      Ok(None) => {}
      Err(e) => warn!("[TransactionService] Confirmed lookup for {} failed: {}", raw.txid, e),
    }

    let transaction = self.normalizer.normalize(raw, None).await;
    let model = TransactionModel::from(&transaction);
    // clear() 가 그 사이에 tombstone 을 남겼다면 삽입되지 않는다
    if !mem_pool.try_add(transaction).await {
      return false;
    }
    self.notifier.notify_new_transaction(&model).await;
    true
  }

  /// Fetches, normalizes and persists the transactions of `block` in one
  /// `add_range`. Transactions the daemon does not return are logged and left
  /// out; only a failed batch call fails the block.
  pub async fn save_all_block_transactions(&self, block: &RawBlock) -> Result<Vec<TransactionModel>, AppError> {
    let raw_transactions = self.rpc.get_raw_transactions(&block.tx).await?;
    if raw_transactions.len() != block.tx.len() {
      let returned: HashSet<&str> = raw_transactions.iter().map(|raw| raw.txid.as_str()).collect();
      for txid in block.tx.iter().filter(|txid| !returned.contains(txid.as_str())) {
        warn!("[TransactionService] Transaction {} of block {} was not returned, skipping", txid, block.height);
      }
    }

    let mut in_flight: HashMap<String, Transaction> = HashMap::with_capacity(raw_transactions.len());
    let mut ordered = Vec::with_capacity(raw_transactions.len());
    let mut models = Vec::with_capacity(raw_transactions.len());
    for raw in &raw_transactions {
      let mut transaction = self.normalizer.normalize(raw, Some(&in_flight)).await;
      transaction.block_number = Some(block.height);
      transaction.block_hash = Some(block.hash.clone());

      models.push(TransactionModel::from(&transaction).with_confirmations(block.confirmations));
      in_flight.insert(transaction.id.clone(), transaction.clone());
      ordered.push(transaction);
    }

    debug!("[TransactionService] Persisting {} transactions of block {}", ordered.len(), block.height);
    self.repository.add_range(ordered).await?;
    Ok(models)
  }

  /// Looks the transaction up in both levels; confirmations come from its block.
  pub async fn find(&self, txid: &str) -> Result<Option<TransactionModel>, AppError> {
    let Some(transaction) = self.repository.find(txid).await? else {
      return Ok(None);
    };

    let mut model = TransactionModel::from(&transaction);
    if let Some(block_hash) = &transaction.block_hash {
      match self.rpc.get_block(block_hash).await? {
        Some(block) => model.set_confirmations(block.confirmations),
        None => warn!("[TransactionService] Block {} of {} not found", block_hash, txid),
      }
    }
    Ok(Some(model))
  }

  pub async fn get_block_transactions(&self, block: &RawBlock) -> Result<Vec<TransactionModel>, AppError> {
    let transactions = self.repository.find_by_block(&block.hash).await?;
    Ok(transactions
      .iter()
      .map(|tx| TransactionModel::from(tx).with_confirmations(block.confirmations))
      .collect())
  }

  pub async fn block_exists(&self, block_hash: &str) -> Result<bool, AppError> {
    Ok(!self.repository.find_by_block(block_hash).await?.is_empty())
  }

  pub async fn get_last(&self, count: usize) -> Result<Vec<TransactionItemModel>, AppError> {
    let transactions = self.repository.get_last(count).await?;
    Ok(transactions.iter().map(TransactionItemModel::from).collect())
  }

  /// Highest confirmed block number, `None` while the confirmed store is empty.
  pub async fn last_block_number(&self) -> Result<Option<u64>, AppError> {
    self.repository.confirmed().get_block_number().await
  }
}
