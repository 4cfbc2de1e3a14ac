use crate::respository::model::Transaction;
use crate::respository::r#trait::TransactionRepository;
use crate::types::AppError;
use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process confirmed store.
/// Used when `repository.memory_db = true` and by the tests.
#[derive(Clone)]
pub struct MemoryRepository {
    // txid -> confirmed transaction
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            transactions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TransactionRepository for MemoryRepository {
    async fn add(&self, tx: Transaction) -> Result<(), AppError> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(tx.id.clone(), tx);
        Ok(())
    }

    async fn add_range(&self, range: Vec<Transaction>) -> Result<(), AppError> {
        let Some(block_number) = range.first().and_then(|tx| tx.block_number) else {
            return Ok(());
        };

        let mut transactions = self.transactions.write().await;

        // 같은 블록 번호의 기존 행은 교체
        let before = transactions.len();
        transactions.retain(|_, tx| tx.block_number != Some(block_number));
        if transactions.len() != before {
            info!(
                "MemoryRepository: replaced {} transactions of block {}",
                before - transactions.len(),
                block_number
            );
        }

        for tx in range {
            transactions.insert(tx.id.clone(), tx);
        }
        debug!("MemoryRepository: stored block {}", block_number);
        Ok(())
    }

    async fn find(&self, txid: &str) -> Result<Option<Transaction>, AppError> {
        Ok(self.transactions.read().await.get(txid).cloned())
    }

    async fn find_all(&self, txids: &[String]) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.transactions.read().await;
        Ok(txids
            .iter()
            .filter_map(|txid| transactions.get(txid).cloned())
            .collect())
    }

    async fn find_by_block(&self, block_hash: &str) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|tx| tx.block_hash.as_deref() == Some(block_hash))
            .cloned()
            .collect())
    }

    async fn find_by_address(&self, address: &str) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|tx| tx.touches(address))
            .cloned()
            .collect())
    }

    async fn get_last(&self, count: usize) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.transactions.read().await;
        let mut sorted: Vec<&Transaction> = transactions.values().collect();
        sorted.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(sorted.into_iter().take(count).cloned().collect())
    }

    async fn get_block_number(&self) -> Result<Option<u64>, AppError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.values().filter_map(|tx| tx.block_number).max())
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}
