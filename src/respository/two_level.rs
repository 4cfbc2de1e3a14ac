use crate::respository::mempool::MemPoolRepository;
use crate::respository::model::Transaction;
use crate::respository::r#trait::TransactionRepository;
use crate::types::AppError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Mempool + confirmed store behind one repository contract.
///
/// Writes are routed by `block_number`; reads consult the mempool first.
#[derive(Clone)]
pub struct TwoLevelRepository {
    mem_pool: Arc<MemPoolRepository>,
    confirmed: Arc<dyn TransactionRepository>,
}

impl TwoLevelRepository {
    pub fn new(mem_pool: Arc<MemPoolRepository>, confirmed: Arc<dyn TransactionRepository>) -> Self {
        Self { mem_pool, confirmed }
    }

    pub fn mem_pool(&self) -> &Arc<MemPoolRepository> {
        &self.mem_pool
    }

    pub fn confirmed(&self) -> &Arc<dyn TransactionRepository> {
        &self.confirmed
    }
}

#[async_trait]
impl TransactionRepository for TwoLevelRepository {
    async fn add(&self, tx: Transaction) -> Result<(), AppError> {
        if tx.is_confirmed() {
            self.confirmed.add(tx).await
        } else {
            self.mem_pool.add(tx).await
        }
    }

    async fn add_range(&self, transactions: Vec<Transaction>) -> Result<(), AppError> {
        self.confirmed.add_range(transactions).await
    }

    async fn find(&self, txid: &str) -> Result<Option<Transaction>, AppError> {
        match self.mem_pool.find(txid).await? {
            Some(tx) => Ok(Some(tx)),
            None => self.confirmed.find(txid).await,
        }
    }

    async fn find_all(&self, txids: &[String]) -> Result<Vec<Transaction>, AppError> {
        let mut transactions = self.mem_pool.find_all(txids).await?;

        let found: HashSet<&str> = transactions.iter().map(|tx| tx.id.as_str()).collect();
        let remaining: Vec<String> = txids
            .iter()
            .filter(|txid| !found.contains(txid.as_str()))
            .cloned()
            .collect();

        if !remaining.is_empty() {
            let confirmed = self.confirmed.find_all(&remaining).await?;
            transactions.extend(confirmed);
        }
        Ok(transactions)
    }

    async fn find_by_block(&self, block_hash: &str) -> Result<Vec<Transaction>, AppError> {
        self.confirmed.find_by_block(block_hash).await
    }

    /// Both levels concatenated, newest first. An id present in both levels
    /// (promotion in flight) is returned twice.
    async fn find_by_address(&self, address: &str) -> Result<Vec<Transaction>, AppError> {
        let mut transactions = self.mem_pool.find_by_address(address).await?;
        transactions.extend(self.confirmed.find_by_address(address).await?);
        transactions.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(transactions)
    }

    async fn get_last(&self, count: usize) -> Result<Vec<Transaction>, AppError> {
        let mut transactions = self.mem_pool.get_last(count).await?;
        if transactions.len() < count {
            let confirmed = self.confirmed.get_last(count - transactions.len()).await?;
            transactions.extend(confirmed);
        }
        Ok(transactions)
    }

    async fn get_block_number(&self) -> Result<Option<u64>, AppError> {
        self.confirmed.get_block_number().await
    }
}
