use crate::respository::model::Transaction;
use crate::types::AppError;
use async_trait::async_trait;

/// Transaction store contract shared by the mempool, the confirmed stores and
/// the two-level repository composing them.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn add(&self, tx: Transaction) -> Result<(), AppError>;

    /// Stores a whole block. Rows previously stored under the same block number
    /// are replaced, so re-processing a block is idempotent.
    async fn add_range(&self, transactions: Vec<Transaction>) -> Result<(), AppError>;

    async fn find(&self, txid: &str) -> Result<Option<Transaction>, AppError>;

    async fn find_all(&self, txids: &[String]) -> Result<Vec<Transaction>, AppError>;

    async fn find_by_block(&self, block_hash: &str) -> Result<Vec<Transaction>, AppError>;

    async fn find_by_address(&self, address: &str) -> Result<Vec<Transaction>, AppError>;

    /// Most recent transactions, newest first.
    async fn get_last(&self, count: usize) -> Result<Vec<Transaction>, AppError>;

    /// Highest stored block number, `None` when nothing is stored yet.
    async fn get_block_number(&self) -> Result<Option<u64>, AppError>;
}
