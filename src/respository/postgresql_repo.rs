use crate::respository::model::Transaction;
use crate::respository::postgresql;
use crate::respository::r#trait::TransactionRepository;
use crate::types::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// PostgreSQL backed confirmed store.
#[derive(Clone)]
pub struct PostgreSQLRepository {
    pool: Arc<PgPool>,
}

impl PostgreSQLRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgreSQLRepository {
    async fn add(&self, tx: Transaction) -> Result<(), AppError> {
        postgresql::add(&self.pool, &tx).await
    }

    async fn add_range(&self, transactions: Vec<Transaction>) -> Result<(), AppError> {
        postgresql::add_range(&self.pool, &transactions).await
    }

    async fn find(&self, txid: &str) -> Result<Option<Transaction>, AppError> {
        postgresql::find(&self.pool, txid).await
    }

    async fn find_all(&self, txids: &[String]) -> Result<Vec<Transaction>, AppError> {
        postgresql::find_all(&self.pool, txids).await
    }

    async fn find_by_block(&self, block_hash: &str) -> Result<Vec<Transaction>, AppError> {
        postgresql::find_by_block(&self.pool, block_hash).await
    }

    async fn find_by_address(&self, address: &str) -> Result<Vec<Transaction>, AppError> {
        postgresql::find_by_address(&self.pool, address).await
    }

    async fn get_last(&self, count: usize) -> Result<Vec<Transaction>, AppError> {
        postgresql::get_last(&self.pool, count).await
    }

    async fn get_block_number(&self) -> Result<Option<u64>, AppError> {
        postgresql::get_block_number(&self.pool).await
    }
}
