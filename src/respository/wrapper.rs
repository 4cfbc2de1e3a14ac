use crate::config::RepositorySettings;
use crate::respository::model::Transaction;
use crate::respository::{
    connect_db, setup_db_schema, MemoryRepository, PostgreSQLRepository, TransactionRepository,
};
use crate::types::AppError;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

/// Confirmed store selected from settings.
pub enum RepositoryWrapper {
    Memory(Arc<MemoryRepository>),
    PostgreSQL(Arc<PostgreSQLRepository>),
}

impl RepositoryWrapper {
    pub async fn from_settings(settings: &RepositorySettings) -> Result<Self, AppError> {
        if settings.memory_db {
            info!("Using in-memory confirmed store");
            Ok(RepositoryWrapper::Memory(Arc::new(MemoryRepository::new())))
        } else {
            let db_connection_pool = connect_db(&settings.postgresql_url).await
                .map_err(|e| AppError::Database(format!("Failed to connect to PostgreSQL: {}", e)))?;
            setup_db_schema(&db_connection_pool).await
                .map_err(|e| AppError::Database(format!("Failed to setup database schema: {}", e)))?;
            info!("Connected to PostgreSQL confirmed store");
            Ok(RepositoryWrapper::PostgreSQL(Arc::new(PostgreSQLRepository::new(Arc::new(db_connection_pool)))))
        }
    }
}

#[async_trait]
impl TransactionRepository for RepositoryWrapper {
    async fn add(&self, tx: Transaction) -> Result<(), AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.add(tx).await,
            RepositoryWrapper::PostgreSQL(r) => r.add(tx).await,
        }
    }

    async fn add_range(&self, transactions: Vec<Transaction>) -> Result<(), AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.add_range(transactions).await,
            RepositoryWrapper::PostgreSQL(r) => r.add_range(transactions).await,
        }
    }

    async fn find(&self, txid: &str) -> Result<Option<Transaction>, AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.find(txid).await,
            RepositoryWrapper::PostgreSQL(r) => r.find(txid).await,
        }
    }

    async fn find_all(&self, txids: &[String]) -> Result<Vec<Transaction>, AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.find_all(txids).await,
            RepositoryWrapper::PostgreSQL(r) => r.find_all(txids).await,
        }
    }

    async fn find_by_block(&self, block_hash: &str) -> Result<Vec<Transaction>, AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.find_by_block(block_hash).await,
            RepositoryWrapper::PostgreSQL(r) => r.find_by_block(block_hash).await,
        }
    }

    async fn find_by_address(&self, address: &str) -> Result<Vec<Transaction>, AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.find_by_address(address).await,
            RepositoryWrapper::PostgreSQL(r) => r.find_by_address(address).await,
        }
    }

    async fn get_last(&self, count: usize) -> Result<Vec<Transaction>, AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.get_last(count).await,
            RepositoryWrapper::PostgreSQL(r) => r.get_last(count).await,
        }
    }

    async fn get_block_number(&self) -> Result<Option<u64>, AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.get_block_number().await,
            RepositoryWrapper::PostgreSQL(r) => r.get_block_number().await,
        }
    }
}
