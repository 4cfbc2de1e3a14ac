mod postgresql;
mod r#trait;
mod memory;
mod mempool;
mod model;
mod postgresql_repo;
mod two_level;
mod wrapper;

// Repository trait
pub use r#trait::TransactionRepository;

// Indexed data
pub use model::{Input, Output, Transaction};

// Repository implementations
pub use memory::MemoryRepository;
pub use mempool::{MemPoolRepository, TOMBSTONE_GENERATIONS};
pub use postgresql_repo::PostgreSQLRepository;
pub use two_level::TwoLevelRepository;
pub use wrapper::RepositoryWrapper;

pub use postgresql::connect_db;
pub use postgresql::setup_db_schema;
