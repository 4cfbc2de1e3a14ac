pub mod explorer;
pub mod transaction_service;

pub use explorer::{BlockDetails, ChainSummary, ExplorerService, SearchResult};
pub use transaction_service::TransactionService;
