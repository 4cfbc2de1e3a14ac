pub mod address;
pub mod normalizer;
pub mod types;
pub mod utils;

pub use address::AddressAnalyzer;
pub use normalizer::TransactionNormalizer;
pub use types::{
    AddressModel, AddressTransactionModel, BlockItemModel, OutputModel, TransactionItemModel,
    TransactionModel, UnspentOutput,
};
