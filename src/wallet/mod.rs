pub mod coin_selection;
pub mod service;

pub use coin_selection::{select_coins, transaction_fee, CoinSelection};
pub use service::{CreateTransactionRequest, UnsignedTransaction, WalletService};
