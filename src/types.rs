/**
* filename : types
* author : HAMA
* date: 2026. 10. 17.
* description: crate-wide error type
**/

use rust_decimal::Decimal;

// ====== Unified Error Type ======
#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("API Client error: {0}")]
  Client(String),

  #[error("RPC error: {0}")]
  Rpc(String),

  #[error("Task join error: {0}")]
  JoinError(#[from] tokio::task::JoinError),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Initialization error: {0}")]
  Initialization(String),

  #[error("Database error: {0}")]
  Database(String),

  #[error("Block error: {0}")]
  Block(String),

  #[error("{0}")]
  Validation(String),

  #[error("Insufficient funds: required {required}, available {available}")]
  InsufficientFunds { required: Decimal, available: Decimal },
}

// ====== Error Conversions (From impls) ======

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    AppError::Client(format!("Reqwest error: {}", err))
  }
}

impl From<sqlx::Error> for AppError {
  fn from(err: sqlx::Error) -> Self {
    AppError::Database(format!("SQLx error: {}", err))
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    AppError::Initialization(format!("IO error: {}", err))
  }
}

impl From<serde_json::Error> for AppError {
  fn from(err: serde_json::Error) -> Self {
    AppError::Client(format!("JSON parse error: {}", err))
  }
}

impl From<config::ConfigError> for AppError {
  fn from(err: config::ConfigError) -> Self {
    AppError::Config(err.to_string())
  }
}
