/**
* filename : coin_trait
* author : HAMA
* date: 2026. 10. 17.
* description: daemon RPC surface consumed by the indexer
**/

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::coin::model::{ChainInfo, OutPoint, PrevOut, RawBlock, RawTransaction, SignedTransaction};
use crate::types::AppError;

/// Everything the indexer asks of the coin daemon.
///
/// `Err` means the daemon could not be reached (or answered garbage for the
/// whole request). An answer that carries an RPC error is `Ok(None)` for single
/// calls and is left out of the returned `Vec` for batch calls.
#[async_trait]
pub trait ChainRpc: Send + Sync {
  async fn get_block_count(&self) -> Result<u64, AppError>;

  async fn get_block_hash(&self, height: u64) -> Result<Option<String>, AppError>;

  async fn get_best_block_hash(&self) -> Result<Option<String>, AppError>;

  async fn get_block(&self, hash: &str) -> Result<Option<RawBlock>, AppError>;

  /// Batch `getblockhash`, results in the order of `heights`.
  async fn get_block_hashes(&self, heights: &[u64]) -> Result<Vec<String>, AppError>;

  /// Batch `getblock`, results in the order of `hashes`.
  async fn get_blocks(&self, hashes: &[String]) -> Result<Vec<RawBlock>, AppError>;

  async fn get_raw_mempool(&self) -> Result<Vec<String>, AppError>;

  async fn get_raw_transaction(&self, txid: &str) -> Result<Option<RawTransaction>, AppError>;

  /// Batch verbose `getrawtransaction`, results in the order of `txids`.
  async fn get_raw_transactions(&self, txids: &[String]) -> Result<Vec<RawTransaction>, AppError>;

  async fn create_raw_transaction(
    &self,
    inputs: &[OutPoint],
    outputs: &[(String, Decimal)],
  ) -> Result<Option<String>, AppError>;

  async fn sign_raw_transaction(
    &self,
    hex: &str,
    prevouts: &[PrevOut],
    private_keys: &[String],
  ) -> Result<Option<SignedTransaction>, AppError>;

  async fn send_raw_transaction(&self, hex: &str) -> Result<Option<String>, AppError>;

  async fn get_info(&self) -> Result<Option<ChainInfo>, AppError>;

  async fn get_network_hashps(&self) -> Result<Option<f64>, AppError>;
}
