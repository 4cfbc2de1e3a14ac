/**
* filename : explorer
* author : HAMA
* date: 2026. 10. 17.
* description: read-side query facade (chain info, blocks, search)
**/

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::analyzer::types::{AddressModel, BlockItemModel, TransactionModel};
use crate::analyzer::utils::{block_type, is_valid_address, is_valid_hash};
use crate::analyzer::AddressAnalyzer;
use crate::coin::model::RawBlock;
use crate::coin::ChainRpc;
use crate::service::TransactionService;
use crate::types::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
  pub blocks: u64,
  pub difficulty: Value,
  pub network_hashps: Option<f64>,
}

/// A block together with the indexed transactions it contains.
#[derive(Debug, Clone, Serialize)]
pub struct BlockDetails {
  #[serde(flatten)]
  pub block: RawBlock,
  #[serde(rename = "type")]
  pub block_type: String,
  pub transactions: Vec<TransactionModel>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "result", rename_all = "lowercase")]
pub enum SearchResult {
  #[serde(rename = "tx")]
  Transaction(TransactionModel),
  Block(BlockDetails),
  Address(AddressModel),
}

pub struct ExplorerService {
  rpc: Arc<dyn ChainRpc>,
  transactions: Arc<TransactionService>,
  addresses: Arc<AddressAnalyzer>,
}

impl ExplorerService {
  pub fn new(rpc: Arc<dyn ChainRpc>, transactions: Arc<TransactionService>, addresses: Arc<AddressAnalyzer>) -> Self {
    Self { rpc, transactions, addresses }
  }

  pub async fn info(&self) -> Result<Option<ChainSummary>, AppError> {
    let Some(info) = self.rpc.get_info().await? else {
      return Ok(None);
    };
    let network_hashps = self.rpc.get_network_hashps().await?;
    Ok(Some(ChainSummary {
      blocks: info.blocks,
      difficulty: info.difficulty,
      network_hashps,
    }))
  }

  /// `search` is a comma separated list of heights, block hashes, `first` and `last`.
  /// Unrecognised terms are ignored.
  pub async fn block_info(&self, search: &str) -> Result<Vec<BlockDetails>, AppError> {
    let mut heights: Vec<u64> = Vec::new();
    let mut hashes: Vec<String> = Vec::new();

    for term in search.trim().split(',').map(str::trim) {
      if let Ok(height) = term.parse::<u64>() {
        push_unique(&mut heights, height);
      } else if term == "first" {
        push_unique(&mut heights, 0);
      } else if term == "last" {
        if let Some(hash) = self.rpc.get_best_block_hash().await? {
          push_unique(&mut hashes, hash);
        }
      } else if is_valid_hash(term) {
        push_unique(&mut hashes, term.to_string());
      } else {
        debug!("[Explorer] Ignoring search term {:?}", term);
      }
    }

    if !heights.is_empty() {
      for hash in self.rpc.get_block_hashes(&heights).await? {
        push_unique(&mut hashes, hash);
      }
    }
    if hashes.is_empty() {
      return Ok(Vec::new());
    }

    let blocks = self.rpc.get_blocks(&hashes).await?;
    let mut details = Vec::with_capacity(blocks.len());
    for block in blocks {
      details.push(self.with_transactions(block).await?);
    }
    Ok(details)
  }

  /// Block summaries walking down from the tip: `offset` blocks are skipped,
  /// at most `limit` are returned.
  pub async fn list_blocks(&self, offset: u64, limit: u64) -> Result<Vec<BlockItemModel>, AppError> {
    let block_count = self.rpc.get_block_count().await?;
    if offset >= block_count || limit == 0 {
      return Ok(Vec::new());
    }

    let start = block_count - offset;
    let end = start.saturating_sub(limit - 1);
    let heights: Vec<u64> = (end..=start).rev().collect();

    let hashes = self.rpc.get_block_hashes(&heights).await?;
    let blocks = self.rpc.get_blocks(&hashes).await?;

    let mut items = Vec::with_capacity(blocks.len());
    for block in &blocks {
      let transactions = self.transactions.get_block_transactions(block).await?;
      items.push(BlockItemModel::new(block, &transactions));
    }
    Ok(items)
  }

  /// Resolves `input` as a transaction id, block hash, address or height.
  pub async fn search(&self, input: &str) -> Result<Option<SearchResult>, AppError> {
    let input = input.trim();

    if is_valid_hash(input) {
      if let Some(transaction) = self.transactions.find(input).await? {
        return Ok(Some(SearchResult::Transaction(transaction)));
      }
      if let Some(block) = self.rpc.get_block(input).await? {
        return Ok(Some(SearchResult::Block(self.with_transactions(block).await?)));
      }
    } else if is_valid_address(input) {
      if let Some(address) = self.addresses.find(input).await? {
        return Ok(Some(SearchResult::Address(address)));
      }
    } else if let Ok(height) = input.parse::<u64>() {
      if let Some(hash) = self.rpc.get_block_hash(height).await? {
        if let Some(block) = self.rpc.get_block(&hash).await? {
          return Ok(Some(SearchResult::Block(self.with_transactions(block).await?)));
        }
      }
    }
    Ok(None)
  }

  async fn with_transactions(&self, block: RawBlock) -> Result<BlockDetails, AppError> {
    let transactions = self.transactions.get_block_transactions(&block).await?;
    Ok(BlockDetails {
      block_type: block_type(block.flags.as_deref()).to_string(),
      block,
      transactions,
    })
  }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
  if !items.contains(&item) {
    items.push(item);
  }
}
