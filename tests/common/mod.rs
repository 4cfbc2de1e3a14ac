#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;

use xexplorer::analyzer::types::{BlockItemModel, TransactionModel};
use xexplorer::coin::model::{
  ChainInfo, OutPoint, PrevOut, RawBlock, RawTransaction, RawVin, RawVout, ScriptPubKey, SignedTransaction,
};
use xexplorer::coin::ChainRpc;
use xexplorer::config::SyncSettings;
use xexplorer::fetcher::BlockScanner;
use xexplorer::notification::NotificationSink;
use xexplorer::respository::{MemPoolRepository, MemoryRepository, TransactionRepository, TwoLevelRepository};
use xexplorer::service::TransactionService;
use xexplorer::types::AppError;

pub const ADDRESS_A: &str = "PAaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const ADDRESS_B: &str = "PBbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const ADDRESS_C: &str = "PCcccccccccccccccccccccccccccccccc";

pub fn dec(value: &str) -> Decimal {
  Decimal::from_str(value).unwrap()
}

/// 64-hex id derived from a short label.
pub fn txid(label: &str) -> String {
  format!("{:0>64}", hex::encode(label))
}

pub fn block_hash(height: u64) -> String {
  format!("{:064x}", 0xb10c_0000_0000u64 + height)
}

pub fn coinbase_tx(id: &str, outputs: &[(Option<&str>, &str)]) -> RawTransaction {
  let mut raw = raw_tx(id, &[], outputs);
  raw.vin.push(RawVin {
    coinbase: Some("03a0860100".to_string()),
    txid: None,
    vout: None,
    script_sig: None,
    sequence: Some(u32::MAX as u64),
  });
  raw
}

/// `inputs` are (parent label, vout), `outputs` are (address, value).
pub fn raw_tx(id: &str, inputs: &[(&str, u32)], outputs: &[(Option<&str>, &str)]) -> RawTransaction {
  RawTransaction {
    txid: txid(id),
    hex: Some("00".repeat(120)),
    size: None,
    time: Some(1_600_000_000),
    blockhash: None,
    confirmations: Some(0),
    vin: inputs
      .iter()
      .map(|(parent, vout)| RawVin {
        coinbase: None,
        txid: Some(txid(parent)),
        vout: Some(*vout),
        script_sig: None,
        sequence: Some(u32::MAX as u64),
      })
      .collect(),
    vout: outputs
      .iter()
      .enumerate()
      .map(|(n, (address, value))| RawVout {
        value: dec(value),
        n: n as u32,
        script_pub_key: ScriptPubKey {
          hex: format!("76a914{:0>40}88ac", n),
          addresses: address.map(|a| vec![a.to_string()]),
          ..Default::default()
        },
      })
      .collect(),
  }
}

#[derive(Default)]
struct ChainState {
  tip: Option<u64>,
  hashes: HashMap<u64, String>,
  blocks: HashMap<String, RawBlock>,
  transactions: HashMap<String, RawTransaction>,
  mempool: Vec<String>,
  unavailable_transactions: HashSet<String>,
  unavailable_heights: HashSet<u64>,
  failing_batches: HashSet<String>,
  hashes_delay: Option<Duration>,
  transactions_delay: Option<Duration>,
  block_batches: Vec<Vec<String>>,
  created: Vec<(Vec<OutPoint>, Vec<(String, Decimal)>)>,
  signed: Vec<(String, Vec<PrevOut>, Vec<String>)>,
  sent: Vec<String>,
}

/// In-memory daemon.
#[derive(Default)]
pub struct MockChain {
  state: Mutex<ChainState>,
}

impl MockChain {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Adds a main-chain block at `height` holding `transactions`.
  pub fn add_block(&self, height: u64, transactions: Vec<RawTransaction>) -> RawBlock {
    self.add_block_with_hash(height, &block_hash(height), transactions, 1)
  }

  pub fn add_block_with_hash(
    &self,
    height: u64,
    hash: &str,
    transactions: Vec<RawTransaction>,
    confirmations: i64,
  ) -> RawBlock {
    let mut state = self.state.lock().unwrap();
    let block = RawBlock {
      hash: hash.to_string(),
      height,
      size: 250,
      time: 1_600_000_000 + height as i64,
      confirmations,
      tx: transactions.iter().map(|tx| tx.txid.clone()).collect(),
      flags: Some("proof-of-stake".to_string()),
      mint: Some(Decimal::ONE),
      difficulty: Some(1.0),
      previousblockhash: None,
      nextblockhash: None,
    };
    for mut tx in transactions {
      tx.blockhash = Some(hash.to_string());
      tx.confirmations = Some(confirmations.max(1));
      state.mempool.retain(|id| *id != tx.txid);
      state.transactions.insert(tx.txid.clone(), tx);
    }
    if confirmations >= 0 {
      state.hashes.insert(height, hash.to_string());
      state.tip = Some(state.tip.map_or(height, |tip| tip.max(height)));
    }
    state.blocks.insert(hash.to_string(), block.clone());
    block
  }

  /// Adds `count` blocks from `from`, each holding a single coinbase paying `ADDRESS_C`.
  pub fn add_coinbase_blocks(&self, from: u64, count: u64) {
    for height in from..from + count {
      self.add_block(height, vec![coinbase_tx(&format!("cb{}", height), &[(Some(ADDRESS_C), "10")])]);
    }
  }

  pub fn add_mempool_tx(&self, tx: RawTransaction) {
    let mut state = self.state.lock().unwrap();
    state.mempool.push(tx.txid.clone());
    state.transactions.insert(tx.txid.clone(), tx);
  }

  pub fn make_unavailable(&self, txid: &str) {
    self.state.lock().unwrap().unavailable_transactions.insert(txid.to_string());
  }

  /// Any `get_raw_transactions` batch asking for `txid` fails as a whole.
  pub fn fail_batches_with(&self, txid: &str) {
    self.state.lock().unwrap().failing_batches.insert(txid.to_string());
  }

  pub fn hide_height(&self, height: u64) {
    self.state.lock().unwrap().unavailable_heights.insert(height);
  }

  pub fn set_hashes_delay(&self, delay: Duration) {
    self.state.lock().unwrap().hashes_delay = Some(delay);
  }

  pub fn set_transactions_delay(&self, delay: Duration) {
    self.state.lock().unwrap().transactions_delay = Some(delay);
  }

  pub fn block_batches(&self) -> Vec<Vec<String>> {
    self.state.lock().unwrap().block_batches.clone()
  }

  pub fn created(&self) -> Vec<(Vec<OutPoint>, Vec<(String, Decimal)>)> {
    self.state.lock().unwrap().created.clone()
  }

  pub fn signed(&self) -> Vec<(String, Vec<PrevOut>, Vec<String>)> {
    self.state.lock().unwrap().signed.clone()
  }

  pub fn sent(&self) -> Vec<String> {
    self.state.lock().unwrap().sent.clone()
  }

  fn transaction(&self, txid: &str) -> Option<RawTransaction> {
    let state = self.state.lock().unwrap();
    if state.unavailable_transactions.contains(txid) {
      return None;
    }
    state.transactions.get(txid).cloned()
  }
}

#[async_trait]
impl ChainRpc for MockChain {
  async fn get_block_count(&self) -> Result<u64, AppError> {
    Ok(self.state.lock().unwrap().tip.unwrap_or(0))
  }

  async fn get_block_hash(&self, height: u64) -> Result<Option<String>, AppError> {
    Ok(self.state.lock().unwrap().hashes.get(&height).cloned())
  }

  async fn get_best_block_hash(&self) -> Result<Option<String>, AppError> {
    let state = self.state.lock().unwrap();
    Ok(state.tip.and_then(|tip| state.hashes.get(&tip).cloned()))
  }

  async fn get_block(&self, hash: &str) -> Result<Option<RawBlock>, AppError> {
    Ok(self.state.lock().unwrap().blocks.get(hash).cloned())
  }

  async fn get_block_hashes(&self, heights: &[u64]) -> Result<Vec<String>, AppError> {
    let delay = self.state.lock().unwrap().hashes_delay;
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    let state = self.state.lock().unwrap();
    Ok(heights
      .iter()
      .filter(|height| !state.unavailable_heights.contains(height))
      .filter_map(|height| state.hashes.get(height).cloned())
      .collect())
  }

  async fn get_blocks(&self, hashes: &[String]) -> Result<Vec<RawBlock>, AppError> {
    let mut state = self.state.lock().unwrap();
    state.block_batches.push(hashes.to_vec());
    Ok(hashes.iter().filter_map(|hash| state.blocks.get(hash).cloned()).collect())
  }

  async fn get_raw_mempool(&self) -> Result<Vec<String>, AppError> {
    Ok(self.state.lock().unwrap().mempool.clone())
  }

  async fn get_raw_transaction(&self, txid: &str) -> Result<Option<RawTransaction>, AppError> {
    Ok(self.transaction(txid))
  }

  async fn get_raw_transactions(&self, txids: &[String]) -> Result<Vec<RawTransaction>, AppError> {
    let delay = self.state.lock().unwrap().transactions_delay;
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    if txids.iter().any(|txid| self.state.lock().unwrap().failing_batches.contains(txid)) {
      return Err(AppError::Rpc("getrawtransaction batch failed".to_string()));
    }
    Ok(txids.iter().filter_map(|txid| self.transaction(txid)).collect())
  }

  async fn create_raw_transaction(
    &self,
    inputs: &[OutPoint],
    outputs: &[(String, Decimal)],
  ) -> Result<Option<String>, AppError> {
    self.state.lock().unwrap().created.push((inputs.to_vec(), outputs.to_vec()));
    Ok(Some("0100".to_string()))
  }

  async fn sign_raw_transaction(
    &self,
    hex: &str,
    prevouts: &[PrevOut],
    private_keys: &[String],
  ) -> Result<Option<SignedTransaction>, AppError> {
    self
      .state
      .lock()
      .unwrap()
      .signed
      .push((hex.to_string(), prevouts.to_vec(), private_keys.to_vec()));
    Ok(Some(SignedTransaction { hex: format!("{}ff", hex), complete: true }))
  }

  async fn send_raw_transaction(&self, hex: &str) -> Result<Option<String>, AppError> {
    self.state.lock().unwrap().sent.push(hex.to_string());
    Ok(Some(txid("sent")))
  }

  async fn get_info(&self) -> Result<Option<ChainInfo>, AppError> {
    let tip = self.state.lock().unwrap().tip.unwrap_or(0);
    Ok(Some(ChainInfo { blocks: tip, difficulty: json!(1.5) }))
  }

  async fn get_network_hashps(&self) -> Result<Option<f64>, AppError> {
    Ok(Some(1000.0))
  }
}

/// Keeps every event it receives.
#[derive(Default)]
pub struct RecordingNotifier {
  blocks: Mutex<Vec<BlockItemModel>>,
  transactions: Mutex<Vec<String>>,
}

impl RecordingNotifier {
  pub fn blocks(&self) -> Vec<BlockItemModel> {
    self.blocks.lock().unwrap().clone()
  }

  pub fn transactions(&self) -> Vec<String> {
    self.transactions.lock().unwrap().clone()
  }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
  async fn notify_new_block(&self, block: &BlockItemModel) {
    self.blocks.lock().unwrap().push(block.clone());
  }

  async fn notify_new_transaction(&self, transaction: &TransactionModel) {
    self.transactions.lock().unwrap().push(transaction.txid.clone());
  }
}

pub struct Harness {
  pub chain: Arc<MockChain>,
  pub confirmed: Arc<MemoryRepository>,
  pub mem_pool: Arc<MemPoolRepository>,
  pub repository: Arc<TwoLevelRepository>,
  pub notifier: Arc<RecordingNotifier>,
  pub transactions: Arc<TransactionService>,
}

impl Harness {
  pub fn new(chain: Arc<MockChain>) -> Self {
    let confirmed = Arc::new(MemoryRepository::new());
    let mem_pool = Arc::new(MemPoolRepository::new());
    let confirmed_store: Arc<dyn TransactionRepository> = confirmed.clone();
    let repository = Arc::new(TwoLevelRepository::new(mem_pool.clone(), confirmed_store));
    let notifier = Arc::new(RecordingNotifier::default());
    let transactions = Arc::new(TransactionService::new(repository.clone(), chain.clone(), notifier.clone()));
    Self { chain, confirmed, mem_pool, repository, notifier, transactions }
  }

  pub async fn scanner(&self, settings: SyncSettings) -> Arc<BlockScanner> {
    Arc::new(
      BlockScanner::new(self.chain.clone(), self.transactions.clone(), self.notifier.clone(), &settings)
        .await
        .unwrap(),
    )
  }
}

pub fn sync_settings(batch_size: u64, lock_timeout_secs: u64) -> SyncSettings {
  SyncSettings {
    batch_size,
    new_block_lock_timeout_secs: lock_timeout_secs,
    ..Default::default()
  }
}
