/**
* filename : scanner
* author : HAMA
* date: 2026. 10. 17.
* description: catch-up scan and new-block ingestion, serialized by one gate
**/

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::analyzer::types::BlockItemModel;
use crate::analyzer::utils::is_valid_hash;
use crate::coin::model::RawBlock;
use crate::coin::ChainRpc;
use crate::config::SyncSettings;
use crate::notification::NotificationSink;
use crate::service::TransactionService;
use crate::types::AppError;

/// What `on_new_block` did with a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewBlockOutcome {
  Ingested,
  /// Height already covered by the last scanned block.
  Stale,
  InvalidHash,
  NotFound,
  /// The gate stayed held past the wait limit; the next periodic scan picks the block up.
  Busy,
}

/// Blocks fetched for `from..=to`. `blocks` holds the contiguous run starting
/// at `from` that the daemon actually returned.
struct FetchedBatch {
  from: u64,
  to: u64,
  blocks: Vec<RawBlock>,
}

impl FetchedBatch {
  fn is_complete(&self) -> bool {
    self.blocks.len() as u64 == self.to - self.from + 1
  }
}

pub struct BlockScanner {
  rpc: Arc<dyn ChainRpc>,
  transactions: Arc<TransactionService>,
  notifier: Arc<dyn NotificationSink>,
  gate: Mutex<()>,
  // -1 until the first block is persisted
  last_scanned: AtomicI64,
  batch_size: u64,
  lock_timeout: Duration,
}

impl BlockScanner {
  /// Resumes from the highest block number in the confirmed store.
  pub async fn new(
    rpc: Arc<dyn ChainRpc>,
    transactions: Arc<TransactionService>,
    notifier: Arc<dyn NotificationSink>,
    settings: &SyncSettings,
  ) -> Result<Self, AppError> {
    let last = transactions.last_block_number().await?;
    info!("[Scanner] Last scanned block: {:?}", last);

    Ok(Self {
      rpc,
      transactions,
      notifier,
      gate: Mutex::new(()),
      last_scanned: AtomicI64::new(last.map(|n| n as i64).unwrap_or(-1)),
      batch_size: settings.batch_size.max(1),
      lock_timeout: Duration::from_secs(settings.new_block_lock_timeout_secs),
    })
  }

  pub fn last_scanned_block_number(&self) -> Option<u64> {
    let last = self.last_scanned.load(Ordering::SeqCst);
    (last >= 0).then_some(last as u64)
  }

  /// Scans `max(last + 1, from)..=to` (tip when `to` is `None`), waiting for the gate.
  pub async fn scan(&self, from: Option<u64>, to: Option<u64>) -> Result<(), AppError> {
    let _guard = self.gate.lock().await;
    self.scan_no_lock(from, to).await
  }

  /// Ingests the block announced by the daemon.
  pub async fn on_new_block(&self, hash: &str) -> Result<NewBlockOutcome, AppError> {
    info!("[Scanner] New block: {}", hash);
    if !is_valid_hash(hash) {
      warn!("[Scanner] Invalid block hash provided: {}", hash);
      return Ok(NewBlockOutcome::InvalidHash);
    }

    let Some(block) = self.rpc.get_block(hash).await? else {
      warn!("[Scanner] Block was not found: {}", hash);
      return Ok(NewBlockOutcome::NotFound);
    };
    if self.is_stale(block.height) {
      debug!("[Scanner] Block {} is not past {:?}", block.height, self.last_scanned_block_number());
      return Ok(NewBlockOutcome::Stale);
    }

    let _guard = match tokio::time::timeout(self.lock_timeout, self.gate.lock()).await {
      Ok(guard) => guard,
      Err(_) => {
        warn!("[Scanner] Scan in progress, dropping block {} ({})", block.height, hash);
        return Ok(NewBlockOutcome::Busy);
      }
    };
    // 대기하는 동안 스캔이 이 블록을 이미 처리했을 수 있음
    if self.is_stale(block.height) {
      return Ok(NewBlockOutcome::Stale);
    }

    if block.height > 0 {
      self.scan_no_lock(None, Some(block.height - 1)).await?;
    }
    self.save_block_transactions(&block).await?;

    let cleared = self.transactions.mem_pool().clear().await;
    debug!("[Scanner] Cleared {} mempool transactions after block {}", cleared, block.height);
    Ok(NewBlockOutcome::Ingested)
  }

  fn is_stale(&self, height: u64) -> bool {
    self.last_scanned_block_number().is_some_and(|last| height <= last)
  }

  async fn scan_no_lock(&self, from: Option<u64>, to: Option<u64>) -> Result<(), AppError> {
    let next_unscanned = self.last_scanned_block_number().map_or(0, |last| last + 1);
    let from = from.map_or(next_unscanned, |from| from.max(next_unscanned));
    let to = match to {
      Some(to) => to,
      None => self.rpc.get_block_count().await?,
    };
    if from > to {
      return Ok(());
    }

    info!("[Scanner] Scanning blocks {}..={}", from, to);
    let batch_end = |start: u64| start.saturating_add(self.batch_size - 1).min(to);

    let mut current = fetch_batch(self.rpc.clone(), from, batch_end(from)).await?;
    loop {
      let next_from = current.to + 1;
      // 다음 배치 조회는 현재 배치 저장과 동시에 진행
      let next = (current.is_complete() && next_from <= to)
        .then(|| tokio::spawn(fetch_batch(self.rpc.clone(), next_from, batch_end(next_from))));

      if let Err(e) = self.save_batch(&current).await {
        if let Some(handle) = next {
          handle.abort();
        }
        error!("[Scanner] ❌ Scan aborted at {:?}: {}", self.last_scanned_block_number(), e);
        return Err(e);
      }

      if !current.is_complete() {
        let e = AppError::Block(format!(
          "blocks {}..={} incomplete, persisted {} of them",
          current.from,
          current.to,
          current.blocks.len()
        ));
        error!("[Scanner] ❌ Scan aborted at {:?}: {}", self.last_scanned_block_number(), e);
        return Err(e);
      }

      match next {
        Some(handle) => current = handle.await??,
        None => break,
      }
    }

    info!("[Scanner] ✅ Scanned up to {:?}", self.last_scanned_block_number());
    Ok(())
  }

  async fn save_batch(&self, batch: &FetchedBatch) -> Result<(), AppError> {
    for block in &batch.blocks {
      self.save_block_transactions(block).await?;
    }
    Ok(())
  }

  /// Persists one block and emits its notifications. A block already in the
  /// confirmed store is skipped without touching the last scanned height.
  async fn save_block_transactions(&self, block: &RawBlock) -> Result<(), AppError> {
    debug!("[Scanner] Saving block {} ({})", block.height, block.hash);
    if self.transactions.block_exists(&block.hash).await? {
      debug!("[Scanner] Block {} already indexed", block.height);
      return Ok(());
    }

    let models = self.transactions.save_all_block_transactions(block).await?;
    self.last_scanned.fetch_max(block.height as i64, Ordering::SeqCst);

    self.notifier.notify_new_block(&BlockItemModel::new(block, &models)).await;
    let mem_pool = self.transactions.mem_pool();
    for model in &models {
      if !mem_pool.contains(&model.txid).await {
        self.notifier.notify_new_transaction(model).await;
      }
    }
    Ok(())
  }
}

/// heights -> hashes -> blocks, trimmed to the contiguous run starting at `from`.
async fn fetch_batch(rpc: Arc<dyn ChainRpc>, from: u64, to: u64) -> Result<FetchedBatch, AppError> {
  let heights: Vec<u64> = (from..=to).collect();
  let hashes = rpc.get_block_hashes(&heights).await?;
  let mut blocks = rpc.get_blocks(&hashes).await?;
  blocks.sort_by_key(|block| block.height);

  let mut contiguous = Vec::with_capacity(blocks.len());
  let mut expected = from;
  for block in blocks {
    if block.height != expected {
      warn!("[Scanner] Expected block {} but got {}, truncating batch", expected, block.height);
      break;
    }
    expected += 1;
    contiguous.push(block);
  }

  debug!("[Scanner] Fetched {} of {} blocks ({}..={})", contiguous.len(), heights.len(), from, to);
  Ok(FetchedBatch { from, to, blocks: contiguous })
}
