use crate::coin::ChainRpc;
use crate::fetcher::{BlockScanner, NewBlockOutcome};
use log::{info, warn};
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Polls the best block hash and hands every change to `on_new_block`.
pub async fn run_tip_watcher(rpc: Arc<dyn ChainRpc>, scanner: Arc<BlockScanner>, poll_interval_secs: u64) {
    info!("[TipWatcher] Polling best block every {}s", poll_interval_secs);

    let mut poll_interval = interval(Duration::from_secs(poll_interval_secs));
    let mut last_seen: Option<String> = None;

    loop {
        poll_interval.tick().await;

        let hash = match rpc.get_best_block_hash().await {
            Ok(Some(hash)) => hash,
            Ok(None) => continue,
            Err(e) => {
                warn!("[TipWatcher] Failed to get best block hash: {}", e);
                continue;
            }
        };
        if last_seen.as_deref() == Some(hash.as_str()) {
            continue;
        }

        match scanner.on_new_block(&hash).await {
            // 스캔이 진행 중이면 다음 폴링에서 다시 시도
            Ok(NewBlockOutcome::Busy) => {}
            Ok(outcome) => {
                info!("[TipWatcher] {} -> {:?}", hash, outcome);
                last_seen = Some(hash);
            }
            Err(e) => warn!("[TipWatcher] Failed to ingest {}: {}", hash, e),
        }
    }
}
