use crate::coin::ChainRpc;
use crate::service::TransactionService;
use crate::types::AppError;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Pulls the daemon's unconfirmed pool into the mempool store.
pub struct MempoolChecker {
    rpc: Arc<dyn ChainRpc>,
    transactions: Arc<TransactionService>,
}

impl MempoolChecker {
    pub fn new(rpc: Arc<dyn ChainRpc>, transactions: Arc<TransactionService>) -> Self {
        Self { rpc, transactions }
    }

    /// One reconciliation pass. Returns how many transactions were newly pooled.
    pub async fn check(&self) -> Result<usize, AppError> {
        let txids = self.rpc.get_raw_mempool().await?;
        if txids.is_empty() {
            return Ok(0);
        }

        let raw_transactions = self.rpc.get_raw_transactions(&txids).await?;
        let mut inserted = 0;
        for raw in &raw_transactions {
            if self.transactions.save_mempool_tx(raw).await {
                debug!("[MempoolChecker] Pooled {}", raw.txid);
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

/// Runs `check()` on every tick. Each pass is awaited before the next tick, so
/// passes never overlap.
pub async fn run_mempool_checker(checker: Arc<MempoolChecker>, check_interval_secs: u64) {
    info!("[MempoolChecker] Starting with check_interval: {}s", check_interval_secs);

    let mut check_interval = interval(Duration::from_secs(check_interval_secs));

    loop {
        check_interval.tick().await;

        match checker.check().await {
            Ok(0) => {}
            Ok(inserted) => info!("[MempoolChecker] {} new unconfirmed transactions", inserted),
            Err(e) => error!("[MempoolChecker] Error checking mempool: {}", e),
        }
    }
}
