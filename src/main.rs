// src/main.rs
/**
* author : HAMA
* date: 2025. 4. 6.
* description: Entry point for the ledger indexer.
**/

use xexplorer::analyzer::AddressAnalyzer;
use xexplorer::coin::{ChainRpc, RpcClient};
use xexplorer::config::Settings;
use xexplorer::fetcher::BlockScanner;
use xexplorer::notification::{LogNotifier, NotificationSink, SqsNotifier};
use xexplorer::respository::{MemPoolRepository, RepositoryWrapper, TransactionRepository, TwoLevelRepository};
use xexplorer::service::{ExplorerService, TransactionService};
use xexplorer::shutdown::shutdown_signal;
use xexplorer::tasks::{run_mempool_checker, run_tip_watcher, spawn_scanner, MempoolChecker};
use xexplorer::types::AppError;

use log::{info, warn};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Application starting...");

    // 2. Load configuration
    let settings = Settings::new().map_err(|e| AppError::Config(e.to_string()))?;
    info!("Configuration loaded.");

    // 3. Confirmed store + mempool
    let confirmed: Arc<dyn TransactionRepository> =
        Arc::new(RepositoryWrapper::from_settings(&settings.repository).await?);
    let mem_pool = Arc::new(MemPoolRepository::new());
    let repository = Arc::new(TwoLevelRepository::new(mem_pool, confirmed));

    // 4. Daemon RPC client
    let mut client = RpcClient::new(settings.rpc.url.clone());
    if let Some(user) = settings.rpc.user.clone() {
        client = client.with_credentials(user, settings.rpc.password.clone());
    }
    let rpc: Arc<dyn ChainRpc> = Arc::new(client);

    // 5. Notifications
    let notifier: Arc<dyn NotificationSink> = match (
        settings.notification.sqs_queue_url.clone(),
        settings.notification.sqs_region.clone(),
    ) {
        (Some(queue_url), Some(region)) => {
            info!("SQS notifications enabled: {}", queue_url);
            Arc::new(SqsNotifier::new(queue_url, region).await)
        }
        _ => Arc::new(LogNotifier),
    };

    // 6. Services
    let transactions = Arc::new(TransactionService::new(repository.clone(), rpc.clone(), notifier.clone()));
    let addresses = Arc::new(AddressAnalyzer::new(repository.clone(), rpc.clone()));
    let explorer = ExplorerService::new(rpc.clone(), transactions.clone(), addresses);
    match explorer.info().await {
        Ok(Some(summary)) => info!("Daemon at {} blocks, difficulty {}", summary.blocks, summary.difficulty),
        Ok(None) => warn!("Daemon returned no info"),
        Err(e) => warn!("Daemon not reachable yet: {}", e),
    }

    let scanner = Arc::new(BlockScanner::new(rpc.clone(), transactions.clone(), notifier, &settings.sync).await?);

    // 7. Background tasks
    let scan_handle = spawn_scanner(scanner.clone(), settings.sync.scan_interval_secs);
    let tip_handle = tokio::spawn(run_tip_watcher(rpc.clone(), scanner, settings.sync.tip_poll_interval_secs));
    let checker = Arc::new(MempoolChecker::new(rpc, transactions));
    let mempool_handle = tokio::spawn(run_mempool_checker(checker, settings.sync.mempool_interval_secs));

    // 8. Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received. Stopping tasks...");

    scan_handle.abort();
    tip_handle.abort();
    mempool_handle.abort();
    let _ = scan_handle.await;
    let _ = tip_handle.await;
    let _ = mempool_handle.await;

    info!("Application exited cleanly.");
    Ok(())
}
