/**
* filename : tasks
* author : HAMA
* date: 2025. 4. 6.
* description: background loops
**/

pub mod mempool_checker;
pub mod tip_watcher;

use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

use crate::fetcher::{run_scanner, BlockScanner};

pub use mempool_checker::{run_mempool_checker, MempoolChecker};
pub use tip_watcher::run_tip_watcher;

pub fn spawn_scanner(scanner: Arc<BlockScanner>, interval_secs: u64) -> JoinHandle<()> {
  tokio::spawn(run_scanner(scanner, Duration::from_secs(interval_secs)))
}
