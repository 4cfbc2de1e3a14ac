/**
* filename : runner
* author : HAMA
* date: 2025. 4. 6.
* description: periodic catch-up scan
**/

use crate::fetcher::scanner::BlockScanner;

use log::{info, warn};
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Runs `scan()` to the tip on every tick. A tick is only taken after the
/// previous scan returned, so scans never overlap.
pub async fn run_scanner(scanner: Arc<BlockScanner>, interval_duration: Duration) {
  let mut tick = interval(interval_duration);
  info!(
    "[Scanner] Starting from block {:?} with interval {:?}",
    scanner.last_scanned_block_number(),
    interval_duration
  );

  loop {
    tick.tick().await;

    info!("===============================================");
    match scanner.scan(None, None).await {
      Ok(()) => {
        info!("[Scanner] ✅ Up to date at block {:?}", scanner.last_scanned_block_number());
      }
      Err(e) => {
        let retry_delay = interval_duration / 2;
        warn!(
          "[Scanner] ⏳ Scan failed at block {:?}: {} | retrying in {:?}",
          scanner.last_scanned_block_number(),
          e,
          retry_delay
        );
        tokio::time::sleep(retry_delay).await;
        tick.reset();
      }
    }
  }
}
