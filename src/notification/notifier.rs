use async_trait::async_trait;
use log::info;

use crate::analyzer::types::{BlockItemModel, TransactionModel};

/// Outbound new-block / new-transaction events. Fire-and-forget: delivery
/// errors are handled (logged) by the sink itself.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_new_block(&self, block: &BlockItemModel);

    async fn notify_new_transaction(&self, transaction: &TransactionModel);
}

/// Sink used when no queue is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify_new_block(&self, block: &BlockItemModel) {
        info!(
            "[Notifier] New block #{} {} ({} txs, {} sent)",
            block.height, block.hash, block.tx_count, block.coins_sent
        );
    }

    async fn notify_new_transaction(&self, transaction: &TransactionModel) {
        info!(
            "[Notifier] New transaction {} ({})",
            transaction.txid, transaction.outputs_value
        );
    }
}
