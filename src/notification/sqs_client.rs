use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use log::{error, info};
use serde::Serialize;

use crate::analyzer::types::{BlockItemModel, TransactionModel};
use crate::notification::notifier::NotificationSink;

#[derive(Debug, Serialize)]
#[serde(tag = "event")]
pub enum ExplorerEvent<'a> {
    NewBlock { block: &'a BlockItemModel },
    NewTransaction { transaction: &'a TransactionModel },
}

pub struct SqsNotifier {
    client: SqsClient,
    queue_url: String,
}

impl SqsNotifier {
    pub async fn new(queue_url: String, region: String) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region))
            .load()
            .await;

        let client = SqsClient::new(&config);

        Self { client, queue_url }
    }

    pub async fn send_event(&self, event: &ExplorerEvent<'_>) -> Result<(), String> {
        let message_body = serde_json::to_string(event)
            .map_err(|e| format!("Failed to serialize event: {}", e))?;

        info!("Sending SQS message: {}", message_body);

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message_body)
            .send()
            .await
            .map_err(|e| format!("Failed to send SQS message: {}", e))?;

        info!("✅ SQS message sent successfully");
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for SqsNotifier {
    async fn notify_new_block(&self, block: &BlockItemModel) {
        if let Err(e) = self.send_event(&ExplorerEvent::NewBlock { block }).await {
            error!("[SqsNotifier] NewBlock {}: {}", block.hash, e);
        }
    }

    async fn notify_new_transaction(&self, transaction: &TransactionModel) {
        if let Err(e) = self.send_event(&ExplorerEvent::NewTransaction { transaction }).await {
            error!("[SqsNotifier] NewTransaction {}: {}", transaction.txid, e);
        }
    }
}
