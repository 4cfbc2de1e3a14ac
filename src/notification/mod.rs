pub mod notifier;
pub mod sqs_client;

pub use notifier::{LogNotifier, NotificationSink};
pub use sqs_client::SqsNotifier;
