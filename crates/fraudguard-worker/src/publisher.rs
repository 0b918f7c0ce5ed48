//! Result publisher: one outbound notification per aggregated work item

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use fraudguard_core::NotificationMessage;

/// Outbound channel for verdict notifications.
///
/// Success means the enqueue call was accepted; no further acknowledgment is
/// awaited.
#[async_trait]
pub trait ResultPublisher: Send + Sync {
    async fn publish(&self, notification: &NotificationMessage) -> Result<()>;
}

/// Publishes notifications with a single `SendMessage` call.
#[derive(Clone)]
pub struct SqsResultPublisher {
    client: SqsClient,
    queue_url: String,
}

impl SqsResultPublisher {
    pub fn new(client: SqsClient, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait]
impl ResultPublisher for SqsResultPublisher {
    #[tracing::instrument(skip(self, notification), fields(user_id = %notification.user_id))]
    async fn publish(&self, notification: &NotificationMessage) -> Result<()> {
        let payload = notification
            .to_payload()
            .context("Failed to serialize notification")?;

        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(payload)
            .send()
            .await
            .context("Failed to send notification to outbound queue")?;

        tracing::info!(
            message_id = output.message_id().unwrap_or("unknown"),
            "Notification published"
        );
        Ok(())
    }
}
