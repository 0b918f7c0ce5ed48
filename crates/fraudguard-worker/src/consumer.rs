//! SQS consumer: long-poll the inbound queue and run each message through the driver
//!
//! Each message is processed in its own task, bounded by a semaphore. On
//! shutdown the loop stops polling and waits for in-flight tasks to finish.

use anyhow::{Context, Result};
use aws_sdk_sqs::types::{Message, MessageAttributeValue};
use aws_sdk_sqs::Client as SqsClient;
use fraudguard_core::{FailureDisposition, PipelineError, QueueConfig, WorkerConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::driver::PipelineDriver;

/// Pause after a failed receive before polling again.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// What happens to an inbound message once its pipeline pass is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAction {
    /// Remove from the inbound queue.
    Delete,
    /// Leave on the queue; it reappears after the visibility timeout.
    Retain,
    /// Forward the body to the dead-letter queue, then delete.
    DeadLetter,
}

/// Pick the action for a finished message. `error` is `None` on success.
///
/// Redelivering an unrecoverable failure would loop forever, so those go to
/// the dead-letter queue when one exists and are dropped otherwise.
pub fn decide_action(
    error: Option<&PipelineError>,
    disposition: FailureDisposition,
    dead_letter_configured: bool,
) -> MessageAction {
    let Some(error) = error else {
        return MessageAction::Delete;
    };

    match disposition {
        FailureDisposition::Drop => MessageAction::Delete,
        FailureDisposition::Redeliver if error.is_recoverable() => MessageAction::Retain,
        FailureDisposition::Redeliver | FailureDisposition::DeadLetter => {
            if dead_letter_configured {
                MessageAction::DeadLetter
            } else {
                MessageAction::Delete
            }
        }
    }
}

pub struct QueueConsumer {
    client: SqsClient,
    queue: QueueConfig,
    driver: Arc<PipelineDriver>,
    on_failure: FailureDisposition,
    max_concurrency: usize,
    semaphore: Arc<Semaphore>,
}

impl QueueConsumer {
    pub fn new(
        client: SqsClient,
        queue: QueueConfig,
        worker: &WorkerConfig,
        driver: Arc<PipelineDriver>,
    ) -> Self {
        let max_concurrency = worker.max_concurrency.max(1);
        Self {
            client,
            queue,
            driver,
            on_failure: worker.on_failure,
            max_concurrency,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
        }
    }

    /// Poll until `shutdown` resolves, then drain in-flight messages.
    pub async fn run<F>(self: Arc<Self>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            queue_url = %self.queue.inbound_queue_url,
            max_concurrency = self.max_concurrency,
            on_failure = %self.on_failure,
            "Queue consumer started"
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Queue consumer shutting down");
                    break;
                }
                received = self.receive_batch() => {
                    match received {
                        Ok(messages) => {
                            for message in messages {
                                self.clone().dispatch(message).await?;
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to receive messages");
                            tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }

        // All permits back means no task is still running.
        let _drained = self
            .semaphore
            .acquire_many(self.max_concurrency as u32)
            .await
            .context("Worker semaphore closed while draining")?;

        tracing::info!("Queue consumer stopped");
        Ok(())
    }

    async fn receive_batch(&self) -> Result<Vec<Message>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue.inbound_queue_url)
            .max_number_of_messages(self.queue.batch_size)
            .wait_time_seconds(self.queue.wait_time_secs)
            .send()
            .await
            .context("ReceiveMessage call failed")?;

        let messages = output.messages.unwrap_or_default();
        if !messages.is_empty() {
            tracing::debug!(count = messages.len(), "Received messages");
        }
        Ok(messages)
    }

    async fn dispatch(self: Arc<Self>, message: Message) -> Result<()> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker semaphore closed")?;

        tokio::spawn(async move {
            let _permit = permit;
            self.handle_message(message).await;
        });
        Ok(())
    }

    async fn handle_message(&self, message: Message) {
        let message_id = message.message_id().unwrap_or("unknown").to_string();
        let body = message.body().unwrap_or_default();

        let outcome = self.driver.process_message(body).await;
        let error = outcome.as_ref().err().map(|failure| &failure.error);
        let action = decide_action(
            error,
            self.on_failure,
            self.queue.dead_letter_queue_url.is_some(),
        );

        tracing::debug!(message_id = %message_id, action = ?action, "Message disposition");

        let result = match action {
            MessageAction::Delete => self.delete(&message).await,
            MessageAction::Retain => {
                tracing::warn!(
                    message_id = %message_id,
                    "Leaving message on queue for redelivery"
                );
                Ok(())
            }
            MessageAction::DeadLetter => {
                let error_code = error.map(PipelineError::error_code).unwrap_or("UNKNOWN");
                match self.forward_to_dead_letter(body, error_code).await {
                    Ok(()) => self.delete(&message).await,
                    Err(e) => Err(e),
                }
            }
        };

        if let Err(e) = result {
            tracing::error!(
                message_id = %message_id,
                error = %e,
                "Failed to settle message; it will be redelivered"
            );
        }
    }

    async fn delete(&self, message: &Message) -> Result<()> {
        let receipt_handle = message
            .receipt_handle()
            .context("Message has no receipt handle")?;

        self.client
            .delete_message()
            .queue_url(&self.queue.inbound_queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .context("DeleteMessage call failed")?;
        Ok(())
    }

    async fn forward_to_dead_letter(&self, body: &str, error_code: &str) -> Result<()> {
        let queue_url = self
            .queue
            .dead_letter_queue_url
            .as_deref()
            .context("No dead-letter queue configured")?;

        let attribute = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(error_code)
            .build()
            .context("Failed to build errorCode attribute")?;

        self.client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .message_attributes("errorCode", attribute)
            .send()
            .await
            .context("SendMessage to dead-letter queue failed")?;

        tracing::warn!(error_code = %error_code, "Message forwarded to dead-letter queue");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::{EvaluationError, EvaluatorKind};

    fn malformed() -> PipelineError {
        PipelineError::MalformedMessage("missing field 'userId'".to_string())
    }

    fn aborted() -> PipelineError {
        PipelineError::AggregationAbort {
            evaluator: EvaluatorKind::AiInference,
            source: EvaluationError::Timeout { timeout_ms: 10 },
        }
    }

    #[test]
    fn test_success_is_always_deleted() {
        for disposition in [
            FailureDisposition::Drop,
            FailureDisposition::Redeliver,
            FailureDisposition::DeadLetter,
        ] {
            assert_eq!(decide_action(None, disposition, true), MessageAction::Delete);
        }
    }

    #[test]
    fn test_drop_deletes_failures() {
        assert_eq!(
            decide_action(Some(&aborted()), FailureDisposition::Drop, true),
            MessageAction::Delete
        );
    }

    #[test]
    fn test_redeliver_retains_recoverable_failures() {
        assert_eq!(
            decide_action(Some(&aborted()), FailureDisposition::Redeliver, false),
            MessageAction::Retain
        );
    }

    #[test]
    fn test_redeliver_routes_unrecoverable_failures() {
        assert_eq!(
            decide_action(Some(&malformed()), FailureDisposition::Redeliver, true),
            MessageAction::DeadLetter
        );
        assert_eq!(
            decide_action(Some(&malformed()), FailureDisposition::Redeliver, false),
            MessageAction::Delete
        );
    }

    #[test]
    fn test_dead_letter_forwards_any_failure() {
        assert_eq!(
            decide_action(Some(&aborted()), FailureDisposition::DeadLetter, true),
            MessageAction::DeadLetter
        );
        assert_eq!(
            decide_action(Some(&malformed()), FailureDisposition::DeadLetter, true),
            MessageAction::DeadLetter
        );
    }
}
