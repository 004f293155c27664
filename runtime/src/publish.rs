//! Event publication policies.
//!
//! Cart events are best-effort: a failed publish is logged and swallowed,
//! never rolling back or failing the mutation that produced it. Events that
//! must not be lost (order creation elsewhere in the platform) go through
//! [`publish_with_retry`], which backs off exponentially and dead-letters
//! the event once retries are exhausted.

use crate::retry::RetryPolicy;
use cartwheel_core::error::PublishError;
use cartwheel_core::events::{DeadLetterQueue, EventPublisher};
use serde_json::Value;
use tokio::time::sleep;

/// Publish fire-and-forget: failures are logged, not propagated.
pub async fn publish_best_effort(events: &dyn EventPublisher, event_name: &str, payload: Value) {
    if let Err(err) = events.publish(event_name, payload).await {
        tracing::warn!(event = event_name, error = %err, "event publish failed, continuing");
    }
}

/// Publish with exponential backoff, dead-lettering on exhaustion.
///
/// # Errors
///
/// Returns the last [`PublishError`] after all attempts fail; by then the
/// event has been recorded in the dead letter queue for later replay.
pub async fn publish_with_retry(
    events: &dyn EventPublisher,
    dead_letters: &dyn DeadLetterQueue,
    policy: &RetryPolicy,
    event_name: &str,
    payload: Value,
) -> Result<(), PublishError> {
    let mut last_error: Option<PublishError> = None;

    for attempt in 0..policy.max_attempts {
        match events.publish(event_name, payload.clone()).await {
            Ok(()) => {
                if attempt > 0 {
                    tracing::info!(event = event_name, attempt, "event published after retry");
                }
                return Ok(());
            }
            Err(err) => {
                if attempt + 1 < policy.max_attempts {
                    let delay = policy.delay_for_attempt(attempt);
                    tracing::warn!(
                        event = event_name,
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "event publish failed, retrying"
                    );
                    sleep(delay).await;
                }
                last_error = Some(err);
            }
        }
    }

    let err = last_error.unwrap_or_else(|| PublishError::PublishFailed {
        event: event_name.to_owned(),
        reason: "no publish attempts were made".to_owned(),
    });

    tracing::error!(
        event = event_name,
        attempts = policy.max_attempts,
        error = %err,
        "event publish failed permanently, dead-lettering"
    );
    dead_letters.enqueue(event_name, payload, &err).await;

    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartwheel_testing::mocks::{InMemoryDeadLetterQueue, RecordingEventPublisher};
    use serde_json::json;
    use std::time::Duration;

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(max_attempts)
            .initial_delay(Duration::from_millis(10))
            .build()
    }

    #[tokio::test]
    async fn best_effort_swallows_failures() {
        let publisher = RecordingEventPublisher::failing(1);
        publish_best_effort(&publisher, "cart.updated", json!({})).await;
        assert!(publisher.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_succeeds_after_transient_failures() {
        let publisher = RecordingEventPublisher::failing(2);
        let dlq = InMemoryDeadLetterQueue::new();

        let result = publish_with_retry(
            &publisher,
            &dlq,
            &fast_policy(4),
            "order.created",
            json!({"orderId": "O1"}),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(publisher.published().len(), 1);
        assert!(dlq.letters().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_dead_letter_the_event() {
        let publisher = RecordingEventPublisher::failing(10);
        let dlq = InMemoryDeadLetterQueue::new();

        let result = publish_with_retry(
            &publisher,
            &dlq,
            &fast_policy(3),
            "order.created",
            json!({"orderId": "O1"}),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(dlq.letters().len(), 1);
        assert_eq!(dlq.letters()[0].name, "order.created");
    }
}
