use std::sync::Arc;

use crate::analytics::aggregator::AggregateStats;
use crate::telemetry::message::TelemetryMessage;
use crate::telemetry::sink::TelemetrySink;

/// Fire-and-forget telemetry hand-off.
///
/// `publish` serializes and detaches delivery onto a background task; the
/// caller gets control back immediately and never learns about delivery
/// failures — those are logged and dropped. Telemetry is best effort, not a
/// correctness-critical path.
pub struct TelemetryPublisher {
    sink: Arc<dyn TelemetrySink>,
}

impl TelemetryPublisher {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }

    /// Must be called from within a tokio runtime context.
    pub fn publish(&self, stats: &AggregateStats, device_id: &str) {
        let message = TelemetryMessage::new(device_id, stats);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.send(&message).await {
                log::warn!("telemetry delivery failed, message dropped: {e}");
            } else {
                log::debug!(
                    "telemetry delivered for {} ({} persons)",
                    message.device_id,
                    message.persons
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::sink::TelemetryError;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct RecordingSink {
        tx: mpsc::UnboundedSender<TelemetryMessage>,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn send(&self, message: &TelemetryMessage) -> Result<(), TelemetryError> {
            tokio::time::sleep(self.delay).await;
            self.tx.send(message.clone()).expect("test receiver alive");
            if self.fail {
                return Err(TelemetryError::Status(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publish_returns_before_delivery_completes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let publisher = TelemetryPublisher::new(Arc::new(RecordingSink {
            tx,
            delay: Duration::from_millis(50),
            fail: false,
        }));

        let stats = AggregateStats {
            person_count: 1,
            ..AggregateStats::default()
        };
        publisher.publish(&stats, "stand-01");
        // nothing delivered yet: the sink is still sleeping
        assert!(rx.try_recv().is_err());

        let delivered = rx.recv().await.expect("delivery happens eventually");
        assert_eq!(delivered.device_id, "stand-01");
        assert_eq!(delivered.persons, 1);
    }

    #[tokio::test]
    async fn test_sink_failure_is_absorbed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let publisher = TelemetryPublisher::new(Arc::new(RecordingSink {
            tx,
            delay: Duration::ZERO,
            fail: true,
        }));

        publisher.publish(&AggregateStats::default(), "stand-01");
        // the failed delivery still ran; the failure went nowhere but the log
        assert!(rx.recv().await.is_some());
    }
}
