//! The two named append-only streams (§4.8): `review:requests` for DIFF
//! mode, `review:agent-requests` for AGENTIC. The router selects the
//! stream purely by `AsyncRequest.mode`, nothing else (§8 property 8).
//! Implemented as bounded mpsc channels, preserving append order per
//! stream (§5); no cross-ordering guarantee between the two.

use tokio::sync::mpsc;

use crate::errors::{DispatcherError, DispatcherResult};
use crate::types::{AsyncRequest, ReviewMode};

pub const DIFF_STREAM_NAME: &str = "review:requests";
pub const AGENTIC_STREAM_NAME: &str = "review:agent-requests";

/// Producer handle: `send` serialises the routing decision and appends to
/// the mode-selected stream.
#[derive(Clone)]
pub struct StreamProducer {
    diff_tx: mpsc::Sender<AsyncRequest>,
    agentic_tx: mpsc::Sender<AsyncRequest>,
}

impl StreamProducer {
    pub async fn send(&self, request: AsyncRequest) -> DispatcherResult<()> {
        let tx = match request.mode {
            ReviewMode::Diff => &self.diff_tx,
            ReviewMode::Agentic => &self.agentic_tx,
        };
        tx.send(request).await.map_err(|e| DispatcherError::Send(e.to_string()))
    }
}

pub struct StreamBus {
    pub producer: StreamProducer,
    pub diff_rx: mpsc::Receiver<AsyncRequest>,
    pub agentic_rx: mpsc::Receiver<AsyncRequest>,
}

impl StreamBus {
    /// `capacity` bounds in-flight records per stream before the producer
    /// starts awaiting a free slot.
    pub fn new(capacity: usize) -> Self {
        let (diff_tx, diff_rx) = mpsc::channel(capacity);
        let (agentic_tx, agentic_rx) = mpsc::channel(capacity);
        Self { producer: StreamProducer { diff_tx, agentic_tx }, diff_rx, agentic_rx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scm::ProviderId;

    #[tokio::test]
    async fn diff_mode_goes_to_diff_stream_only() {
        let mut bus = StreamBus::new(8);
        let req = AsyncRequest::new(ProviderId::GitHub, "o/r", 1, ReviewMode::Diff, None);
        bus.producer.send(req.clone()).await.unwrap();
        let received = bus.diff_rx.recv().await.unwrap();
        assert_eq!(received.request_id, req.request_id);
        assert!(bus.agentic_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn agentic_mode_goes_to_agentic_stream_only() {
        let mut bus = StreamBus::new(8);
        let req = AsyncRequest::new(ProviderId::GitLab, "123", 2, ReviewMode::Agentic, None);
        bus.producer.send(req.clone()).await.unwrap();
        let received = bus.agentic_rx.recv().await.unwrap();
        assert_eq!(received.request_id, req.request_id);
        assert!(bus.diff_rx.try_recv().is_err());
    }
}
