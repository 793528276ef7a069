use async_trait::async_trait;
use huddle_client::{ConnectionState, RemoteMedia, RoomObserver};
use huddle_core::PeerId;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Event types recorded by TestObserver.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Joined { peer_id: PeerId },
    Left { peer_id: PeerId },
    RemoteMedia { peer_id: PeerId, track_id: String },
    ConnectionState { peer_id: PeerId, state: ConnectionState },
}

/// RoomObserver that records every notification.
#[derive(Clone, Default)]
pub struct TestObserver {
    events: Arc<Mutex<Vec<RoomEvent>>>,
}

impl TestObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_events(&self) -> Vec<RoomEvent> {
        self.events.lock().await.clone()
    }

    /// Wait until `pred` holds for the recorded events.
    pub async fn wait_for<F>(&self, timeout_ms: u64, pred: F) -> bool
    where
        F: Fn(&[RoomEvent]) -> bool,
    {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if pred(&self.events.lock().await) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn joins_of(&self, peer_id: &PeerId) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| matches!(e, RoomEvent::Joined { peer_id: id } if id == peer_id))
            .count()
    }

    pub async fn has_left(&self, peer_id: &PeerId) -> bool {
        self.events
            .lock()
            .await
            .iter()
            .any(|e| matches!(e, RoomEvent::Left { peer_id: id } if id == peer_id))
    }

    async fn record(&self, event: RoomEvent) {
        self.events.lock().await.push(event);
    }
}

#[async_trait]
impl RoomObserver for TestObserver {
    async fn on_peer_joined(&self, peer_id: PeerId) {
        self.record(RoomEvent::Joined { peer_id }).await;
    }

    async fn on_peer_left(&self, peer_id: PeerId) {
        self.record(RoomEvent::Left { peer_id }).await;
    }

    async fn on_remote_media(&self, peer_id: PeerId, media: RemoteMedia) {
        self.record(RoomEvent::RemoteMedia {
            peer_id,
            track_id: media.track_id,
        })
        .await;
    }

    async fn on_connection_state(&self, peer_id: PeerId, state: ConnectionState) {
        self.record(RoomEvent::ConnectionState { peer_id, state })
            .await;
    }
}
