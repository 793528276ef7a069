use crate::transport::{ConnectionState, RemoteMedia};
use async_trait::async_trait;
use huddle_core::PeerId;
use tracing::info;

/// Presentation layer hooks. Called from the coordinator task, one at a time.
#[async_trait]
pub trait RoomObserver: Send + Sync + 'static {
    /// Fired once per remote peer per join.
    async fn on_peer_joined(&self, peer_id: PeerId);

    async fn on_peer_left(&self, peer_id: PeerId);

    async fn on_remote_media(&self, _peer_id: PeerId, _media: RemoteMedia) {}

    /// Diagnostics only; signaling never depends on it.
    async fn on_connection_state(&self, _peer_id: PeerId, _state: ConnectionState) {}
}

/// Observer that only logs.
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

#[async_trait]
impl RoomObserver for TracingObserver {
    async fn on_peer_joined(&self, peer_id: PeerId) {
        info!("Peer joined: {}", peer_id);
    }

    async fn on_peer_left(&self, peer_id: PeerId) {
        info!("Peer left: {}", peer_id);
    }

    async fn on_remote_media(&self, peer_id: PeerId, media: RemoteMedia) {
        info!("Remote track {} from {}", media.track_id, peer_id);
    }
}
