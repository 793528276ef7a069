mod transport_config;
mod transport_event;
mod webrtc_transport;

pub use transport_config::TransportConfig;
pub use transport_event::{
    ConnectionState, RemoteMedia, TransportEvent, TransportEventKind, TransportEvents,
};
pub use webrtc_transport::{WebRtcTransport, WebRtcTransportFactory};

use crate::media::LocalStream;
use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{IceCandidate, SessionDescription};
use std::sync::Arc;

/// One peer-to-peer connection. Locally discovered candidates, remote media
/// and connectivity changes are reported through the [`TransportEvents`]
/// handed to [`TransportFactory::create`].
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Builds a transport carrying every track of `stream`.
    async fn create(
        &self,
        config: &TransportConfig,
        stream: &LocalStream,
        events: TransportEvents,
    ) -> Result<Arc<dyn PeerTransport>>;
}
