use huddle_core::{IceCandidate, PeerId};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Incoming media from a remote peer.
#[derive(Clone)]
pub struct RemoteMedia {
    pub track_id: String,
    pub stream_id: String,
    /// RTP reader, when the transport exposes one.
    pub track: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMedia")
            .field("track_id", &self.track_id)
            .field("stream_id", &self.stream_id)
            .field("readable", &self.track.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum TransportEventKind {
    LocalCandidate(IceCandidate),
    RemoteMedia(RemoteMedia),
    ConnectionState(ConnectionState),
}

/// Event produced by a transport, tagged with the session that owns it.
#[derive(Debug)]
pub struct TransportEvent {
    pub peer_id: PeerId,
    pub(crate) epoch: u64,
    pub(crate) session: u64,
    pub kind: TransportEventKind,
}

/// Sender handed to a transport at creation. Stamps every event with the
/// owning session so late events from a replaced transport can be told apart.
#[derive(Clone)]
pub struct TransportEvents {
    peer_id: PeerId,
    epoch: u64,
    session: u64,
    tx: mpsc::Sender<TransportEvent>,
}

impl TransportEvents {
    pub(crate) fn new(
        peer_id: PeerId,
        epoch: u64,
        session: u64,
        tx: mpsc::Sender<TransportEvent>,
    ) -> Self {
        Self {
            peer_id,
            epoch,
            session,
            tx,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub async fn emit(&self, kind: TransportEventKind) {
        let event = TransportEvent {
            peer_id: self.peer_id.clone(),
            epoch: self.epoch,
            session: self.session,
            kind,
        };
        if self.tx.send(event).await.is_err() {
            debug!("Transport event for {} dropped: coordinator gone", self.peer_id);
        }
    }
}
