use crate::coordinator::{NegotiationState, Role};
use crate::transport::ConnectionState;
use huddle_core::{PeerId, RoomId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub role: Role,
    pub state: NegotiationState,
    pub connection: ConnectionState,
}

/// Point-in-time view of a coordinator, for status lines and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorSnapshot {
    pub room: Option<RoomId>,
    pub local_id: Option<PeerId>,
    pub sessions: BTreeMap<PeerId, SessionSnapshot>,
    /// Peers reported to the observer and not yet reported as left.
    pub known_peers: BTreeSet<PeerId>,
    /// Per-sender candidate subscriptions currently held.
    pub candidate_listeners: usize,
    pub pending_candidates: usize,
    pub media_live: bool,
}

impl CoordinatorSnapshot {
    pub fn is_joined(&self) -> bool {
        self.room.is_some()
    }

    pub fn session(&self, peer: &PeerId) -> Option<&SessionSnapshot> {
        self.sessions.get(peer)
    }
}
