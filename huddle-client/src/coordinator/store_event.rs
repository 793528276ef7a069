use huddle_core::{ChildSnapshot, PeerId};

/// Store notification queued for the coordinator task. `epoch` identifies the
/// join that registered the listener.
#[derive(Debug)]
pub(crate) enum StoreEvent {
    /// New envelope in the local signal inbox, keyed by sender.
    Signal { epoch: u64, snapshot: ChildSnapshot },

    /// A sender created its subdirectory in the local candidate inbox.
    CandidateSender { epoch: u64, from: PeerId },

    Candidate {
        epoch: u64,
        from: PeerId,
        snapshot: ChildSnapshot,
    },

    PeerRemoved { epoch: u64, peer: PeerId },
}

impl StoreEvent {
    pub(crate) fn epoch(&self) -> u64 {
        match self {
            StoreEvent::Signal { epoch, .. }
            | StoreEvent::CandidateSender { epoch, .. }
            | StoreEvent::Candidate { epoch, .. }
            | StoreEvent::PeerRemoved { epoch, .. } => *epoch,
        }
    }
}
