use crate::model::{PeerId, RoomId};
use crate::utils::ROOMS_ROOT;
use std::fmt;

/// Slash separated location in the realtime store. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StorePath(String);

impl StorePath {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalizes leading, trailing and repeated slashes.
    pub fn parse(raw: &str) -> Self {
        let joined = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    pub fn child(&self, key: impl AsRef<str>) -> Self {
        let key = key.as_ref().trim_matches('/');
        if self.0.is_empty() {
            Self::parse(key)
        } else {
            Self::parse(&format!("{}/{}", self.0, key))
        }
    }

    pub fn segments(&self) -> Vec<&str> {
        if self.0.is_empty() {
            Vec::new()
        } else {
            self.0.split('/').collect()
        }
    }

    /// True when `self` equals `other` or lies above it.
    pub fn contains(&self, other: &StorePath) -> bool {
        if self.0.is_empty() || self.0 == other.0 {
            return true;
        }
        other
            .0
            .strip_prefix(&self.0)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

/// The namespace contract every compatible peer writes to:
///
/// ```text
/// rooms/{room}/peers/{peer}                          presence
/// rooms/{room}/signals/{recipient}/{sender}          offer | answer
/// rooms/{room}/candidates/{recipient}/{sender}/{key} candidate
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPaths {
    room: StorePath,
}

impl RoomPaths {
    pub fn new(room: &RoomId) -> Self {
        Self {
            room: StorePath::root().child(ROOMS_ROOT).child(room.as_str()),
        }
    }

    pub fn room(&self) -> &StorePath {
        &self.room
    }

    pub fn peers(&self) -> StorePath {
        self.room.child("peers")
    }

    pub fn presence(&self, peer: &PeerId) -> StorePath {
        self.peers().child(peer.as_str())
    }

    /// Mailbox holding every envelope addressed to `recipient`, keyed by sender.
    pub fn signal_inbox(&self, recipient: &PeerId) -> StorePath {
        self.room.child("signals").child(recipient.as_str())
    }

    pub fn signal(&self, recipient: &PeerId, sender: &PeerId) -> StorePath {
        self.signal_inbox(recipient).child(sender.as_str())
    }

    /// Mailbox holding one subdirectory per sender.
    pub fn candidate_inbox(&self, recipient: &PeerId) -> StorePath {
        self.room.child("candidates").child(recipient.as_str())
    }

    pub fn candidates(&self, recipient: &PeerId, sender: &PeerId) -> StorePath {
        self.candidate_inbox(recipient).child(sender.as_str())
    }
}
