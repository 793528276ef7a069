use serde::{Deserialize, Serialize};

/// Placeholder the store replaces with its own clock when the write lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerValue {
    #[serde(rename = ".sv")]
    pub sv: String,
}

impl ServerValue {
    pub const TIMESTAMP: &'static str = "timestamp";

    pub fn timestamp() -> Self {
        Self {
            sv: Self::TIMESTAMP.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Epoch milliseconds assigned by the store.
    Resolved(u64),
    Pending(ServerValue),
}

/// Stored at `rooms/{room}/peers/{peer}` while the peer is a live member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub t: Timestamp,
}

impl PresenceRecord {
    pub fn pending() -> Self {
        Self {
            t: Timestamp::Pending(ServerValue::timestamp()),
        }
    }

    pub fn joined_at(&self) -> Option<u64> {
        match self.t {
            Timestamp::Resolved(ms) => Some(ms),
            Timestamp::Pending(_) => None,
        }
    }
}
