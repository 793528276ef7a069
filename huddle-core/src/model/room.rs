use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Characters the realtime store refuses inside a key.
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '$', '#', '[', ']', '/'];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRoomId {
    #[error("room name is empty")]
    Empty,
    #[error("room name '{0}' contains a character not allowed in store keys")]
    ForbiddenCharacter(String),
}

/// User-supplied rendezvous namespace.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Trims surrounding whitespace and rejects names that cannot be a store key.
    pub fn parse(raw: &str) -> Result<Self, InvalidRoomId> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(InvalidRoomId::Empty);
        }
        if name.contains(FORBIDDEN_KEY_CHARS) || name.chars().any(char::is_control) {
            return Err(InvalidRoomId::ForbiddenCharacter(name.to_owned()));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
