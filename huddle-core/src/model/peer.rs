use crate::utils::to_base36;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// 36^6, the range of the random suffix.
const SUFFIX_SPACE: u128 = 2_176_782_336;
const SUFFIX_LEN: usize = 6;

/// Opaque participant identifier, used verbatim as a store key.
///
/// Locally generated ids look like `p_<millis base36>_<6 random base36>` so
/// they interoperate with browser peers writing to the same store.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let random = Uuid::new_v4().as_u128() % SUFFIX_SPACE;

        Self(format!(
            "p_{}_{:0>width$}",
            to_base36(millis),
            to_base36(random),
            width = SUFFIX_LEN
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
