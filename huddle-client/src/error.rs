use crate::media::MediaError;
use huddle_core::{RoomId, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Local audio could not be acquired; nothing was written to the store.
    #[error("local audio device unavailable: {0}")]
    DeviceUnavailable(#[source] MediaError),

    #[error("already joined room '{0}'")]
    AlreadyJoined(RoomId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("signaling coordinator has stopped")]
    Stopped,
}
