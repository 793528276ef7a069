mod local_stream;
mod silence_source;

pub use local_stream::{LocalAudioTrack, LocalStream};
pub use silence_source::SilenceSource;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("microphone access denied")]
    PermissionDenied,

    #[error("no audio capture device: {0}")]
    NotFound(String),

    #[error("audio capture failed: {0}")]
    Capture(String),
}

/// Acquires the local audio capture device.
#[async_trait]
pub trait LocalMediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalStream, MediaError>;
}
