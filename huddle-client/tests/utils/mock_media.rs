use async_trait::async_trait;
use huddle_client::{LocalAudioTrack, LocalMediaSource, LocalStream, MediaError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// LocalMediaSource that either hands out a one-track stream or fails.
#[derive(Clone, Default)]
pub struct MockMediaSource {
    deny: bool,
    acquired: Arc<Mutex<Vec<LocalStream>>>,
}

impl MockMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    pub async fn acquired(&self) -> usize {
        self.acquired.lock().await.len()
    }

    /// True when every stream handed out so far has been stopped.
    pub async fn all_stopped(&self) -> bool {
        self.acquired.lock().await.iter().all(|s| !s.is_live())
    }
}

#[async_trait]
impl LocalMediaSource for MockMediaSource {
    async fn acquire(&self) -> Result<LocalStream, MediaError> {
        if self.deny {
            return Err(MediaError::PermissionDenied);
        }

        let stream = LocalStream::new(
            "mock-stream",
            vec![LocalAudioTrack::opus("mock-audio", "mock-stream")],
        );
        self.acquired.lock().await.push(stream.clone());
        Ok(stream)
    }
}
