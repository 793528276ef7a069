use super::{LocalAudioTrack, LocalMediaSource, LocalStream, MediaError};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, info};
use webrtc::media::Sample;

/// A single 20 ms Opus frame of digital silence.
static OPUS_SILENCE_FRAME: [u8; 3] = [0xf8, 0xff, 0xfe];
const FRAME_DURATION: Duration = Duration::from_millis(20);

/// Stands in for a capture device: one Opus track fed with silence frames
/// until the track is stopped.
#[derive(Debug, Clone)]
pub struct SilenceSource {
    stream_id: String,
}

impl SilenceSource {
    pub fn new() -> Self {
        Self {
            stream_id: "huddle-local".to_owned(),
        }
    }
}

impl Default for SilenceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalMediaSource for SilenceSource {
    async fn acquire(&self) -> Result<LocalStream, MediaError> {
        let track = LocalAudioTrack::opus("audio", self.stream_id.clone());
        info!("Silence source started for stream {}", self.stream_id);

        let feeder = track.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FRAME_DURATION);
            let rtc_track = feeder.rtc_track();

            while feeder.is_live() {
                ticker.tick().await;
                let sample = Sample {
                    data: Bytes::from_static(&OPUS_SILENCE_FRAME),
                    duration: FRAME_DURATION,
                    ..Default::default()
                };
                if let Err(e) = rtc_track.write_sample(&sample).await {
                    debug!("Silence frame not written: {}", e);
                }
            }

            debug!("Silence feeder for track {} stopped", feeder.id());
        });

        Ok(LocalStream::new(self.stream_id.clone(), vec![track]))
    }
}
