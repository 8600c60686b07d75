use std::io::Cursor;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::capability::AudioFrame;
use crate::config::CaptureConfig;
use crate::error::VoiceError;

/// A finished capture, encoded and ready to hand to the send-voice-message
/// boundary.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Encoded audio bytes (WAV container)
    pub data: Vec<u8>,

    /// Media type the clip is tagged with
    pub media_type: &'static str,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u16,

    /// Duration in seconds
    pub duration_seconds: f64,

    /// When the capture finished
    pub captured_at: DateTime<Utc>,
}

impl AudioClip {
    /// Encode buffered PCM frames into a single WAV clip.
    ///
    /// Format metadata comes from the first frame; `fallback` covers the
    /// empty-buffer case so even a zero-frame clip carries a valid header.
    pub fn from_frames(frames: &[AudioFrame], fallback: &CaptureConfig) -> Result<Self, VoiceError> {
        let (sample_rate, channels) = frames
            .first()
            .map(|f| (f.sample_rate, f.channels))
            .unwrap_or((fallback.sample_rate, fallback.channels));

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut data = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut data), spec)?;
            for frame in frames {
                for &sample in &frame.samples {
                    writer.write_sample(sample)?;
                }
            }
            writer.finalize()?;
        }

        let sample_count: usize = frames.iter().map(|f| f.samples.len()).sum();
        let duration_seconds = sample_count as f64 / (sample_rate as f64 * channels as f64);

        info!(
            "Assembled clip: {:.1}s, {} Hz, {} channel(s), {} bytes",
            duration_seconds,
            sample_rate,
            channels,
            data.len()
        );

        Ok(Self {
            data,
            media_type: "audio/wav",
            sample_rate,
            channels,
            duration_seconds,
            captured_at: Utc::now(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.duration_seconds == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(samples: Vec<i16>, timestamp_ms: u64) -> AudioFrame {
        AudioFrame {
            samples,
            sample_rate: 16000,
            channels: 1,
            timestamp_ms,
        }
    }

    #[test]
    fn encodes_frames_into_wav() {
        let frames = vec![frame(vec![0i16; 1600], 0), frame(vec![0i16; 1600], 100)];
        let clip = AudioClip::from_frames(&frames, &CaptureConfig::default()).unwrap();

        assert_eq!(clip.media_type, "audio/wav");
        assert_eq!(clip.sample_rate, 16000);
        assert_eq!(clip.channels, 1);
        // 3200 samples at 16kHz mono = 200ms
        assert!((clip.duration_seconds - 0.2).abs() < 1e-9);
        // RIFF header
        assert_eq!(&clip.data[..4], b"RIFF");
        assert!(!clip.is_empty());
    }

    #[test]
    fn empty_buffer_still_yields_valid_header() {
        let clip = AudioClip::from_frames(&[], &CaptureConfig::default()).unwrap();

        assert_eq!(clip.sample_rate, 16000);
        assert_eq!(&clip.data[..4], b"RIFF");
        assert!(clip.is_empty());
    }
}
