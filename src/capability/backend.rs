use tokio::sync::mpsc;

use crate::error::VoiceError;

/// Audio sample data delivered by a microphone backend (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Event delivered on a capture stream channel
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A chunk of recorded audio
    Frame(AudioFrame),
    /// The device failed mid-recording; the stream is dead
    Failed(String),
}

/// Microphone capture backend
///
/// Implementations wrap whatever device API the host platform provides.
/// The scripted implementation in [`super::simulated`] is used by tests
/// and the demo binary.
#[async_trait::async_trait]
pub trait MicrophoneBackend: Send + Sync {
    /// Whether microphone capture is available at all on this platform
    fn is_supported(&self) -> bool;

    /// Request the device stream and start capturing.
    ///
    /// Resolves once the stream is granted (the permission prompt happens
    /// here) and returns a channel receiver of capture events. Denial or
    /// hardware absence is reported as an error; nothing is left open.
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, VoiceError>;

    /// Stop capturing and release the device stream (all tracks stopped).
    /// The event channel closes after the last buffered frame.
    async fn stop(&mut self) -> Result<(), VoiceError>;

    /// Check if the backend currently holds an open stream
    fn is_capturing(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Settings for one recognition session
#[derive(Debug, Clone)]
pub struct RecognitionSettings {
    /// Language tag (e.g. "en-US")
    pub language: String,
    /// Deliver interim results while the utterance is in progress
    pub interim_results: bool,
}

/// Event delivered on a recognition session channel
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// A transcript update. Both parts reflect the engine's current view of
    /// the whole utterance, not a delta.
    Result {
        final_text: String,
        interim_text: String,
    },
    /// Engine-reported failure; the session is over
    Error(String),
    /// The engine finished the utterance on its own
    End,
}

/// Speech recognition backend (speech-to-text engine)
#[async_trait::async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Whether a recognition engine is available on this platform
    fn is_supported(&self) -> bool;

    /// Start a single-utterance recognition session.
    ///
    /// Resolves once the engine confirms it is listening and returns the
    /// session's event channel.
    async fn start(
        &mut self,
        settings: &RecognitionSettings,
    ) -> Result<mpsc::Receiver<RecognitionEvent>, VoiceError>;

    /// Request graceful termination of the active session. The engine emits
    /// its terminal event (or simply closes the channel) afterwards.
    async fn stop(&mut self) -> Result<(), VoiceError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// One text-to-speech request
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Event delivered on a synthesis channel
#[derive(Debug, Clone)]
pub enum SynthesisEvent {
    /// Audio output has begun
    Started,
    /// The utterance finished naturally
    Ended,
    /// The engine failed; nothing more will play
    Error(String),
}

/// Speech synthesis backend (text-to-speech engine)
///
/// `cancel` silences the current utterance immediately and closes its event
/// channel. The backend itself plays at most one utterance at a time; the
/// controller enforces the cancel-before-speak policy.
#[async_trait::async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Whether a synthesis engine is available on this platform
    fn is_supported(&self) -> bool;

    /// Begin speaking and return the utterance's event channel
    async fn speak(
        &mut self,
        utterance: &Utterance,
    ) -> Result<mpsc::Receiver<SynthesisEvent>, VoiceError>;

    /// Cancel whatever is currently speaking. Idempotent.
    async fn cancel(&mut self) -> Result<(), VoiceError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Event delivered on a player's channel
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// The clip reached its natural end
    Ended,
    /// Load or decode failure; the player is unusable
    Error(String),
}

/// A single loaded audio clip (one per response message)
#[async_trait::async_trait]
pub trait AudioPlayer: Send {
    /// Start or resume playback from the current position
    async fn play(&mut self) -> Result<(), VoiceError>;

    /// Pause playback, keeping the current position
    async fn pause(&mut self) -> Result<(), VoiceError>;

    /// Seek back to position zero
    async fn rewind(&mut self) -> Result<(), VoiceError>;
}

/// Factory for response-audio players
#[async_trait::async_trait]
pub trait AudioPlayerBackend: Send + Sync {
    /// Create a player for the given URL.
    ///
    /// Returns the player handle plus its event channel. Creation is lazy
    /// per message; the registry reuses the handle across toggles.
    async fn create(
        &self,
        url: &str,
    ) -> Result<(Box<dyn AudioPlayer>, mpsc::Receiver<PlayerEvent>), VoiceError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
