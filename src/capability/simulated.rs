//! Scripted capability backends.
//!
//! These run the controllers without any real device or speech engine: a
//! script decides whether the stream is granted, which frames and transcript
//! updates arrive, and how sessions end. Events are pre-buffered on the
//! channel, so test runs are fully deterministic. Used by the integration
//! tests and the demo binary.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::mpsc;

use super::backend::{
    AudioFrame, AudioPlayer, AudioPlayerBackend, CaptureEvent, MicrophoneBackend, PlayerEvent,
    RecognitionBackend, RecognitionEvent, RecognitionSettings, SynthesisBackend, SynthesisEvent,
    Utterance,
};
use crate::error::VoiceError;

fn channel_for<T>(event_count: usize) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    // All scripted events are buffered up front; size the channel so the
    // backend never blocks waiting for a reader.
    mpsc::channel(event_count.max(4) + 1)
}

/// What a [`SimulatedMicrophone`] does when the stream is requested
#[derive(Debug, Clone)]
pub enum MicrophoneScript {
    /// Grant the stream and deliver these frames; the stream then stays open
    /// until `stop` is called
    Grant { frames: Vec<AudioFrame> },
    /// Deny the permission request
    Deny { reason: String },
    /// Grant, deliver these frames, then fail mid-recording
    FailAfter {
        frames: Vec<AudioFrame>,
        reason: String,
    },
}

pub struct SimulatedMicrophone {
    script: MicrophoneScript,
    supported: bool,
    capturing: Arc<AtomicBool>,
    // Held while the stream is open so the event channel outlives start()
    live_tx: Option<mpsc::Sender<CaptureEvent>>,
}

impl SimulatedMicrophone {
    pub fn new(script: MicrophoneScript) -> Self {
        Self {
            script,
            supported: true,
            capturing: Arc::new(AtomicBool::new(false)),
            live_tx: None,
        }
    }

    pub fn unsupported() -> Self {
        let mut mic = Self::new(MicrophoneScript::Grant { frames: Vec::new() });
        mic.supported = false;
        mic
    }

    /// Live view of whether the stream is open, for asserting release
    pub fn capturing_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.capturing)
    }

    /// A short burst of silence frames, convenient for scripts
    pub fn silence_frames(count: usize, sample_rate: u32, channels: u16) -> Vec<AudioFrame> {
        let samples_per_frame = (sample_rate / 10) as usize * channels as usize; // 100ms
        (0..count)
            .map(|i| AudioFrame {
                samples: vec![0i16; samples_per_frame],
                sample_rate,
                channels,
                timestamp_ms: i as u64 * 100,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl MicrophoneBackend for SimulatedMicrophone {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, VoiceError> {
        if !self.supported {
            return Err(VoiceError::CapabilityUnsupported("microphone capture"));
        }

        match self.script.clone() {
            MicrophoneScript::Deny { reason } => Err(VoiceError::PermissionDenied(reason)),
            MicrophoneScript::Grant { frames } => {
                let (tx, rx) = channel_for(frames.len());
                for frame in frames {
                    let _ = tx.send(CaptureEvent::Frame(frame)).await;
                }
                self.live_tx = Some(tx);
                self.capturing.store(true, Ordering::SeqCst);
                Ok(rx)
            }
            MicrophoneScript::FailAfter { frames, reason } => {
                let (tx, rx) = channel_for(frames.len() + 1);
                for frame in frames {
                    let _ = tx.send(CaptureEvent::Frame(frame)).await;
                }
                let _ = tx.send(CaptureEvent::Failed(reason)).await;
                // Device is gone: drop the sender so the channel closes
                self.capturing.store(false, Ordering::SeqCst);
                Ok(rx)
            }
        }
    }

    async fn stop(&mut self) -> Result<(), VoiceError> {
        self.live_tx = None;
        self.capturing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "simulated-microphone"
    }
}

/// What a [`SimulatedRecognizer`] session delivers
#[derive(Debug, Clone)]
pub enum RecognizerScript {
    /// Deliver these events. If the last one is `End` or `Error` the channel
    /// closes on its own; otherwise it stays open until `stop` is called.
    Session { events: Vec<RecognitionEvent> },
    /// Fail before the session starts
    FailToStart { reason: String },
}

pub struct SimulatedRecognizer {
    script: RecognizerScript,
    supported: bool,
    live_tx: Option<mpsc::Sender<RecognitionEvent>>,
    last_settings: Arc<StdMutex<Option<RecognitionSettings>>>,
}

impl SimulatedRecognizer {
    pub fn new(script: RecognizerScript) -> Self {
        Self {
            script,
            supported: true,
            live_tx: None,
            last_settings: Arc::new(StdMutex::new(None)),
        }
    }

    pub fn unsupported() -> Self {
        let mut rec = Self::new(RecognizerScript::Session { events: Vec::new() });
        rec.supported = false;
        rec
    }

    /// Shared view of the settings the most recent session was started with
    pub fn settings_log(&self) -> Arc<StdMutex<Option<RecognitionSettings>>> {
        Arc::clone(&self.last_settings)
    }
}

fn is_terminal(event: &RecognitionEvent) -> bool {
    matches!(event, RecognitionEvent::End | RecognitionEvent::Error(_))
}

#[async_trait::async_trait]
impl RecognitionBackend for SimulatedRecognizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn start(
        &mut self,
        settings: &RecognitionSettings,
    ) -> Result<mpsc::Receiver<RecognitionEvent>, VoiceError> {
        if !self.supported {
            return Err(VoiceError::CapabilityUnsupported("speech recognition"));
        }
        *self.last_settings.lock().unwrap() = Some(settings.clone());

        match self.script.clone() {
            RecognizerScript::FailToStart { reason } => Err(VoiceError::EngineError(reason)),
            RecognizerScript::Session { events } => {
                let ends_itself = events.last().is_some_and(is_terminal);
                let (tx, rx) = channel_for(events.len());
                for event in events {
                    let _ = tx.send(event).await;
                }
                self.live_tx = if ends_itself { None } else { Some(tx) };
                Ok(rx)
            }
        }
    }

    async fn stop(&mut self) -> Result<(), VoiceError> {
        // Graceful termination: close the channel so the session sees end
        self.live_tx = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated-recognizer"
    }
}

pub struct SimulatedSynthesizer {
    supported: bool,
    /// Emit `Ended` right after `Started` instead of waiting for cancel
    auto_complete: bool,
    fail_with: Option<String>,
    spoken: Arc<StdMutex<Vec<String>>>,
    cancels: Arc<StdMutex<u32>>,
    live_tx: Option<mpsc::Sender<SynthesisEvent>>,
}

impl SimulatedSynthesizer {
    /// Utterances stay audible until cancelled
    pub fn sustained() -> Self {
        Self {
            supported: true,
            auto_complete: false,
            fail_with: None,
            spoken: Arc::new(StdMutex::new(Vec::new())),
            cancels: Arc::new(StdMutex::new(0)),
            live_tx: None,
        }
    }

    /// Utterances complete immediately
    pub fn completing() -> Self {
        let mut synth = Self::sustained();
        synth.auto_complete = true;
        synth
    }

    pub fn failing(reason: &str) -> Self {
        let mut synth = Self::sustained();
        synth.fail_with = Some(reason.to_string());
        synth
    }

    pub fn unsupported() -> Self {
        let mut synth = Self::sustained();
        synth.supported = false;
        synth
    }

    /// Every text handed to `speak`, in order
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    /// Shared view of the spoken log, for asserting after the backend is
    /// boxed into a controller
    pub fn spoken_log(&self) -> Arc<StdMutex<Vec<String>>> {
        Arc::clone(&self.spoken)
    }

    /// Shared cancel counter
    pub fn cancel_log(&self) -> Arc<StdMutex<u32>> {
        Arc::clone(&self.cancels)
    }
}

#[async_trait::async_trait]
impl SynthesisBackend for SimulatedSynthesizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn speak(
        &mut self,
        utterance: &Utterance,
    ) -> Result<mpsc::Receiver<SynthesisEvent>, VoiceError> {
        if !self.supported {
            return Err(VoiceError::CapabilityUnsupported("speech synthesis"));
        }
        self.spoken.lock().unwrap().push(utterance.text.clone());

        let (tx, rx) = channel_for(3);
        if let Some(reason) = &self.fail_with {
            let _ = tx.send(SynthesisEvent::Error(reason.clone())).await;
            self.live_tx = None;
            return Ok(rx);
        }

        let _ = tx.send(SynthesisEvent::Started).await;
        if self.auto_complete {
            let _ = tx.send(SynthesisEvent::Ended).await;
            self.live_tx = None;
        } else {
            self.live_tx = Some(tx);
        }
        Ok(rx)
    }

    async fn cancel(&mut self) -> Result<(), VoiceError> {
        if self.live_tx.take().is_some() {
            *self.cancels.lock().unwrap() += 1;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated-synthesizer"
    }
}

/// Player method calls observed by a [`SimulatedPlayerBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Play(String),
    Pause(String),
    Rewind(String),
}

#[derive(Default)]
struct PlayerBackendShared {
    actions: StdMutex<Vec<PlayerAction>>,
    // Event senders by URL, so tests can emit Ended/Error after the fact
    senders: StdMutex<HashMap<String, mpsc::Sender<PlayerEvent>>>,
}

/// Creates [`SimulatedPlayer`]s and records everything they are asked to do
pub struct SimulatedPlayerBackend {
    shared: Arc<PlayerBackendShared>,
    fail_urls: HashSet<String>,
}

impl SimulatedPlayerBackend {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(PlayerBackendShared::default()),
            fail_urls: HashSet::new(),
        }
    }

    /// `create` fails for this URL (simulates a broken/stale clip)
    pub fn with_failing_url(mut self, url: &str) -> Self {
        self.fail_urls.insert(url.to_string());
        self
    }

    /// Ordered log of play/pause/rewind calls across all players
    pub fn actions(&self) -> Vec<PlayerAction> {
        self.shared.actions.lock().unwrap().clone()
    }

    /// Emit a natural end-of-clip for the player loaded from `url`
    pub async fn finish_clip(&self, url: &str) {
        let tx = self.shared.senders.lock().unwrap().get(url).cloned();
        if let Some(tx) = tx {
            let _ = tx.send(PlayerEvent::Ended).await;
        }
    }

    /// Emit a playback error for the player loaded from `url`
    pub async fn fail_clip(&self, url: &str, reason: &str) {
        let tx = self.shared.senders.lock().unwrap().get(url).cloned();
        if let Some(tx) = tx {
            let _ = tx.send(PlayerEvent::Error(reason.to_string())).await;
        }
    }
}

impl Default for SimulatedPlayerBackend {
    fn default() -> Self {
        Self::new()
    }
}

struct SimulatedPlayer {
    url: String,
    shared: Arc<PlayerBackendShared>,
}

#[async_trait::async_trait]
impl AudioPlayer for SimulatedPlayer {
    async fn play(&mut self) -> Result<(), VoiceError> {
        self.shared
            .actions
            .lock()
            .unwrap()
            .push(PlayerAction::Play(self.url.clone()));
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), VoiceError> {
        self.shared
            .actions
            .lock()
            .unwrap()
            .push(PlayerAction::Pause(self.url.clone()));
        Ok(())
    }

    async fn rewind(&mut self) -> Result<(), VoiceError> {
        self.shared
            .actions
            .lock()
            .unwrap()
            .push(PlayerAction::Rewind(self.url.clone()));
        Ok(())
    }
}

#[async_trait::async_trait]
impl AudioPlayerBackend for SimulatedPlayerBackend {
    async fn create(
        &self,
        url: &str,
    ) -> Result<(Box<dyn AudioPlayer>, mpsc::Receiver<PlayerEvent>), VoiceError> {
        if self.fail_urls.contains(url) {
            return Err(VoiceError::Playback(format!("failed to load {url}")));
        }

        let (tx, rx) = channel_for(4);
        self.shared
            .senders
            .lock()
            .unwrap()
            .insert(url.to_string(), tx);

        let player = SimulatedPlayer {
            url: url.to_string(),
            shared: Arc::clone(&self.shared),
        };
        Ok((Box::new(player), rx))
    }

    fn name(&self) -> &str {
        "simulated-player"
    }
}
