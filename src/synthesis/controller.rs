use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::capability::{SynthesisBackend, SynthesisEvent, Utterance};
use crate::config::SynthesisConfig;
use crate::error::VoiceError;

/// State of the current (or most recent) utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisStatus {
    Idle,
    Speaking,
    Done,
    Error(String),
}

impl Default for SynthesisStatus {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Default)]
struct SynthesisInner {
    status: SynthesisStatus,
    // Bumped on every speak/stop so a cancelled utterance's trailing events
    // cannot clobber the state of its replacement
    generation: u64,
}

/// Speech synthesis controller.
///
/// At most one utterance is audible at a time: `speak` cancels whatever is
/// in progress before starting the new utterance, and a cancelled utterance
/// never resumes.
pub struct SynthesisController {
    backend: Arc<Mutex<Box<dyn SynthesisBackend>>>,
    config: SynthesisConfig,
    inner: Arc<Mutex<SynthesisInner>>,
    event_task: Option<JoinHandle<()>>,
}

impl SynthesisController {
    pub fn new(backend: Box<dyn SynthesisBackend>, config: SynthesisConfig) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            config,
            inner: Arc::new(Mutex::new(SynthesisInner::default())),
            event_task: None,
        }
    }

    pub async fn is_supported(&self) -> bool {
        self.backend.lock().await.is_supported()
    }

    pub async fn status(&self) -> SynthesisStatus {
        self.inner.lock().await.status.clone()
    }

    /// Speak `text`, cancelling any utterance already in progress.
    pub async fn speak(&mut self, text: &str) -> Result<(), VoiceError> {
        if !self.backend.lock().await.is_supported() {
            let err = VoiceError::CapabilityUnsupported("speech synthesis");
            self.inner.lock().await.status = SynthesisStatus::Error(err.reason());
            return Err(err);
        }

        // Invalidate the previous utterance before silencing it
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.generation
        };

        let utterance = Utterance {
            text: text.to_string(),
            rate: self.config.rate,
            pitch: self.config.pitch,
            volume: self.config.volume,
        };

        let rx = {
            let mut backend = self.backend.lock().await;
            if let Err(e) = backend.cancel().await {
                warn!("Failed to cancel previous utterance: {}", e);
            }
            match backend.speak(&utterance).await {
                Ok(rx) => rx,
                Err(e) => {
                    error!("Failed to start utterance: {}", e);
                    self.inner.lock().await.status = SynthesisStatus::Error(e.reason());
                    return Err(e);
                }
            }
        };

        self.inner.lock().await.status = SynthesisStatus::Speaking;
        info!("Speaking ({} chars)", text.len());

        if let Some(task) = self.event_task.take() {
            task.abort();
        }

        let inner = Arc::clone(&self.inner);
        self.event_task = Some(tokio::spawn(async move {
            let mut rx = rx;
            while let Some(event) = rx.recv().await {
                match event {
                    SynthesisEvent::Started => {}
                    SynthesisEvent::Ended => {
                        let mut inner = inner.lock().await;
                        if inner.generation == generation {
                            inner.status = SynthesisStatus::Done;
                        }
                        break;
                    }
                    SynthesisEvent::Error(reason) => {
                        error!("Synthesis engine error: {}", reason);
                        let mut inner = inner.lock().await;
                        if inner.generation == generation {
                            inner.status = SynthesisStatus::Error(
                                format!("speech synthesis error: {reason}"),
                            );
                        }
                        break;
                    }
                }
            }
            // Channel closed without a terminal event: the utterance was
            // cancelled; its replacement owns the status now.
        }));

        Ok(())
    }

    /// Cancel the active utterance and return to Idle. Idempotent.
    pub async fn stop_speaking(&mut self) -> Result<(), VoiceError> {
        {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.status = SynthesisStatus::Idle;
        }
        self.backend.lock().await.cancel().await?;
        Ok(())
    }
}

impl Drop for SynthesisController {
    fn drop(&mut self) {
        if let Some(task) = &self.event_task {
            task.abort();
        }
    }
}
