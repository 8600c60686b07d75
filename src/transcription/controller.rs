use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::capability::{RecognitionBackend, RecognitionEvent, RecognitionSettings};
use crate::config::TranscriptionConfig;
use crate::error::VoiceError;

/// State of the one transcription session a controller may hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionStatus {
    Idle,
    Listening,
    /// The session ended; final text (possibly empty) is available
    Done,
    Error(String),
}

impl Default for TranscriptionStatus {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Default)]
struct TranscriptionInner {
    status: TranscriptionStatus,
    text: String,
}

/// Speech transcription controller.
///
/// Runs single-utterance recognition sessions against the injected engine
/// backend. Text updates are last-write-wins: each result event replaces the
/// text with the engine's current final-or-interim view, never appending
/// historical partials. A guard timeout bounds how long a session may sit in
/// Listening if the engine never signals end.
pub struct TranscriptionController {
    backend: Arc<Mutex<Box<dyn RecognitionBackend>>>,
    config: TranscriptionConfig,
    inner: Arc<Mutex<TranscriptionInner>>,
    listen_task: Option<JoinHandle<()>>,
}

impl TranscriptionController {
    pub fn new(backend: Box<dyn RecognitionBackend>, config: TranscriptionConfig) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            config,
            inner: Arc::new(Mutex::new(TranscriptionInner::default())),
            listen_task: None,
        }
    }

    pub async fn is_supported(&self) -> bool {
        self.backend.lock().await.is_supported()
    }

    pub async fn status(&self) -> TranscriptionStatus {
        self.inner.lock().await.status.clone()
    }

    /// Current transcript text (interim while Listening, final after Done)
    pub async fn text(&self) -> String {
        self.inner.lock().await.text.clone()
    }

    /// Consume the final text, returning the controller to Idle
    pub async fn take_text(&mut self) -> String {
        let mut inner = self.inner.lock().await;
        if inner.status == TranscriptionStatus::Listening {
            warn!("take_text called while still listening");
            return String::new();
        }
        inner.status = TranscriptionStatus::Idle;
        std::mem::take(&mut inner.text)
    }

    /// Start a single-utterance recognition session.
    ///
    /// No-op while already Listening (restarting would dangle the engine
    /// handle). Prior text is cleared. The session ends when the engine
    /// signals end or error, when `stop_listening` is called, or when the
    /// configured guard timeout expires.
    pub async fn start_listening(&mut self) -> Result<(), VoiceError> {
        {
            let inner = self.inner.lock().await;
            if inner.status == TranscriptionStatus::Listening {
                warn!("Recognition session already active; ignoring start");
                return Ok(());
            }
        }

        if !self.backend.lock().await.is_supported() {
            let err = VoiceError::CapabilityUnsupported("speech recognition");
            self.inner.lock().await.status = TranscriptionStatus::Error(err.reason());
            return Err(err);
        }

        let settings = RecognitionSettings {
            language: self.config.language.clone(),
            interim_results: self.config.interim_results,
        };

        let rx = {
            let mut backend = self.backend.lock().await;
            match backend.start(&settings).await {
                Ok(rx) => rx,
                Err(e) => {
                    error!("Failed to start recognition engine: {}", e);
                    self.inner.lock().await.status = TranscriptionStatus::Error(e.reason());
                    return Err(e);
                }
            }
        };

        {
            let mut inner = self.inner.lock().await;
            inner.text.clear();
            inner.status = TranscriptionStatus::Listening;
        }
        info!("Recognition session started ({})", settings.language);

        if let Some(task) = self.listen_task.take() {
            task.abort();
        }

        let inner = Arc::clone(&self.inner);
        let backend = Arc::clone(&self.backend);
        let guard = Duration::from_secs(self.config.listen_timeout_secs);
        self.listen_task = Some(tokio::spawn(async move {
            let mut rx = rx;
            let timeout = tokio::time::sleep(guard);
            tokio::pin!(timeout);

            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Some(RecognitionEvent::Result { final_text, interim_text }) => {
                            let mut inner = inner.lock().await;
                            if inner.status == TranscriptionStatus::Listening {
                                // Final segments win over interim ones
                                inner.text = if final_text.is_empty() {
                                    interim_text
                                } else {
                                    final_text
                                };
                            }
                        }
                        Some(RecognitionEvent::Error(code)) => {
                            error!("Recognition engine error: {}", code);
                            inner.lock().await.status = TranscriptionStatus::Error(
                                format!("speech recognition error: {code}"),
                            );
                            if let Err(e) = backend.lock().await.stop().await {
                                warn!("Failed to release engine after error: {}", e);
                            }
                            break;
                        }
                        Some(RecognitionEvent::End) | None => {
                            let mut inner = inner.lock().await;
                            if inner.status == TranscriptionStatus::Listening {
                                inner.status = TranscriptionStatus::Done;
                            }
                            break;
                        }
                    },
                    _ = &mut timeout => {
                        warn!(
                            "Listening session exceeded {}s guard; stopping engine",
                            guard.as_secs()
                        );
                        if let Err(e) = backend.lock().await.stop().await {
                            warn!("Failed to stop engine at guard timeout: {}", e);
                        }
                        let mut inner = inner.lock().await;
                        if inner.status == TranscriptionStatus::Listening {
                            inner.status = TranscriptionStatus::Done;
                        }
                        break;
                    }
                }
            }
        }));

        Ok(())
    }

    /// Request graceful termination; final text survives into Done.
    pub async fn stop_listening(&mut self) -> Result<(), VoiceError> {
        {
            let inner = self.inner.lock().await;
            if inner.status != TranscriptionStatus::Listening {
                warn!("stop_listening called outside Listening; ignoring");
                return Ok(());
            }
        }

        if let Err(e) = self.backend.lock().await.stop().await {
            warn!("Failed to stop recognition engine cleanly: {}", e);
        }

        // The engine's terminal event (or channel close) moves us to Done
        if let Some(task) = self.listen_task.take() {
            if let Err(e) = task.await {
                error!("Recognition listen task panicked: {}", e);
            }
        }

        Ok(())
    }

    /// Reset text (and, outside a session, status) to empty/Idle
    pub async fn clear_speech_text(&mut self) {
        let mut inner = self.inner.lock().await;
        inner.text.clear();
        if inner.status != TranscriptionStatus::Listening {
            inner.status = TranscriptionStatus::Idle;
        }
    }
}

impl Drop for TranscriptionController {
    fn drop(&mut self) {
        if let Some(task) = &self.listen_task {
            task.abort();
        }
    }
}
