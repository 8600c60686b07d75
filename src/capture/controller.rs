use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::clip::AudioClip;
use crate::capability::{AudioFrame, CaptureEvent, MicrophoneBackend};
use crate::config::CaptureConfig;
use crate::error::VoiceError;

/// State of the one capture session a controller may hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    /// Awaiting the device stream grant (permission prompt)
    Requesting,
    Recording,
    /// A finished clip is available
    Stopped,
    Error(String),
}

impl Default for CaptureStatus {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Default)]
struct CaptureInner {
    status: CaptureStatus,
    frames: Vec<AudioFrame>,
    clip: Option<AudioClip>,
}

/// Microphone capture controller.
///
/// Owns the device stream for the duration of a session: exactly one stream
/// is open at a time, and it is released on stop, on clear, on mid-recording
/// failure, and on drop. Frames arriving on the backend channel are buffered
/// by a drain task and assembled into an [`AudioClip`] when recording stops.
pub struct CaptureController {
    backend: Arc<Mutex<Box<dyn MicrophoneBackend>>>,
    config: CaptureConfig,
    inner: Arc<Mutex<CaptureInner>>,
    drain_task: Option<JoinHandle<()>>,
}

impl CaptureController {
    pub fn new(backend: Box<dyn MicrophoneBackend>, config: CaptureConfig) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            config,
            inner: Arc::new(Mutex::new(CaptureInner::default())),
            drain_task: None,
        }
    }

    pub async fn is_supported(&self) -> bool {
        self.backend.lock().await.is_supported()
    }

    /// Whether the backend holds an open device stream right now
    pub async fn is_capturing(&self) -> bool {
        self.backend.lock().await.is_capturing()
    }

    pub async fn status(&self) -> CaptureStatus {
        self.inner.lock().await.status.clone()
    }

    /// The finished clip, if the controller is in Stopped
    pub async fn clip(&self) -> Option<AudioClip> {
        self.inner.lock().await.clip.clone()
    }

    /// Consume the finished clip, returning the controller to Idle
    pub async fn take_clip(&mut self) -> Option<AudioClip> {
        let mut inner = self.inner.lock().await;
        let clip = inner.clip.take();
        if clip.is_some() {
            inner.frames.clear();
            inner.status = CaptureStatus::Idle;
        }
        clip
    }

    /// Request the device stream and begin buffering frames.
    ///
    /// No-op while a session is already Requesting or Recording. Permitted
    /// from Idle, Stopped, and Error (a failed attempt never locks the
    /// controller out). Denial or missing capability lands in Error with a
    /// readable reason.
    pub async fn start_recording(&mut self) -> Result<(), VoiceError> {
        {
            let inner = self.inner.lock().await;
            if matches!(
                inner.status,
                CaptureStatus::Requesting | CaptureStatus::Recording
            ) {
                warn!("Capture session already active; ignoring start");
                return Ok(());
            }
        }

        if !self.backend.lock().await.is_supported() {
            let err = VoiceError::CapabilityUnsupported("microphone capture");
            self.inner.lock().await.status = CaptureStatus::Error(err.reason());
            return Err(err);
        }

        {
            let mut inner = self.inner.lock().await;
            inner.status = CaptureStatus::Requesting;
            inner.frames.clear();
            inner.clip = None;
        }

        let rx = {
            let mut backend = self.backend.lock().await;
            match backend.start().await {
                Ok(rx) => rx,
                Err(e) => {
                    error!("Failed to open capture stream: {}", e);
                    self.inner.lock().await.status = CaptureStatus::Error(e.reason());
                    return Err(e);
                }
            }
        };

        self.inner.lock().await.status = CaptureStatus::Recording;
        info!("Capture stream open, recording");

        // Should already be gone, but never leave two drain tasks alive
        if let Some(task) = self.drain_task.take() {
            task.abort();
        }

        let inner = Arc::clone(&self.inner);
        let backend = Arc::clone(&self.backend);
        self.drain_task = Some(tokio::spawn(async move {
            let mut rx = rx;
            while let Some(event) = rx.recv().await {
                match event {
                    CaptureEvent::Frame(frame) => {
                        let mut inner = inner.lock().await;
                        if inner.status == CaptureStatus::Recording {
                            inner.frames.push(frame);
                        }
                    }
                    CaptureEvent::Failed(reason) => {
                        error!("Capture stream failed mid-recording: {}", reason);
                        {
                            let mut inner = inner.lock().await;
                            inner.status =
                                CaptureStatus::Error(VoiceError::DeviceFailure(reason).reason());
                            inner.frames.clear();
                        }
                        // Release whatever is left of the stream
                        if let Err(e) = backend.lock().await.stop().await {
                            warn!("Failed to release stream after device failure: {}", e);
                        }
                        break;
                    }
                }
            }
        }));

        Ok(())
    }

    /// Finalize the recording: release the device stream, wait for the last
    /// buffered frames, and assemble the finished clip.
    pub async fn stop_recording(&mut self) -> Result<(), VoiceError> {
        {
            let inner = self.inner.lock().await;
            if inner.status != CaptureStatus::Recording {
                warn!("stop_recording called outside Recording; ignoring");
                return Ok(());
            }
        }

        // Stops all tracks; the event channel closes after the tail frames
        if let Err(e) = self.backend.lock().await.stop().await {
            warn!("Failed to stop capture stream cleanly: {}", e);
        }

        if let Some(task) = self.drain_task.take() {
            if let Err(e) = task.await {
                error!("Capture drain task panicked: {}", e);
            }
        }

        let mut inner = self.inner.lock().await;
        if inner.status != CaptureStatus::Recording {
            // The stream died while we were stopping; the Error state stands
            return Ok(());
        }

        let frames = std::mem::take(&mut inner.frames);
        match AudioClip::from_frames(&frames, &self.config) {
            Ok(clip) => {
                info!(
                    "Recording stopped: {:.1}s clip ({} bytes)",
                    clip.duration_seconds,
                    clip.data.len()
                );
                inner.clip = Some(clip);
                inner.status = CaptureStatus::Stopped;
                Ok(())
            }
            Err(e) => {
                error!("Failed to assemble clip: {}", e);
                inner.status = CaptureStatus::Error(e.reason());
                Err(e)
            }
        }
    }

    /// Discard the finished clip (or the error) and return to Idle.
    /// Valid from Stopped, Error, and Idle; ignored during an active session.
    pub async fn clear_recording(&mut self) {
        let mut inner = self.inner.lock().await;
        if matches!(
            inner.status,
            CaptureStatus::Requesting | CaptureStatus::Recording
        ) {
            warn!("clear_recording called during an active session; ignoring");
            return;
        }
        inner.clip = None;
        inner.frames.clear();
        inner.status = CaptureStatus::Idle;
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        // Backend (and with it the stream) is dropped with the controller;
        // the drain task must not outlive either.
        if let Some(task) = &self.drain_task {
            task.abort();
        }
    }
}
