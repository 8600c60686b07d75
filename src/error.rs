use thiserror::Error;

/// Failure classes for the voice subsystem.
///
/// Capability and permission failures are terminal for the current attempt.
/// Device, engine, and playback failures abort the active session; the caller
/// may start a new one. None of these are fatal to the application: every
/// controller lands back in a stable Idle or Error state.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("not supported on this platform: {0}")]
    CapabilityUnsupported(&'static str),

    #[error("microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("device failure: {0}")]
    DeviceFailure(String),

    #[error("speech engine error: {0}")]
    EngineError(String),

    #[error("audio playback failed: {0}")]
    Playback(String),

    #[error("failed to encode audio clip: {0}")]
    Encode(#[from] hound::Error),
}

impl VoiceError {
    /// Human-readable reason string stored in controller Error states.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}
