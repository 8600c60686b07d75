//! Microphone capture: one recording attempt, start to stop.
//!
//! The controller walks Idle → Requesting → Recording → Stopped, buffering
//! PCM frames from the injected microphone backend and assembling them into
//! a WAV clip for the send-voice-message boundary.

mod clip;
mod controller;

pub use clip::AudioClip;
pub use controller::{CaptureController, CaptureStatus};
