//! Injected capability interfaces for device and speech-engine access.
//!
//! The controllers never touch a device API directly; they own a boxed
//! backend and react to its event channels. That keeps the state machines
//! runnable (and testable) on hosts with no microphone or speech engine.

pub mod backend;
pub mod simulated;

pub use backend::{
    AudioFrame, AudioPlayer, AudioPlayerBackend, CaptureEvent, MicrophoneBackend, PlayerEvent,
    RecognitionBackend, RecognitionEvent, RecognitionSettings, SynthesisBackend, SynthesisEvent,
    Utterance,
};
pub use simulated::{
    MicrophoneScript, PlayerAction, RecognizerScript, SimulatedMicrophone, SimulatedPlayerBackend,
    SimulatedRecognizer, SimulatedSynthesizer,
};
