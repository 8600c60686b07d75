//! Speech transcription: one speech-to-text attempt, start to finalize.

mod controller;

pub use controller::{TranscriptionController, TranscriptionStatus};
