//! Speech synthesis: text-to-speech playback of agent responses.

mod controller;

pub use controller::{SynthesisController, SynthesisStatus};
