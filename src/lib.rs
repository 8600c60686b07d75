pub mod capability;
pub mod capture;
pub mod chat;
pub mod config;
pub mod error;
pub mod panel;
pub mod playback;
pub mod synthesis;
pub mod transcription;

pub use capability::{
    AudioFrame, AudioPlayer, AudioPlayerBackend, CaptureEvent, MicrophoneBackend, PlayerEvent,
    RecognitionBackend, RecognitionEvent, RecognitionSettings, SynthesisBackend, SynthesisEvent,
    Utterance,
};
pub use capture::{AudioClip, CaptureController, CaptureStatus};
pub use chat::{
    generate_user_id, Agent, ChatBackend, ChatHistory, ChatMessage, ChatReply, ChatRole,
    EmergencyType, HttpChatClient,
};
pub use config::Config;
pub use error::VoiceError;
pub use panel::{AssistantReply, VoiceChatPanel};
pub use playback::{resolve_audio_url, PlaybackRegistry, PlaybackStatus};
pub use synthesis::{SynthesisController, SynthesisStatus};
pub use transcription::{TranscriptionController, TranscriptionStatus};
