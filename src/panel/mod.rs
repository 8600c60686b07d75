//! The voice-enabled chat panel: the four controllers wired to one agent's
//! chat endpoint. Capture and transcription results are consumed here and
//! handed across the chat boundary; replies come back playable (response
//! clip) and speakable (reply text).

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::capture::CaptureController;
use crate::chat::{generate_user_id, Agent, ChatBackend, ChatReply};
use crate::error::VoiceError;
use crate::playback::{resolve_audio_url, PlaybackRegistry};
use crate::synthesis::SynthesisController;
use crate::transcription::TranscriptionController;

/// A reply delivered through the panel, keyed for the playback registry
#[derive(Debug, Clone)]
pub struct AssistantReply {
    /// Fresh id assigned to this reply message
    pub message_id: String,
    pub reply: ChatReply,
    /// Response clip URL, already resolved against the backend base URL
    pub audio_url: Option<String>,
    pub received_at: DateTime<Utc>,
}

pub struct VoiceChatPanel {
    pub capture: CaptureController,
    pub transcription: TranscriptionController,
    pub synthesis: SynthesisController,
    pub playback: PlaybackRegistry,
    chat: Arc<dyn ChatBackend>,
    agent: Agent,
    user_id: String,
    base_url: String,
    /// Speak reply text through the synthesis controller as it arrives
    pub speak_replies: bool,
}

impl VoiceChatPanel {
    pub fn new(
        capture: CaptureController,
        transcription: TranscriptionController,
        synthesis: SynthesisController,
        playback: PlaybackRegistry,
        chat: Arc<dyn ChatBackend>,
        agent: Agent,
        base_url: &str,
    ) -> Self {
        let user_id = generate_user_id();
        info!("Voice chat panel ready: {:?} agent, user {}", agent, user_id);

        Self {
            capture,
            transcription,
            synthesis,
            playback,
            chat,
            agent,
            user_id,
            base_url: base_url.trim_end_matches('/').to_string(),
            speak_replies: false,
        }
    }

    pub fn agent(&self) -> Agent {
        self.agent
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Send typed (or already-finalized) text to the agent
    pub async fn send_text(&mut self, text: &str) -> Result<AssistantReply> {
        let reply = self
            .chat
            .send_text_message(self.agent, &self.user_id, text)
            .await?;
        Ok(self.accept_reply(reply).await)
    }

    /// Consume the finished transcription, if any, and send it as text.
    ///
    /// Returns `None` when no final text is available (session still
    /// listening, or nothing was heard). Consuming a finished transcript
    /// returns the controller to Idle; an active session is left untouched.
    pub async fn send_transcript(&mut self) -> Result<Option<AssistantReply>> {
        let text = self.transcription.take_text().await;
        if text.is_empty() {
            warn!("No transcription text to send");
            return Ok(None);
        }
        Ok(Some(self.send_text(&text).await?))
    }

    /// Consume the finished capture clip, if any, and send it as a voice
    /// message. The capture controller is back at Idle afterwards.
    pub async fn send_recorded_clip(&mut self) -> Result<Option<AssistantReply>> {
        let Some(clip) = self.capture.take_clip().await else {
            warn!("No finished clip to send");
            return Ok(None);
        };

        let reply = self
            .chat
            .send_voice_message(self.agent, &self.user_id, &clip)
            .await?;
        Ok(Some(self.accept_reply(reply).await))
    }

    /// Toggle playback of a reply's response clip
    pub async fn toggle_reply_audio(&self, reply: &AssistantReply) -> Result<(), VoiceError> {
        match &reply.audio_url {
            Some(url) => self.playback.play(&reply.message_id, url).await,
            None => {
                warn!("Reply {} carries no response audio", reply.message_id);
                Ok(())
            }
        }
    }

    async fn accept_reply(&mut self, reply: ChatReply) -> AssistantReply {
        let message_id = uuid::Uuid::new_v4().to_string();
        let audio_url = reply
            .audio_response_path
            .as_deref()
            .map(|path| resolve_audio_url(&self.base_url, path));

        if self.speak_replies {
            // Best effort: a mute reply is not a failed send
            if let Err(e) = self.synthesis.speak(&reply.response).await {
                warn!("Could not speak reply: {}", e);
            }
        }

        AssistantReply {
            message_id,
            reply,
            audio_url,
            received_at: Utc::now(),
        }
    }
}
