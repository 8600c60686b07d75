use anyhow::{Context, Result};
use tracing::info;

use super::messages::{Agent, ChatHistory, ChatReply, ChatRequest};
use crate::capture::AudioClip;

/// The remote chat collaborator the voice subsystem hands its results to.
///
/// Final transcription text goes out through `send_text_message`; a finished
/// capture clip goes out through `send_voice_message`. Network failures are
/// this boundary's to surface, not the controllers'.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_text_message(&self, agent: Agent, user_id: &str, text: &str)
        -> Result<ChatReply>;

    async fn send_voice_message(
        &self,
        agent: Agent,
        user_id: &str,
        clip: &AudioClip,
    ) -> Result<ChatReply>;

    async fn chat_history(&self, agent: Agent, user_id: &str) -> Result<ChatHistory>;
}

/// Generate a unique per-conversation user id
pub fn generate_user_id() -> String {
    format!("user-{}", uuid::Uuid::new_v4())
}

/// HTTP implementation of [`ChatBackend`] against the dispatch backend
pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self, agent: Agent) -> String {
        format!("{}/api/{}/chat", self.base_url, agent.route_segment())
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpChatClient {
    async fn send_text_message(
        &self,
        agent: Agent,
        user_id: &str,
        text: &str,
    ) -> Result<ChatReply> {
        let url = self.chat_url(agent);
        info!("Sending text message to {} ({} chars)", url, text.len());

        let request = ChatRequest {
            user_id: user_id.to_string(),
            message: text.to_string(),
        };

        let reply = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?
            .error_for_status()
            .with_context(|| format!("Chat request to {} rejected", url))?
            .json::<ChatReply>()
            .await
            .context("Failed to parse chat reply")?;

        Ok(reply)
    }

    async fn send_voice_message(
        &self,
        agent: Agent,
        user_id: &str,
        clip: &AudioClip,
    ) -> Result<ChatReply> {
        let url = self.chat_url(agent);
        info!(
            "Sending voice message to {} ({:.1}s, {} bytes)",
            url,
            clip.duration_seconds,
            clip.data.len()
        );

        let audio = reqwest::multipart::Part::bytes(clip.data.clone())
            .file_name("voice.wav")
            .mime_str(clip.media_type)
            .context("Invalid clip media type")?;

        let form = reqwest::multipart::Form::new()
            .text("user_id", user_id.to_string())
            .text("message", String::new())
            .text("input_type", "voice")
            .part("audio", audio);

        let reply = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?
            .error_for_status()
            .with_context(|| format!("Voice message to {} rejected", url))?
            .json::<ChatReply>()
            .await
            .context("Failed to parse chat reply")?;

        Ok(reply)
    }

    async fn chat_history(&self, agent: Agent, user_id: &str) -> Result<ChatHistory> {
        let url = format!(
            "{}/api/{}/chatHistory/{}",
            self.base_url,
            agent.route_segment(),
            user_id
        );

        let history = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?
            .error_for_status()
            .with_context(|| format!("History request to {} rejected", url))?
            .json::<ChatHistory>()
            .await
            .context("Failed to parse chat history")?;

        Ok(history)
    }
}
