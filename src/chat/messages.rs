use serde::{Deserialize, Serialize};

/// The dispatch agents exposed by the remote backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Agent {
    /// Front-desk triage; classifies the emergency and hands off
    Triage,
    Medical,
    Police,
    Electricity,
    Fire,
}

impl Agent {
    /// Path segment this agent's routes live under
    pub fn route_segment(&self) -> &'static str {
        match self {
            Agent::Triage => "triage",
            Agent::Medical => "medical-emergency",
            Agent::Police => "police-emergency",
            Agent::Electricity => "electricity-emergency",
            Agent::Fire => "fire-emergency",
        }
    }
}

/// Body of a text chat request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

/// Classification attached to a triage reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmergencyType {
    Medical,
    Police,
    Electricity,
    Fire,
}

/// Assistant reply from any agent endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,

    /// Present on triage replies that routed the user to a specialist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_type: Option<EmergencyType>,

    /// For voice messages: what the backend heard the user say
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,

    /// Path of a spoken response clip, resolvable against the base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_response_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of a persisted conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_response_path: Option<String>,
}

/// Conversation history as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    pub history: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_parses_with_optional_fields_absent() {
        let reply: ChatReply = serde_json::from_str(r#"{"response": "ok"}"#).unwrap();
        assert_eq!(reply.response, "ok");
        assert!(reply.emergency_type.is_none());
        assert!(reply.audio_response_path.is_none());
    }

    #[test]
    fn reply_parses_emergency_type_and_audio_path() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"response": "dispatching", "emergency_type": "Fire", "audio_response_path": "/audio/x.wav"}"#,
        )
        .unwrap();
        assert_eq!(reply.emergency_type, Some(EmergencyType::Fire));
        assert_eq!(reply.audio_response_path.as_deref(), Some("/audio/x.wav"));
    }

    #[test]
    fn history_roles_are_lowercase_on_the_wire() {
        let history: ChatHistory = serde_json::from_str(
            r#"{"history": [{"role": "user", "content": "help"}, {"role": "assistant", "content": "on the way"}]}"#,
        )
        .unwrap();
        assert_eq!(history.history.len(), 2);
        assert_eq!(history.history[0].role, ChatRole::User);
        assert_eq!(history.history[1].role, ChatRole::Assistant);
    }
}
