//! Boundary contracts with the remote dispatch backend.

mod client;
mod messages;

pub use client::{generate_user_id, ChatBackend, HttpChatClient};
pub use messages::{
    Agent, ChatHistory, ChatMessage, ChatReply, ChatRequest, ChatRole, EmergencyType,
};
