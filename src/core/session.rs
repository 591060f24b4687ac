use crate::domain::model::{ChatMessage, ChatRole};
use crate::domain::ports::{Storage, WorkflowGateway};
use crate::utils::error::{DeskError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process your request.";

/// Chat context passed explicitly to every exchange. Persisting it between
/// invocations is the caller's job ([`ChatSession::load`] / [`ChatSession::save`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: Uuid,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            messages: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
        tracing::info!("Started new chat session {}", self.session_id);
    }

    /// Sends `input` to the agent and returns its reply.
    ///
    /// The user message is kept in the history even when the call fails; the
    /// assistant reply is only appended on success.
    pub async fn exchange<G: WorkflowGateway + ?Sized>(
        &mut self,
        gateway: &G,
        input: &str,
    ) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DeskError::validation("Chat message cannot be empty"));
        }

        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: input.to_string(),
        });

        let session_id = self.session_id.to_string();
        let reply = gateway
            .invoke_agent(&session_id, input)
            .await?
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());

        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content: reply.clone(),
        });
        Ok(reply)
    }

    /// [`ChatSession::exchange`] followed by [`ChatSession::save`]. The session is
    /// written even when the agent call fails, so the user message survives.
    pub async fn exchange_and_save<G, S>(
        &mut self,
        gateway: &G,
        storage: &S,
        path: &str,
        input: &str,
    ) -> Result<String>
    where
        G: WorkflowGateway + ?Sized,
        S: Storage,
    {
        let result = self.exchange(gateway, input).await;
        self.save(storage, path).await?;
        if let Err(e) = &result {
            tracing::warn!("Chat exchange failed, session {} saved without a reply: {}", self.session_id, e);
        }
        result
    }

    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        if !storage.exists(path) {
            tracing::debug!("No saved chat session at {}, starting a new one", path);
            return Ok(Self::new());
        }
        let data = storage.read_file(path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub async fn save<S: Storage>(&self, storage: &S, path: &str) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        storage.write_file(path, &data).await
    }
}
