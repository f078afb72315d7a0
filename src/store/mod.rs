pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use crate::models::agent::{ AgentUpdate, AiAgent, ModelConfig, NewAgent };
use crate::models::chat::ChatMessage;
use crate::models::device::AiDevice;

pub const AGENT_COLLECTION: &str = "ai_agent";
pub const DEVICE_COLLECTION: &str = "ai_device";
pub const CHAT_HISTORY_COLLECTION: &str = "ai_agent_chat_history";
pub const MODEL_CONFIG_COLLECTION: &str = "model_config";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("hub request failed: {0}")] Http(#[from] reqwest::Error),
    #[error("hub returned {status}: {message}")] Rejected {
        status: u16,
        message: String,
    },
    #[error("record not found: {0}")] NotFound(String),
    #[error("authentication with the hub failed: {0}")] Auth(String),
    #[error("invalid hub url: {0}")] BaseUrl(#[from] url::ParseError),
    #[error("failed to decode hub response: {0}")] Decode(#[from] serde_json::Error),
    #[error("unsupported store type: {0}")] UnsupportedBackend(String),
}

/// What the hub reports after a successful device bind.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindReceipt {
    pub mac_address: String,
    pub agent_id: String,
}

/// Access to the hub's record collections and custom routes. The http
/// backend talks to a live hub; the memory backend keeps everything
/// in-process for tests and offline runs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_agents(&self) -> Result<Vec<AiAgent>, StoreError>;
    async fn get_agent(&self, id: &str) -> Result<AiAgent, StoreError>;
    async fn create_agent(&self, agent: &NewAgent) -> Result<AiAgent, StoreError>;
    async fn update_agent(&self, id: &str, update: &AgentUpdate) -> Result<AiAgent, StoreError>;
    async fn delete_agent(&self, id: &str) -> Result<(), StoreError>;

    /// Enabled model options of one type, defaults first.
    async fn list_model_configs(&self, model_type: &str) -> Result<Vec<ModelConfig>, StoreError>;

    /// The agent's most recent chat messages, newest first, capped at `limit`.
    async fn list_messages(
        &self,
        agent_id: &str,
        limit: usize
    ) -> Result<Vec<ChatMessage>, StoreError>;

    async fn list_devices(&self, agent_id: &str) -> Result<Vec<AiDevice>, StoreError>;
    async fn delete_device(&self, id: &str) -> Result<(), StoreError>;
    async fn bind_device(&self, code: &str, agent_id: &str) -> Result<BindReceipt, StoreError>;

    /// Absolute URL for a file stored on a record (e.g., a message's audio).
    fn file_url(&self, collection: &str, record_id: &str, filename: &str) -> String;
}

pub async fn create_record_store(args: &Args) -> Result<Arc<dyn RecordStore>, StoreError> {
    match args.store_type.to_lowercase().as_str() {
        "http" => {
            let store = http::HttpRecordStore::new(args)?;
            if let (Some(identity), Some(password)) = (
                args.identity.as_deref(),
                args.password.as_deref(),
            ) {
                store.auth_with_password(identity, password).await?;
            } else if args.token.is_some() {
                store.auth_refresh().await?;
            }
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(memory::MemoryRecordStore::new())),
        other => Err(StoreError::UnsupportedBackend(other.to_string())),
    }
}
