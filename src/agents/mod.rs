use std::sync::Arc;

use log::info;

use crate::models::agent::{ AgentUpdate, AiAgent, ModelConfig, NewAgent };
use crate::store::{ RecordStore, StoreError };

/// Defaults a freshly created agent starts with.
pub const DEFAULT_ROLE_PROMPT: &str = "You are a helpful AI assistant.";
pub const DEFAULT_LANG_CODE: &str = "en";

/// Agent configuration operations over the record store.
pub struct AgentManager {
    store: Arc<dyn RecordStore>,
}

impl AgentManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Agents visible to the authenticated user, newest first.
    pub async fn list(&self) -> Result<Vec<AiAgent>, StoreError> {
        self.store.list_agents().await
    }

    pub async fn get(&self, id: &str) -> Result<AiAgent, StoreError> {
        self.store.get_agent(id).await
    }

    pub async fn create(&self, user: &str, name: &str) -> Result<AiAgent, StoreError> {
        let agent = NewAgent {
            user: user.to_string(),
            agent_name: name.to_string(),
            role_prompt: DEFAULT_ROLE_PROMPT.to_string(),
            lang_code: DEFAULT_LANG_CODE.to_string(),
            chat_history_enabled: true,
        };
        let created = self.store.create_agent(&agent).await?;
        info!("created agent {} ({})", created.agent_name, created.id);
        Ok(created)
    }

    pub async fn configure(&self, id: &str, update: AgentUpdate) -> Result<AiAgent, StoreError> {
        self.store.update_agent(id, &update).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete_agent(id).await
    }

    /// Enabled model options of one type (asr, vad, llm, tts, mem, intent),
    /// defaults first.
    pub async fn model_options(&self, model_type: &str) -> Result<Vec<ModelConfig>, StoreError> {
        self.store.list_model_configs(model_type).await
    }
}
