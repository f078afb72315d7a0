use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::agent::{ AgentUpdate, AiAgent, ModelConfig, NewAgent };
use crate::models::chat::{ ChatMessage, Role };
use crate::models::device::AiDevice;
use crate::store::{ BindReceipt, RecordStore, StoreError };

/// In-process record store. Backs tests and offline runs with the same
/// operations the http backend performs against a live hub.
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    agents: Vec<AiAgent>,
    devices: Vec<AiDevice>,
    messages: Vec<ChatMessage>,
    model_configs: Vec<ModelConfig>,
    // code -> mac address waiting to be bound
    bind_codes: HashMap<String, String>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }

    fn mint_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn seed_agent(&self, id: &str, user: &str, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.agents.push(AiAgent {
            id: id.to_string(),
            user: user.to_string(),
            agent_name: name.to_string(),
            role_prompt: String::new(),
            lang_code: "en".to_string(),
            asr_model_id: String::new(),
            vad_model_id: String::new(),
            llm_model_id: String::new(),
            tts_model_id: String::new(),
            tts_voice_id: String::new(),
            mem_model_id: String::new(),
            intent_model_id: String::new(),
            chat_history_enabled: true,
            summary_memory: String::new(),
        });
    }

    pub fn seed_message(
        &self,
        agent_id: &str,
        id: &str,
        conversation_id: &str,
        role: Role,
        content: &str,
        created: &str
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.messages.push(ChatMessage {
            id: id.to_string(),
            agent: agent_id.to_string(),
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            role,
            chat_audio: None,
            created: created.to_string(),
        });
    }

    pub fn seed_model_config(&self, config: ModelConfig) {
        self.inner.lock().unwrap().model_configs.push(config);
    }

    /// Stage a device-displayed bind code, as the hub does when an unbound
    /// device connects.
    pub fn register_bind_code(&self, code: &str, mac_address: &str) {
        self.inner
            .lock()
            .unwrap()
            .bind_codes.insert(code.to_string(), mac_address.to_string());
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list_agents(&self) -> Result<Vec<AiAgent>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.agents.iter().rev().cloned().collect())
    }

    async fn get_agent(&self, id: &str) -> Result<AiAgent, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.agents
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create_agent(&self, agent: &NewAgent) -> Result<AiAgent, StoreError> {
        let record = AiAgent {
            id: Self::mint_id(),
            user: agent.user.clone(),
            agent_name: agent.agent_name.clone(),
            role_prompt: agent.role_prompt.clone(),
            lang_code: agent.lang_code.clone(),
            asr_model_id: String::new(),
            vad_model_id: String::new(),
            llm_model_id: String::new(),
            tts_model_id: String::new(),
            tts_voice_id: String::new(),
            mem_model_id: String::new(),
            intent_model_id: String::new(),
            chat_history_enabled: agent.chat_history_enabled,
            summary_memory: String::new(),
        };
        self.inner.lock().unwrap().agents.push(record.clone());
        Ok(record)
    }

    async fn update_agent(&self, id: &str, update: &AgentUpdate) -> Result<AiAgent, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let agent = inner.agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(value) = &update.agent_name {
            agent.agent_name = value.clone();
        }
        if let Some(value) = &update.role_prompt {
            agent.role_prompt = value.clone();
        }
        if let Some(value) = &update.lang_code {
            agent.lang_code = value.clone();
        }
        if let Some(value) = &update.asr_model_id {
            agent.asr_model_id = value.clone();
        }
        if let Some(value) = &update.vad_model_id {
            agent.vad_model_id = value.clone();
        }
        if let Some(value) = &update.llm_model_id {
            agent.llm_model_id = value.clone();
        }
        if let Some(value) = &update.tts_model_id {
            agent.tts_model_id = value.clone();
        }
        if let Some(value) = &update.tts_voice_id {
            agent.tts_voice_id = value.clone();
        }
        if let Some(value) = &update.mem_model_id {
            agent.mem_model_id = value.clone();
        }
        if let Some(value) = &update.intent_model_id {
            agent.intent_model_id = value.clone();
        }
        if let Some(value) = update.chat_history_enabled {
            agent.chat_history_enabled = value;
        }

        Ok(agent.clone())
    }

    async fn delete_agent(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.agents.len();
        inner.agents.retain(|a| a.id != id);
        if inner.agents.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_model_configs(&self, model_type: &str) -> Result<Vec<ModelConfig>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut configs: Vec<ModelConfig> = inner.model_configs
            .iter()
            .filter(|c| c.model_type == model_type && c.is_enabled)
            .cloned()
            .collect();
        configs.sort_by(|a, b|
            b.is_default.cmp(&a.is_default).then_with(|| a.model_name.cmp(&b.model_name))
        );
        Ok(configs)
    }

    async fn list_messages(
        &self,
        agent_id: &str,
        limit: usize
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut messages: Vec<ChatMessage> = inner.messages
            .iter()
            .filter(|m| m.agent == agent_id)
            .cloned()
            .collect();
        // The hub's created column sorts lexicographically in time order.
        messages.sort_by(|a, b| b.created.cmp(&a.created));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn list_devices(&self, agent_id: &str) -> Result<Vec<AiDevice>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(
            inner.devices
                .iter()
                .rev()
                .filter(|d| d.agent == agent_id)
                .cloned()
                .collect()
        )
    }

    async fn delete_device(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.devices.len();
        inner.devices.retain(|d| d.id != id);
        if inner.devices.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn bind_device(&self, code: &str, agent_id: &str) -> Result<BindReceipt, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let mac_address = match inner.bind_codes.get(code) {
            Some(mac) => mac.clone(),
            None => {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: "Invalid or expired device code".to_string(),
                });
            }
        };

        let user = inner.agents
            .iter()
            .find(|a| a.id == agent_id)
            .map(|a| a.user.clone())
            .ok_or_else(|| StoreError::NotFound("Agent not found".to_string()))?;

        if inner.devices.iter().any(|d| d.mac_address == mac_address) {
            return Err(StoreError::Rejected {
                status: 400,
                message: "Device already bound".to_string(),
            });
        }

        inner.devices.push(AiDevice {
            id: Self::mint_id(),
            mac_address: mac_address.clone(),
            user,
            agent: agent_id.to_string(),
            board: String::new(),
            last_connected: String::new(),
        });
        inner.bind_codes.remove(code);

        Ok(BindReceipt {
            mac_address,
            agent_id: agent_id.to_string(),
        })
    }

    fn file_url(&self, collection: &str, record_id: &str, filename: &str) -> String {
        format!("memory://{}/{}/{}", collection, record_id, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn messages_are_filtered_by_agent_and_newest_first() {
        let store = MemoryRecordStore::new();
        store.seed_message("a1", "m1", "c1", Role::User, "old", "2024-01-01 10:00:00.000Z");
        store.seed_message("a2", "m2", "c7", Role::User, "other agent", "2024-01-01 11:00:00.000Z");
        store.seed_message("a1", "m3", "c1", Role::Assistant, "new", "2024-01-02 10:00:00.000Z");

        let messages = store.list_messages("a1", 500).await.unwrap();
        let ids: Vec<&str> = messages
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["m3", "m1"]);
    }

    #[tokio::test]
    async fn bind_consumes_the_code_once() {
        let store = MemoryRecordStore::new();
        store.seed_agent("a1", "u1", "Buddy");
        store.register_bind_code("123456", "aa:bb:cc:dd:ee:ff");

        let receipt = store.bind_device("123456", "a1").await.unwrap();
        assert_eq!(receipt.mac_address, "aa:bb:cc:dd:ee:ff");
        assert_eq!(receipt.agent_id, "a1");

        let devices = store.list_devices("a1").await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].user, "u1");

        // The code is one-shot.
        assert!(matches!(
            store.bind_device("123456", "a1").await,
            Err(StoreError::Rejected { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn bind_rejects_unknown_agent_and_rebinding() {
        let store = MemoryRecordStore::new();
        store.register_bind_code("111111", "aa:aa:aa:aa:aa:aa");
        assert!(matches!(
            store.bind_device("111111", "missing").await,
            Err(StoreError::NotFound(_))
        ));

        store.seed_agent("a1", "u1", "Buddy");
        store.bind_device("111111", "a1").await.unwrap();

        store.register_bind_code("222222", "aa:aa:aa:aa:aa:aa");
        assert!(matches!(
            store.bind_device("222222", "a1").await,
            Err(StoreError::Rejected { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn model_configs_list_defaults_first() {
        let store = MemoryRecordStore::new();
        let config = |name: &str, is_default: bool, is_enabled: bool| ModelConfig {
            id: name.to_string(),
            model_name: name.to_string(),
            model_type: "llm".to_string(),
            is_default,
            is_enabled,
            config_json: serde_json::Value::Null,
            provider_id: String::new(),
        };
        store.seed_model_config(config("zeta", false, true));
        store.seed_model_config(config("alpha", false, true));
        store.seed_model_config(config("main", true, true));
        store.seed_model_config(config("disabled", true, false));

        let configs = store.list_model_configs("llm").await.unwrap();
        let names: Vec<&str> = configs
            .iter()
            .map(|c| c.model_name.as_str())
            .collect();
        assert_eq!(names, vec!["main", "alpha", "zeta"]);
    }
}
