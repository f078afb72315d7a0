use serde::{ Serialize, Deserialize };
use serde_json::Value as JsonValue;

/// An AI voice/chat agent record. Each per-stage model id points at a
/// `model_config` record; an empty id means "use the hub default".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiAgent {
    pub id: String,
    #[serde(default)]
    pub user: String,
    pub agent_name: String,
    #[serde(default)]
    pub role_prompt: String,
    #[serde(default)]
    pub lang_code: String,
    #[serde(default)]
    pub asr_model_id: String,
    #[serde(default)]
    pub vad_model_id: String,
    #[serde(default)]
    pub llm_model_id: String,
    #[serde(default)]
    pub tts_model_id: String,
    #[serde(default)]
    pub tts_voice_id: String,
    #[serde(default)]
    pub mem_model_id: String,
    #[serde(default)]
    pub intent_model_id: String,
    #[serde(default)]
    pub chat_history_enabled: bool,
    #[serde(default)]
    pub summary_memory: String,
}

/// Fields sent when creating an agent.
#[derive(Clone, Debug, Serialize)]
pub struct NewAgent {
    pub user: String,
    pub agent_name: String,
    pub role_prompt: String,
    pub lang_code: String,
    pub chat_history_enabled: bool,
}

/// Partial agent update; only the set fields are written.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AgentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asr_model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vad_model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_history_enabled: Option<bool>,
}

/// A configurable model entry (ASR, VAD, LLM, TTS, memory, intent).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub model_name: String,
    pub model_type: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub config_json: JsonValue,
    #[serde(default)]
    pub provider_id: String,
}
