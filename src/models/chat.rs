use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize, Deserializer };

/// Who produced a chat message. Older hub records store the numeric
/// `chat_type` codes ("1" for user, "2" for assistant); both spellings decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "user" | "1" => Ok(Role::User),
            "assistant" | "2" => Ok(Role::Assistant),
            other =>
                Err(serde::de::Error::unknown_variant(other, &["user", "assistant", "1", "2"])),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where D: Deserializer<'de>
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// One chat history record as returned by the hub. Unknown extra fields are
/// ignored; `conversation_id` may be empty on rows written before session
/// tracking existed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(alias = "chat_type")]
    pub role: Role,
    /// Stored audio filename, if the message carries a recording.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub chat_audio: Option<String>,
    pub created: String,
}

/// A reconstructed chat session: the messages sharing one conversation id,
/// in chronological order. Rebuilt from scratch on every grouping pass.
#[derive(Clone, Debug, Serialize)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub last_message_time: DateTime<Utc>,
}

impl Conversation {
    /// Text for a session list entry: the opening message, when it has any.
    pub fn preview(&self) -> Option<&str> {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_role_names_and_legacy_codes() {
        let json = r#"{"id":"m1","role":"user","created":"2024-01-01T10:00:00Z"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, Role::User);

        let json = r#"{"id":"m2","chat_type":"2","created":"2024-01-01T10:00:00Z"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn rejects_unknown_role() {
        let json = r#"{"id":"m1","role":"system","created":"2024-01-01T10:00:00Z"}"#;
        assert!(serde_json::from_str::<ChatMessage>(json).is_err());
    }

    #[test]
    fn ignores_extra_fields_and_missing_optionals() {
        let json = r#"{
            "id": "m1",
            "collectionId": "pbc_333196930",
            "collectionName": "ai_agent_chat_history",
            "device": "dev1",
            "mac_address": "aa:bb:cc:dd:ee:ff",
            "role": "assistant",
            "created": "2024-01-01 10:00:00.123Z"
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.conversation_id, "");
        assert_eq!(msg.content, "");
        assert!(msg.chat_audio.is_none());
    }

    #[test]
    fn empty_audio_filename_decodes_to_none() {
        let json = r#"{"id":"m1","role":"user","chat_audio":"","created":"2024-01-01T10:00:00Z"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert!(msg.chat_audio.is_none());

        let json =
            r#"{"id":"m1","role":"user","chat_audio":"audio_1.mp3","created":"2024-01-01T10:00:00Z"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.chat_audio.as_deref(), Some("audio_1.mp3"));
    }

    #[test]
    fn preview_skips_empty_opening_message() {
        let conversation = Conversation {
            id: "c1".to_string(),
            messages: vec![ChatMessage {
                id: "m1".to_string(),
                agent: String::new(),
                conversation_id: "c1".to_string(),
                content: String::new(),
                role: Role::User,
                chat_audio: None,
                created: "2024-01-01T10:00:00Z".to_string(),
            }],
            last_message_time: Utc::now(),
        };
        assert!(conversation.preview().is_none());
    }
}
