pub mod cache;

use std::collections::HashMap;

use chrono::{ DateTime, NaiveDateTime, Utc };
use thiserror::Error;

use crate::models::chat::{ ChatMessage, Conversation, Role };
use crate::store::StoreError;

pub use cache::ChatHistory;

/// Session key assigned to messages recorded before conversation tracking,
/// or whose conversation id was lost.
pub const UNKNOWN_CONVERSATION_ID: &str = "unknown";

#[derive(Debug, Error)]
pub enum HistoryError {
    /// A message carries a timestamp this client cannot order by. Ordering
    /// would silently corrupt if such a value were coerced to a default.
    #[error("message {message_id} has an unparseable timestamp: {value:?}")]
    InvalidTimestamp {
        message_id: String,
        value: String,
    },
    #[error(transparent)] Store(#[from] StoreError),
}

/// Parse a record timestamp. The hub emits RFC 3339 over its API, while raw
/// database exports use the space-separated `YYYY-MM-DD HH:MM:SS.fffZ` form;
/// both are accepted.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.fZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Reconstruct conversations from a flat page of chat messages.
///
/// Messages are partitioned by `conversation_id` (empty ids fall into the
/// [`UNKNOWN_CONVERSATION_ID`] group), sorted chronologically within each
/// group, and the groups are returned most-recently-active first. The input
/// may arrive in any order; every message ends up in exactly one group.
pub fn group_messages(messages: &[ChatMessage]) -> Result<Vec<Conversation>, HistoryError> {
    let mut discovery_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<(DateTime<Utc>, ChatMessage)>> = HashMap::new();

    for message in messages {
        let instant = parse_timestamp(&message.created).ok_or_else(|| {
            HistoryError::InvalidTimestamp {
                message_id: message.id.clone(),
                value: message.created.clone(),
            }
        })?;

        let key = if message.conversation_id.is_empty() {
            UNKNOWN_CONVERSATION_ID.to_string()
        } else {
            message.conversation_id.clone()
        };

        match groups.get_mut(&key) {
            Some(group) => group.push((instant, message.clone())),
            None => {
                discovery_order.push(key.clone());
                groups.insert(key, vec![(instant, message.clone())]);
            }
        }
    }

    let mut conversations = Vec::with_capacity(discovery_order.len());
    for id in discovery_order {
        let mut entries = match groups.remove(&id) {
            Some(entries) => entries,
            None => continue,
        };
        // Stable: messages with equal timestamps keep their input order.
        entries.sort_by_key(|(instant, _)| *instant);
        let last_message_time = match entries.last() {
            Some((instant, _)) => *instant,
            None => continue,
        };
        conversations.push(Conversation {
            id,
            messages: entries
                .into_iter()
                .map(|(_, message)| message)
                .collect(),
            last_message_time,
        });
    }

    // Stable sort over the discovery-ordered vec: groups with equal last
    // activity keep their first-appearance order, so repeated calls on the
    // same input produce identical output.
    conversations.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));

    Ok(conversations)
}

/// Pick the conversation to display: the previously selected one if it still
/// exists, otherwise the most recent, otherwise none.
pub fn select_conversation<'a>(
    conversations: &'a [Conversation],
    selected_id: Option<&str>
) -> Option<&'a Conversation> {
    selected_id
        .and_then(|id| conversations.iter().find(|c| c.id == id))
        .or_else(|| conversations.first())
}

pub fn render_transcript(conversation: &Conversation) -> String {
    let mut result = String::new();
    for msg in &conversation.messages {
        let role_display = match msg.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };

        result.push_str(&format!("{}: {}\n", role_display, msg.content));
    }

    result
}
