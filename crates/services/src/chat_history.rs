//! Per-profile chat log rules.
//!
//! The log for a profile lives under `chatHistory_<name>`, so renaming a
//! profile has to move the stored log along with it.

use crate::store::{StorageHandle, StoreError};
use shared::wellness::Message;
use tracing::info;

pub const WELCOME_MESSAGE_ID: &str = "initial-welcome";

pub fn history_key(profile_name: &str) -> String {
    format!("chatHistory_{profile_name}")
}

/// The greeting that seeds an empty conversation.
pub fn welcome_message(text: impl Into<String>) -> Message {
    let mut msg = Message::ai(text);
    msg.id = WELCOME_MESSAGE_ID.to_string();
    msg
}

pub fn delete_message(messages: &[Message], id: &str) -> Vec<Message> {
    messages.iter().filter(|m| m.id != id).cloned().collect()
}

/// Case-insensitive substring filter. A blank query matches everything.
pub fn search<'a>(messages: &'a [Message], query: &str) -> Vec<&'a Message> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return messages.iter().collect();
    }
    messages
        .iter()
        .filter(|m| m.text.to_lowercase().contains(&needle))
        .collect()
}

/// The AI message to base reply suggestions on: the last message, when it
/// came from the AI and no reply is pending.
pub fn suggestion_anchor(messages: &[Message], reply_pending: bool) -> Option<&Message> {
    if reply_pending {
        return None;
    }
    messages.last().filter(|m| m.is_from_ai())
}

/// Move the stored log from `old_name`'s key to `new_name`'s key.
///
/// Returns true if a log existed and was moved. Same-name renames are a no-op.
pub fn migrate_history(
    handle: &StorageHandle,
    old_name: &str,
    new_name: &str,
) -> Result<bool, StoreError> {
    if old_name == new_name {
        return Ok(false);
    }
    let old_key = history_key(old_name);
    let Some(history) = handle.get_item(&old_key)? else {
        return Ok(false);
    };
    let new_key = history_key(new_name);
    handle.set_item(&new_key, &history)?;
    handle.remove_item(&old_key)?;
    info!(from = %old_key, to = %new_key, "migrated chat history");
    Ok(true)
}
