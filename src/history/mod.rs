mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use chrono::Utc;
use log::{ debug, error, info, warn };
use serde::{ Serialize, Deserialize };
use std::sync::Arc;
use thiserror::Error;
use crate::format::Formatter;
use crate::format::sanitize::unescape_html;
use crate::models::chat::{ ConversationHistory, Message, Sender };

pub const HISTORY_KEY: &str = "chatbot_quaxar_history";
pub const OPEN_STATE_KEY: &str = "chatbot_quaxar_open";
const PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The browser's key-value storage as seen by the widget.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Keys are scoped per site so two widgets on one page never share state.
pub fn storage_key(base: &str, site_id: &str) -> String {
    format!("{}:{}", base, site_id)
}

#[derive(Serialize, Deserialize)]
struct StoredMessage {
    sender: Sender,
    #[serde(default)]
    html: String,
}

#[derive(Serialize, Deserialize)]
struct StoredHistory {
    version: u32,
    saved_at: i64,
    messages: Vec<StoredMessage>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPayload {
    Current(StoredHistory),
    Legacy(Vec<StoredMessage>),
}

/// Session-scoped conversation persistence. Messages are stored as the
/// HTML shown in their bubbles and sanitized again on the way back in.
pub struct HistoryStore {
    storage: Arc<dyn SessionStorage>,
    key: String,
    formatter: Formatter,
}

impl HistoryStore {
    pub fn new(storage: Arc<dyn SessionStorage>, site_id: &str, formatter: Formatter) -> Self {
        Self {
            storage,
            key: storage_key(HISTORY_KEY, site_id),
            formatter,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(&self, history: &ConversationHistory) {
        if let Err(e) = self.try_save(history) {
            error!("Error saving chat history under {}: {}", self.key, e);
        }
    }

    pub fn try_save(&self, history: &ConversationHistory) -> Result<(), PersistenceError> {
        let payload = StoredHistory {
            version: PAYLOAD_VERSION,
            saved_at: Utc::now().timestamp(),
            messages: history
                .messages()
                .iter()
                .map(|msg| StoredMessage { sender: msg.sender, html: msg.html() })
                .collect(),
        };
        let json = serde_json::to_string(&payload)?;
        self.storage.set_item(&self.key, &json)?;
        debug!("Saved {} message(s) under {}", history.len(), self.key);
        Ok(())
    }

    /// Never fails: missing or unreadable data is an empty history.
    pub fn load(&self) -> ConversationHistory {
        match self.try_load() {
            Ok(history) => history,
            Err(e) => {
                warn!("Error loading chat history from {}: {}", self.key, e);
                ConversationHistory::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<ConversationHistory, PersistenceError> {
        let Some(raw) = self.storage.get_item(&self.key)? else {
            return Ok(ConversationHistory::new());
        };
        let stored = match serde_json::from_str::<StoredPayload>(&raw)? {
            StoredPayload::Current(history) => {
                let age = Utc::now().timestamp() - history.saved_at;
                debug!("Restoring history v{} saved {}s ago", history.version, age);
                history.messages
            }
            StoredPayload::Legacy(messages) => {
                info!("Restoring legacy history payload from {}", self.key);
                messages
            }
        };

        let messages = stored
            .into_iter()
            .map(|msg| {
                let html = self.formatter.sanitize(&msg.html);
                match msg.sender {
                    Sender::User => Message::user(unescape_html(&html)),
                    Sender::Bot => Message::bot(html),
                }
            })
            .collect::<Vec<_>>();
        Ok(ConversationHistory::from(messages))
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove_item(&self.key) {
            error!("Error clearing chat history under {}: {}", self.key, e);
        }
    }
}

/// Remembers whether the window was left open. Lives in durable storage;
/// only affects the initial UI.
pub struct OpenStateStore {
    storage: Arc<dyn SessionStorage>,
    key: String,
}

impl OpenStateStore {
    pub fn new(storage: Arc<dyn SessionStorage>, site_id: &str) -> Self {
        Self { storage, key: storage_key(OPEN_STATE_KEY, site_id) }
    }

    pub fn save(&self, open: bool) {
        let value = if open { "1" } else { "0" };
        if let Err(e) = self.storage.set_item(&self.key, value) {
            error!("Error saving open state: {}", e);
        }
    }

    pub fn load(&self) -> Option<bool> {
        match self.storage.get_item(&self.key) {
            Ok(Some(value)) => Some(value == "1"),
            Ok(None) => None,
            Err(e) => {
                warn!("Error reading open state: {}", e);
                None
            }
        }
    }
}
