//! Local services for the companion: persisted state, localization, and the
//! journal/mood/chat-history rules layered on top of them.

pub mod chat_history;
pub mod i18n;
pub mod journal;
pub mod mood;
pub mod store;

pub use i18n::Localizer;
pub use store::{FileStore, MemoryStore, Persisted, Storage, StorageHandle, StoreError};
