pub mod agent;
pub mod backend;
pub mod cli;
pub mod companion;
pub mod config;
pub mod db;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod mood;
pub mod openai;
pub mod personality;
pub mod prompt;
pub mod responder;
pub mod store;

pub use agent::{CommandResult, CommandRouter, OsActions, SystemActions};
pub use backend::{GenerationBackend, GenerationConfig};
pub use companion::{Companion, TurnKind, TurnReply};
pub use config::{BackendKind, Config};
pub use db::SqliteStore;
pub use error::{BackendError, ConfigError, OsActionError, StoreError};
pub use personality::{PersonalityProfile, Trait};
pub use responder::ResponseGenerator;
pub use store::{ConversationStore, Message, Sender};
