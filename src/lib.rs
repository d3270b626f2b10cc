pub mod chat;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod llm;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod session;
pub mod sql_extract;
pub mod table;

pub use chat::{ChatEntry, Conversation};
pub use error::{PinnError, Result};
pub use pipeline::{ConversationPipeline, TurnOutcome};
pub use session::ChatSession;
