//! # Narration
//!
//! Turns a seed, retrieved canon and the player's turn into narration plus
//! suggested next actions.
//!
//! ```text
//! SeedData + snippets ──► build_system_prompt ─┐
//! PlayerTurn ─────────► build_user_prompt ───┴─► NarrationProvider ──► Narration
//!                                                  ├─ Local  (template)
//!                                                  └─ Remote (ChatBackend, retry, repair)
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod local;
pub mod prompt;
pub mod provider;
pub mod remote;
pub mod repair;
pub mod types;

pub use chat::{
    ChatBackend, ChatConfig, ChatMessage, ChatRequest, ChatRole, DEFAULT_CHAT_MODEL,
    OpenAIChatBackend,
};
pub use config::{LMSTUDIO_BASE_URL, NarrationConfig, OLLAMA_BASE_URL, ProviderKind};
pub use error::{NarrationError, Result};
pub use local::LocalNarrator;
pub use prompt::{build_system_prompt, build_user_prompt, world_title, world_tone};
pub use provider::{NarrationProvider, Narrator};
pub use remote::{AttemptOutcome, RemoteNarrator, RetryPolicy, RetryState};
pub use repair::parse_narration;
pub use types::{Narration, NarrationInput, PlayerTurn};
