//! The narrator abstraction and its closed set of variants.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::chat::{ChatBackend, OpenAIChatBackend};
use crate::config::NarrationConfig;
use crate::local::LocalNarrator;
use crate::remote::RemoteNarrator;
use crate::types::{Narration, NarrationInput};

/// Produces narration and choices for a turn.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Get the narrator name.
    fn name(&self) -> &str;

    /// Generate narration. Implementations do not fail; degraded output is
    /// expressed as an empty [`Narration`].
    async fn generate(&self, input: &NarrationInput<'_>) -> Narration;
}

/// Either the offline narrator or a backend-driven one.
#[derive(Clone)]
pub enum NarrationProvider {
    Local(LocalNarrator),
    Remote(RemoteNarrator),
}

impl NarrationProvider {
    /// Build the provider described by `config`.
    pub fn from_config(config: &NarrationConfig) -> Self {
        if !config.provider.is_remote() {
            return Self::Local(LocalNarrator::new());
        }

        let chat = config.chat_config();
        info!(
            "Using {:?} narration at {} with model {}",
            config.provider, chat.base_url, chat.model
        );
        let backend: Arc<dyn ChatBackend> = Arc::new(OpenAIChatBackend::new(&chat));
        Self::Remote(
            RemoteNarrator::new(backend)
                .with_temperature(config.temperature)
                .with_policy(config.retry_policy()),
        )
    }

    /// A remote provider over an arbitrary backend.
    pub fn remote(backend: Arc<dyn ChatBackend>, config: &NarrationConfig) -> Self {
        Self::Remote(
            RemoteNarrator::new(backend)
                .with_temperature(config.temperature)
                .with_policy(config.retry_policy()),
        )
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl Default for NarrationProvider {
    fn default() -> Self {
        Self::Local(LocalNarrator::new())
    }
}

#[async_trait]
impl Narrator for NarrationProvider {
    fn name(&self) -> &str {
        match self {
            Self::Local(_) => "local",
            Self::Remote(remote) => remote.backend().name(),
        }
    }

    async fn generate(&self, input: &NarrationInput<'_>) -> Narration {
        match self {
            Self::Local(local) => local.narrate(input),
            Self::Remote(remote) => remote.narrate(input).await,
        }
    }
}
