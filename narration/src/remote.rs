//! Backend-driven narrator with retry and output repair.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::chat::{ChatBackend, ChatMessage, ChatRequest};
use crate::error::Result;
use crate::prompt::{build_system_prompt, build_user_prompt};
use crate::repair::parse_narration;
use crate::types::{Narration, NarrationInput};

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default backoff unit in milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 300;

/// How often and how patiently to retry a failing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Backoff unit; the wait before attempt `n` is `n` units.
    #[serde(with = "millis")]
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }
}

/// Result of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
}

/// Where a generation call stands. Attempts are numbered from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Run attempt `attempt` after waiting `delay`.
    Attempting { attempt: u32, delay: Duration },
    Success,
    Fallback,
}

impl RetryState {
    /// The state a call starts in.
    pub fn initial() -> Self {
        Self::Attempting {
            attempt: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Attempting { .. })
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Next state after attempt `attempt` finished with `outcome`.
    pub fn transition(&self, attempt: u32, outcome: AttemptOutcome) -> RetryState {
        match outcome {
            AttemptOutcome::Succeeded => RetryState::Success,
            AttemptOutcome::Failed => {
                let next = attempt.saturating_add(1);
                if next > self.max_retries {
                    RetryState::Fallback
                } else {
                    RetryState::Attempting {
                        attempt: next,
                        delay: self.backoff_base.saturating_mul(next),
                    }
                }
            }
        }
    }
}

/// Sends the assembled prompt to a [`ChatBackend`] and repairs its answer.
///
/// Generation never fails: once retries are exhausted the result is
/// [`Narration::empty`].
#[derive(Clone)]
pub struct RemoteNarrator {
    backend: Arc<dyn ChatBackend>,
    temperature: f32,
    policy: RetryPolicy,
}

impl RemoteNarrator {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            temperature: DEFAULT_TEMPERATURE,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> &dyn ChatBackend {
        self.backend.as_ref()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn narrate(&self, input: &NarrationInput<'_>) -> Narration {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(build_system_prompt(input.seed, input.canon_snippets)),
                ChatMessage::user(build_user_prompt(input.turn)),
            ],
            temperature: self.temperature,
            json_output: true,
        };

        let mut state = RetryState::initial();
        while let RetryState::Attempting { attempt, delay } = state {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.attempt(&request).await {
                Ok(narration) => {
                    debug!("Narration succeeded on attempt {attempt}");
                    return narration;
                }
                Err(e) => {
                    warn!(
                        "Narration attempt {attempt} via {} failed: {e}",
                        self.backend.name()
                    );
                    state = self.policy.transition(attempt, AttemptOutcome::Failed);
                }
            }
        }

        error!(
            "Narration backend {} failed after {} attempts, using empty narration",
            self.backend.name(),
            self.policy.max_retries + 1
        );
        Narration::empty()
    }

    async fn attempt(&self, request: &ChatRequest) -> Result<Narration> {
        let content = self.backend.complete(request).await?;
        parse_narration(&content)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
