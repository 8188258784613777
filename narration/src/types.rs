//! Inputs and outputs of a narration turn.

use ghostwriter_canon::SeedData;
use serde::{Deserialize, Serialize};

/// What the player just did and where they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTurn {
    pub player_name: String,

    #[serde(default)]
    pub room_id: Option<String>,

    #[serde(default)]
    pub last_command: Option<String>,

    #[serde(default)]
    pub transcript_tail: Option<String>,
}

impl PlayerTurn {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Self::default()
        }
    }

    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn with_last_command(mut self, command: impl Into<String>) -> Self {
        self.last_command = Some(command.into());
        self
    }

    pub fn with_transcript_tail(mut self, tail: impl Into<String>) -> Self {
        self.transcript_tail = Some(tail.into());
        self
    }

    /// The last command, ignoring blank ones.
    pub fn command(&self) -> Option<&str> {
        non_empty(self.last_command.as_deref())
    }

    /// The current room, ignoring blank ones.
    pub fn room(&self) -> Option<&str> {
        non_empty(self.room_id.as_deref())
    }

    /// The transcript tail, ignoring blank ones.
    pub fn tail(&self) -> Option<&str> {
        non_empty(self.transcript_tail.as_deref())
    }
}

/// Everything a narrator needs for one turn.
#[derive(Debug, Clone, Copy)]
pub struct NarrationInput<'a> {
    pub seed: &'a SeedData,
    pub turn: &'a PlayerTurn,
    pub canon_snippets: &'a [String],
}

impl<'a> NarrationInput<'a> {
    pub fn new(seed: &'a SeedData, turn: &'a PlayerTurn) -> Self {
        Self {
            seed,
            turn,
            canon_snippets: &[],
        }
    }

    pub fn with_snippets(mut self, snippets: &'a [String]) -> Self {
        self.canon_snippets = snippets;
        self
    }
}

/// Narration text plus suggested next actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narration {
    pub narration: String,

    #[serde(default)]
    pub choices: Vec<String>,
}

impl Narration {
    pub fn new<I, S>(narration: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            narration: narration.into(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    /// The fallback result when a backend cannot produce anything.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.narration.is_empty() && self.choices.is_empty()
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
