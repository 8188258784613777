//! Deterministic offline narrator.

use crate::prompt::{world_title, world_tone};
use crate::types::{Narration, NarrationInput};

/// Actions offered when no backend is involved.
const ACTION_VOCABULARY: &[&str] = &[
    "look",
    "inventory",
    "say hello",
    "think",
    "north",
    "south",
    "east",
    "west",
];

const CHOICE_COUNT: usize = 4;
const CAST_EXCERPT: usize = 3;

/// Fills a fixed template from the seed and the player turn. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalNarrator;

impl LocalNarrator {
    pub fn new() -> Self {
        Self
    }

    pub fn narrate(&self, input: &NarrationInput<'_>) -> Narration {
        let turn = input.turn;
        let preface = turn
            .command()
            .map(|command| format!("After the command \"{command}\", "))
            .unwrap_or_default();
        let room = turn.room().unwrap_or("somewhere unfamiliar");

        let mut sentences = vec![
            format!("{preface}{} stands in {room}.", turn.player_name),
            format!(
                "In the {} world of {}, the air is thick with possibility.",
                world_tone(input.seed),
                world_title(input.seed)
            ),
        ];

        let cast: Vec<&str> = input
            .seed
            .characters
            .iter()
            .take(CAST_EXCERPT)
            .map(|c| c.name.as_str())
            .collect();
        if !cast.is_empty() {
            sentences.push(format!("Nearby figures linger: {}.", cast.join(", ")));
        }

        Narration {
            narration: sentences.join(" "),
            choices: suggest_choices(turn.command()),
        }
    }
}

/// The first few vocabulary actions, skipping the command just issued.
fn suggest_choices(last_command: Option<&str>) -> Vec<String> {
    ACTION_VOCABULARY
        .iter()
        .filter(|action| Some(**action) != last_command)
        .take(CHOICE_COUNT)
        .map(|action| (*action).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerTurn;
    use ghostwriter_canon::{SeedCharacter, SeedData, SeedWorld};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_narration_after_command() {
        let seed = SeedData {
            world: Some(SeedWorld {
                title: Some("Hollowmere".to_string()),
                tone: Some("melancholy".to_string()),
                synopsis: None,
            }),
            characters: ["Ada", "Bram", "Cole", "Dara"]
                .into_iter()
                .map(SeedCharacter::new)
                .collect(),
            ..SeedData::default()
        };
        let turn = PlayerTurn::new("Wren")
            .with_room("the lantern hall")
            .with_last_command("look");

        let out = LocalNarrator::new().narrate(&NarrationInput::new(&seed, &turn));
        assert_eq!(
            out.narration,
            "After the command \"look\", Wren stands in the lantern hall. In the melancholy world of Hollowmere, the air is thick with possibility. Nearby figures linger: Ada, Bram, Cole."
        );
        assert_eq!(out.choices, vec!["inventory", "say hello", "think", "north"]);
    }

    #[test]
    fn test_narration_defaults() {
        let seed = SeedData::default();
        let turn = PlayerTurn::new("Wren");

        let out = LocalNarrator::new().narrate(&NarrationInput::new(&seed, &turn));
        assert_eq!(
            out.narration,
            "Wren stands in somewhere unfamiliar. In the adventurous world of Untitled World, the air is thick with possibility."
        );
        assert_eq!(out.choices, vec!["look", "inventory", "say hello", "think"]);
    }

    #[test]
    fn test_unknown_command_keeps_first_four() {
        assert_eq!(
            suggest_choices(Some("dance")),
            vec!["look", "inventory", "say hello", "think"]
        );
        assert_eq!(
            suggest_choices(Some("think")),
            vec!["look", "inventory", "say hello", "north"]
        );
    }
}
