//! Prompt assembly.
//!
//! Both builders are pure and total: missing optional fields fall back to
//! textual defaults and empty sections are left out.

use ghostwriter_canon::{SeedCharacter, SeedData};

use crate::types::{PlayerTurn, non_empty};

/// Title used when the seed has none.
pub const DEFAULT_TITLE: &str = "Untitled World";

/// Tone used when the seed has none.
pub const DEFAULT_TONE: &str = "adventurous";

const ROLE: &str = "You are an expert Game Master and ghostwriter for a single-player, text-only RPG.";

const RULES: &[&str] = &[
    "Rules:",
    "- Keep narration concise (1-3 paragraphs) and forward-moving.",
    "- Maintain internal consistency with provided world and characters.",
    "- Offer 3-5 grounded next-action choices the player could take.",
    "- Output MUST be strict JSON with keys: narration (string), choices (string[]).",
];

const JSON_INSTRUCTION: &str = r#"Respond ONLY with JSON: {"narration": string, "choices": string[]}"#;

/// World title with the default applied.
pub fn world_title(seed: &SeedData) -> &str {
    non_empty(seed.title()).unwrap_or(DEFAULT_TITLE)
}

/// World tone with the default applied.
pub fn world_tone(seed: &SeedData) -> &str {
    non_empty(seed.tone()).unwrap_or(DEFAULT_TONE)
}

/// Render the system block: framing, world, cast, canon and output rules.
pub fn build_system_prompt(seed: &SeedData, canon_snippets: &[String]) -> String {
    let mut parts = vec![
        ROLE.to_string(),
        format!("World: {}", world_title(seed)),
        format!("Tone: {}", world_tone(seed)),
    ];

    if let Some(synopsis) = non_empty(seed.synopsis()) {
        parts.push(format!("Synopsis: {synopsis}"));
    }

    if !seed.characters.is_empty() {
        let cast: Vec<String> = seed.characters.iter().map(roster_line).collect();
        parts.push(format!("Characters:\n{}", cast.join("\n")));
    }

    if !canon_snippets.is_empty() {
        parts.push(format!(
            "Canon context (snippets):\n- {}",
            canon_snippets.join("\n- ")
        ));
    }

    parts.extend(RULES.iter().map(|line| (*line).to_string()));
    parts.join("\n")
}

/// Render the user block for one turn.
pub fn build_user_prompt(turn: &PlayerTurn) -> String {
    let mut parts = vec![match turn.command() {
        Some(command) => format!("Player command: {command}"),
        None => "Start of session".to_string(),
    }];

    if let Some(room) = turn.room() {
        parts.push(format!("Current location: {room}"));
    }
    parts.push(format!("Player: {}", turn.player_name));
    if let Some(tail) = turn.tail() {
        parts.push(format!("Recent transcript:\n{tail}"));
    }
    parts.push(JSON_INSTRUCTION.to_string());

    parts.join("\n")
}

fn roster_line(character: &SeedCharacter) -> String {
    let mut line = format!("- {}", character.name);
    if !character.traits.is_empty() {
        line.push_str(&format!(" ({})", character.traits.join(", ")));
    }
    if let Some(summary) = non_empty(character.summary.as_deref()) {
        line.push_str(&format!(": {summary}"));
    }
    line
}
