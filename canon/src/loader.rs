//! Seed loading from JSON files and composite seed directories.
//!
//! A composite seed directory holds loose lore files:
//!
//! - `info.txt` and `timeline.txt` form the synopsis
//! - `Characters.yaml` lists the cast (as a list or a map keyed by name)
//! - `Items.yaml` and `Quests.yaml` list named references
//! - every other `*.yaml` file names a location
//!
//! Every part is optional and read best-effort.

use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::seed::{
    SeedCharacter, SeedData, SeedWorld, ValidatedSeed, parse_seed_json, scalar_to_string,
};

const CHARACTERS_FILE: &str = "Characters.yaml";
const ITEMS_FILE: &str = "Items.yaml";
const QUESTS_FILE: &str = "Quests.yaml";

/// World framing applied to composite seeds, which carry no title or tone of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedDefaults {
    pub title: String,
    pub tone: String,
}

impl Default for SeedDefaults {
    fn default() -> Self {
        Self {
            title: "Fanfic World".to_string(),
            tone: "adventurous, character-driven".to_string(),
        }
    }
}

/// The seed used when no seed path is configured or it does not exist.
pub fn placeholder_seed() -> SeedData {
    SeedData {
        world: Some(SeedWorld {
            title: Some("Seedless Realm".to_string()),
            tone: Some("exploratory".to_string()),
            synopsis: Some("A placeholder world used when no seed is provided.".to_string()),
        }),
        characters: vec![SeedCharacter::new("Narrator").with_summary("An impartial observer.")],
        canon_references: IndexSet::new(),
    }
}

/// Load a seed from a JSON file or a composite seed directory.
///
/// Never fails: a missing path gives the placeholder seed, an unreadable or
/// malformed JSON file gives an empty seed plus a warning.
pub fn load_seed(path: Option<&Path>, defaults: &SeedDefaults) -> ValidatedSeed {
    let Some(path) = path.filter(|p| p.exists()) else {
        debug!("No seed found, using placeholder seed");
        return ValidatedSeed::clean(placeholder_seed());
    };

    if path.is_dir() {
        return ValidatedSeed::clean(build_composite_seed(path, defaults));
    }

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        return match fs::read_to_string(path) {
            Ok(raw) => parse_seed_json(&raw),
            Err(e) => {
                warn!("Failed to read seed {}: {e}", path.display());
                ValidatedSeed {
                    seed: SeedData::default(),
                    warnings: vec![format!("Seed could not be read: {e}")],
                }
            }
        };
    }

    match path.parent() {
        Some(dir) => ValidatedSeed::clean(build_composite_seed(dir, defaults)),
        None => ValidatedSeed::clean(placeholder_seed()),
    }
}

/// Assemble a seed from the loose files of a composite seed directory.
pub fn build_composite_seed(dir: &Path, defaults: &SeedDefaults) -> SeedData {
    let info = read_text_safe(&dir.join("info.txt"));
    let timeline = read_text_safe(&dir.join("timeline.txt"));

    let mut parts = Vec::new();
    if !info.is_empty() {
        parts.push(info);
    }
    if !timeline.is_empty() {
        parts.push(format!("Timeline:\n{timeline}"));
    }
    let synopsis = Some(parts.join("\n\n")).filter(|s| !s.is_empty());

    let characters = read_yaml(&dir.join(CHARACTERS_FILE))
        .map(|value| parse_characters(&value))
        .unwrap_or_default();

    let mut canon_references = IndexSet::new();
    for list in [ITEMS_FILE, QUESTS_FILE] {
        if let Some(value) = read_yaml(&dir.join(list)) {
            canon_references.extend(parse_name_list(&value));
        }
    }
    canon_references.extend(location_names(dir));

    SeedData {
        world: Some(SeedWorld {
            title: Some(defaults.title.clone()),
            tone: Some(defaults.tone.clone()),
            synopsis,
        }),
        characters,
        canon_references,
    }
}

/// Write `seed` as pretty JSON to `out`.
pub fn write_seed(seed: &SeedData, out: &Path) -> Result<()> {
    fs::write(out, seed.to_json_pretty()?)?;
    Ok(())
}

fn read_text_safe(path: &Path) -> String {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn read_yaml(path: &Path) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let parsed: Result<Value> = fs::read_to_string(path)
        .map_err(Into::into)
        .and_then(|raw| serde_yaml::from_str(&raw).map_err(Into::into));
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Skipping seed file {}: {e}", path.display());
            None
        }
    }
}

/// First truthy field among `keys`, rendered as trimmed text.
fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .filter_map(scalar_to_string)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn character_from(name: String, value: &Value) -> SeedCharacter {
    let traits = value
        .get("traits")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar_to_string).collect())
        .unwrap_or_default();

    SeedCharacter {
        name,
        traits,
        summary: first_text(value, &["summary", "description", "bio"]),
    }
}

fn parse_characters(value: &Value) -> Vec<SeedCharacter> {
    match value {
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| {
                let name = match entry {
                    Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
                    _ => first_text(entry, &["name", "id", "title"]),
                }?;
                Some(character_from(name, entry))
            })
            .collect(),
        Value::Object(entries) => entries
            .iter()
            .filter_map(|(key, entry)| {
                let name = first_text(entry, &["name"])
                    .or_else(|| Some(key.trim().to_string()))
                    .filter(|s| !s.is_empty())?;
                Some(character_from(name, entry))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_name_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| {
                first_text(entry, &["name", "title", "id"]).or_else(|| {
                    scalar_to_string(entry)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                })
            })
            .collect(),
        Value::Object(entries) => entries
            .iter()
            .filter_map(|(key, entry)| {
                first_text(entry, &["name", "title"])
                    .or_else(|| Some(key.trim().to_string()))
                    .filter(|s| !s.is_empty())
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Stems of the remaining `*.yaml` files, sorted.
fn location_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| {
            name.to_lowercase().ends_with(".yaml")
                && ![CHARACTERS_FILE, ITEMS_FILE, QUESTS_FILE].contains(&name.as_str())
        })
        .filter_map(|name| {
            Path::new(&name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .collect();
    names.sort();
    names
}
