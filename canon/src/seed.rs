//! Seed data: the world, cast and canon references a session starts from.
//!
//! Seeds arrive as loosely typed JSON or YAML. `validate_seed` turns such a
//! value into a structured `SeedData` and collects human-readable warnings
//! for every field it had to coerce or drop. Validation is advisory: the
//! returned seed is always usable.

use indexmap::IndexSet;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// World framing for the narration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedWorld {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

/// A member of the cast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedCharacter {
    pub name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl SeedCharacter {
    /// Create a character with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the character traits.
    pub fn with_traits<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits = traits.into_iter().map(Into::into).collect();
        self
    }

    /// Set the character summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Structured seed for one session.
///
/// Built once per session and replaced wholesale on reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedData {
    pub world: Option<SeedWorld>,
    pub characters: Vec<SeedCharacter>,
    pub canon_references: IndexSet<String>,
}

impl SeedData {
    /// World title, if one was given.
    pub fn title(&self) -> Option<&str> {
        self.world.as_ref().and_then(|w| w.title.as_deref())
    }

    /// World tone, if one was given.
    pub fn tone(&self) -> Option<&str> {
        self.world.as_ref().and_then(|w| w.tone.as_deref())
    }

    /// World synopsis, if one was given.
    pub fn synopsis(&self) -> Option<&str> {
        self.world.as_ref().and_then(|w| w.synopsis.as_deref())
    }

    /// Render the seed in the on-disk JSON shape.
    pub fn to_json_pretty(&self) -> Result<String> {
        #[derive(Serialize)]
        struct CanonRefs<'a> {
            references: &'a IndexSet<String>,
        }

        #[derive(Serialize)]
        struct SeedFile<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            world: Option<&'a SeedWorld>,
            characters: &'a [SeedCharacter],
            canon: CanonRefs<'a>,
        }

        let file = SeedFile {
            world: self.world.as_ref(),
            characters: &self.characters,
            canon: CanonRefs {
                references: &self.canon_references,
            },
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}

/// A parsed seed together with the issues found while parsing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedSeed {
    pub seed: SeedData,
    pub warnings: Vec<String>,
}

impl ValidatedSeed {
    /// Wrap a seed that needs no validation.
    pub fn clean(seed: SeedData) -> Self {
        Self {
            seed,
            warnings: Vec::new(),
        }
    }
}

/// Parse a seed from raw JSON text. Unparsable text yields an empty seed and a warning.
pub fn parse_seed_json(raw: &str) -> ValidatedSeed {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => validate_seed(&value),
        Err(e) => ValidatedSeed {
            seed: SeedData::default(),
            warnings: vec![format!("Seed could not be parsed: {e}")],
        },
    }
}

/// Convert a loosely typed seed value into `SeedData`, collecting warnings.
pub fn validate_seed(value: &Value) -> ValidatedSeed {
    let mut warnings = Vec::new();

    let root = match value {
        Value::Null => {
            warnings.push("Seed is empty. Using defaults.".to_string());
            return ValidatedSeed {
                seed: SeedData::default(),
                warnings,
            };
        }
        Value::Object(root) => root,
        _ => {
            warnings.push("Seed should be an object. Using defaults.".to_string());
            return ValidatedSeed {
                seed: SeedData::default(),
                warnings,
            };
        }
    };

    let world = match root.get("world") {
        None | Some(Value::Null) => None,
        Some(Value::Object(world)) => Some(SeedWorld {
            title: string_field(world, "title", "world.title", &mut warnings),
            tone: string_field(world, "tone", "world.tone", &mut warnings),
            synopsis: string_field(world, "synopsis", "world.synopsis", &mut warnings),
        }),
        Some(_) => {
            warnings.push("world should be an object.".to_string());
            None
        }
    };

    let characters = match root.get("characters") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| validate_character(i, entry, &mut warnings))
            .collect(),
        Some(_) => {
            warnings.push("characters should be an array.".to_string());
            Vec::new()
        }
    };

    let canon_references = match root.get("canon") {
        None | Some(Value::Null) => IndexSet::new(),
        Some(Value::Object(canon)) => match canon.get("references") {
            None | Some(Value::Null) => IndexSet::new(),
            Some(Value::Array(refs)) => string_list(refs, "canon.references", &mut warnings)
                .into_iter()
                .collect(),
            Some(_) => {
                warnings.push("canon.references should be an array of strings.".to_string());
                IndexSet::new()
            }
        },
        Some(_) => {
            warnings.push("canon should be an object.".to_string());
            IndexSet::new()
        }
    };

    ValidatedSeed {
        seed: SeedData {
            world,
            characters,
            canon_references,
        },
        warnings,
    }
}

fn validate_character(
    index: usize,
    entry: &Value,
    warnings: &mut Vec<String>,
) -> Option<SeedCharacter> {
    let Value::Object(fields) = entry else {
        warnings.push(format!("characters[{index}] should be an object."));
        warnings.push(format!(
            "characters[{index}].name should be a non-empty string."
        ));
        return None;
    };

    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        other => {
            warnings.push(format!(
                "characters[{index}].name should be a non-empty string."
            ));
            // Keep the character when the name is a usable scalar such as a number.
            other
                .and_then(scalar_to_string)
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())?
        }
    };

    let traits = match fields.get("traits") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            string_list(items, &format!("characters[{index}].traits"), warnings)
        }
        Some(_) => {
            warnings.push(format!(
                "characters[{index}].traits should be an array of strings."
            ));
            Vec::new()
        }
    };

    let summary = string_field(
        fields,
        "summary",
        &format!("characters[{index}].summary"),
        warnings,
    );

    Some(SeedCharacter {
        name,
        traits,
        summary,
    })
}

/// Read an optional string field, coercing scalars and warning on anything else.
fn string_field(
    fields: &Map<String, Value>,
    key: &str,
    path: &str,
    warnings: &mut Vec<String>,
) -> Option<String> {
    match fields.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()).filter(|s| !s.is_empty()),
        Some(other) => {
            warnings.push(format!("{path} should be a string."));
            scalar_to_string(other)
        }
    }
}

fn string_list(items: &[Value], path: &str, warnings: &mut Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(items.len());
    let mut warned = false;
    for item in items {
        if let Value::String(s) = item {
            out.push(s.clone());
            continue;
        }
        if !warned {
            warnings.push(format!("{path} should be an array of strings."));
            warned = true;
        }
        if let Some(s) = scalar_to_string(item) {
            out.push(s);
        }
    }
    out
}

/// Render a scalar JSON value as text; arrays, objects and null give `None`.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
