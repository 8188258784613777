//! # Canon
//!
//! World-lore material for the ghostwriter pipeline:
//!
//! - **CanonIndex**: a small in-memory corpus searched by raw term occurrence
//! - **Snippets**: the densest fixed-size window of a matching document
//! - **Seed data**: world, cast and canon references, validated with warnings
//!
//! ```text
//! canon dir ──► CanonIndex::load ──► search(query, k) ──► snippets
//! seed path ──► load_seed ──► ValidatedSeed { seed, warnings }
//! ```

pub mod error;
pub mod index;
pub mod loader;
pub mod seed;
pub mod snippet;

pub use error::{CanonError, Result};
pub use index::{CanonDocument, CanonHit, CanonIndex, VECTOR_INDEX_SUFFIX};
pub use loader::{SeedDefaults, build_composite_seed, load_seed, placeholder_seed, write_seed};
pub use seed::{
    SeedCharacter, SeedData, SeedWorld, ValidatedSeed, parse_seed_json, validate_seed,
};
pub use snippet::{DEFAULT_SNIPPET_WINDOW, Snippet, extract_snippet, tokenize};
