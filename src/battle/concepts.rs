//! Concept corpus the AI draws its attacks from

use crate::core::error::{GameError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::path::Path;

/// Used whenever the corpus is missing or empty
pub const FALLBACK_CONCEPTS: [&str; 8] = [
    "Fire", "Water", "Wolf", "Rock", "Lightning", "Ice", "Wind", "Dragon",
];

pub trait ConceptCorpus: Send {
    /// `None` means the corpus is unavailable; callers fall back to [`FALLBACK_CONCEPTS`].
    fn pick_random(&mut self) -> Option<String>;
}

/// In-memory concept list with a seeded generator
pub struct StaticCorpus {
    concepts: Vec<String>,
    rng: ChaCha8Rng,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusEntry {
    Named { name: String },
    Plain(String),
}

impl StaticCorpus {
    pub fn new(concepts: Vec<String>, seed: u64) -> Self {
        let concepts = concepts
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self {
            concepts,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Built-in list only
    pub fn fallback(seed: u64) -> Self {
        Self::new(FALLBACK_CONCEPTS.iter().map(|c| c.to_string()).collect(), seed)
    }

    /// Accepts `["Fire", ...]` or a materials table `[{"name": "Fire", ...}, ...]`
    pub fn from_json_str(source: &str, seed: u64) -> Result<Self> {
        let entries: Vec<CorpusEntry> = serde_json::from_str(source)?;
        let concepts: Vec<String> = entries
            .into_iter()
            .map(|entry| match entry {
                CorpusEntry::Named { name } => name,
                CorpusEntry::Plain(name) => name,
            })
            .collect();
        if concepts.is_empty() {
            return Err(GameError::InvalidConcept("concept corpus is empty".into()));
        }
        Ok(Self::new(concepts, seed))
    }

    pub fn from_json_file(path: impl AsRef<Path>, seed: u64) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source, seed)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

impl ConceptCorpus for StaticCorpus {
    fn pick_random(&mut self) -> Option<String> {
        self.concepts.choose(&mut self.rng).cloned()
    }
}

/// A player-submitted concept: trimmed, non-empty, at most `max_chars` characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptInput(String);

impl ConceptInput {
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GameError::InvalidConcept("empty concept".into()));
        }
        let concept: String = trimmed.chars().take(max_chars).collect();
        Ok(Self(concept.trim_end().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Pick from the built-in list
pub fn fallback_concept(rng: &mut impl rand::Rng) -> String {
    FALLBACK_CONCEPTS
        .choose(rng)
        .copied()
        .unwrap_or("Fire")
        .to_string()
}
