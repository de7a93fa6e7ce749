use serde::{Deserialize, Serialize};
use std::fmt;

/// Text injected into prompts when retrieval produced nothing usable.
pub const NO_CONTEXT_FOUND: &str = "No relevant context found.";

/// Separator placed between passages inside a [`ContextBlock`].
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// A single passage returned by the semantic index.
///
/// `score` is a similarity measure where higher means more relevant. It is
/// not normalized to any fixed range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub text: String,
    pub score: f32,
}

impl ScoredPassage {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// The context text actually placed in a generation prompt.
///
/// Never blank: when there is nothing to show it holds [`NO_CONTEXT_FOUND`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBlock {
    text: String,
    fallback: bool,
}

impl ContextBlock {
    /// The placeholder block used when no passages are available.
    pub fn fallback() -> Self {
        Self {
            text: NO_CONTEXT_FOUND.to_string(),
            fallback: true,
        }
    }

    /// Joins passage texts in the given order, skipping blank ones. Nothing
    /// left to join yields the fallback block.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let kept: Vec<&str> = texts
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .collect();
        if kept.is_empty() {
            return Self::fallback();
        }
        Self {
            text: kept.join(PASSAGE_SEPARATOR),
            fallback: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether this block is the placeholder rather than retrieved text.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

impl fmt::Display for ContextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
