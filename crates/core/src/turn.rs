use serde::{Deserialize, Serialize};
use std::fmt;

/// The speaking roles of a podcast segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Asks the questions a listener would want answered.
    Curious,
    /// Answers questions, grounded in retrieved context.
    Explainer,
    /// Optional host voice framing a segment. Never generated, only voiced.
    Moderator,
}

impl Role {
    /// Fixed playback order used when segments are combined.
    pub const PLAYBACK_ORDER: [Role; 3] = [Role::Curious, Role::Explainer, Role::Moderator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Curious => "curious",
            Role::Explainer => "explainer",
            Role::Moderator => "moderator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question/answer exchange between the Curious and Explainer roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based position within its episode.
    pub index: usize,
    pub curious_question: String,
    pub explainer_answer: String,
    pub is_wrap_up: bool,
}

/// An ordered sequence of turns forming one podcast segment.
pub type Episode = Vec<Turn>;

/// A user-submitted question answered by the Explainer. Always a wrap-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interjection {
    pub user_text: String,
    pub explainer_answer: String,
}

/// Whether the turn at zero-based `position` closes an episode of `total` turns.
///
/// Depends only on the position and length, never on retrieval results.
pub fn is_wrap_up(position: usize, total: usize) -> bool {
    position + 1 == total
}
