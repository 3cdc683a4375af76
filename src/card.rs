//! Card data model shared by the scheduler, the pipeline and the session.
//!
//! Everything here is transient and request-scoped: a [`CardContent`] is
//! fetched once per review, converted once into a [`ConversionResult`], and
//! dropped when the next card is fetched.

use crate::error::Anki2MdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a card as assigned by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw HTML for both sides of one card, as rendered by Anki.
///
/// The answer side usually repeats the question followed by
/// `<hr id=answer>`; the pipeline keeps that marker as a divider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardContent {
    pub card_id: CardId,
    pub question: String,
    pub answer: String,
}

/// Markdown for both sides of one card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub question_markdown: String,
    pub answer_markdown: String,
}

/// The four-level grade submitted after reviewing a card, worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Again,
    Hard,
    Good,
    Easy,
}

impl Ease {
    /// All grades, worst first.
    pub const ALL: [Ease; 4] = [Ease::Again, Ease::Hard, Ease::Good, Ease::Easy];

    /// Numeric value understood by Anki (1–4).
    pub fn value(self) -> u8 {
        match self {
            Ease::Again => 1,
            Ease::Hard => 2,
            Ease::Good => 3,
            Ease::Easy => 4,
        }
    }

    /// Inverse of [`Ease::value`].
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Ease::Again),
            2 => Some(Ease::Hard),
            3 => Some(Ease::Good),
            4 => Some(Ease::Easy),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Ease::Again => "again",
            Ease::Hard => "hard",
            Ease::Good => "good",
            Ease::Easy => "easy",
        }
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Ease {
    type Err = Anki2MdError;

    /// Accepts the grade names (any case) or their digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u8>() {
            if let Some(ease) = Ease::from_value(n) {
                return Ok(ease);
            }
        }
        Ease::ALL
            .into_iter()
            .find(|e| e.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Anki2MdError::InvalidEase {
                input: s.to_string(),
            })
    }
}
