//! Scheduler seam: where due cards come from and where answers go.
//!
//! The crate never decides which card is due; that is Anki's job. The
//! [`Scheduler`] trait captures the two capabilities the review flow needs,
//! and the two AnkiConnect-backed strategies differ only in *how* they ask:
//!
//! * [`DirectLookup`] — search `deck:"…" is:due`, take the first id, read it
//!   with `cardsInfo`, answer with `answerCards`. Leaves Anki's GUI alone.
//! * [`GuiSession`] — open Anki's reviewer on the deck and mirror whatever
//!   card it shows, answering through the reviewer.
//!
//! Both share one [`AnkiConnect`] handle; [`scheduler_for`] picks one from the
//! configured [`Strategy`].

use crate::anki::AnkiConnect;
use crate::card::{CardContent, CardId, Ease};
use crate::config::Strategy;
use crate::error::Anki2MdError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// A source of due cards that also records answers.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// The next card due in `deck`, or `None` when nothing is due.
    async fn next_due_card(&self, deck: &str) -> Result<Option<CardContent>, Anki2MdError>;

    /// Record `ease` for `card_id`.
    async fn answer(&self, card_id: CardId, ease: Ease) -> Result<(), Anki2MdError>;
}

#[async_trait]
impl<T: Scheduler + ?Sized> Scheduler for Arc<T> {
    async fn next_due_card(&self, deck: &str) -> Result<Option<CardContent>, Anki2MdError> {
        (**self).next_due_card(deck).await
    }

    async fn answer(&self, card_id: CardId, ease: Ease) -> Result<(), Anki2MdError> {
        (**self).answer(card_id, ease).await
    }
}

/// Build the scheduler for `strategy` on a shared client.
pub fn scheduler_for(strategy: Strategy, client: Arc<AnkiConnect>) -> Arc<dyn Scheduler> {
    match strategy {
        Strategy::DirectLookup => Arc::new(DirectLookup::new(client)),
        Strategy::GuiSession => Arc::new(GuiSession::new(client)),
    }
}

/// Anki search query for the due cards of `deck`.
///
/// Quotes inside the deck name are escaped so the name stays one search term.
pub fn due_query(deck: &str) -> String {
    format!("deck:\"{}\" is:due", deck.replace('"', "\\\""))
}

// ── Direct lookup ────────────────────────────────────────────────────────

/// Picks the first due card from a search, without touching the GUI.
///
/// When several cards are due the first id returned by the search wins; that
/// is not necessarily the order Anki's reviewer would use.
#[derive(Debug, Clone)]
pub struct DirectLookup {
    client: Arc<AnkiConnect>,
}

impl DirectLookup {
    pub fn new(client: Arc<AnkiConnect>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Scheduler for DirectLookup {
    async fn next_due_card(&self, deck: &str) -> Result<Option<CardContent>, Anki2MdError> {
        let due = self.client.find_cards(&due_query(deck)).await?;
        debug!("{} due card(s) in '{}'", due.len(), deck);

        let Some(&first) = due.first() else {
            return Ok(None);
        };

        let info = self.client.cards_info(&[first]).await?;
        Ok(info.into_iter().next().map(|card| CardContent {
            card_id: CardId(card.card_id),
            question: card.question,
            answer: card.answer,
        }))
    }

    async fn answer(&self, card_id: CardId, ease: Ease) -> Result<(), Anki2MdError> {
        let recorded = self.client.answer_cards(&[(card_id, ease)]).await?;
        if recorded.first().copied().unwrap_or(false) {
            info!("Answered card {} with {}", card_id, ease);
            Ok(())
        } else {
            Err(Anki2MdError::AnswerRejected { card_id: card_id.0 })
        }
    }
}

// ── GUI session ──────────────────────────────────────────────────────────

/// Mirrors the card shown in Anki's own reviewer.
#[derive(Debug, Clone)]
pub struct GuiSession {
    client: Arc<AnkiConnect>,
}

impl GuiSession {
    pub fn new(client: Arc<AnkiConnect>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Scheduler for GuiSession {
    async fn next_due_card(&self, deck: &str) -> Result<Option<CardContent>, Anki2MdError> {
        if !self.client.gui_deck_review(deck).await? {
            return Err(Anki2MdError::AnkiConnect {
                action: "guiDeckReview".into(),
                message: format!("could not open deck '{deck}' for review"),
            });
        }

        let current = self.client.gui_current_card().await?;
        Ok(current.map(|card| CardContent {
            card_id: CardId(card.card_id),
            question: card.question,
            answer: card.answer,
        }))
    }

    async fn answer(&self, card_id: CardId, ease: Ease) -> Result<(), Anki2MdError> {
        let shown = self
            .client
            .gui_current_card()
            .await?
            .map(|card| card.card_id);
        ensure_same_card(card_id, shown)?;

        // The reviewer only accepts an ease once the answer side is showing.
        self.client.gui_show_answer().await?;
        if self.client.gui_answer_card(ease).await? {
            info!("Answered card {} with {} via reviewer", card_id, ease);
            Ok(())
        } else {
            Err(Anki2MdError::AnswerRejected { card_id: card_id.0 })
        }
    }
}

/// The reviewer must still be showing the card being answered.
fn ensure_same_card(expected: CardId, shown: Option<u64>) -> Result<(), Anki2MdError> {
    match shown {
        Some(id) if id == expected.0 => Ok(()),
        Some(id) => Err(Anki2MdError::CardMismatch {
            expected: expected.0,
            shown: id,
        }),
        None => Err(Anki2MdError::AnswerRejected {
            card_id: expected.0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReviewConfig;

    #[test]
    fn due_query_quotes_deck() {
        assert_eq!(due_query("Japanese"), "deck:\"Japanese\" is:due");
        assert_eq!(due_query("Lang::Core 2k"), "deck:\"Lang::Core 2k\" is:due");
        assert_eq!(due_query("a\"b"), "deck:\"a\\\"b\" is:due");
    }

    #[test]
    fn same_card_check() {
        assert!(ensure_same_card(CardId(3), Some(3)).is_ok());
        assert!(matches!(
            ensure_same_card(CardId(3), Some(4)),
            Err(Anki2MdError::CardMismatch { expected: 3, shown: 4 })
        ));
        assert!(matches!(
            ensure_same_card(CardId(3), None),
            Err(Anki2MdError::AnswerRejected { card_id: 3 })
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        // Port 9 (discard) is closed on test machines; the connection is refused.
        let config = ReviewConfig::builder()
            .endpoint("http://127.0.0.1:9")
            .request_timeout_secs(2)
            .build()
            .unwrap();
        let client = Arc::new(AnkiConnect::new(&config).unwrap());
        let scheduler = scheduler_for(Strategy::DirectLookup, client);
        let err = scheduler.next_due_card("Default").await.unwrap_err();
        assert!(err.is_unavailable(), "got: {err}");
    }
}
