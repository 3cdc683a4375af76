//! Review session: request-keyed state for a fetch → show → answer loop.
//!
//! A display layer may start a new fetch while an older one is still
//! converting (the user pressed reload). Results are therefore keyed by
//! [`RequestId`]: only the most recently started request may install its
//! card, and anything older reports [`FetchOutcome::Stale`] and is dropped.
//!
//! Answering keeps the shown card on failure, so a rejected or failed
//! submission never blanks the screen. At most one answer per card is in
//! flight; a second one is refused with [`Anki2MdError::AnswerInFlight`].
//!
//! The session holds no lock across an `.await`; state changes happen in
//! short critical sections after each external call returns.

use crate::card::{CardId, ConversionResult, Ease};
use crate::config::ReviewConfig;
use crate::convert::convert_card;
use crate::error::Anki2MdError;
use crate::media_store::MediaStore;
use crate::scheduler::Scheduler;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Identity of one fetch request within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

/// A converted card, tagged with the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewCard {
    pub request: RequestId,
    pub card_id: CardId,
    pub markdown: ConversionResult,
}

/// Result of completing a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The card is now the session's current card.
    Applied(ReviewCard),
    /// Nothing is due; the session shows no card.
    Empty,
    /// A newer request was started; this result was discarded.
    Stale,
}

#[derive(Debug, Default)]
struct State {
    latest: u64,
    pending: Option<RequestId>,
    current: Option<ReviewCard>,
    answering: Option<CardId>,
}

/// One deck's review flow over a scheduler and a media store.
pub struct ReviewSession {
    scheduler: Arc<dyn Scheduler>,
    store: Arc<dyn MediaStore>,
    deck: String,
    config: ReviewConfig,
    state: Mutex<State>,
}

impl ReviewSession {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        store: Arc<dyn MediaStore>,
        deck: impl Into<String>,
        config: ReviewConfig,
    ) -> Self {
        Self {
            scheduler,
            store,
            deck: deck.into(),
            config,
            state: Mutex::new(State::default()),
        }
    }

    pub fn deck(&self) -> &str {
        &self.deck
    }

    /// The card currently shown, if any.
    pub fn current(&self) -> Option<ReviewCard> {
        self.state().current.clone()
    }

    /// The request still in flight, if the latest one has not completed.
    pub fn pending(&self) -> Option<RequestId> {
        self.state().pending
    }

    /// Start a fetch. Any earlier request still in flight becomes stale.
    pub fn begin_fetch(&self) -> RequestId {
        let mut state = self.state();
        state.latest += 1;
        let request = RequestId(state.latest);
        state.pending = Some(request);
        debug!("Fetch {:?} started for '{}'", request, self.deck);
        request
    }

    /// Fetch and convert the next due card for `request`.
    ///
    /// Errors from a request that has since been superseded are swallowed
    /// and reported as [`FetchOutcome::Stale`].
    pub async fn fetch_next(&self, request: RequestId) -> Result<FetchOutcome, Anki2MdError> {
        let card = match self.scheduler.next_due_card(&self.deck).await {
            Ok(card) => card,
            Err(e) => {
                let mut state = self.state();
                if state.latest != request.0 {
                    return Ok(FetchOutcome::Stale);
                }
                state.pending = None;
                return Err(e);
            }
        };

        let Some(card) = card else {
            let mut state = self.state();
            if state.latest != request.0 {
                return Ok(FetchOutcome::Stale);
            }
            state.pending = None;
            state.current = None;
            info!("No cards due in '{}'", self.deck);
            return Ok(FetchOutcome::Empty);
        };

        if self.state().latest != request.0 {
            return Ok(FetchOutcome::Stale);
        }

        let markdown = convert_card(&card, self.store.as_ref(), &self.config).await;
        let review = ReviewCard {
            request,
            card_id: card.card_id,
            markdown,
        };

        let mut state = self.state();
        if state.latest != request.0 {
            debug!("Fetch {:?} superseded, dropping card {}", request, card.card_id);
            return Ok(FetchOutcome::Stale);
        }
        state.pending = None;
        state.current = Some(review.clone());
        Ok(FetchOutcome::Applied(review))
    }

    /// [`begin_fetch`](Self::begin_fetch) followed by [`fetch_next`](Self::fetch_next).
    pub async fn load_next(&self) -> Result<FetchOutcome, Anki2MdError> {
        let request = self.begin_fetch();
        self.fetch_next(request).await
    }

    /// Submit `ease` for the current card.
    ///
    /// On success the card is cleared (unless a newer card already replaced
    /// it). On failure the card stays current and the error is returned.
    pub async fn answer(&self, ease: Ease) -> Result<CardId, Anki2MdError> {
        let (request, card_id) = {
            let mut state = self.state();
            let card = state.current.as_ref().ok_or(Anki2MdError::NoCardShown)?;
            let (request, card_id) = (card.request, card.card_id);
            if state.answering == Some(card_id) {
                return Err(Anki2MdError::AnswerInFlight { card_id: card_id.0 });
            }
            state.answering = Some(card_id);
            (request, card_id)
        };

        let result = self.scheduler.answer(card_id, ease).await;

        let mut state = self.state();
        if state.answering == Some(card_id) {
            state.answering = None;
        }
        result?;
        if state.current.as_ref().map(|c| c.request) == Some(request) {
            state.current = None;
        }
        Ok(card_id)
    }

    /// The card whose answer is being submitted, if any.
    pub fn answering(&self) -> Option<CardId> {
        self.state().answering
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave `State` half-updated;
        // every critical section assigns whole fields.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
