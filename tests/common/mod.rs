//! Stub collaborators shared by the integration tests.

#![allow(dead_code)]

use anki2md::{Anki2MdError, CardContent, CardId, Ease, MediaStore, Scheduler};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ── Media store ──────────────────────────────────────────────────────────────

/// In-memory media store that counts lookups and can be slowed down.
#[derive(Default)]
pub struct CountingStore {
    files: HashMap<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, payload: &str) -> Self {
        self.files.insert(name.to_string(), payload.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaStore for CountingStore {
    async fn retrieve(&self, filename: &str) -> Result<Option<String>, Anki2MdError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.files.get(filename).cloned())
    }
}

// ── Scheduler ────────────────────────────────────────────────────────────────

/// One scripted reply to `next_due_card`.
pub struct Due {
    pub delay: Duration,
    pub card: Result<Option<CardContent>, Anki2MdError>,
}

impl Due {
    pub fn card(id: u64, delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            card: Ok(Some(card(id))),
        }
    }

    pub fn empty() -> Self {
        Self {
            delay: Duration::ZERO,
            card: Ok(None),
        }
    }

    pub fn unreachable(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            card: Err(Anki2MdError::Unreachable {
                endpoint: "stub".into(),
                reason: "connection refused".into(),
            }),
        }
    }
}

/// Scheduler replaying scripted fetch replies in call order.
#[derive(Default)]
pub struct StubScheduler {
    replies: Mutex<VecDeque<Due>>,
    reject_answers: bool,
    answer_delay: Duration,
    answers: Mutex<Vec<(CardId, Ease)>>,
}

impl StubScheduler {
    pub fn new(replies: impl IntoIterator<Item = Due>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn rejecting_answers(mut self) -> Self {
        self.reject_answers = true;
        self
    }

    pub fn with_answer_delay(mut self, delay: Duration) -> Self {
        self.answer_delay = delay;
        self
    }

    pub fn answers(&self) -> Vec<(CardId, Ease)> {
        self.answers.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scheduler for StubScheduler {
    async fn next_due_card(&self, _deck: &str) -> Result<Option<CardContent>, Anki2MdError> {
        let reply = self.replies.lock().unwrap().pop_front();
        let Some(reply) = reply else {
            return Ok(None);
        };
        tokio::time::sleep(reply.delay).await;
        reply.card
    }

    async fn answer(&self, card_id: CardId, ease: Ease) -> Result<(), Anki2MdError> {
        tokio::time::sleep(self.answer_delay).await;
        if self.reject_answers {
            return Err(Anki2MdError::AnswerRejected { card_id: card_id.0 });
        }
        self.answers.lock().unwrap().push((card_id, ease));
        Ok(())
    }
}

/// A card whose question names its id, so tests can tell cards apart.
pub fn card(id: u64) -> CardContent {
    CardContent {
        card_id: CardId(id),
        question: format!("<p>Question {id}</p>"),
        answer: format!("<p>Question {id}</p><hr id=answer><p>Answer {id}</p>"),
    }
}
