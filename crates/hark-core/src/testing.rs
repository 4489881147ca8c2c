//! In-memory adapter used by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapter::Adapter;
use crate::error::{AdapterError, AdapterResult};
use crate::message::Message;
use crate::robot::Robot;

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub kind: &'static str,
    pub room: String,
    pub user: Option<String>,
    pub message_id: Option<String>,
    pub text: String,
}

/// Records `send`, `topic` and `play`; `emote` and `reply` keep the trait
/// defaults so they show up as sends.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    calls: Mutex<Vec<Outbound>>,
    runs: AtomicUsize,
    closed: AtomicBool,
}

impl RecordingAdapter {
    fn record(&self, kind: &'static str, message: &Message, text: &str) -> AdapterResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AdapterError::Closed);
        }
        self.calls.lock().push(Outbound {
            kind,
            room: message.room().to_owned(),
            user: message.user().map(|u| u.name().to_owned()),
            message_id: message.id().map(str::to_owned),
            text: text.to_owned(),
        });
        Ok(())
    }

    pub fn calls(&self) -> Vec<Outbound> {
        self.calls.lock().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.kind == "send")
            .map(|c| c.text.clone())
            .collect()
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Adapter for RecordingAdapter {
    async fn send(&self, message: &Message, text: &str) -> AdapterResult<()> {
        self.record("send", message, text)
    }

    async fn topic(&self, message: &Message, text: &str) -> AdapterResult<()> {
        self.record("topic", message, text)
    }

    async fn play(&self, message: &Message, text: &str) -> AdapterResult<()> {
        self.record("play", message, text)
    }

    async fn run(&self, _robot: &Robot) -> AdapterResult<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> AdapterResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
