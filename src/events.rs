//! Observable progress for the load and process passes.
//!
//! The organizer never exposes mutable progress fields. Every change is
//! pushed as an [`Event`] to each subscriber, in emission order, so any two
//! observers see exactly the same sequence.
//!
//! ```
//! use mediatidy::events::{Event, EventBus};
//!
//! let bus = EventBus::new();
//! let receiver = bus.subscribe();
//! bus.emit(Event::Progress(50));
//! assert!(matches!(receiver.try_recv(), Some(Event::Progress(50))));
//! ```

use crate::organizer::OrganizerState;
use chrono::NaiveDateTime;
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Everything the organizer reports while it works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// The organizer moved to a new state.
    StateChanged(OrganizerState),
    /// Percentage of files examined (load) or records handled (process).
    Progress(u8),
    /// Human-readable count of retained files.
    Summary(String),
    /// A file was admitted to the result set.
    Admitted {
        name: String,
        path: PathBuf,
        size_bytes: u64,
        date_taken: NaiveDateTime,
    },
    /// A retained file was replaced by a same-named, larger-or-equal one.
    Superseded {
        name: String,
        path: PathBuf,
        size_bytes: u64,
    },
    /// A record was moved into the destination tree.
    Moved { path: PathBuf, destination: PathBuf },
    /// The load pass finished.
    LoadFinished { retained: usize },
    /// The process pass finished.
    ProcessFinished { moved: usize },
}

/// Receiving end handed to a subscriber.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event arrives. Returns `None` once the bus is gone.
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Take the next event if one is waiting.
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate over events until the bus is dropped.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Drain every event currently queued without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Fans events out to any number of subscribers.
///
/// Cloning the bus shares the subscriber list, so a handle kept outside a
/// running pass can still add subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<Event>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber. It sees every event emitted from now on.
    pub fn subscribe(&self) -> EventReceiver {
        let (sender, receiver) = unbounded();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(sender);
        }
        EventReceiver { inner: receiver }
    }

    /// Send an event to every live subscriber. Dropped receivers are pruned.
    pub fn emit(&self, event: Event) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        }
    }

    /// Number of live subscribers as of the last emit.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Summary line for a count of retained files.
pub fn summary_message(count: usize) -> String {
    match count {
        0 => "No files found".to_string(),
        1 => "1 file found".to_string(),
        n => format!("{} files found", n),
    }
}
