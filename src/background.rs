//! Runs organizer passes off the calling thread.
//!
//! Each `load` or `process` invocation gets exactly one spawned thread. A
//! busy flag makes the organizer single-flight: starting a pass while
//! another is running fails with [`OrganizerError::Busy`] instead of
//! queueing.

use crate::error::{OrganizerError, Result};
use crate::events::{EventBus, EventReceiver};
use crate::medium::MediumRecord;
use crate::organizer::{
    BatchOrganizer, CancelFlag, LoadReport, LoadRequest, OrganizerState, ProcessReport,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Handle to a pass running in the background.
pub struct PassHandle<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T> PassHandle<T> {
    /// Wait for the pass and return its result.
    pub fn join(self) -> Result<T> {
        self.handle.join().map_err(|_| OrganizerError::WorkerLost)?
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Clears the busy flag when the pass ends, including by panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A [`BatchOrganizer`] driven from background threads.
#[derive(Clone)]
pub struct BackgroundOrganizer {
    inner: Arc<Mutex<BatchOrganizer>>,
    busy: Arc<AtomicBool>,
    events: EventBus,
    cancel: CancelFlag,
}

impl Default for BackgroundOrganizer {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundOrganizer {
    pub fn new() -> Self {
        let organizer = BatchOrganizer::new();
        let events = organizer.events().clone();
        let cancel = organizer.cancel_flag();
        Self {
            inner: Arc::new(Mutex::new(organizer)),
            busy: Arc::new(AtomicBool::new(false)),
            events,
            cancel,
        }
    }

    /// Subscribe to events. Works while a pass is running.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Ask the running pass to stop before its next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start a load pass on a new thread.
    ///
    /// # Errors
    ///
    /// Returns `OrganizerError::Busy` if a pass is already running.
    pub fn spawn_load(&self, request: LoadRequest) -> Result<PassHandle<LoadReport>> {
        self.spawn("load", move |organizer| {
            organizer.load(&request).map_err(OrganizerError::from)
        })
    }

    /// Start a process pass on a new thread.
    ///
    /// # Errors
    ///
    /// Returns `OrganizerError::Busy` if a pass is already running.
    pub fn spawn_process(&self) -> Result<PassHandle<ProcessReport>> {
        self.spawn("process", |organizer| {
            organizer.process().map_err(OrganizerError::from)
        })
    }

    fn spawn<T, F>(&self, pass: &'static str, run: F) -> Result<PassHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut BatchOrganizer) -> Result<T> + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(OrganizerError::Busy);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));
        let inner = Arc::clone(&self.inner);

        debug!(pass, "Spawning background pass");
        let handle = thread::spawn(move || {
            let _guard = guard;
            let mut organizer = lock(&inner);
            run(&mut organizer)
        });

        Ok(PassHandle { handle })
    }

    /// Current state, or `Busy` while a pass holds the organizer.
    pub fn state(&self) -> Result<OrganizerState> {
        self.with_idle(|organizer| organizer.state())
    }

    /// Copy of the result set, or `Busy` while a pass holds the organizer.
    ///
    /// Use [`subscribe`](Self::subscribe) to follow admissions live.
    pub fn snapshot(&self) -> Result<Vec<MediumRecord>> {
        self.with_idle(|organizer| organizer.results().as_slice().to_vec())
    }

    fn with_idle<R>(&self, read: impl FnOnce(&BatchOrganizer) -> R) -> Result<R> {
        if self.is_busy() {
            return Err(OrganizerError::Busy);
        }
        Ok(read(&lock(&self.inner)))
    }
}

fn lock(inner: &Mutex<BatchOrganizer>) -> MutexGuard<'_, BatchOrganizer> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
