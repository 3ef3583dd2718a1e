//! Completion handles for submitted units of work.
//!
//! `submit` pairs every unit of work with a [`Promise`] (kept by the worker
//! side) and a [`Future`] (returned to the caller). The promise writes the
//! outcome slot exactly once and only then disconnects the completion
//! channel, so a waiter that wakes up always finds the slot settled.

use crossbeam_channel::{bounded, Receiver, Sender};
use forkpool_core::error::TaskError;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

/// Outcome of a unit of work: its value or the error it reported.
pub type Outcome<T> = Result<T, TaskError>;

struct Shared<T> {
    outcome: OnceLock<Outcome<T>>,
}

/// Create a connected promise/future pair.
pub(crate) fn pair<T>() -> (Promise<T>, Future<T>) {
    let (done_tx, done_rx) = bounded(0);
    let (handle_tx, handle_rx) = bounded(0);
    let shared = Arc::new(Shared {
        outcome: OnceLock::new(),
    });

    let promise = Promise {
        shared: Some(Arc::clone(&shared)),
        done: Some(done_tx),
    };
    let future = Future {
        shared,
        done: done_rx,
        handle: handle_tx,
        handles: handle_rx,
    };
    (promise, future)
}

/// Worker-side half of a submission. Settles its future exactly once.
pub(crate) struct Promise<T> {
    shared: Option<Arc<Shared<T>>>,
    done: Option<Sender<()>>,
}

impl<T> Promise<T> {
    /// Publish the outcome and wake every waiter.
    pub(crate) fn complete(mut self, outcome: Outcome<T>) {
        self.settle(outcome);
    }

    fn settle(&mut self, outcome: Outcome<T>) {
        let (Some(shared), Some(done)) = (self.shared.take(), self.done.take()) else {
            return;
        };
        let _ = shared.outcome.set(outcome);
        // Release our reference before signalling so the sole remaining
        // handle can take the outcome by value.
        drop(shared);
        drop(done);
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        self.settle(Err(TaskError::Abandoned));
    }
}

/// Handle on the outcome of a submitted unit of work.
///
/// Clones observe the same outcome, so any number of threads may wait on
/// it, either through clones or through a shared reference.
pub struct Future<T> {
    // Declared before `handle` so a dropped clone releases the outcome
    // before it stops counting as a live handle.
    shared: Arc<Shared<T>>,
    done: Receiver<()>,
    /// Never sends; `handles` disconnects once every clone is dropped.
    handle: Sender<()>,
    handles: Receiver<()>,
}

impl<T> Future<T> {
    /// Block until the unit of work has run and return its outcome.
    pub fn wait(&self) -> &Outcome<T> {
        loop {
            if let Some(outcome) = self.shared.outcome.get() {
                return outcome;
            }
            // Disconnects only after the outcome slot has been written.
            let _ = self.done.recv();
        }
    }

    /// Block for at most `timeout`; `None` if the unit has not finished yet.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<&Outcome<T>> {
        if let Some(outcome) = self.shared.outcome.get() {
            return Some(outcome);
        }
        let _ = self.done.recv_timeout(timeout);
        self.shared.outcome.get()
    }

    /// Non-blocking peek.
    ///
    /// `None` means not yet settled; `Some(Ok(_))` settled without error;
    /// `Some(Err(_))` settled with the unit's error.
    pub fn try_result(&self) -> Option<&Outcome<T>> {
        self.shared.outcome.get()
    }

    /// Whether the outcome is available.
    pub fn is_done(&self) -> bool {
        self.shared.outcome.get().is_some()
    }

    /// Wait and return the unit's error, or `None` if it succeeded.
    pub fn err(&self) -> Option<&TaskError> {
        self.wait().as_ref().err()
    }

    /// Receiver that disconnects once the outcome is available.
    ///
    /// Useful as a `recv` arm in `crossbeam_channel::select!`; it never
    /// yields a message.
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }

    /// Wait for the outcome and take it by value.
    ///
    /// Also waits until every clone of this future has been dropped, so a
    /// thread that still holds a clone must not call this. Use
    /// [`Future::try_join`] when other handles may outlive the call.
    pub fn join(self) -> Outcome<T> {
        let Future {
            shared,
            done,
            handle,
            handles,
        } = self;
        drop(handle);
        // Disconnects once the last clone has released its `shared`.
        let _ = handles.recv();
        Self::released(&done);

        let mut shared = shared;
        loop {
            match Arc::try_unwrap(shared) {
                Ok(shared) => return Self::into_outcome(shared),
                Err(still_shared) => {
                    shared = still_shared;
                    thread::yield_now();
                }
            }
        }
    }

    /// Wait for the outcome and take it by value if this is the only handle.
    ///
    /// Returns the future unchanged while clones of it are alive; they can
    /// still observe the outcome.
    pub fn try_join(self) -> Result<Outcome<T>, Self> {
        Self::released(&self.done);
        match Arc::try_unwrap(self.shared) {
            Ok(shared) => Ok(Self::into_outcome(shared)),
            Err(shared) => Err(Future {
                shared,
                done: self.done,
                handle: self.handle,
                handles: self.handles,
            }),
        }
    }

    /// Block until the promise has written the outcome and let go of it.
    fn released(done: &Receiver<()>) {
        while done.recv().is_ok() {}
    }

    fn into_outcome(shared: Shared<T>) -> Outcome<T> {
        shared
            .outcome
            .into_inner()
            .unwrap_or(Err(TaskError::Abandoned))
    }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            done: self.done.clone(),
            handle: self.handle.clone(),
            handles: self.handles.clone(),
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.shared.outcome.get() {
            None => "pending",
            Some(Ok(_)) => "succeeded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("Future").field("state", &state).finish()
    }
}
