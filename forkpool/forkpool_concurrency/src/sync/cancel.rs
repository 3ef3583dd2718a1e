//! One-shot cancellation signals.
//!
//! A `CancelToken` is fired at most once, either explicitly through
//! [`CancelToken::cancel`] or implicitly when its deadline passes. Any number
//! of threads can block on it; firing wakes all of them.

use crossbeam_channel::{at, bounded, never, select, Receiver, Sender};
use forkpool_core::error::CancelReason;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Inner {
    /// Dropped on cancel; every clone of `signal` then observes disconnection.
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
    deadline: Option<Instant>,
}

/// A cloneable, broadcast-once cancellation signal with an optional deadline.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Create a token that only fires when cancelled explicitly.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a token that also fires once `deadline` is reached.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    /// Create a token that also fires after `timeout` has elapsed.
    ///
    /// A timeout too large to represent as an `Instant` never fires.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Instant::now().checked_add(timeout))
    }

    fn build(deadline: Option<Instant>) -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                trigger: Mutex::new(Some(trigger)),
                signal,
                deadline,
            }),
        }
    }

    /// Fire the token. Repeated calls are no-ops.
    pub fn cancel(&self) {
        self.inner.trigger.lock().take();
    }

    /// Why the token fired, or `None` if it has not.
    ///
    /// An explicit cancel takes precedence over an expired deadline.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.inner.trigger.lock().is_none() {
            return Some(CancelReason::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Block until the token fires and return why.
    pub fn wait(&self) -> CancelReason {
        let deadline = self.deadline_channel();
        select! {
            recv(self.inner.signal) -> _ => {}
            recv(deadline) -> _ => {}
        }
        self.reason().unwrap_or(CancelReason::Cancelled)
    }

    /// Receiver that disconnects when the token is cancelled explicitly.
    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }

    /// Receiver that yields once the deadline passes, or never.
    pub(crate) fn deadline_channel(&self) -> Receiver<Instant> {
        match self.deadline() {
            Some(deadline) => at(deadline),
            None => never(),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        assert_eq!(token.reason(), None);

        token.cancel();
        token.cancel();
        assert_eq!(token.reason(), Some(CancelReason::Cancelled));
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_wait_wakes_all_waiters() {
        let token = CancelToken::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let token = token.clone();
                thread::spawn(move || token.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        token.cancel();

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), CancelReason::Cancelled);
        }
    }

    #[test]
    fn test_deadline_fires() {
        let token = CancelToken::with_timeout(Duration::from_millis(10));
        assert_eq!(token.wait(), CancelReason::DeadlineExceeded);
        assert_eq!(token.reason(), Some(CancelReason::DeadlineExceeded));
    }

    #[test]
    fn test_deadline_accessor() {
        assert_eq!(CancelToken::new().deadline(), None);

        let deadline = Instant::now() + Duration::from_secs(30);
        let token = CancelToken::with_deadline(deadline);
        assert_eq!(token.deadline(), Some(deadline));
        assert_eq!(token.reason(), None);

        let token = CancelToken::with_timeout(Duration::from_secs(30));
        assert!(token.deadline().unwrap() > Instant::now());
    }

    #[test]
    fn test_explicit_cancel_beats_deadline() {
        let token = CancelToken::with_timeout(Duration::from_secs(60));
        token.cancel();
        assert_eq!(token.wait(), CancelReason::Cancelled);
    }
}
