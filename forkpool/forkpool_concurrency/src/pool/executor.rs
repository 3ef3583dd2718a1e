//! Bounded worker-pool executor.
//!
//! A fixed set of worker threads drains a bounded FIFO queue of units of
//! work. Producers block while the queue is full, which is the only flow
//! control: nothing is buffered beyond the configured capacity.
//!
//! Lifecycle: `Open --close()--> Closing --(queue drained, workers exit)--> Drained`.
//! The open/closed state and the right to enqueue live behind one mutex.
//! Closing also drops the only sender of a broadcast channel, which wakes
//! every producer blocked on a full queue with [`ExecutorError::Closed`].

use crate::pool::future::{self, Future};
use crate::sync::cancel::CancelToken;
use crossbeam_channel::{
    bounded, never, select_biased, Receiver, Sender, TryRecvError, TrySendError,
};
use forkpool_core::error::{panic_message, CancelReason, ExecutorError, TaskError};
use forkpool_core::utils::config::ExecutorConfig;
use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// A boxed fire-and-forget unit of work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A boxed unit of work that reports success or failure.
pub type FallibleJob = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Lifecycle state of an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Accepting new work
    Open,

    /// Refusing new work, still draining queued work
    Closing,

    /// Every worker has exited
    Drained,
}

/// Statistics about the executor
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Number of units accepted into the queue
    pub tasks_queued: u64,

    /// Number of units that ran to completion without error
    pub tasks_completed: u64,

    /// Number of submitted units that returned an error
    pub tasks_failed: u64,

    /// Number of units that panicked
    pub tasks_panicked: u64,

    /// Total execution time (microseconds)
    pub total_execution_time_us: u64,

    /// Total time spent queued (microseconds)
    pub total_queue_time_us: u64,

    /// Maximum execution time of a single unit (microseconds)
    pub max_execution_time_us: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    tasks_queued: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_panicked: AtomicU64,
    total_execution_time_us: AtomicU64,
    total_queue_time_us: AtomicU64,
    max_execution_time_us: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> ExecutorStats {
        ExecutorStats {
            tasks_queued: self.tasks_queued.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            total_execution_time_us: self.total_execution_time_us.load(Ordering::Relaxed),
            total_queue_time_us: self.total_queue_time_us.load(Ordering::Relaxed),
            max_execution_time_us: self.max_execution_time_us.load(Ordering::Relaxed),
        }
    }

    fn record_run(&self, completion: Completion, queue_time: Duration, exec_time: Duration) {
        self.total_queue_time_us
            .fetch_add(queue_time.as_micros() as u64, Ordering::Relaxed);
        let exec_time_us = exec_time.as_micros() as u64;
        self.total_execution_time_us
            .fetch_add(exec_time_us, Ordering::Relaxed);
        self.max_execution_time_us
            .fetch_max(exec_time_us, Ordering::Relaxed);

        let counter = match completion {
            Completion::Succeeded => &self.tasks_completed,
            Completion::Failed => &self.tasks_failed,
            Completion::Panicked => &self.tasks_panicked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// How a unit of work ended, as seen by the worker that ran it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Succeeded,
    Failed,
    Panicked,
}

/// Queued unit of work with metadata for tracking
struct Task {
    func: Box<dyn FnOnce() -> Completion + Send + 'static>,
    enqueued_at: Instant,
}

impl Task {
    fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Completion + Send + 'static,
    {
        Self {
            func: Box::new(f),
            enqueued_at: Instant::now(),
        }
    }

    fn from_job(job: Job) -> Self {
        Self::new(move || {
            job();
            Completion::Succeeded
        })
    }
}

/// Handles that only exist while the executor is open.
struct OpenGate {
    jobs: Sender<Task>,
    /// Never sends; dropping it broadcasts the close to blocked producers.
    _closing: Sender<()>,
}

/// Worker context holding shared state for the worker loop
struct WorkerContext {
    receiver: Receiver<Task>,
    collect_stats: bool,
    stats: Arc<StatsCounters>,
    /// Held until the worker exits; `wait` observes the last drop.
    _alive: Sender<()>,
}

/// Fixed-size pool of worker threads draining a bounded FIFO queue.
///
/// All methods take `&self`; share the executor between producers with an
/// `Arc`. Dropping the executor closes it; workers finish the queued work
/// and exit on their own.
pub struct Executor {
    gate: Mutex<Option<OpenGate>>,
    closed: Receiver<()>,
    drained: Receiver<()>,
    queue: Receiver<Task>,
    workers: usize,
    queue_capacity: usize,
    config: ExecutorConfig,
    stats: Arc<StatsCounters>,
}

impl Executor {
    /// Create an executor with `workers` threads and a queue of
    /// `queue_capacity` slots.
    ///
    /// `workers` is raised to at least one. A capacity of zero makes every
    /// hand-off a rendezvous with an idle worker.
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self, ExecutorError> {
        Self::with_config(ExecutorConfig::new(workers, queue_capacity))
    }

    /// Create an executor from configuration and start its workers.
    pub fn with_config(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        let workers = config.effective_workers();
        let queue_capacity = config.queue_capacity;

        let (jobs_tx, jobs_rx) = bounded(queue_capacity);
        let (closing_tx, closing_rx) = bounded(0);
        let (alive_tx, alive_rx) = bounded(0);
        let stats = Arc::new(StatsCounters::default());

        info!(
            "Creating executor with {} workers and queue capacity {}",
            workers, queue_capacity
        );

        for id in 0..workers {
            let ctx = WorkerContext {
                receiver: jobs_rx.clone(),
                collect_stats: config.collect_stats,
                stats: Arc::clone(&stats),
                _alive: alive_tx.clone(),
            };

            // On failure the already-started workers see the queue disconnect
            // once `jobs_tx` is dropped on return, and exit.
            thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, id))
                .spawn(move || Self::worker_loop(id, ctx))
                .map_err(|e| {
                    error!("Failed to spawn worker {}: {}", id, e);
                    ExecutorError::Spawn(e)
                })?;
        }

        Ok(Self {
            gate: Mutex::new(Some(OpenGate {
                jobs: jobs_tx,
                _closing: closing_tx,
            })),
            closed: closing_rx,
            drained: alive_rx,
            queue: jobs_rx,
            workers,
            queue_capacity,
            config,
            stats,
        })
    }

    /// Worker thread main loop
    fn worker_loop(id: usize, ctx: WorkerContext) {
        debug!("Worker {}: Starting", id);

        // Ends once the queue is empty and every sender is gone.
        for task in ctx.receiver.iter() {
            let queue_time = task.enqueued_at.elapsed();
            trace!(
                "Worker {}: Executing task (queue time: {:.2}ms)",
                id,
                queue_time.as_micros() as f64 / 1000.0
            );

            let exec_start = Instant::now();
            let completion = match panic::catch_unwind(AssertUnwindSafe(task.func)) {
                Ok(completion) => completion,
                Err(payload) => {
                    error!(
                        "Worker {}: Task panicked: {}",
                        id,
                        panic_message(payload.as_ref())
                    );
                    Completion::Panicked
                }
            };
            let exec_time = exec_start.elapsed();

            trace!(
                "Worker {}: Task finished ({:?}) in {:.2}ms",
                id,
                completion,
                exec_time.as_micros() as f64 / 1000.0
            );

            if ctx.collect_stats {
                ctx.stats.record_run(completion, queue_time, exec_time);
            }
        }

        debug!("Worker {}: Queue closed and drained, exiting", id);
    }

    /// Enqueue a unit of work, blocking while the queue is full.
    ///
    /// Fails with [`ExecutorError::Closed`] if the executor is closing, also
    /// when the close happens while this call is blocked. Errors the unit
    /// itself might produce are not observable; use [`Executor::submit`] for
    /// that. A panic inside the unit is caught, logged and counted.
    pub fn execute<F>(&self, f: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Task::from_job(Box::new(f)), None)
    }

    /// Like [`Executor::execute`] for a boxed unit that may be absent.
    pub fn execute_job(&self, job: Option<Job>) -> Result<(), ExecutorError> {
        let job = job.ok_or(ExecutorError::NilUnit)?;
        self.enqueue(Task::from_job(job), None)
    }

    /// Enqueue without blocking.
    ///
    /// Returns `Ok(false)` when the queue is momentarily full; that is not an
    /// error and the unit is dropped unrun.
    pub fn try_execute<F>(&self, f: F) -> Result<bool, ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.try_enqueue(Task::from_job(Box::new(f)))
    }

    /// Like [`Executor::try_execute`] for a boxed unit that may be absent.
    pub fn try_execute_job(&self, job: Option<Job>) -> Result<bool, ExecutorError> {
        let job = job.ok_or(ExecutorError::NilUnit)?;
        self.try_enqueue(Task::from_job(job))
    }

    /// Like [`Executor::execute`], but gives up with
    /// [`ExecutorError::Cancelled`] if `cancel` fires before the unit is
    /// enqueued. A unit that has been enqueued is never withdrawn.
    pub fn execute_with_cancel<F>(&self, cancel: &CancelToken, f: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Task::from_job(Box::new(f)), Some(cancel))
    }

    /// Like [`Executor::execute`], but gives up after waiting `timeout` for
    /// queue space.
    pub fn execute_timeout<F>(&self, timeout: Duration, f: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute_with_cancel(&CancelToken::with_timeout(timeout), f)
    }

    /// Enqueue a unit of work and return a [`Future`] for its outcome.
    ///
    /// The unit's `Err` value, or a panic converted to
    /// [`TaskError::Panicked`], settles the future; it is never retried.
    pub fn submit<F, T, E>(&self, f: F) -> Result<Future<T>, ExecutorError>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + Sync + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let (task, future) = Self::capture(f);
        self.enqueue(task, None)?;
        Ok(future)
    }

    /// Like [`Executor::submit`] for a boxed unit that may be absent.
    pub fn submit_job(&self, job: Option<FallibleJob>) -> Result<Future<()>, ExecutorError> {
        let job = job.ok_or(ExecutorError::NilUnit)?;
        self.submit(job)
    }

    /// Like [`Executor::submit`], but gives up if `cancel` fires before the
    /// unit is enqueued.
    pub fn submit_with_cancel<F, T, E>(
        &self,
        cancel: &CancelToken,
        f: F,
    ) -> Result<Future<T>, ExecutorError>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + Sync + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let (task, future) = Self::capture(f);
        self.enqueue(task, Some(cancel))?;
        Ok(future)
    }

    /// Wrap `f` so that running it settles a future with its outcome.
    fn capture<F, T, E>(f: F) -> (Task, Future<T>)
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + Sync + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let (promise, future) = future::pair();
        let task = Task::new(move || {
            let (outcome, completion) = match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(Ok(value)) => (Ok(value), Completion::Succeeded),
                Ok(Err(e)) => (Err(TaskError::Failed(e.into())), Completion::Failed),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("Submitted task panicked: {}", message);
                    (Err(TaskError::Panicked(message)), Completion::Panicked)
                }
            };
            promise.complete(outcome);
            completion
        });
        (task, future)
    }

    fn try_enqueue(&self, task: Task) -> Result<bool, ExecutorError> {
        let gate = self.gate.lock();
        let open = gate.as_ref().ok_or(ExecutorError::Closed)?;

        match open.jobs.try_send(task) {
            Ok(()) => {
                self.record_queued();
                Ok(true)
            }
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Disconnected(_)) => Err(ExecutorError::Closed),
        }
    }

    fn enqueue(&self, task: Task, cancel: Option<&CancelToken>) -> Result<(), ExecutorError> {
        if let Some(reason) = cancel.and_then(CancelToken::reason) {
            return Err(ExecutorError::Cancelled(reason));
        }

        // Fast path under the gate; the slow path blocks outside it.
        let (jobs, task) = {
            let gate = self.gate.lock();
            let open = gate.as_ref().ok_or(ExecutorError::Closed)?;

            match open.jobs.try_send(task) {
                Ok(()) => {
                    self.record_queued();
                    return Ok(());
                }
                Err(TrySendError::Full(task)) => (open.jobs.clone(), task),
                Err(TrySendError::Disconnected(_)) => return Err(ExecutorError::Closed),
            }
        };

        trace!("Queue full, producer waiting for space");

        let no_cancel = never();
        let cancelled = cancel.map_or(&no_cancel, CancelToken::signal);
        let deadline = cancel.map_or_else(never, CancelToken::deadline_channel);

        // The close signal is polled first: once closing has begun a blocked
        // producer cannot still win a send.
        let result = select_biased! {
            recv(self.closed) -> _ => Err(ExecutorError::Closed),
            recv(cancelled) -> _ => Err(ExecutorError::Cancelled(CancelReason::Cancelled)),
            recv(deadline) -> _ => Err(ExecutorError::Cancelled(CancelReason::DeadlineExceeded)),
            send(jobs, task) -> sent => sent.map_err(|_| ExecutorError::Closed),
        };

        match &result {
            Ok(()) => self.record_queued(),
            Err(e) => warn!("Submission refused while waiting for queue space: {}", e),
        }
        result
    }

    fn record_queued(&self) {
        if self.config.collect_stats {
            self.stats.tasks_queued.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Stop accepting work. Queued work still runs.
    ///
    /// Idempotent; only the first call has an effect. Producers blocked on a
    /// full queue are woken with [`ExecutorError::Closed`].
    pub fn close(&self) {
        let mut gate = self.gate.lock();
        if let Some(open) = gate.take() {
            info!("Closing executor; queued work will drain");
            // Dropped under the lock so no producer can observe the gate
            // closed while the broadcast is still pending.
            drop(open);
        }
    }

    /// Block until every worker has exited.
    ///
    /// Returns only after [`Executor::close`] has been called (by any thread)
    /// and the queue has drained. Must not be called from inside a unit of
    /// work running on this executor.
    pub fn wait(&self) {
        // Disconnects when the last worker drops its liveness sender.
        let _ = self.drained.recv();
    }

    /// Close, then wait for the queue to drain and the workers to exit.
    pub fn shutdown(&self) {
        info!("Shutting down executor");
        self.close();
        self.wait();
        info!("Executor shutdown complete");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExecutorState {
        if self.gate.lock().is_some() {
            ExecutorState::Open
        } else if matches!(self.drained.try_recv(), Err(TryRecvError::Disconnected)) {
            ExecutorState::Drained
        } else {
            ExecutorState::Closing
        }
    }

    /// Whether the executor refuses new work.
    pub fn is_closed(&self) -> bool {
        self.gate.lock().is_none()
    }

    /// Get the number of worker threads
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Get the queue capacity
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Number of units waiting in the queue
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Get current statistics for the executor
    pub fn stats(&self) -> ExecutorStats {
        if self.config.collect_stats {
            self.stats.snapshot()
        } else {
            ExecutorStats::default()
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.close();
        debug!("Executor dropped - workers exit once the queue drains");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    #[test]
    fn test_executor_basic() {
        let executor = Executor::new(4, 4).unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        executor
            .execute(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        executor.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sizes_are_clamped() {
        let executor = Executor::new(0, 0).unwrap();
        assert_eq!(executor.worker_count(), 1);
        assert_eq!(executor.queue_capacity(), 0);
        executor.shutdown();
    }

    #[test]
    fn test_panic_does_not_kill_worker() {
        let executor = Executor::new(1, 2).unwrap();

        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = flag.clone();

        executor
            .execute(|| {
                panic!("This task should panic");
            })
            .unwrap();

        executor
            .execute(move || {
                flag_clone.store(true, Ordering::SeqCst);
            })
            .unwrap();

        executor.shutdown();
        assert!(flag.load(Ordering::SeqCst));

        let stats = executor.stats();
        assert_eq!(stats.tasks_panicked, 1);
        assert_eq!(stats.tasks_completed, 1);
    }

    #[test]
    fn test_state_transitions() {
        let executor = Executor::new(1, 1).unwrap();
        assert_eq!(executor.state(), ExecutorState::Open);

        let (release_tx, release_rx) = bounded::<()>(0);
        executor
            .execute(move || {
                let _ = release_rx.recv();
            })
            .unwrap();

        executor.close();
        assert!(executor.is_closed());
        assert_eq!(executor.state(), ExecutorState::Closing);

        drop(release_tx);
        executor.wait();
        assert_eq!(executor.state(), ExecutorState::Drained);
    }

    #[test]
    fn test_stats_counts_outcomes() {
        let executor = Executor::new(1, 8).unwrap();

        for _ in 0..3 {
            executor
                .execute(|| thread::sleep(Duration::from_millis(2)))
                .unwrap();
        }
        let failed = executor
            .submit(|| Err::<(), _>(anyhow::anyhow!("nope")))
            .unwrap();

        executor.shutdown();
        assert!(failed.err().is_some());

        let stats = executor.stats();
        assert_eq!(stats.tasks_queued, 4);
        assert_eq!(stats.tasks_completed, 3);
        assert_eq!(stats.tasks_failed, 1);
        assert!(stats.total_execution_time_us > 0);
        assert!(stats.max_execution_time_us > 0);
    }

    #[test]
    fn test_stats_disabled() {
        let mut config = ExecutorConfig::new(1, 1);
        config.collect_stats = false;
        let executor = Executor::with_config(config).unwrap();

        executor.execute(|| {}).unwrap();
        executor.shutdown();
        assert_eq!(executor.stats(), ExecutorStats::default());
    }

    #[test]
    fn test_worker_threads_are_named() {
        let mut config = ExecutorConfig::new(1, 0);
        config.thread_name_prefix = "sorter".to_string();
        let executor = Executor::with_config(config).unwrap();

        let name = executor
            .submit(|| Ok::<_, anyhow::Error>(thread::current().name().map(str::to_string)))
            .unwrap();
        assert_eq!(
            name.wait().as_ref().unwrap().as_deref(),
            Some("sorter-0")
        );
        executor.shutdown();
    }
}
