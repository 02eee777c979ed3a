//! The bounded dispatch pool.
//!
//! Requests admitted by the server are executed as jobs on a bounded set of
//! worker tasks sharing a FIFO queue. `min_workers` workers start with the
//! pool; it grows up to `max_workers` while work is arriving faster than
//! idle workers can pick it up, and surplus workers retire after sitting
//! idle for `idle_timeout_secs`. The queue is bounded at
//! `max_queued_requests`; submissions beyond that are rejected so
//! backpressure surfaces at admission instead of inside the pool.
//!
//! Each worker runs exactly one job at a time, start to finish. A panicking
//! job is caught and logged; the worker survives and moves on.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, error, info};

use crate::config::PoolConfig;
use crate::observability::metrics;
use crate::pool::snapshot::{PoolProbe, PoolSnapshot};

/// A unit of work executed by the pool.
pub type Job = BoxFuture<'static, ()>;

/// Error returned when a submission is not admitted.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The queue is at `max_queued_requests`.
    #[error("dispatch queue is full")]
    QueueFull,

    /// The pool has not been started, or is shutting down.
    #[error("dispatch pool is not running")]
    NotRunning,
}

/// A bounded worker pool executing request jobs.
///
/// Cheap to clone; all clones share the same workers and queue.
#[derive(Clone)]
pub struct DispatchPool {
    shared: Arc<Shared>,
}

struct Shared {
    config: PoolConfig,
    queue: Mutex<VecDeque<Job>>,
    workers: AtomicUsize,
    busy: AtomicUsize,
    queued: AtomicUsize,
    started: AtomicBool,
    accepting: AtomicBool,
    work_available: Notify,
    worker_exited: Notify,
}

impl DispatchPool {
    /// Create a pool. No workers run until [`DispatchPool::start`].
    pub fn new(config: PoolConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                queue: Mutex::new(VecDeque::new()),
                workers: AtomicUsize::new(0),
                busy: AtomicUsize::new(0),
                queued: AtomicUsize::new(0),
                started: AtomicBool::new(false),
                accepting: AtomicBool::new(false),
                work_available: Notify::new(),
                worker_exited: Notify::new(),
            }),
        }
    }

    /// Spawn the core workers and begin accepting submissions.
    ///
    /// Idempotent. Gauges for the pool are described and published here;
    /// before this call the pool reports all-zero state rather than failing.
    pub fn start(&self) {
        if self.shared.started.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.accepting.store(true, Ordering::Release);

        for _ in 0..self.shared.config.min_workers {
            spawn_worker(&self.shared, true);
        }

        metrics::describe_pool_gauges();
        self.shared.publish_gauges();

        info!(
            min_workers = self.shared.config.min_workers,
            max_workers = self.shared.config.max_workers,
            max_queued_requests = self.shared.config.max_queued_requests,
            idle_timeout_secs = self.shared.config.idle_timeout_secs,
            "Dispatch pool started"
        );
    }

    /// Submit a job for execution.
    ///
    /// Rejects immediately when the queue is at capacity or the pool is not
    /// running; admitted jobs run in FIFO order.
    pub fn submit(&self, job: Job) -> Result<(), SubmitError> {
        let shared = &self.shared;
        if !shared.accepting.load(Ordering::Acquire) {
            return Err(SubmitError::NotRunning);
        }

        // `busy` is incremented under the queue lock when a job is popped,
        // so demand computed here cannot miss a worker that is mid-pickup.
        let should_spawn = {
            let mut queue = shared.queue.lock().unwrap();
            if queue.len() >= shared.config.max_queued_requests {
                return Err(SubmitError::QueueFull);
            }
            queue.push_back(job);
            shared.queued.store(queue.len(), Ordering::Release);

            let workers = shared.workers.load(Ordering::Acquire);
            let demand = shared.busy.load(Ordering::Acquire) + queue.len();
            demand > workers && workers < shared.config.max_workers
        };
        shared.work_available.notify_one();
        if should_spawn {
            spawn_worker(shared, false);
        }

        shared.publish_gauges();
        Ok(())
    }

    /// Current worker count.
    pub fn size(&self) -> usize {
        self.snapshot().workers
    }

    /// Current queue depth. O(1): read from a size-tracked counter.
    pub fn queued_requests(&self) -> usize {
        self.snapshot().queued_requests
    }

    /// Fraction of capacity currently busy, computed at call time.
    pub fn utilization(&self) -> f64 {
        self.snapshot().utilization()
    }

    /// Stop admitting work. Queued and in-flight jobs still complete.
    pub fn close(&self) {
        self.shared.accepting.store(false, Ordering::Release);
        self.shared.work_available.notify_waiters();
        self.shared.publish_gauges();
        debug!("Dispatch pool closed to new work");
    }

    /// Wait for all workers to exit after [`DispatchPool::close`].
    ///
    /// Returns `true` once the pool is fully drained, `false` if workers
    /// remain past the timeout.
    pub async fn drained(&self, timeout: Duration) -> bool {
        let shared = &self.shared;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if shared.workers.load(Ordering::Acquire) == 0 {
                return true;
            }
            let exited = shared.worker_exited.notified();
            tokio::pin!(exited);
            exited.as_mut().enable();
            if shared.workers.load(Ordering::Acquire) == 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, exited).await.is_err() {
                return shared.workers.load(Ordering::Acquire) == 0;
            }
        }
    }
}

impl PoolProbe for DispatchPool {
    fn snapshot(&self) -> PoolSnapshot {
        self.shared.snapshot()
    }
}

impl Shared {
    fn snapshot(&self) -> PoolSnapshot {
        if !self.started.load(Ordering::Acquire) {
            return PoolSnapshot::empty(self.config.max_workers);
        }
        let workers = self.workers.load(Ordering::Acquire);
        let busy = self.busy.load(Ordering::Acquire).min(workers);
        PoolSnapshot {
            workers,
            idle_workers: workers - busy,
            max_workers: self.config.max_workers,
            queued_requests: self.queued.load(Ordering::Acquire),
        }
    }

    fn publish_gauges(&self) {
        metrics::update_pool_gauges(&self.snapshot());
    }

    /// Decrement the worker count if it is above the floor.
    fn try_retire(&self) -> bool {
        let mut current = self.workers.load(Ordering::Acquire);
        loop {
            if current <= self.config.min_workers {
                return false;
            }
            match self.workers.compare_exchange(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

fn spawn_worker(shared: &Arc<Shared>, core: bool) -> bool {
    let mut current = shared.workers.load(Ordering::Acquire);
    loop {
        if current >= shared.config.max_workers {
            return false;
        }
        match shared.workers.compare_exchange(
            current,
            current + 1,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => break,
            Err(actual) => current = actual,
        }
    }

    let shared = shared.clone();
    tokio::spawn(worker_loop(shared, core));
    true
}

async fn worker_loop(shared: Arc<Shared>, core: bool) {
    // Set when the worker has already taken itself out of the count.
    let mut retired = false;

    loop {
        let job = {
            let mut queue = shared.queue.lock().unwrap();
            let job = queue.pop_front();
            if job.is_some() {
                // Marked busy in the same critical section as the pop, so
                // submitters never observe a job in neither place.
                shared.busy.fetch_add(1, Ordering::AcqRel);
            }
            shared.queued.store(queue.len(), Ordering::Release);
            job
        };

        match job {
            Some(job) => {
                shared.publish_gauges();
                let result = AssertUnwindSafe(job).catch_unwind().await;
                shared.busy.fetch_sub(1, Ordering::AcqRel);
                shared.publish_gauges();
                if let Err(panic) = result {
                    error!(panic = panic_message(panic.as_ref()), "Job panicked");
                }
            }
            None => {
                if !shared.accepting.load(Ordering::Acquire) {
                    break;
                }
                // Register for wakeup before rechecking, so a submission
                // racing with us cannot be missed.
                let notified = shared.work_available.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if shared.queued.load(Ordering::Acquire) > 0 {
                    continue;
                }
                if !shared.accepting.load(Ordering::Acquire) {
                    break;
                }
                if core {
                    notified.await;
                } else {
                    let idle = Duration::from_secs(shared.config.idle_timeout_secs);
                    if tokio::time::timeout(idle, notified).await.is_err()
                        && shared.try_retire()
                    {
                        retired = true;
                        // A job may have slipped in between the timeout and
                        // the retirement; hand the wakeup to someone else.
                        if shared.queued.load(Ordering::Acquire) > 0 {
                            shared.work_available.notify_one();
                        }
                        break;
                    }
                }
            }
        }
    }

    if !retired {
        shared.workers.fetch_sub(1, Ordering::AcqRel);
    }
    shared.publish_gauges();
    shared.worker_exited.notify_waiters();
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
