//! Point-in-time views of pool state.

/// A consistent view of the dispatch pool's counters.
///
/// Computed on demand from the live atomics, never stored. Snapshot fields
/// always satisfy `idle_workers <= workers <= max_workers`; transient
/// scheduling races are clamped at capture time rather than surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Current worker count.
    pub workers: usize,
    /// Workers currently waiting for work.
    pub idle_workers: usize,
    /// Configured upper bound on workers.
    pub max_workers: usize,
    /// Requests admitted but not yet picked up by a worker.
    pub queued_requests: usize,
}

impl PoolSnapshot {
    /// A snapshot of a pool that has not been started.
    pub fn empty(max_workers: usize) -> Self {
        Self {
            workers: 0,
            idle_workers: 0,
            max_workers,
            queued_requests: 0,
        }
    }

    /// Workers currently executing a request.
    pub fn busy_workers(&self) -> usize {
        self.workers.saturating_sub(self.idle_workers)
    }

    /// Fraction of pool capacity currently busy, in `[0, 1]`.
    ///
    /// A zero-capacity pool reports 0 rather than dividing by zero. Callers
    /// must tolerate transient values above 1 under pathological
    /// interleavings.
    pub fn utilization(&self) -> f64 {
        if self.max_workers == 0 {
            0.0
        } else {
            self.busy_workers() as f64 / self.max_workers as f64
        }
    }
}

/// Read access to live pool state.
///
/// The health checks consume pool state through this trait so tests can
/// substitute fixed snapshots.
pub trait PoolProbe: Send + Sync {
    fn snapshot(&self) -> PoolSnapshot;
}
