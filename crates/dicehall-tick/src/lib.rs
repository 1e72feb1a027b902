//! Periodic sweep scheduler for Dicehall background maintenance.
//!
//! The room directory's idle eviction runs on a timer, not on protocol
//! traffic. This crate provides that timer: a scheduler that fires at a
//! fixed interval, with an initial random jitter so several server
//! instances started together don't sweep in lockstep.
//!
//! # Integration
//!
//! The scheduler sits inside a maintenance task's loop:
//!
//! ```ignore
//! loop {
//!     let sweep = scheduler.wait_for_sweep().await;
//!     let evicted = rooms.lock().await.evict_idle(Utc::now());
//!     scheduler.record_sweep_end();
//! }
//! ```
//!
//! When the interval is zero the scheduler is disabled and
//! [`SweepScheduler::wait_for_sweep`] pends forever — a server that
//! wants no background eviction simply never sweeps.

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the sweep scheduler.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Time between sweeps. `Duration::ZERO` disables sweeping.
    pub interval: Duration,
    /// Random jitter (0–max ms) added to the *first* sweep so servers
    /// started at the same instant desynchronize.
    pub initial_jitter_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
            initial_jitter_ms: 2_000,
        }
    }
}

impl SweepConfig {
    /// Config sweeping at the given interval with default jitter.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Config with sweeping disabled.
    pub fn disabled() -> Self {
        Self {
            interval: Duration::ZERO,
            initial_jitter_ms: 0,
        }
    }

    /// The sweep interval, or `None` when disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        if self.interval.is_zero() {
            None
        } else {
            Some(self.interval)
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for the sweep scheduler.
///
/// Timing values refer to the maintenance work reported via
/// [`SweepScheduler::record_sweep_end`].
#[derive(Debug, Clone, Default)]
pub struct SweepMetrics {
    /// Total sweeps fired.
    pub total_sweeps: u64,
    /// Duration of the most recent completed sweep.
    pub last_sweep_time: Duration,
    /// Longest sweep observed.
    pub max_sweep_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fires at a fixed interval to drive background maintenance.
///
/// One scheduler per maintenance task. Not a timer wheel — between
/// firings it is just a deadline plus bookkeeping.
pub struct SweepScheduler {
    config: SweepConfig,
    interval: Option<Duration>,
    sweep_count: u64,
    /// When the next sweep should fire.
    next_sweep: Option<TokioInstant>,
    /// Wall-clock instant when the current sweep's work started.
    /// Set by `wait_for_sweep`, consumed by `record_sweep_end`.
    sweep_start: Option<Instant>,
    paused: bool,
    metrics: SweepMetrics,
}

impl SweepScheduler {
    /// Creates a new scheduler from config.
    ///
    /// The first sweep is scheduled one interval out, plus jitter.
    pub fn new(config: SweepConfig) -> Self {
        let interval = config.sweep_interval();

        let next_sweep = interval.map(|d| {
            let jitter = if config.initial_jitter_ms > 0 {
                let ms = rand::rng().random_range(0..config.initial_jitter_ms);
                Duration::from_millis(ms)
            } else {
                Duration::ZERO
            };
            TokioInstant::now() + d + jitter
        });

        match interval {
            None => debug!("sweep scheduler created in disabled mode"),
            Some(d) => debug!(interval_secs = d.as_secs(), "sweep scheduler created"),
        }

        Self {
            config,
            interval,
            sweep_count: 0,
            next_sweep,
            sweep_start: None,
            paused: false,
            metrics: SweepMetrics::default(),
        }
    }

    /// Creates a scheduler sweeping at the given interval.
    pub fn every(interval: Duration) -> Self {
        Self::new(SweepConfig::every(interval))
    }

    /// Waits until the next sweep is due. Returns the sweep number
    /// (starting at 1).
    ///
    /// When disabled or paused this future pends forever — it never
    /// resolves on its own, but `tokio::select!` around it still
    /// processes other branches.
    pub async fn wait_for_sweep(&mut self) -> u64 {
        let (next, interval) = match (self.next_sweep, self.interval) {
            (Some(next), Some(interval)) if !self.paused => (next, interval),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.sweep_count += 1;
        self.sweep_start = Some(Instant::now());
        self.metrics.total_sweeps += 1;

        // If we woke up very late (event loop stalled), log it and
        // schedule from now rather than trying to catch up.
        let late_by = now.saturating_duration_since(next);
        if late_by > interval / 10 {
            warn!(
                sweep = self.sweep_count,
                late_ms = late_by.as_millis() as u64,
                "sweep fired late — rescheduling from now"
            );
        }
        self.next_sweep = Some(now + interval);

        trace!(sweep = self.sweep_count, "sweep fired");
        self.sweep_count
    }

    /// Records that the current sweep's maintenance work has finished.
    ///
    /// Call after the sweep body returns to feed the duration metrics.
    /// If not called, timings simply aren't recorded.
    pub fn record_sweep_end(&mut self) {
        let Some(start) = self.sweep_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        self.metrics.last_sweep_time = elapsed;
        if elapsed > self.metrics.max_sweep_time {
            self.metrics.max_sweep_time = elapsed;
        }
    }

    /// Pauses sweeping. `wait_for_sweep` pends until
    /// [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(sweep = self.sweep_count, "sweep scheduler paused");
        }
    }

    /// Resumes sweeping after a pause.
    ///
    /// The next deadline resets to `now + interval` so time spent paused
    /// doesn't produce a burst of makeup sweeps.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(interval) = self.interval {
                self.next_sweep = Some(TokioInstant::now() + interval);
            }
            debug!(sweep = self.sweep_count, "sweep scheduler resumed");
        }
    }

    /// Whether the scheduler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether sweeping is disabled (zero interval).
    pub fn is_disabled(&self) -> bool {
        self.interval.is_none()
    }

    /// Sweeps fired so far.
    pub fn sweep_count(&self) -> u64 {
        self.sweep_count
    }

    /// Snapshot of current metrics.
    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }

    /// The configured interval, or `None` when disabled.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// The configuration this scheduler was built from.
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }
}
