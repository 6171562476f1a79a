//! Time source for retry loops.
//!
//! Production code sleeps on the tokio timer. [`ManualClock`] advances virtual
//! time instead of sleeping and records every sleep, so deadline behaviour and
//! cooldown counts can be asserted without waiting.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[async_trait]
pub trait RetryClock: Send + Sync + Debug {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl RetryClock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
struct ManualClockState {
    origin: Instant,
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// Virtual clock; `sleep` returns immediately after advancing time
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualClockState>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualClockState {
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                sleeps: Vec::new(),
            })),
        }
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        self.state.lock().elapsed += duration;
    }

    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }

    pub fn sleep_count(&self) -> usize {
        self.state.lock().sleeps.len()
    }

    /// Number of sleeps of exactly `duration`
    pub fn sleeps_of(&self, duration: Duration) -> usize {
        self.state
            .lock()
            .sleeps
            .iter()
            .filter(|slept| **slept == duration)
            .count()
    }
}

#[async_trait]
impl RetryClock for ManualClock {
    fn now(&self) -> Instant {
        let state = self.state.lock();
        state.origin + state.elapsed
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.sleeps.push(duration);
        state.elapsed += duration;
    }
}
