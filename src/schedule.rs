use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Halts a [`FrameLoop`] from anywhere holding a clone.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Cooperative per-frame driver: runs `body` once per `cadence` until the
/// token is cancelled or the body breaks.
pub struct FrameLoop {
    cadence: Duration,
    token: CancelToken,
}

impl FrameLoop {
    pub fn new(cadence: Duration, token: CancelToken) -> Self {
        Self { cadence, token }
    }

    pub fn run<B, E>(&self, mut body: impl FnMut(Instant) -> Result<ControlFlow<B>, E>) -> Result<Option<B>, E> {
        while !self.token.is_cancelled() {
            let started = Instant::now();
            if let ControlFlow::Break(value) = body(started)? {
                return Ok(Some(value));
            }
            if let Some(rest) = self.cadence.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        Ok(None)
    }
}

/// Milliseconds between consecutive frames.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self { last: now }
    }

    pub fn elapsed_ms(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed.as_secs_f32() * 1000.0
    }
}

/// Fires once, `delay` after the most recent trigger.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    due: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, due: None }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.due = Some(now + self.delay);
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

/// Rejects events closer together than `window`.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn allow(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}
