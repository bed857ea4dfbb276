//! Frame tick sources.
//!
//! The player pulls ticks instead of being called back: [`TickSource::due`] reports how many
//! ticks elapsed since the previous poll, and `Player::pump` runs that many.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A periodic tick subscription at a given frame rate.
pub trait TickSource {
    /// Begin (or restart) delivering ticks at `fps`.
    fn open(&mut self, fps: u32);
    /// Ticks elapsed since the previous call; 0 while closed.
    fn due(&mut self) -> u32;
    /// Stop delivering ticks.
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

#[derive(Debug, Default)]
struct ManualInner {
    open: bool,
    pending: u32,
    fps: u32,
    opens: u32,
}

/// Test-friendly tick source driven by explicit [`ManualTickSource::fire`] calls.
///
/// Clones share state, so a test can keep a handle after moving one into a player.
#[derive(Clone, Debug, Default)]
pub struct ManualTickSource {
    inner: Rc<RefCell<ManualInner>>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `n` ticks. Ticks fired while closed are dropped.
    pub fn fire(&self, n: u32) {
        let mut inner = self.inner.borrow_mut();
        if inner.open {
            inner.pending = inner.pending.saturating_add(n);
        }
    }

    /// 1 while a subscription is open, else 0.
    pub fn active_subscriptions(&self) -> u32 {
        u32::from(self.inner.borrow().open)
    }

    /// How many times a subscription was opened.
    pub fn open_count(&self) -> u32 {
        self.inner.borrow().opens
    }

    /// Frame rate of the current (or last) subscription.
    pub fn fps(&self) -> u32 {
        self.inner.borrow().fps
    }
}

impl TickSource for ManualTickSource {
    fn open(&mut self, fps: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.open = true;
        inner.pending = 0;
        inner.fps = fps;
        inner.opens += 1;
    }

    fn due(&mut self) -> u32 {
        let mut inner = self.inner.borrow_mut();
        if !inner.open {
            return 0;
        }
        std::mem::take(&mut inner.pending)
    }

    fn close(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.open = false;
        inner.pending = 0;
    }

    fn is_open(&self) -> bool {
        self.inner.borrow().open
    }
}

/// Wall-clock tick source.
///
/// After a long stall at most [`ClockTickSource::MAX_CATCH_UP`] ticks are reported; the rest are
/// skipped so playback does not fast-forward.
#[derive(Clone, Debug, Default)]
pub struct ClockTickSource {
    started: Option<Instant>,
    interval: Duration,
    delivered: u64,
}

impl ClockTickSource {
    pub const MAX_CATCH_UP: u32 = 8;

    pub fn new() -> Self {
        Self::default()
    }

    fn due_at(&mut self, now: Instant) -> u32 {
        let Some(started) = self.started else {
            return 0;
        };
        let elapsed = now.saturating_duration_since(started);
        let total = (elapsed.as_nanos() / self.interval.as_nanos().max(1)) as u64;
        let due = total.saturating_sub(self.delivered);
        self.delivered = total;
        due.min(u64::from(Self::MAX_CATCH_UP)) as u32
    }
}

impl TickSource for ClockTickSource {
    fn open(&mut self, fps: u32) {
        self.interval = Duration::from_secs(1) / fps.max(1);
        self.started = Some(Instant::now());
        self.delivered = 0;
    }

    fn due(&mut self) -> u32 {
        self.due_at(Instant::now())
    }

    fn close(&mut self) {
        self.started = None;
    }

    fn is_open(&self) -> bool {
        self.started.is_some()
    }
}
