//! Frame scheduling primitives for the background render loop.
//!
//! A host exposes a single "run before next repaint" primitive through
//! [`FrameScheduler`]. Every request hands back a [`FrameHandle`] that acts as
//! an explicit cancellation token, so the render loop never has to remember
//! ids captured inside closures. [`FrameThrottle`] caps how often a fired
//! callback is allowed to paint, independent of the display refresh rate.

use std::time::Duration;

use bgconfig::{DEFAULT_REFRESH_HZ, MAX_REFRESH_HZ, MIN_REFRESH_HZ};

/// Opaque token for one pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Host primitive that runs a callback before the next repaint.
pub trait FrameScheduler {
    /// Queues one frame callback and returns its cancellation token.
    fn request_frame(&mut self) -> FrameHandle;
    /// Cancels a queued callback. Returns false when the handle already fired
    /// or was cancelled before.
    fn cancel_frame(&mut self, handle: FrameHandle) -> bool;
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for Box<T> {
    fn request_frame(&mut self) -> FrameHandle {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) -> bool {
        (**self).cancel_frame(handle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub requested: u64,
    pub cancelled: u64,
    pub fired: u64,
}

/// Scheduler whose callbacks fire only when the host asks for them.
///
/// Headless hosts and tests drive it explicitly: after each simulated vsync
/// they call [`ManualScheduler::take_due`] and deliver the returned handles.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<FrameHandle>,
    stats: SchedulerStats,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Removes every queued callback and reports them as fired.
    pub fn take_due(&mut self) -> Vec<FrameHandle> {
        let due = std::mem::take(&mut self.pending);
        self.stats.fired += due.len() as u64;
        due
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        self.stats.requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|pending| *pending != handle);
        let removed = self.pending.len() != before;
        if removed {
            self.stats.cancelled += 1;
        }
        removed
    }
}

/// Drops frame callbacks that arrive sooner than the configured interval.
///
/// The first callback is always accepted; afterwards a callback paints only
/// when at least `interval` milliseconds elapsed since the last accepted one.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval_ms: f64,
    last_accepted: Option<f64>,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_secs_f64() * 1000.0,
            last_accepted: None,
        }
    }

    pub fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }

    /// Returns true when a callback at `now_ms` is allowed to paint.
    pub fn accept(&mut self, now_ms: f64) -> bool {
        match self.last_accepted {
            Some(last) if now_ms - last < self.interval_ms => false,
            _ => {
                self.last_accepted = Some(now_ms);
                true
            }
        }
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(bgconfig::DEFAULT_FRAME_INTERVAL)
    }
}

/// Pulls a refresh rate into the configurable range; NaN falls back to the
/// default rate.
pub fn clamp_refresh_hz(refresh_hz: f32) -> f32 {
    if refresh_hz.is_nan() {
        DEFAULT_REFRESH_HZ
    } else {
        refresh_hz.clamp(MIN_REFRESH_HZ, MAX_REFRESH_HZ)
    }
}

/// Simulated display clock producing vsync timestamps in milliseconds.
#[derive(Debug, Clone)]
pub struct RefreshClock {
    interval_ms: f64,
    frame: u64,
}

impl RefreshClock {
    pub fn new(refresh_hz: f32) -> Self {
        let hz = f64::from(clamp_refresh_hz(refresh_hz));
        Self {
            interval_ms: 1000.0 / hz,
            frame: 0,
        }
    }

    /// Timestamp of the current vsync.
    pub fn now(&self) -> f64 {
        self.frame as f64 * self.interval_ms
    }

    /// Advances to the next vsync and returns its timestamp.
    pub fn advance(&mut self) -> f64 {
        self.frame += 1;
        self.now()
    }

    /// Skips `duration` worth of vsyncs, e.g. while the page is hidden.
    pub fn skip(&mut self, duration: Duration) {
        let frames = (duration.as_secs_f64() * 1000.0 / self.interval_ms).floor() as u64;
        self.frame += frames;
    }
}
