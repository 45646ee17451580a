use std::time::{Duration, Instant};

/// Value written to `uTime` for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    pub seconds: f32,
}

impl From<Duration> for TimeSample {
    fn from(elapsed: Duration) -> Self {
        Self {
            seconds: elapsed.as_secs_f32(),
        }
    }
}

/// Where the render loop gets shader time from.
///
/// [`RenderLoop::run`](crate::RenderLoop::run) calls `reset` once before the
/// first frame, so time counts from render start rather than process start.
pub trait TimeSource: Send {
    fn reset(&mut self);
    fn sample(&mut self) -> TimeSample;
}

/// Monotonic wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    started: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.started = Instant::now();
    }

    fn sample(&mut self) -> TimeSample {
        TimeSample::from(self.started.elapsed())
    }
}

/// Frozen time, for headless runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource(pub f32);

impl FixedTimeSource {
    pub fn new(seconds: f32) -> Self {
        Self(seconds)
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {}

    fn sample(&mut self) -> TimeSample {
        TimeSample { seconds: self.0 }
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource>;
