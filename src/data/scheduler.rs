use std::time::{Duration, Instant};

use log::trace;

/// Anything measured below this is treated as noise and the target is used.
pub const MIN_PLAUSIBLE_FPS: f32 = 10.0;

/// Committed frames per measurement window.
const SAMPLE_FRAMES: u32 = 2;

/// Drives ticks at a target rate and measures the rate actually achieved.
///
/// Scheduling is cooperative: the host runs a tick once [`is_due`] and then
/// calls [`schedule_next`], so there is never more than one pending tick.
///
/// [`is_due`]: FrameScheduler::is_due
/// [`schedule_next`]: FrameScheduler::schedule_next
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    target_fps: u32,
    interval: Duration,

    window_start: Option<Instant>,
    frames: u32,
    measured: f32,

    deadline: Option<Instant>,
}

fn interval_for(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / fps.max(1) as u64)
}

impl FrameScheduler {
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_fps: target_fps.max(1),
            interval: interval_for(target_fps),
            window_start: None,
            frames: 0,
            measured: 0.0,
            deadline: None,
        }
    }

    /// Changes the target and throws away the current measurement.
    pub fn set_target_fps(&mut self, fps: u32) {
        self.target_fps = fps.max(1);
        self.interval = interval_for(fps);
        self.window_start = None;
        self.frames = 0;
        self.measured = 0.0;
    }

    #[cfg(test)]
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    #[cfg(test)]
    pub fn target_interval(&self) -> Duration {
        self.interval
    }

    /// Records a frame that made it to the screen.
    ///
    /// The very first frame only opens the measurement window.
    pub fn frame_committed(&mut self, at: Instant) {
        let Some(start) = self.window_start else {
            self.window_start = Some(at);
            return;
        };

        self.frames += 1;

        if self.frames < SAMPLE_FRAMES {
            return;
        }

        let elapsed_ms = at.saturating_duration_since(start).as_secs_f32() * 1000.0;
        let fps = 1000.0 / (elapsed_ms / self.frames as f32);

        if fps.is_finite() {
            self.measured = fps;
            trace!("Measured {:.2} fps over {} frames.", fps, self.frames);
        }

        self.window_start = Some(at);
        self.frames = 0;
    }

    /// The last measurement, or the target while that is implausibly low.
    pub fn current_fps(&self) -> f32 {
        if self.measured < MIN_PLAUSIBLE_FPS {
            return self.target_fps as f32;
        }

        self.measured
    }

    /// Delay before the next tick after a frame that took `frame_duration`.
    pub fn delay_after(&self, frame_duration: Duration) -> Duration {
        self.interval.saturating_sub(frame_duration)
    }

    /// Arms the next tick, subtracting the time the current one took.
    pub fn schedule_next(&mut self, frame_start: Instant, now: Instant) -> Instant {
        let delay = self.delay_after(now.saturating_duration_since(frame_start));
        let deadline = now + delay;
        self.deadline = Some(deadline);
        deadline
    }

    pub fn arm_now(&mut self, now: Instant) {
        self.deadline = Some(now);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}
