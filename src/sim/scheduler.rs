use std::time::{Duration, Instant};

pub const NOMINAL_FRAME_MS: f32 = 1000.0 / 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Stabilized: frames are not produced but the loop can resume.
    Paused,
    /// Torn down; only [`FrameLoop::start`] brings it back.
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    pub frame: u64,
    pub dt_ms: f32,
}

impl FrameTick {
    /// Elapsed time in nominal 60 Hz frames.
    pub fn dt_frames(&self) -> f32 {
        self.dt_ms / NOMINAL_FRAME_MS
    }
}

/// Notified once for every frame in which the physics step ran.
pub trait FrameObserver {
    fn on_frame(&mut self, tick: &FrameTick);
}

/// Cancellable periodic task that hands out clamped frame deltas.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    last_frame: Option<Instant>,
    max_dt: Duration,
    frames: u64,
}

impl FrameLoop {
    pub fn new(max_dt_ms: f32) -> Self {
        Self {
            state: LoopState::Running,
            last_frame: None,
            max_dt: Duration::from_secs_f32(max_dt_ms.max(1.0) / 1000.0),
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn start(&mut self) {
        self.state = LoopState::Running;
        self.last_frame = None;
    }

    pub fn pause(&mut self) {
        if self.state == LoopState::Running {
            self.state = LoopState::Paused;
            self.last_frame = None;
        }
    }

    pub fn resume(&mut self) {
        if self.state == LoopState::Paused {
            self.state = LoopState::Running;
        }
    }

    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
        self.last_frame = None;
    }

    /// Produces the next tick while running. The first frame after a start,
    /// resume or long stall is clamped to `max_dt`.
    pub fn advance(&mut self, now: Instant) -> Option<FrameTick> {
        if self.state != LoopState::Running {
            return None;
        }

        let elapsed = match self.last_frame {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_secs_f32(NOMINAL_FRAME_MS / 1000.0),
        };
        self.last_frame = Some(now);
        self.frames += 1;

        Some(FrameTick {
            frame: self.frames,
            dt_ms: elapsed.min(self.max_dt).as_secs_f32() * 1000.0,
        })
    }
}
