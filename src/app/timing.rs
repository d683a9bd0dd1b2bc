use std::time::{Duration, Instant};

/// An iteration longer than this counts towards freeze detection.
pub const FREEZE_THRESHOLD: Duration = Duration::from_secs(1);
/// Consecutive long iterations after which the loop gives up.
pub const FREEZE_LIMIT: u32 = 2;

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_fps_time: Instant,
    frame_count: u32,
    pub frame_dt: f32,
    long_frames: u32,
}

impl FrameTiming {
    pub fn new(now: Instant) -> Self {
        Self {
            last_frame_time: None,
            last_fps_time: now,
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            long_frames: 0,
        }
    }

    pub fn update(&mut self, now: Instant) {
        let dt_duration = if let Some(last) = self.last_frame_time {
            now.saturating_duration_since(last)
        } else {
            Duration::from_millis(16)
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().max(0.0);

        if dt_duration > FREEZE_THRESHOLD {
            self.long_frames = self.long_frames.saturating_add(1);
        } else {
            self.long_frames = 0;
        }

        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_fps_time);
        if elapsed.as_secs_f32() >= 5.0 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            log::debug!("{:.1} passes/s (last {:.2} ms)", fps, self.frame_dt * 1000.0);
            self.frame_count = 0;
            self.last_fps_time = now;
        }
    }

    pub fn frozen(&self) -> bool {
        self.long_frames >= FREEZE_LIMIT
    }

    /// Forgets long iterations seen so far. Used while slow passes are expected.
    pub fn clear_long_frames(&mut self) {
        self.long_frames = 0;
    }
}
