//! Two-keyframe camera path and the per-frame sampler that drives animation export.

use crate::render::camera::CameraPose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyframeSlot {
    A,
    B,
}

impl std::fmt::Display for KeyframeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyframeSlot::A => write!(f, "A"),
            KeyframeSlot::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimationError {
    #[error("keyframe {0} has not been captured")]
    MissingKeyframe(KeyframeSlot),
    #[error("camera speed must be positive")]
    NonPositiveSpeed,
    #[error("frame rate must be positive")]
    NonPositiveFrameRate,
    #[error("keyframes are too close together to produce any frame")]
    ZeroFrames,
    #[error("an animation is already rendering")]
    AlreadyRendering,
}

/// Straight-line camera path between two poses, traversed at constant speed.
///
/// The frame count is fixed at construction and never zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationPath {
    start: CameraPose,
    end: CameraPose,
    total_frames: u32,
}

impl AnimationPath {
    pub fn new(
        start: CameraPose,
        end: CameraPose,
        speed: f32,
        frame_rate: u32,
    ) -> Result<Self, AnimationError> {
        let total_frames = Self::frame_count(&start, &end, speed, frame_rate)?;
        Ok(Self {
            start,
            end,
            total_frames,
        })
    }

    /// `round(distance / speed * frame_rate)`. Orientation changes do not add frames.
    pub fn frame_count(
        start: &CameraPose,
        end: &CameraPose,
        speed: f32,
        frame_rate: u32,
    ) -> Result<u32, AnimationError> {
        if !(speed > 0.0) || !speed.is_finite() {
            return Err(AnimationError::NonPositiveSpeed);
        }
        if frame_rate == 0 {
            return Err(AnimationError::NonPositiveFrameRate);
        }
        let seconds = start.position.distance(end.position) / speed;
        let frames = (seconds * frame_rate as f32).round();
        if !(frames >= 1.0) {
            return Err(AnimationError::ZeroFrames);
        }
        Ok(frames.min(u32::MAX as f32) as u32)
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Pose for `frame`, interpolating position, yaw and pitch independently.
    ///
    /// Angles are lerped numerically, so a yaw change of more than half a turn swings the long
    /// way round.
    pub fn pose_at(&self, frame: u32) -> CameraPose {
        let t = frame as f32 / self.total_frames as f32;
        CameraPose::new(
            self.start.position.lerp(self.end.position, t),
            lerp(self.start.yaw, self.end.yaw, t),
            lerp(self.start.pitch, self.end.pitch, t),
        )
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Nothing captured since the last render ended or the keyframes were cleared.
    Idle,
    /// A keyframe was captured; rendering may start once both are present.
    Armed,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameCursor {
    /// Rendering was requested but no iteration has sampled yet.
    Pending,
    Frame(u32),
}

/// What the render loop should draw in this iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    pub frame: u32,
    pub pass: u32,
    pub pose: CameraPose,
}

impl FrameStep {
    /// The first pass of a frame must start from an empty accumulation buffer.
    pub fn restarts_accumulation(&self) -> bool {
        self.pass == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Not rendering an animation.
    Idle,
    /// Rendering was started during this iteration; sampling begins with the next one.
    NotStarted,
    Accumulating { frame: u32, pass: u32 },
    /// All passes of `frame` are done and it should be captured.
    FrameComplete { frame: u32 },
    /// Like `FrameComplete`, and `frame` was the last one.
    Finished { frame: u32 },
}

impl PassOutcome {
    /// Frame index ready for capture, if any.
    pub fn completed_frame(&self) -> Option<u32> {
        match *self {
            PassOutcome::FrameComplete { frame } | PassOutcome::Finished { frame } => Some(frame),
            _ => None,
        }
    }
}

/// Keyframe storage plus the Idle → Armed → Rendering state machine.
///
/// Finishing or cancelling a render returns to Idle. The keyframes themselves are kept, so the
/// same path can be started again without recapturing it.
///
/// The loop calls [`AnimationSampler::begin_iteration`] at the top of every iteration and
/// [`AnimationSampler::finish_pass`] after the pass has been rendered.
#[derive(Debug, Clone)]
pub struct AnimationSampler {
    keyframe_a: Option<CameraPose>,
    keyframe_b: Option<CameraPose>,
    speed: f32,
    frame_rate: u32,
    frame_passes: u32,
    state: SamplerState,
    active: Option<AnimationPath>,
    cursor: FrameCursor,
    pass: u32,
}

impl AnimationSampler {
    pub fn new(speed: f32, frame_rate: u32, frame_passes: u32) -> Self {
        Self {
            keyframe_a: None,
            keyframe_b: None,
            speed,
            frame_rate,
            frame_passes: frame_passes.max(1),
            state: SamplerState::Idle,
            active: None,
            cursor: FrameCursor::Pending,
            pass: 0,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_rendering(&self) -> bool {
        self.state == SamplerState::Rendering
    }

    pub fn set_keyframe(&mut self, slot: KeyframeSlot, pose: CameraPose) -> Result<(), AnimationError> {
        if self.is_rendering() {
            return Err(AnimationError::AlreadyRendering);
        }
        log::debug!("keyframe {} set to {:?}", slot, pose);
        match slot {
            KeyframeSlot::A => self.keyframe_a = Some(pose),
            KeyframeSlot::B => self.keyframe_b = Some(pose),
        }
        self.state = SamplerState::Armed;
        Ok(())
    }

    pub fn clear_keyframes(&mut self) -> Result<(), AnimationError> {
        if self.is_rendering() {
            return Err(AnimationError::AlreadyRendering);
        }
        self.keyframe_a = None;
        self.keyframe_b = None;
        self.state = SamplerState::Idle;
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn frame_passes(&self) -> u32 {
        self.frame_passes
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_frame_rate(&mut self, frame_rate: u32) {
        self.frame_rate = frame_rate;
    }

    pub fn set_frame_passes(&mut self, frame_passes: u32) {
        self.frame_passes = frame_passes.max(1);
    }

    /// Frame count the current keyframes and timing would produce.
    pub fn planned_frames(&self) -> Result<u32, AnimationError> {
        let (start, end) = self.keyframes()?;
        AnimationPath::frame_count(&start, &end, self.speed, self.frame_rate)
    }

    fn keyframes(&self) -> Result<(CameraPose, CameraPose), AnimationError> {
        let start = self
            .keyframe_a
            .ok_or(AnimationError::MissingKeyframe(KeyframeSlot::A))?;
        let end = self
            .keyframe_b
            .ok_or(AnimationError::MissingKeyframe(KeyframeSlot::B))?;
        Ok((start, end))
    }

    /// Enters Rendering. Returns the number of frames that will be produced.
    pub fn start(&mut self) -> Result<u32, AnimationError> {
        if self.is_rendering() {
            return Err(AnimationError::AlreadyRendering);
        }
        let (start, end) = self.keyframes()?;
        let path = AnimationPath::new(start, end, self.speed, self.frame_rate)?;
        let total = path.total_frames();
        self.state = SamplerState::Rendering;
        self.active = Some(path);
        self.cursor = FrameCursor::Pending;
        self.pass = 0;
        log::info!(
            "animation started: {} frames at {} fps, {} passes per frame",
            total,
            self.frame_rate,
            self.frame_passes
        );
        Ok(total)
    }

    /// Stops rendering. Returns false if nothing was rendering.
    pub fn cancel(&mut self) -> bool {
        if !self.is_rendering() {
            return false;
        }
        log::info!("animation cancelled at frame {:?}", self.current_frame());
        self.active = None;
        self.state = SamplerState::Idle;
        self.cursor = FrameCursor::Pending;
        self.pass = 0;
        true
    }

    pub fn total_frames(&self) -> Option<u32> {
        self.active.as_ref().map(AnimationPath::total_frames)
    }

    pub fn current_frame(&self) -> Option<u32> {
        match self.cursor {
            FrameCursor::Frame(frame) if self.active.is_some() => Some(frame),
            _ => None,
        }
    }

    /// Called at the top of a loop iteration. Leaves the pending state on the first call after
    /// [`AnimationSampler::start`] and returns the pose to render, or `None` when idle.
    pub fn begin_iteration(&mut self) -> Option<FrameStep> {
        let path = self.active.as_ref()?;
        let frame = match self.cursor {
            FrameCursor::Pending => {
                self.cursor = FrameCursor::Frame(0);
                0
            }
            FrameCursor::Frame(frame) => frame,
        };
        Some(FrameStep {
            frame,
            pass: self.pass,
            pose: path.pose_at(frame),
        })
    }

    /// Called after the iteration's pass has been rendered.
    pub fn finish_pass(&mut self) -> PassOutcome {
        let Some(path) = self.active.as_ref() else {
            return PassOutcome::Idle;
        };
        let FrameCursor::Frame(frame) = self.cursor else {
            return PassOutcome::NotStarted;
        };

        if self.pass + 1 < self.frame_passes {
            self.pass += 1;
            return PassOutcome::Accumulating {
                frame,
                pass: self.pass,
            };
        }

        self.pass = 0;
        let next = frame + 1;
        if next >= path.total_frames() {
            log::info!("animation finished after {} frames", next);
            self.state = SamplerState::Idle;
            self.active = None;
            self.cursor = FrameCursor::Pending;
            PassOutcome::Finished { frame }
        } else {
            self.cursor = FrameCursor::Frame(next);
            PassOutcome::FrameComplete { frame }
        }
    }
}

impl Default for AnimationSampler {
    fn default() -> Self {
        Self::new(1.0, 24, 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn pose(x: f32, yaw: f32, pitch: f32) -> CameraPose {
        CameraPose::new(Vec3::new(x, 0.0, 0.0), yaw, pitch)
    }

    fn armed(frame_passes: u32) -> AnimationSampler {
        let mut sampler = AnimationSampler::new(1.0, 1, frame_passes);
        sampler.set_keyframe(KeyframeSlot::A, pose(0.0, 0.0, 0.0)).unwrap();
        sampler.set_keyframe(KeyframeSlot::B, pose(3.0, 0.0, 0.0)).unwrap();
        sampler
    }

    #[test]
    fn ten_unit_path_at_one_fps() {
        let path = AnimationPath::new(pose(0.0, 0.0, 0.0), pose(10.0, 0.0, 0.0), 1.0, 1).unwrap();
        assert_eq!(path.total_frames(), 10);
        assert!((path.pose_at(5).position - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn first_frame_is_keyframe_a_and_last_stops_short() {
        let a = CameraPose::new(Vec3::new(1.0, 2.0, 3.0), 0.5, -0.25);
        let b = CameraPose::new(Vec3::new(1.0, 2.0, 7.0), 1.5, 0.25);
        let path = AnimationPath::new(a, b, 2.0, 24).unwrap();
        assert_eq!(path.total_frames(), 48);
        assert_eq!(path.pose_at(0), a);

        let last = path.pose_at(path.total_frames() - 1);
        assert!(last.position.z < b.position.z);
        assert!(last.yaw < b.yaw);
    }

    #[test]
    fn sampling_is_idempotent() {
        let path = AnimationPath::new(pose(0.0, 0.0, 0.0), pose(4.0, 1.0, 0.5), 1.0, 24).unwrap();
        assert_eq!(path.pose_at(17), path.pose_at(17));
    }

    #[test]
    fn angles_are_lerped_numerically() {
        let path = AnimationPath::new(pose(0.0, -3.0, 0.0), pose(2.0, 3.0, 0.0), 1.0, 2).unwrap();
        // Halfway goes through yaw 0, not round the back through pi.
        assert!(path.pose_at(2).yaw.abs() < 1e-6);
    }

    #[test]
    fn frame_count_rounds() {
        let count = AnimationPath::frame_count(&pose(0.0, 0.0, 0.0), &pose(1.3, 0.0, 0.0), 1.0, 1);
        assert_eq!(count, Ok(1));
        let count = AnimationPath::frame_count(&pose(0.0, 0.0, 0.0), &pose(1.6, 0.0, 0.0), 1.0, 1);
        assert_eq!(count, Ok(2));
    }

    #[test]
    fn degenerate_paths_are_rejected() {
        let a = pose(0.0, 0.0, 0.0);
        assert_eq!(AnimationPath::new(a, a, 1.0, 24), Err(AnimationError::ZeroFrames));
        assert_eq!(
            AnimationPath::new(a, pose(1.0, 0.0, 0.0), 0.0, 24),
            Err(AnimationError::NonPositiveSpeed)
        );
        assert_eq!(
            AnimationPath::new(a, pose(1.0, 0.0, 0.0), f32::NAN, 24),
            Err(AnimationError::NonPositiveSpeed)
        );
        assert_eq!(
            AnimationPath::new(a, pose(1.0, 0.0, 0.0), 1.0, 0),
            Err(AnimationError::NonPositiveFrameRate)
        );
    }

    #[test]
    fn state_transitions() {
        let mut sampler = AnimationSampler::default();
        assert_eq!(sampler.state(), SamplerState::Idle);
        assert_eq!(
            sampler.start(),
            Err(AnimationError::MissingKeyframe(KeyframeSlot::A))
        );

        sampler.set_keyframe(KeyframeSlot::A, pose(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(sampler.state(), SamplerState::Armed);
        assert_eq!(
            sampler.start(),
            Err(AnimationError::MissingKeyframe(KeyframeSlot::B))
        );

        sampler.set_keyframe(KeyframeSlot::B, pose(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(sampler.planned_frames(), Ok(24));
        assert_eq!(sampler.start(), Ok(24));
        assert_eq!(sampler.state(), SamplerState::Rendering);
        assert_eq!(sampler.start(), Err(AnimationError::AlreadyRendering));
        assert_eq!(
            sampler.set_keyframe(KeyframeSlot::A, pose(5.0, 0.0, 0.0)),
            Err(AnimationError::AlreadyRendering)
        );

        assert!(sampler.cancel());
        assert!(!sampler.cancel());
        assert_eq!(sampler.state(), SamplerState::Idle);

        // Keyframes survive the render, so the same path can run again.
        assert_eq!(sampler.start(), Ok(24));
        assert!(sampler.cancel());

        sampler.clear_keyframes().unwrap();
        assert_eq!(sampler.state(), SamplerState::Idle);
        assert_eq!(
            sampler.start(),
            Err(AnimationError::MissingKeyframe(KeyframeSlot::A))
        );
    }

    #[test]
    fn clearing_keyframes_is_refused_while_rendering() {
        let mut sampler = armed(1);
        sampler.start().unwrap();
        assert_eq!(sampler.clear_keyframes(), Err(AnimationError::AlreadyRendering));
        assert_eq!(sampler.state(), SamplerState::Rendering);
    }

    #[test]
    fn timing_changes_apply_to_next_start() {
        let mut sampler = armed(1);
        sampler.set_speed(3.0);
        sampler.set_frame_rate(2);
        sampler.set_frame_passes(0);
        assert_eq!(sampler.frame_passes(), 1);
        assert_eq!(sampler.start(), Ok(2));
    }

    #[test]
    fn start_leaves_one_iteration_before_frame_zero() {
        let mut sampler = armed(2);
        sampler.start().unwrap();
        assert_eq!(sampler.current_frame(), None);
        assert_eq!(sampler.finish_pass(), PassOutcome::NotStarted);

        let step = sampler.begin_iteration().unwrap();
        assert_eq!((step.frame, step.pass), (0, 0));
        assert!(step.restarts_accumulation());
        assert_eq!(sampler.current_frame(), Some(0));
    }

    #[test]
    fn every_frame_gets_all_passes_once() {
        let mut sampler = armed(3);
        assert_eq!(sampler.start(), Ok(3));

        let mut completed = Vec::new();
        let mut passes = Vec::new();
        while let Some(step) = sampler.begin_iteration() {
            passes.push((step.frame, step.pass));
            if let Some(frame) = sampler.finish_pass().completed_frame() {
                completed.push(frame);
            }
        }

        assert_eq!(completed, vec![0, 1, 2]);
        assert_eq!(passes.len(), 9);
        assert_eq!(passes[3], (1, 0));
        assert_eq!(sampler.state(), SamplerState::Idle);
        assert_eq!(sampler.finish_pass(), PassOutcome::Idle);
    }

    #[test]
    fn last_frame_reports_finished() {
        let mut sampler = armed(1);
        sampler.start().unwrap();
        let mut last = PassOutcome::Idle;
        while sampler.begin_iteration().is_some() {
            last = sampler.finish_pass();
        }
        assert_eq!(last, PassOutcome::Finished { frame: 2 });
    }

    #[test]
    fn cancel_between_frames_stops_sampling() {
        let mut sampler = armed(1);
        sampler.start().unwrap();
        sampler.begin_iteration();
        assert_eq!(sampler.finish_pass(), PassOutcome::FrameComplete { frame: 0 });
        assert!(sampler.cancel());
        assert!(sampler.begin_iteration().is_none());
    }
}
