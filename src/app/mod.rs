mod input;
mod timing;

pub use input::{ClickAction, InputEvent, InputState, Key};
use timing::FrameTiming;

use crate::animation::{AnimationError, AnimationSampler, KeyframeSlot, PassOutcome};
use crate::cli::{Args, Command};
use crate::config::{ConfigError, EditorConfig};
use crate::render::uniforms;
use crate::render::{
    bind, pick, CameraController, CameraPose, CaptureError, FrameSink, PngFrameWriter,
    PreviewRenderer, Renderer,
};
use crate::scene::serialization::{self, SerializationError};
use crate::scene::{SceneEdit, SceneStore, Selection};
use glam::Vec2;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("scene file error: {0}")]
    Scene(#[from] SerializationError),
    #[error("animation error: {0}")]
    Animation(#[from] AnimationError),
    #[error("frame capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("animation stopped after {written} of {total} frames")]
    Incomplete { written: u32, total: u32 },
    #[error("failed to read replay script {}: {source}", path.display())]
    ScriptIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid replay script {}: {source}", path.display())]
    ScriptJson {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Quit,
}

/// Editor state plus the per-iteration control loop.
///
/// One [`App::tick`] renders one accumulation pass. Input is queued with [`App::handle_event`]
/// between ticks; held keys apply immediately, while clicks and cancellation wait for the next
/// tick. Without a renderer every renderer-side step is skipped.
///
/// Freeze detection only guards interactive use. Animation passes may take as long as they
/// need, since an export is expected to be slow.
pub struct App<R: Renderer> {
    screen_width: u32,
    screen_height: u32,
    scene: SceneStore,
    selection: Selection,
    camera: CameraController,
    animation: AnimationSampler,
    input: InputState,
    mouse_captured: bool,
    pending_click: Option<Vec2>,
    pending_look: Vec2,
    cancel_requested: bool,
    quit_requested: bool,
    scene_bound: bool,
    refresh_required: bool,
    accumulated_passes: i32,
    renderer: Option<R>,
    frame_sink: Option<Box<dyn FrameSink>>,
    frames_captured: u32,
    capture_error: Option<CaptureError>,
    timing: FrameTiming,
    started: Instant,
}

impl<R: Renderer> App<R> {
    pub fn new(config: EditorConfig, scene: SceneStore, renderer: Option<R>) -> Self {
        let now = Instant::now();
        let camera = CameraController::new(CameraPose::default()).with_tuning(
            config.mouse_sensitivity,
            config.move_speed,
            config.sprint_multiplier,
        );
        let animation = AnimationSampler::new(
            config.animation.speed,
            config.animation.frame_rate,
            config.animation.frame_passes,
        );
        Self {
            screen_width: config.screen_width.max(1),
            screen_height: config.screen_height.max(1),
            scene,
            selection: Selection::none(),
            camera,
            animation,
            input: InputState::default(),
            mouse_captured: false,
            pending_click: None,
            pending_look: Vec2::ZERO,
            cancel_requested: false,
            quit_requested: false,
            scene_bound: false,
            refresh_required: true,
            accumulated_passes: 0,
            renderer,
            frame_sink: None,
            frames_captured: 0,
            capture_error: None,
            timing: FrameTiming::new(now),
            started: now,
        }
    }

    pub fn with_frame_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.frame_sink = Some(sink);
        self
    }

    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    pub fn set_camera_pose(&mut self, pose: CameraPose) {
        self.camera.pose = pose;
        self.refresh_required = true;
    }

    pub fn animation(&self) -> &AnimationSampler {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationSampler {
        &mut self.animation
    }

    /// Frames handed to the frame sink without error since the app was created.
    pub fn frames_captured(&self) -> u32 {
        self.frames_captured
    }

    /// The capture failure that stopped the last animation, if any.
    pub fn take_capture_error(&mut self) -> Option<CaptureError> {
        self.capture_error.take()
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPressed { key } => {
                self.input.handle_key(key, true);
                if key == Key::Escape {
                    self.handle_escape();
                }
            }
            InputEvent::KeyReleased { key } => self.input.handle_key(key, false),
            InputEvent::MouseMotion { dx, dy } => {
                if self.mouse_captured {
                    self.pending_look += Vec2::new(dx, dy);
                }
            }
            InputEvent::MouseClicked { x, y } => {
                if self.mouse_captured || self.animation.is_rendering() {
                    log::debug!("click at ({}, {}) ignored", x, y);
                } else if self.pending_click.replace(Vec2::new(x, y)).is_some() {
                    log::debug!("earlier click in this iteration superseded");
                }
            }
            InputEvent::Resized { width, height } => self.resize(width, height),
            InputEvent::CaptureKeyframe { slot } => self.capture_keyframe(slot),
            InputEvent::ClearKeyframes => {
                if let Err(err) = self.animation.clear_keyframes() {
                    log::warn!("cannot clear keyframes: {}", err);
                }
            }
            InputEvent::AnimationTiming {
                speed,
                frame_rate,
                frame_passes,
            } => self.set_animation_timing(speed, frame_rate, frame_passes),
            InputEvent::StartAnimation => {
                if let Err(err) = self.animation.start() {
                    log::warn!("cannot start animation: {}", err);
                }
            }
            InputEvent::SetCameraPose { pose } => {
                if self.animation.is_rendering() {
                    log::debug!("camera is driven by the animation, pose ignored");
                } else {
                    self.set_camera_pose(pose);
                }
            }
            InputEvent::EditScene { edit } => self.edit_scene(edit),
            InputEvent::Quit => self.quit_requested = true,
        }
    }

    fn handle_escape(&mut self) {
        if self.animation.is_rendering() {
            self.cancel_requested = true;
            return;
        }
        if self.input.shift_held() {
            self.quit_requested = true;
            return;
        }

        self.mouse_captured = !self.mouse_captured;
        if self.mouse_captured {
            self.pending_click = None;
            self.selection.clear();
            if let Some(renderer) = self.renderer.as_mut() {
                bind::bind_selection(renderer, self.selection);
            }
        }
        log::debug!("mouse captured: {}", self.mouse_captured);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to {}x{}", width, height);
            return;
        }
        self.screen_width = width;
        self.screen_height = height;
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(width, height);
        }
        self.refresh_required = true;
    }

    fn capture_keyframe(&mut self, slot: KeyframeSlot) {
        match self.animation.set_keyframe(slot, self.camera.pose) {
            Ok(()) => match self.animation.planned_frames() {
                Ok(frames) => log::info!("keyframe {} captured, path is {} frames", slot, frames),
                Err(err) => log::debug!(
                    "keyframe {} captured, sampler {:?}: {}",
                    slot,
                    self.animation.state(),
                    err
                ),
            },
            Err(err) => log::warn!("cannot capture keyframe {}: {}", slot, err),
        }
    }

    fn set_animation_timing(&mut self, speed: f32, frame_rate: u32, frame_passes: u32) {
        if self.animation.is_rendering() {
            log::warn!("animation timing cannot change while rendering");
            return;
        }
        self.animation.set_speed(speed);
        self.animation.set_frame_rate(frame_rate);
        self.animation.set_frame_passes(frame_passes);
        log::debug!(
            "animation timing: {} units/s, {} fps, {} passes per frame",
            self.animation.speed(),
            self.animation.frame_rate(),
            self.animation.frame_passes()
        );
    }

    /// Scene edits are rebound in full on the next tick. They are refused while an animation
    /// renders so every frame shows the same scene.
    fn edit_scene(&mut self, edit: SceneEdit) {
        if self.animation.is_rendering() {
            log::debug!("scene edit ignored while rendering");
            return;
        }
        if self.scene.apply_edit(edit) {
            self.scene_bound = false;
        } else {
            log::warn!("scene edit {:?} names a missing entry", edit);
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> TickOutcome {
        self.timing.update(now);
        if self.quit_requested {
            return TickOutcome::Quit;
        }
        if std::mem::take(&mut self.cancel_requested) {
            self.animation.cancel();
        }

        if !self.scene_bound {
            if let Some(renderer) = self.renderer.as_mut() {
                bind::bind_scene(renderer, &self.scene, self.selection);
            }
            self.scene_bound = true;
            self.refresh_required = true;
        }

        let look = std::mem::take(&mut self.pending_look);
        if let Some(step) = self.animation.begin_iteration() {
            self.camera.pose = step.pose;
            if step.restarts_accumulation() {
                log::debug!(
                    "rendering animation frame {} of {}",
                    step.frame + 1,
                    self.animation.total_frames().unwrap_or(0)
                );
                self.refresh_required = true;
            }
        } else if self.mouse_captured {
            let looked = self.camera.look(look.x, look.y);
            let moved = self
                .camera
                .update_movement(&self.input.movement(), self.timing.frame_dt);
            if looked || moved {
                self.refresh_required = true;
            }
        }

        if let Some(cursor) = self.pending_click.take() {
            self.handle_click(cursor);
        }

        if self.scene.take_changed() {
            self.refresh_required = true;
        }
        if std::mem::take(&mut self.refresh_required) {
            self.accumulated_passes = 0;
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.set_int(uniforms::ACCUMULATED_PASSES, 0);
            }
        }

        self.render_pass(now);

        if self.animation.is_rendering() {
            self.timing.clear_long_frames();
        } else if self.timing.frozen() {
            log::error!("freeze detected, shutting down");
            return TickOutcome::Quit;
        }

        let outcome = self.animation.finish_pass();
        if let PassOutcome::Accumulating { frame, pass } = outcome {
            log::trace!("frame {} has {} passes", frame, pass);
        }
        if let Some(frame) = outcome.completed_frame() {
            self.capture_frame(frame);
        }
        TickOutcome::Continue
    }

    fn handle_click(&mut self, cursor: Vec2) {
        let ray = pick::screen_to_ray(
            cursor.x,
            cursor.y,
            self.screen_width as f32,
            self.screen_height as f32,
            &self.camera.pose,
        );
        match self.input.click_action() {
            ClickAction::Select => {
                pick::select_hovered(&self.scene, &mut self.selection, &ray);
                if let Some(renderer) = self.renderer.as_mut() {
                    bind::bind_selection(renderer, self.selection);
                }
            }
            ClickAction::Place => {
                let Some(index) = pick::place_at_cursor(&mut self.scene, &self.selection, &ray) else {
                    return;
                };
                if let (Some(renderer), Some(primitive)) =
                    (self.renderer.as_mut(), self.scene.primitive(index))
                {
                    bind::bind_primitive(renderer, index, primitive);
                }
            }
        }
    }

    fn render_pass(&mut self, now: Instant) {
        let aspect_ratio = self.screen_width as f32 / self.screen_height as f32;
        let elapsed = now.saturating_duration_since(self.started).as_secs_f32();

        if let Some(renderer) = self.renderer.as_mut() {
            if !self.animation.is_rendering() {
                renderer.set_int(uniforms::DEBUG_KEY_PRESSED, self.input.debug_key as i32);
            }
            renderer.set_float(uniforms::TIME, elapsed);
            bind::bind_camera(renderer, &self.camera.pose, aspect_ratio);
            renderer.set_int(uniforms::DIRECT_OUTPUT_PASS, 0);
            renderer.render_pass(&self.scene, &self.camera.pose);
        }
        self.accumulated_passes += 1;
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_int(uniforms::DIRECT_OUTPUT_PASS, 1);
            renderer.set_int(uniforms::ACCUMULATED_PASSES, self.accumulated_passes);
            renderer.present();
        }
    }

    /// Hands a finished frame to the sink. The first failure stops the animation, so an export
    /// never skips frames.
    fn capture_frame(&mut self, frame: u32) {
        let Some(sink) = self.frame_sink.as_mut() else {
            log::debug!("no frame sink, frame {} discarded", frame);
            return;
        };
        let written = match self.renderer.as_mut().and_then(|renderer| renderer.read_frame()) {
            Some(image) => sink.write_frame(frame, &image),
            None => Err(CaptureError::MissingReadback { frame }),
        };
        match written {
            Ok(()) => self.frames_captured += 1,
            Err(err) => {
                log::error!("capturing frame {} failed: {}", frame, err);
                self.animation.cancel();
                self.capture_error.get_or_insert(err);
            }
        }
    }
}

/// One step of a replay script: either an input event or a number of loop iterations.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum ScriptEntry {
    Wait { wait: u32 },
    Event(InputEvent),
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptEntry>, AppError> {
    let json = std::fs::read_to_string(path).map_err(|source| AppError::ScriptIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| AppError::ScriptJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Feeds `entries` through `app`, then keeps ticking until a started animation has finished.
pub fn replay<R: Renderer>(app: &mut App<R>, entries: Vec<ScriptEntry>) -> TickOutcome {
    for entry in entries {
        match entry {
            ScriptEntry::Wait { wait } => {
                for _ in 0..wait {
                    if app.tick() == TickOutcome::Quit {
                        return TickOutcome::Quit;
                    }
                }
            }
            ScriptEntry::Event(event) => app.handle_event(event),
        }
    }

    if app.tick() == TickOutcome::Quit {
        return TickOutcome::Quit;
    }
    run_until_idle(app)
}

fn run_until_idle<R: Renderer>(app: &mut App<R>) -> TickOutcome {
    while app.animation().is_rendering() {
        if app.tick() == TickOutcome::Quit {
            return TickOutcome::Quit;
        }
    }
    TickOutcome::Continue
}

/// Renders the armed animation to completion. Returns the number of frames written.
///
/// Fails if a frame could not be captured or the loop stopped before the last frame.
pub fn export<R: Renderer>(app: &mut App<R>) -> Result<u32, AppError> {
    let already_written = app.frames_captured();
    let total = app.animation_mut().start()?;
    if run_until_idle(app) == TickOutcome::Quit {
        log::warn!("animation interrupted by quit request");
    }
    if let Some(err) = app.take_capture_error() {
        return Err(err.into());
    }
    let written = app.frames_captured() - already_written;
    if written < total {
        return Err(AppError::Incomplete { written, total });
    }
    Ok(written)
}

pub fn run(args: Args) -> Result<(), AppError> {
    let mut config = EditorConfig::load(args.config.as_deref())?;
    let width = args.width.unwrap_or(config.screen_width);
    let height = args.height.unwrap_or(config.screen_height);
    config = config.screen_size(width, height);

    let scene = match &args.scene {
        Some(path) => {
            let scene = serialization::load_scene_from_file(path)?;
            log::info!(
                "loaded scene {} ({} primitives, {} lights)",
                path.display(),
                scene.primitives().len(),
                scene.lights().len()
            );
            scene
        }
        None => args.preset().build(),
    };

    match args.command {
        Command::Animate {
            from,
            to,
            speed,
            frame_rate,
            passes,
            output,
        } => {
            if let Some(speed) = speed {
                config = config.animation_speed(speed);
            }
            if let Some(frame_rate) = frame_rate {
                config = config.frame_rate(frame_rate);
            }
            if let Some(passes) = passes {
                config = config.frame_passes(passes);
            }
            if let Some(output) = output {
                config = config.output_dir(output);
            }
            config.validate()?;
            animate(config, scene, from, to)
        }
        Command::Replay { script, save } => {
            config.validate()?;
            let entries = load_script(&script)?;
            let writer = PngFrameWriter::new(config.output_dir.clone());
            let mut app = preview_app(config, scene, writer);
            log::info!("replaying {} script entries from {}", entries.len(), script.display());
            if replay(&mut app, entries) == TickOutcome::Quit {
                log::info!("replay stopped by quit request");
            }
            if let Some(err) = app.take_capture_error() {
                return Err(err.into());
            }
            if let Some(path) = save {
                serialization::save_scene_to_file(app.scene(), &path)?;
                log::info!("saved scene to {}", path.display());
            }
            Ok(())
        }
    }
}

fn preview_app(
    config: EditorConfig,
    scene: SceneStore,
    writer: PngFrameWriter,
) -> App<PreviewRenderer> {
    let renderer = PreviewRenderer::new(config.screen_width, config.screen_height, 0);
    App::new(config, scene, Some(renderer)).with_frame_sink(Box::new(writer))
}

fn animate(
    config: EditorConfig,
    scene: SceneStore,
    from: CameraPose,
    to: CameraPose,
) -> Result<(), AppError> {
    let writer = PngFrameWriter::new(config.output_dir.clone());
    log::info!("writing frames into {}", writer.output_dir().display());
    let mut app = preview_app(config, scene, writer);
    app.animation_mut().set_keyframe(KeyframeSlot::A, from)?;
    app.animation_mut().set_keyframe(KeyframeSlot::B, to)?;

    let started = Instant::now();
    let frames = export(&mut app)?;
    log::info!(
        "animation done: {} frames in {:.1} s",
        frames,
        started.elapsed().as_secs_f32()
    );
    Ok(())
}

#[cfg(test)]
impl<R: Renderer> App<R> {
    fn selection(&self) -> Selection {
        self.selection
    }

    fn camera(&self) -> &CameraController {
        &self.camera
    }

    fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    fn is_mouse_captured(&self) -> bool {
        self.mouse_captured
    }

    fn accumulated_passes(&self) -> i32 {
        self.accumulated_passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::SamplerState;
    use crate::render::uniforms::{UniformRecorder, UniformSink, UniformValue};
    use crate::render::FrameImage;
    use crate::scene::{Material, Primitive, PrimitiveKind};
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 48;

    #[derive(Default)]
    struct RecordingRenderer {
        uniforms: UniformRecorder,
        poses: Vec<CameraPose>,
        presents: u32,
        accumulated: u32,
    }

    impl UniformSink for RecordingRenderer {
        fn set_uniform(&mut self, name: &str, value: UniformValue) {
            if let (uniforms::ACCUMULATED_PASSES, UniformValue::Int(0)) = (name, value) {
                self.accumulated = 0;
            }
            self.uniforms.set_uniform(name, value);
        }
    }

    impl Renderer for RecordingRenderer {
        fn render_pass(&mut self, _scene: &SceneStore, pose: &CameraPose) {
            self.poses.push(*pose);
            self.accumulated += 1;
        }

        fn present(&mut self) {
            self.presents += 1;
        }

        fn read_frame(&mut self) -> Option<FrameImage> {
            FrameImage::new(1, 1, vec![0.5; 3], self.accumulated).ok()
        }
    }

    #[derive(Clone, Default)]
    struct MemorySink(Rc<RefCell<Vec<(u32, FrameImage)>>>);

    impl FrameSink for MemorySink {
        fn write_frame(&mut self, frame: u32, image: &FrameImage) -> Result<(), CaptureError> {
            self.0.borrow_mut().push((frame, image.clone()));
            Ok(())
        }
    }

    fn test_config() -> EditorConfig {
        EditorConfig::new()
            .screen_size(WIDTH, HEIGHT)
            .animation_speed(1.0)
            .frame_rate(1)
            .frame_passes(2)
    }

    /// Sphere straight ahead of the default camera at (0, 1, 2).
    fn sphere_scene() -> SceneStore {
        let mut scene = SceneStore::new();
        scene.add_primitive(Primitive::sphere(
            Vec3::new(0.0, 1.0, -3.0),
            1.0,
            Material::default(),
        ));
        scene
    }

    fn test_app() -> App<RecordingRenderer> {
        App::new(test_config(), sphere_scene(), Some(RecordingRenderer::default()))
    }

    fn uniform(app: &App<RecordingRenderer>, name: &str) -> Option<UniformValue> {
        app.renderer().and_then(|renderer| renderer.uniforms.latest(name))
    }

    fn center_click() -> InputEvent {
        InputEvent::MouseClicked {
            x: WIDTH as f32 / 2.0,
            y: HEIGHT as f32 / 2.0,
        }
    }

    #[test]
    fn first_tick_binds_scene_and_renders() {
        let mut app = test_app();
        assert_eq!(app.tick(), TickOutcome::Continue);

        let renderer = app.renderer().unwrap();
        let names = renderer.uniforms.names();
        assert!(names.contains(&"u_objects[0].type"));
        assert!(names.contains(&"u_planeVisible"));
        assert_eq!(renderer.poses.len(), 1);
        assert_eq!(renderer.presents, 1);
        assert_eq!(uniform(&app, "u_accumulatedPasses"), Some(UniformValue::Int(1)));
        assert_eq!(uniform(&app, "u_directOutputPass"), Some(UniformValue::Int(1)));
        assert_eq!(
            uniform(&app, "u_aspectRatio"),
            Some(UniformValue::Float(WIDTH as f32 / HEIGHT as f32))
        );
    }

    #[test]
    fn passes_accumulate_while_nothing_changes() {
        let mut app = test_app();
        for _ in 0..3 {
            app.tick();
        }
        assert_eq!(app.accumulated_passes(), 3);
        assert_eq!(uniform(&app, "u_accumulatedPasses"), Some(UniformValue::Int(3)));
    }

    #[test]
    fn click_selects_and_syncs_highlight() {
        let mut app = test_app();
        app.tick();
        app.handle_event(center_click());
        app.tick();
        assert_eq!(app.selection().index(), Some(0));
        assert_eq!(uniform(&app, "u_selectedSphereIndex"), Some(UniformValue::Int(0)));
        // Selecting does not touch the scene, so accumulation continues.
        assert_eq!(app.accumulated_passes(), 2);
    }

    #[test]
    fn latest_click_wins() {
        let mut app = test_app();
        app.handle_event(center_click());
        app.handle_event(InputEvent::MouseClicked { x: 0.0, y: 0.0 });
        app.tick();
        assert_eq!(app.selection().index(), None);
    }

    #[test]
    fn place_modifier_click_appends_and_restarts_accumulation() {
        let mut app = test_app();
        app.set_camera_pose(CameraPose::new(Vec3::new(0.0, 4.0, 0.0), 0.0, 1.2));
        app.tick();
        app.tick();
        assert_eq!(app.accumulated_passes(), 2);

        app.handle_event(InputEvent::KeyPressed { key: Key::E });
        app.handle_event(center_click());
        app.tick();

        assert_eq!(app.scene().primitives().len(), 2);
        let placed = app.scene().primitive(1).unwrap();
        assert_eq!(placed.kind, PrimitiveKind::Sphere);
        assert_eq!(placed.material, Material::neutral_white());
        assert_eq!(app.accumulated_passes(), 1);
        assert!(uniform(&app, "u_objects[1].position").is_some());
    }

    #[test]
    fn escape_captures_mouse_and_clears_selection() {
        let mut app = test_app();
        app.handle_event(center_click());
        app.tick();
        assert_eq!(app.selection().index(), Some(0));

        app.handle_event(InputEvent::KeyPressed { key: Key::Escape });
        assert!(app.is_mouse_captured());
        assert_eq!(app.selection().index(), None);
        assert_eq!(uniform(&app, "u_selectedSphereIndex"), Some(UniformValue::Int(-1)));

        // Clicks are ignored while captured, mouse motion turns the camera.
        app.handle_event(center_click());
        app.handle_event(InputEvent::MouseMotion { dx: 100.0, dy: 0.0 });
        app.tick();
        assert_eq!(app.selection().index(), None);
        assert!((app.camera().pose.yaw - 0.2).abs() < 1e-6);
        assert_eq!(app.accumulated_passes(), 1);

        app.handle_event(InputEvent::KeyPressed { key: Key::Escape });
        assert!(!app.is_mouse_captured());
    }

    #[test]
    fn shift_escape_quits() {
        let mut app = test_app();
        app.handle_event(InputEvent::KeyPressed { key: Key::LeftShift });
        app.handle_event(InputEvent::KeyPressed { key: Key::Escape });
        assert_eq!(app.tick(), TickOutcome::Quit);
    }

    fn armed_app(sink: MemorySink) -> App<RecordingRenderer> {
        let mut app = test_app().with_frame_sink(Box::new(sink));
        app.set_camera_pose(CameraPose::new(Vec3::new(0.0, 1.0, 0.0), 0.0, 0.0));
        app.handle_event(InputEvent::CaptureKeyframe { slot: KeyframeSlot::A });
        app.set_camera_pose(CameraPose::new(Vec3::new(3.0, 1.0, 0.0), 0.5, 0.0));
        app.handle_event(InputEvent::CaptureKeyframe { slot: KeyframeSlot::B });
        app
    }

    #[test]
    fn animation_captures_every_frame_after_all_passes() {
        let sink = MemorySink::default();
        let mut app = armed_app(sink.clone());
        app.handle_event(InputEvent::StartAnimation);
        assert_eq!(app.animation().total_frames(), Some(3));

        let mut ticks = 0;
        while app.animation().is_rendering() {
            app.tick();
            ticks += 1;
        }
        assert_eq!(ticks, 6);

        let frames = sink.0.borrow();
        let indices: Vec<u32> = frames.iter().map(|(frame, _)| *frame).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(frames.iter().all(|(_, image)| image.passes == 2));

        let poses = &app.renderer().unwrap().poses;
        assert!(poses[2].position.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
        assert_eq!(poses[3], poses[2]);
        assert!((poses[4].yaw - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn slow_animation_passes_do_not_trip_freeze_detection() {
        let sink = MemorySink::default();
        let mut app = armed_app(sink.clone());
        app.handle_event(InputEvent::StartAnimation);

        let start = Instant::now();
        let mut now = start;
        while app.animation().is_rendering() {
            now += Duration::from_millis(1500);
            assert_eq!(app.tick_at(now), TickOutcome::Continue);
        }
        let indices: Vec<u32> = sink.0.borrow().iter().map(|(frame, _)| *frame).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(app.animation().state(), SamplerState::Idle);

        // Back in interactive use, slow iterations count again from zero.
        now += Duration::from_millis(1500);
        assert_eq!(app.tick_at(now), TickOutcome::Continue);
        now += Duration::from_millis(1500);
        assert_eq!(app.tick_at(now), TickOutcome::Quit);
    }

    #[test]
    fn export_writes_every_frame() {
        let sink = MemorySink::default();
        let mut app = armed_app(sink.clone());
        assert_eq!(export(&mut app).unwrap(), 3);
        assert_eq!(sink.0.borrow().len(), 3);
        assert_eq!(app.frames_captured(), 3);

        // Keyframes survive, so the same path can be exported again.
        assert_eq!(export(&mut app).unwrap(), 3);
        assert_eq!(sink.0.borrow().len(), 6);
    }

    /// Accepts frames below `fail_from` and rejects the rest.
    struct FailingSink {
        written: Rc<RefCell<Vec<u32>>>,
        fail_from: u32,
    }

    impl FrameSink for FailingSink {
        fn write_frame(&mut self, frame: u32, _image: &FrameImage) -> Result<(), CaptureError> {
            if frame >= self.fail_from {
                return Err(CaptureError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.written.borrow_mut().push(frame);
            Ok(())
        }
    }

    #[test]
    fn failing_sink_stops_the_animation() {
        let written = Rc::new(RefCell::new(Vec::new()));
        let mut app = armed_app(MemorySink::default()).with_frame_sink(Box::new(FailingSink {
            written: written.clone(),
            fail_from: 1,
        }));

        let err = export(&mut app).unwrap_err();
        assert!(matches!(err, AppError::Capture(CaptureError::Io(_))));
        assert_eq!(*written.borrow(), vec![0]);
        assert_eq!(app.frames_captured(), 1);
        assert_eq!(app.animation().state(), SamplerState::Idle);
        // Reported once.
        assert!(app.take_capture_error().is_none());
    }

    #[test]
    fn failing_sink_error_is_kept_for_interactive_renders() {
        let mut app = armed_app(MemorySink::default()).with_frame_sink(Box::new(FailingSink {
            written: Rc::new(RefCell::new(Vec::new())),
            fail_from: 0,
        }));
        app.handle_event(InputEvent::StartAnimation);
        app.tick();
        assert!(app.animation().is_rendering());
        app.tick();
        assert!(!app.animation().is_rendering());
        assert!(matches!(app.take_capture_error(), Some(CaptureError::Io(_))));
    }

    #[test]
    fn missing_readback_fails_the_export() {
        let mut app: App<RecordingRenderer> = App::new(test_config(), sphere_scene(), None)
            .with_frame_sink(Box::new(MemorySink::default()));
        app.handle_event(InputEvent::SetCameraPose {
            pose: CameraPose::new(Vec3::ZERO, 0.0, 0.0),
        });
        app.handle_event(InputEvent::CaptureKeyframe { slot: KeyframeSlot::A });
        app.handle_event(InputEvent::SetCameraPose {
            pose: CameraPose::new(Vec3::new(2.0, 0.0, 0.0), 0.0, 0.0),
        });
        app.handle_event(InputEvent::CaptureKeyframe { slot: KeyframeSlot::B });

        let err = export(&mut app).unwrap_err();
        assert!(matches!(
            err,
            AppError::Capture(CaptureError::MissingReadback { frame: 0 })
        ));
    }

    #[test]
    fn quit_during_export_reports_incomplete() {
        let mut app = armed_app(MemorySink::default());
        app.handle_event(InputEvent::Quit);
        let err = export(&mut app).unwrap_err();
        assert!(matches!(err, AppError::Incomplete { written: 0, total: 3 }));
    }

    #[test]
    fn export_without_keyframes_fails() {
        let mut app = test_app().with_frame_sink(Box::new(MemorySink::default()));
        assert!(matches!(export(&mut app), Err(AppError::Animation(_))));
    }

    #[test]
    fn timing_event_applies_to_next_render_only() {
        let mut app = armed_app(MemorySink::default());
        app.handle_event(InputEvent::AnimationTiming {
            speed: 1.0,
            frame_rate: 2,
            frame_passes: 1,
        });
        app.handle_event(InputEvent::StartAnimation);
        assert_eq!(app.animation().total_frames(), Some(6));

        app.handle_event(InputEvent::AnimationTiming {
            speed: 5.0,
            frame_rate: 2,
            frame_passes: 4,
        });
        assert_eq!(app.animation().frame_passes(), 1);
        assert_eq!(app.animation().speed(), 1.0);
    }

    #[test]
    fn clear_keyframes_event_disarms() {
        let mut app = armed_app(MemorySink::default());
        assert_eq!(app.animation().state(), SamplerState::Armed);
        app.handle_event(InputEvent::ClearKeyframes);
        assert_eq!(app.animation().state(), SamplerState::Idle);
        app.handle_event(InputEvent::StartAnimation);
        assert!(!app.animation().is_rendering());
    }

    #[test]
    fn camera_pose_event_is_ignored_while_rendering() {
        let mut app = armed_app(MemorySink::default());
        let pose = CameraPose::new(Vec3::new(0.0, 2.0, 5.0), 0.1, 0.2);
        app.handle_event(InputEvent::SetCameraPose { pose });
        assert_eq!(app.camera().pose, pose);

        app.handle_event(InputEvent::StartAnimation);
        app.tick();
        app.handle_event(InputEvent::SetCameraPose { pose });
        assert_ne!(app.camera().pose, pose);
    }

    #[test]
    fn scene_edits_wait_for_the_animation() {
        let mut app = armed_app(MemorySink::default());
        app.handle_event(InputEvent::StartAnimation);
        app.tick();
        app.handle_event(InputEvent::EditScene {
            edit: SceneEdit::SphereRadius { index: 0, radius: 3.0 },
        });
        assert_eq!(app.scene().primitive(0).unwrap().scale, Vec3::ONE);
    }

    #[test]
    fn escape_cancels_animation_at_next_tick() {
        let sink = MemorySink::default();
        let mut app = armed_app(sink.clone());
        app.handle_event(InputEvent::StartAnimation);
        app.tick();
        app.handle_event(InputEvent::KeyPressed { key: Key::Escape });
        assert!(app.animation().is_rendering());
        assert!(!app.is_mouse_captured());

        app.tick();
        assert!(!app.animation().is_rendering());
        assert!(sink.0.borrow().is_empty());
    }

    #[test]
    fn clicks_are_ignored_while_rendering() {
        let mut app = armed_app(MemorySink::default());
        app.handle_event(InputEvent::StartAnimation);
        app.handle_event(center_click());
        app.tick();
        assert_eq!(app.selection().index(), None);
    }

    #[test]
    fn start_without_keyframes_stays_idle() {
        let mut app = test_app();
        app.handle_event(InputEvent::StartAnimation);
        assert!(!app.animation().is_rendering());
    }

    #[test]
    fn works_without_renderer() {
        let mut app: App<RecordingRenderer> = App::new(test_config(), sphere_scene(), None);
        app.handle_event(center_click());
        assert_eq!(app.tick(), TickOutcome::Continue);
        assert_eq!(app.selection().index(), Some(0));
    }

    #[test]
    fn resize_restarts_accumulation_and_changes_aspect() {
        let mut app = test_app();
        app.tick();
        app.tick();
        app.handle_event(InputEvent::Resized { width: 100, height: 50 });
        app.tick();
        assert_eq!(app.accumulated_passes(), 1);
        assert_eq!(uniform(&app, "u_aspectRatio"), Some(UniformValue::Float(2.0)));
    }

    #[test]
    fn scene_edit_rebinds_on_next_tick() {
        let mut app = test_app();
        app.tick();
        app.handle_event(InputEvent::EditScene {
            edit: SceneEdit::PlaneVisible { visible: false },
        });
        assert!(!app.scene().plane().visible);
        app.tick();
        assert_eq!(uniform(&app, "u_planeVisible"), Some(UniformValue::Int(0)));
        assert_eq!(app.accumulated_passes(), 1);
    }

    #[test]
    fn two_long_iterations_quit() {
        let mut app = test_app();
        let start = Instant::now();
        assert_eq!(app.tick_at(start), TickOutcome::Continue);
        assert_eq!(app.tick_at(start + Duration::from_millis(1500)), TickOutcome::Continue);
        assert_eq!(app.tick_at(start + Duration::from_millis(3000)), TickOutcome::Quit);
    }

    #[test]
    fn replay_script_entries() {
        let entries: Vec<ScriptEntry> = serde_json::from_str(
            r#"[
                { "event": "key_pressed", "key": "e" },
                { "event": "mouse_clicked", "x": 32.0, "y": 24.0 },
                { "wait": 2 },
                { "event": "key_released", "key": "e" }
            ]"#,
        )
        .unwrap();
        assert_eq!(entries[2], ScriptEntry::Wait { wait: 2 });

        let mut app = test_app();
        app.set_camera_pose(CameraPose::new(Vec3::new(0.0, 4.0, 0.0), 0.0, 1.2));
        assert_eq!(replay(&mut app, entries), TickOutcome::Continue);
        assert_eq!(app.scene().primitives().len(), 2);
        assert_eq!(app.renderer().unwrap().poses.len(), 3);
    }
}
