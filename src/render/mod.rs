pub mod bind;
pub mod camera;
pub mod capture;
pub mod pick;
pub mod preview;
pub mod uniforms;

pub use camera::{CameraController, CameraMovement, CameraPose};
pub use capture::{CaptureError, FrameImage, FrameSink, PngFrameWriter};
pub use preview::PreviewRenderer;
pub use uniforms::UniformSink;

use crate::scene::SceneStore;

/// Backend that draws the scene.
///
/// Everything except geometry reaches the renderer as uniforms. Each loop iteration issues one
/// accumulation pass (`u_directOutputPass` = 0) followed by a present (`u_directOutputPass` = 1).
/// A pass rendered while `u_accumulatedPasses` is 0 discards whatever was accumulated before.
pub trait Renderer: UniformSink {
    fn render_pass(&mut self, scene: &SceneStore, pose: &CameraPose);

    /// Shows the accumulated image. Headless renderers have nothing to do here.
    fn present(&mut self) {}

    /// New output size in pixels. The caller restarts accumulation afterwards.
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Reads back the accumulated image, or `None` if the backend cannot.
    fn read_frame(&mut self) -> Option<FrameImage>;
}
