use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame buffer holds {actual} floats, expected {expected} for {width}x{height} RGB")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("frame {frame} finished but the renderer returned no pixels")]
    MissingReadback { frame: u32 },
}

/// Accumulated frame read back from the renderer.
///
/// `pixels` is linear RGB, three floats per pixel, rows stored bottom-up as GPU readback
/// delivers them, holding the sum of `passes` passes.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<f32>,
    pub passes: u32,
}

impl FrameImage {
    pub fn new(width: u32, height: u32, pixels: Vec<f32>, passes: u32) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(CaptureError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            passes,
        })
    }

    /// Averages the passes into 8-bit RGB, top row first.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let scale = 1.0 / self.passes.max(1) as f32;
        let row_len = self.width as usize * 3;
        let mut out = Vec::with_capacity(self.pixels.len());
        if row_len == 0 {
            return out;
        }
        for row in self.pixels.chunks_exact(row_len).rev() {
            out.extend(
                row.iter()
                    .map(|value| ((value * scale).clamp(0.0, 1.0) * 255.0) as u8),
            );
        }
        out
    }
}

/// Receives each finished animation frame.
pub trait FrameSink {
    fn write_frame(&mut self, frame: u32, image: &FrameImage) -> Result<(), CaptureError>;
}

/// Writes `<output_dir>/<frame>.png`.
#[derive(Debug, Clone)]
pub struct PngFrameWriter {
    output_dir: PathBuf,
}

impl PngFrameWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn frame_path(&self, frame: u32) -> PathBuf {
        self.output_dir.join(format!("{}.png", frame))
    }
}

impl FrameSink for PngFrameWriter {
    fn write_frame(&mut self, frame: u32, image: &FrameImage) -> Result<(), CaptureError> {
        if !self.output_dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.output_dir)?;
        }
        let path = self.frame_path(frame);
        image::save_buffer_with_format(
            &path,
            &image.to_rgb8(),
            image.width,
            image.height,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )?;
        log::info!("saved frame {} to {}", frame, path.display());
        Ok(())
    }
}
