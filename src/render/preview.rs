//! Flat-shaded CPU renderer.
//!
//! Casts one ray per pixel with the same generation as picking and colours the nearest hit by
//! its material's albedo plus emission. No lighting is computed; it exists so the headless binary
//! can drive the whole loop and produce inspectable frames.

use crate::geometry::Ray;
use crate::render::camera::CameraPose;
use crate::render::capture::FrameImage;
use crate::render::pick::screen_to_ray;
use crate::render::uniforms::{self, UniformSink, UniformValue};
use crate::render::Renderer;
use crate::scene::{Material, Plane, SceneStore};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const SKY_HORIZON: Vec3 = Vec3::ONE;
const SKY_ZENITH: Vec3 = Vec3::new(0.5, 0.7, 1.0);
const HIGHLIGHT: Vec3 = Vec3::new(1.0, 0.6, 0.1);

pub struct PreviewRenderer {
    width: u32,
    height: u32,
    /// Summed RGB, rows bottom-up.
    accumulation: Vec<f32>,
    passes: u32,
    accumulated_passes: i32,
    selected: i32,
    jitter: Option<ChaCha20Rng>,
}

impl PreviewRenderer {
    /// Renderer with sub-pixel jitter, so accumulated passes anti-alias edges.
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        let mut renderer = Self::without_jitter(width, height);
        renderer.jitter = Some(ChaCha20Rng::seed_from_u64(seed));
        renderer
    }

    /// Renderer that always samples pixel centers.
    pub fn without_jitter(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            accumulation: vec![0.0; width as usize * height as usize * 3],
            passes: 0,
            accumulated_passes: 0,
            selected: -1,
            jitter: None,
        }
    }

    fn sample_offset(&mut self) -> (f32, f32) {
        match self.jitter.as_mut() {
            Some(rng) => (rng.random::<f32>(), rng.random::<f32>()),
            None => (0.5, 0.5),
        }
    }

    fn shade(&self, scene: &SceneStore, ray: &Ray) -> Vec3 {
        let primitive = scene.nearest_hit(ray);
        let plane = if scene.plane().visible {
            Plane::intersect(ray)
        } else {
            None
        };

        match (primitive, plane) {
            (Some((index, distance)), plane) if plane.map_or(true, |p| distance <= p) => {
                let color = scene
                    .primitive(index)
                    .map_or(Vec3::ZERO, |hit| surface_color(&hit.material));
                if index as i32 == self.selected {
                    color.lerp(HIGHLIGHT, 0.5)
                } else {
                    color
                }
            }
            (_, Some(_)) => surface_color(&scene.plane().material),
            _ => sky_color(ray.direction),
        }
    }
}

fn surface_color(material: &Material) -> Vec3 {
    material.albedo + material.emission * material.emission_strength
}

fn sky_color(direction: Vec3) -> Vec3 {
    let t = 0.5 * (direction.y + 1.0);
    SKY_HORIZON.lerp(SKY_ZENITH, t)
}

impl UniformSink for PreviewRenderer {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        match (name, value) {
            (uniforms::ACCUMULATED_PASSES, UniformValue::Int(passes)) => {
                self.accumulated_passes = passes
            }
            (uniforms::SELECTED_INDEX, UniformValue::Int(index)) => self.selected = index,
            _ => log::trace!("preview ignores uniform {}", name),
        }
    }
}

impl Renderer for PreviewRenderer {
    fn render_pass(&mut self, scene: &SceneStore, pose: &CameraPose) {
        if self.accumulated_passes == 0 {
            self.accumulation.fill(0.0);
            self.passes = 0;
        }

        let (width, height) = (self.width, self.height);
        for y in 0..height {
            let row = (height - 1 - y) as usize;
            for x in 0..width {
                let (dx, dy) = self.sample_offset();
                let ray = screen_to_ray(
                    x as f32 + dx,
                    y as f32 + dy,
                    width as f32,
                    height as f32,
                    pose,
                );
                let color = self.shade(scene, &ray);
                let offset = (row * width as usize + x as usize) * 3;
                self.accumulation[offset] += color.x;
                self.accumulation[offset + 1] += color.y;
                self.accumulation[offset + 2] += color.z;
            }
        }
        self.passes += 1;
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.accumulation = vec![0.0; self.width as usize * self.height as usize * 3];
        self.passes = 0;
    }

    fn read_frame(&mut self) -> Option<FrameImage> {
        match FrameImage::new(self.width, self.height, self.accumulation.clone(), self.passes) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!("preview readback failed: {}", err);
                None
            }
        }
    }
}
