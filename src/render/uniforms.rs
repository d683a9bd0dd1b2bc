//! Named uniform slots shared with the ray tracing shader.
//!
//! Array members are addressed as `collection[index].field`; an index here is the primitive or
//! light index in the scene store.

use glam::{Mat4, Vec3};

pub const CAMERA_POSITION: &str = "u_cameraPosition";
pub const ROTATION_MATRIX: &str = "u_rotationMatrix";
pub const ASPECT_RATIO: &str = "u_aspectRatio";
pub const ACCUMULATED_PASSES: &str = "u_accumulatedPasses";
pub const DIRECT_OUTPUT_PASS: &str = "u_directOutputPass";
pub const TIME: &str = "u_time";
pub const DEBUG_KEY_PRESSED: &str = "u_debugKeyPressed";
pub const SELECTED_INDEX: &str = "u_selectedSphereIndex";
pub const PLANE_VISIBLE: &str = "u_planeVisible";

pub const SHADOW_RESOLUTION: &str = "u_shadowResolution";
pub const LIGHT_BOUNCES: &str = "u_lightBounces";
pub const FRAME_PASSES: &str = "u_framePasses";
pub const BLUR: &str = "u_blur";
pub const BLOOM_RADIUS: &str = "u_bloomRadius";
pub const BLOOM_INTENSITY: &str = "u_bloomIntensity";
pub const SKYBOX_STRENGTH: &str = "u_skyboxStrength";
pub const SKYBOX_GAMMA: &str = "u_skyboxGamma";
pub const SKYBOX_CEILING: &str = "u_skyboxCeiling";

pub const OBJECTS: &str = "u_objects";
pub const LIGHTS: &str = "u_lights";
pub const PLANE_MATERIAL: &str = "u_planeMaterial";

/// `u_objects[3].material.albedo` style name.
pub fn element_name(collection: &str, index: usize, field: &str) -> String {
    format!("{}[{}].{}", collection, index, field)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec3(Vec3),
    /// Column-major, as the shader expects.
    Mat4(Mat4),
}

/// Destination for uniform writes. Implementations must ignore names the bound program does not
/// declare instead of failing.
pub trait UniformSink {
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn set_int(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    fn set_uint(&mut self, name: &str, value: u32) {
        self.set_uniform(name, UniformValue::UInt(value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }
}

/// Keeps every write in order, for asserting on what a renderer was sent.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct UniformRecorder {
    writes: Vec<(String, UniformValue)>,
}

#[cfg(test)]
impl UniformRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.writes.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Most recent value written to `name`.
    pub fn latest(&self, name: &str) -> Option<UniformValue> {
        self.writes
            .iter()
            .rev()
            .find(|(written, _)| written == name)
            .map(|(_, value)| *value)
    }
}

#[cfg(test)]
impl UniformSink for UniformRecorder {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        log::trace!("uniform {} = {:?}", name, value);
        self.writes.push((name.to_string(), value));
    }
}
