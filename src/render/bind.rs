//! Pushes scene state into a [`UniformSink`].
//!
//! [`bind_scene`] writes in a fixed order: lights, plane material, render settings, primitives,
//! then selection and plane visibility. The per-item functions are used after single edits so
//! the whole scene does not need to be re-sent.

use crate::render::camera::CameraPose;
use crate::render::uniforms::{self, element_name, UniformSink};
use crate::scene::{Material, PointLight, Primitive, RenderSettings, SceneStore, Selection};

pub fn bind_scene(sink: &mut dyn UniformSink, scene: &SceneStore, selection: Selection) {
    for (index, light) in scene.lights().iter().enumerate() {
        bind_light(sink, index, light);
    }

    bind_material(sink, uniforms::PLANE_MATERIAL, &scene.plane().material);
    bind_settings(sink, scene.settings());

    for (index, primitive) in scene.primitives().iter().enumerate() {
        bind_primitive(sink, index, primitive);
    }

    bind_selection(sink, selection);
    sink.set_int(uniforms::PLANE_VISIBLE, scene.plane().visible as i32);
}

pub fn bind_light(sink: &mut dyn UniformSink, index: usize, light: &PointLight) {
    sink.set_vec3(&element_name(uniforms::LIGHTS, index, "position"), light.position);
    sink.set_float(&element_name(uniforms::LIGHTS, index, "radius"), light.radius);
    sink.set_vec3(&element_name(uniforms::LIGHTS, index, "color"), light.color);
    sink.set_float(&element_name(uniforms::LIGHTS, index, "power"), light.power);
    sink.set_float(&element_name(uniforms::LIGHTS, index, "reach"), light.reach);
}

/// Writes the seven material fields under `prefix`, e.g. `u_planeMaterial` or
/// `u_objects[2].material`.
pub fn bind_material(sink: &mut dyn UniformSink, prefix: &str, material: &Material) {
    let field = |name: &str| format!("{}.{}", prefix, name);
    sink.set_vec3(&field("albedo"), material.albedo);
    sink.set_vec3(&field("specular"), material.specular);
    sink.set_vec3(&field("emission"), material.emission);
    sink.set_float(&field("emissionStrength"), material.emission_strength);
    sink.set_float(&field("roughness"), material.roughness);
    sink.set_float(&field("specularHighlight"), material.specular_highlight);
    sink.set_float(&field("specularExponent"), material.specular_exponent);
}

pub fn bind_settings(sink: &mut dyn UniformSink, settings: &RenderSettings) {
    sink.set_int(uniforms::SHADOW_RESOLUTION, settings.shadow_resolution);
    sink.set_int(uniforms::LIGHT_BOUNCES, settings.light_bounces);
    sink.set_int(uniforms::FRAME_PASSES, settings.frame_passes);
    sink.set_float(uniforms::BLUR, settings.blur);
    sink.set_float(uniforms::BLOOM_RADIUS, settings.bloom_radius);
    sink.set_float(uniforms::BLOOM_INTENSITY, settings.bloom_intensity);
    sink.set_float(uniforms::SKYBOX_STRENGTH, settings.skybox_strength);
    sink.set_float(uniforms::SKYBOX_GAMMA, settings.skybox_gamma);
    sink.set_float(uniforms::SKYBOX_CEILING, settings.skybox_ceiling);
}

pub fn bind_primitive(sink: &mut dyn UniformSink, index: usize, primitive: &Primitive) {
    sink.set_uint(&element_name(uniforms::OBJECTS, index, "type"), primitive.kind.type_id());
    sink.set_vec3(&element_name(uniforms::OBJECTS, index, "position"), primitive.position);
    sink.set_vec3(&element_name(uniforms::OBJECTS, index, "scale"), primitive.scale);
    bind_material(
        sink,
        &element_name(uniforms::OBJECTS, index, "material"),
        &primitive.material,
    );
}

pub fn bind_selection(sink: &mut dyn UniformSink, selection: Selection) {
    sink.set_int(uniforms::SELECTED_INDEX, selection.uniform_value());
}

/// Per-frame camera slots.
pub fn bind_camera(sink: &mut dyn UniformSink, pose: &CameraPose, aspect_ratio: f32) {
    sink.set_vec3(uniforms::CAMERA_POSITION, pose.position);
    sink.set_mat4(uniforms::ROTATION_MATRIX, pose.rotation_matrix());
    sink.set_float(uniforms::ASPECT_RATIO, aspect_ratio);
}
