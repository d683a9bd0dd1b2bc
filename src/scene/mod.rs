pub mod procedural;
pub mod serialization;

use crate::geometry::{self, Ray};
use glam::Vec3;

/// Size of the light array the shader declares. Lights past this index are still stored but the
/// renderer will not see them.
pub const MAX_LIGHTS: usize = 16;

/// Surface description shared by primitives and the ground plane.
///
/// `specular_exponent` is a normalized [0, 1] control, the shader maps it to a real exponent.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Material {
    pub albedo: Vec3,
    pub specular: Vec3,
    pub emission: Vec3,
    pub emission_strength: f32,
    pub roughness: f32,
    pub specular_highlight: f32,
    pub specular_exponent: f32,
}

impl Material {
    pub fn new(
        albedo: Vec3,
        specular: Vec3,
        emission: Vec3,
        emission_strength: f32,
        roughness: f32,
        specular_highlight: f32,
        specular_exponent: f32,
    ) -> Self {
        Self {
            albedo,
            specular,
            emission,
            emission_strength,
            roughness,
            specular_highlight,
            specular_exponent,
        }
    }

    /// Rough, non-emissive surface of the given color.
    pub fn diffuse(albedo: Vec3) -> Self {
        Self::new(albedo, Vec3::ZERO, Vec3::ZERO, 1.0, 1.0, 0.0, 0.5)
    }

    /// Material given to primitives placed with nothing selected.
    pub fn neutral_white() -> Self {
        Self::new(Vec3::ONE, Vec3::ZERO, Vec3::ZERO, 0.0, 1.0, 0.0, 0.0)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Vec3::ONE)
    }
}

/// Primitive type tag. The discriminant is what the shader reads from `u_objects[i].type`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    None = 0,
    Sphere = 1,
    Box = 2,
}

impl PrimitiveKind {
    pub fn type_id(self) -> u32 {
        self as u32
    }
}

/// Renderable shape entry.
///
/// For spheres only `scale.x` is meaningful and acts as the radius; boxes store their full
/// extent in `scale`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub position: Vec3,
    pub scale: Vec3,
    pub material: Material,
}

impl Primitive {
    pub fn sphere(position: Vec3, radius: f32, material: Material) -> Self {
        Self {
            kind: PrimitiveKind::Sphere,
            position,
            scale: Vec3::splat(radius),
            material,
        }
    }

    #[cfg(test)]
    pub fn cuboid(position: Vec3, extent: Vec3, material: Material) -> Self {
        Self {
            kind: PrimitiveKind::Box,
            position,
            scale: extent,
            material,
        }
    }

    pub fn radius(&self) -> f32 {
        self.scale.x
    }

    /// Hit distance along `ray`, dispatching on the primitive type. `None` primitives never hit.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        match self.kind {
            PrimitiveKind::None => None,
            PrimitiveKind::Sphere => geometry::intersect_sphere(self.position, self.radius(), ray),
            PrimitiveKind::Box => geometry::intersect_box(self.position, self.scale, ray),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    /// Soft shadow source size, not a visual radius.
    pub radius: f32,
    pub color: Vec3,
    pub power: f32,
    /// Points further away than this are not lit.
    pub reach: f32,
}

impl PointLight {
    pub fn new(position: Vec3, radius: f32, color: Vec3, power: f32, reach: f32) -> Self {
        Self {
            position,
            radius,
            color,
            power,
            reach,
        }
    }
}

/// The implicit ground plane: y = 0, normal +Y.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Plane {
    pub material: Material,
    pub visible: bool,
}

impl Plane {
    pub const NORMAL: Vec3 = Vec3::Y;
    pub const POINT: Vec3 = Vec3::ZERO;

    pub fn intersect(ray: &Ray) -> Option<f32> {
        geometry::intersect_plane(Self::NORMAL, Self::POINT, ray)
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            material: Material::default(),
            visible: true,
        }
    }
}

/// Global renderer parameters edited from the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub shadow_resolution: i32,
    pub light_bounces: i32,
    /// Sample passes per displayed frame.
    pub frame_passes: i32,
    pub blur: f32,
    pub bloom_radius: f32,
    pub bloom_intensity: f32,
    pub skybox_strength: f32,
    pub skybox_gamma: f32,
    pub skybox_ceiling: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_resolution: 20,
            light_bounces: 5,
            frame_passes: 4,
            // Less than a pixel, acts as anti-aliasing.
            blur: 0.002,
            bloom_radius: 0.02,
            bloom_intensity: 0.5,
            skybox_strength: 1.0,
            skybox_gamma: 2.2,
            skybox_ceiling: 10.0,
        }
    }
}

/// Optional index into the primitive sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection(Option<usize>);

impl Selection {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn index(&self) -> Option<usize> {
        self.0
    }

    pub fn set(&mut self, index: Option<usize>) {
        self.0 = index;
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    /// Value of the highlight uniform: the index, or -1 when nothing is selected.
    pub fn uniform_value(&self) -> i32 {
        self.0.map_or(-1, |index| index as i32)
    }
}

/// Index-addressed edit, as the settings panel issues them.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "set", rename_all = "snake_case")]
pub enum SceneEdit {
    PrimitiveKind { index: usize, kind: PrimitiveKind },
    PrimitivePosition { index: usize, position: Vec3 },
    PrimitiveScale { index: usize, scale: Vec3 },
    SphereRadius { index: usize, radius: f32 },
    PrimitiveMaterial { index: usize, material: Material },
    Light { index: usize, light: PointLight },
    PlaneMaterial { material: Material },
    PlaneVisible { visible: bool },
    Settings { settings: RenderSettings },
}

/// Owns every primitive, light, the plane and the render settings.
///
/// Insertion order is identity: index `i` here is `u_objects[i]` in the shader. There is no
/// removal, so an index stays valid for the lifetime of the store. Every mutation sets the
/// changed latch, which the render loop consumes to restart sample accumulation.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneStore {
    primitives: Vec<Primitive>,
    lights: Vec<PointLight>,
    #[serde(default)]
    plane: Plane,
    #[serde(default)]
    settings: RenderSettings,
    #[serde(skip)]
    changed: bool,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn primitive(&self, index: usize) -> Option<&Primitive> {
        self.primitives.get(index)
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Appends a primitive and returns its index.
    pub fn add_primitive(&mut self, primitive: Primitive) -> usize {
        self.primitives.push(primitive);
        self.changed = true;
        self.primitives.len() - 1
    }

    /// Appends a light and returns its index.
    pub fn add_light(&mut self, light: PointLight) -> usize {
        self.lights.push(light);
        self.check_light_capacity();
        self.changed = true;
        self.lights.len() - 1
    }

    /// Applies `edit` to the primitive at `index`. Returns false if the index is out of range.
    pub fn update_primitive(&mut self, index: usize, edit: impl FnOnce(&mut Primitive)) -> bool {
        let Some(primitive) = self.primitives.get_mut(index) else {
            return false;
        };
        edit(primitive);
        self.changed = true;
        true
    }

    pub fn set_primitive_position(&mut self, index: usize, position: Vec3) -> bool {
        self.update_primitive(index, |primitive| primitive.position = position)
    }

    pub fn set_primitive_scale(&mut self, index: usize, scale: Vec3) -> bool {
        self.update_primitive(index, |primitive| primitive.scale = scale)
    }

    pub fn set_primitive_material(&mut self, index: usize, material: Material) -> bool {
        self.update_primitive(index, |primitive| primitive.material = material)
    }

    /// Writes the radius into all three scale components so a later switch to a box stays cubic.
    pub fn set_sphere_radius(&mut self, index: usize, radius: f32) -> bool {
        self.update_primitive(index, |primitive| primitive.scale = Vec3::splat(radius))
    }

    /// Changes the primitive type, converting the scale so the shape keeps roughly its size:
    /// a sphere of radius r becomes a box of extent 2r, a box becomes a sphere with half its
    /// smallest extent as radius.
    pub fn set_primitive_kind(&mut self, index: usize, kind: PrimitiveKind) -> bool {
        self.update_primitive(index, |primitive| {
            match (primitive.kind, kind) {
                (PrimitiveKind::Sphere, PrimitiveKind::Box) => primitive.scale *= 2.0,
                (PrimitiveKind::Box, PrimitiveKind::Sphere) => {
                    primitive.scale = Vec3::splat(primitive.scale.min_element() / 2.0)
                }
                _ => {}
            }
            primitive.kind = kind;
        })
    }

    pub fn update_light(&mut self, index: usize, edit: impl FnOnce(&mut PointLight)) -> bool {
        let Some(light) = self.lights.get_mut(index) else {
            return false;
        };
        edit(light);
        self.changed = true;
        true
    }

    /// Lights stored past the shader's array size.
    pub fn excess_lights(&self) -> usize {
        self.lights.len().saturating_sub(MAX_LIGHTS)
    }

    /// Warns when the renderer will not see every light. Returns the number it drops.
    pub fn check_light_capacity(&self) -> usize {
        let excess = self.excess_lights();
        if excess > 0 {
            log::warn!(
                "{} lights exceed the renderer capacity of {}; extra lights are ignored by the shader",
                self.lights.len(),
                MAX_LIGHTS
            );
        }
        excess
    }

    /// Applies one settings panel edit. Returns false if it names a missing primitive or light.
    pub fn apply_edit(&mut self, edit: SceneEdit) -> bool {
        match edit {
            SceneEdit::PrimitiveKind { index, kind } => self.set_primitive_kind(index, kind),
            SceneEdit::PrimitivePosition { index, position } => {
                self.set_primitive_position(index, position)
            }
            SceneEdit::PrimitiveScale { index, scale } => self.set_primitive_scale(index, scale),
            SceneEdit::SphereRadius { index, radius } => self.set_sphere_radius(index, radius),
            SceneEdit::PrimitiveMaterial { index, material } => {
                self.set_primitive_material(index, material)
            }
            SceneEdit::Light { index, light } => self.update_light(index, |stored| *stored = light),
            SceneEdit::PlaneMaterial { material } => {
                self.set_plane_material(material);
                true
            }
            SceneEdit::PlaneVisible { visible } => {
                self.set_plane_visible(visible);
                true
            }
            SceneEdit::Settings { settings } => {
                self.update_settings(|stored| *stored = settings);
                true
            }
        }
    }

    pub fn set_plane_material(&mut self, material: Material) {
        self.plane.material = material;
        self.changed = true;
    }

    pub fn set_plane_visible(&mut self, visible: bool) {
        self.plane.visible = visible;
        self.changed = true;
    }

    pub fn update_settings(&mut self, edit: impl FnOnce(&mut RenderSettings)) {
        edit(&mut self.settings);
        self.changed = true;
    }

    /// Nearest primitive hit by `ray`, scanning in index order.
    ///
    /// Ties keep the lower index because the comparison is strict.
    pub fn nearest_hit(&self, ray: &Ray) -> Option<(usize, f32)> {
        let mut nearest: Option<(usize, f32)> = None;
        for (index, primitive) in self.primitives.iter().enumerate() {
            let Some(distance) = primitive.intersect(ray) else {
                continue;
            };
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((index, distance)),
            }
        }
        nearest
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    #[cfg(test)]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Reads and clears the changed latch.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}
