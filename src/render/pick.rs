//! Analytic picking and click-to-place.
//!
//! Picking casts a single ray through the cursor and tests it against every primitive, the same
//! ray the shader generates for that pixel. Both operations only touch the scene store and the
//! selection; pushing the result to a renderer is left to the caller (see [`crate::render::bind`]).

use crate::geometry::Ray;
use crate::render::camera::CameraPose;
use crate::scene::{Material, Plane, Primitive, PrimitiveKind, SceneStore, Selection};
use glam::{Vec2, Vec3};

/// Ray through pixel (`cursor_x`, `cursor_y`), top-left origin, for a screen of the given size.
pub fn screen_to_ray(
    cursor_x: f32,
    cursor_y: f32,
    screen_width: f32,
    screen_height: f32,
    pose: &CameraPose,
) -> Ray {
    let relative = Vec2::new(cursor_x / screen_width, 1.0 - cursor_y / screen_height);
    let aspect = Vec2::new(screen_width / screen_height, 1.0);
    let uv = (2.0 * relative - Vec2::ONE) * aspect;
    let direction = pose.to_world(Vec3::new(uv.x, uv.y, -1.0).normalize());
    Ray::new(pose.position, direction)
}

/// Selects the nearest primitive hit by `ray`, or clears the selection on a miss.
///
/// Returns the new selection.
pub fn select_hovered(scene: &SceneStore, selection: &mut Selection, ray: &Ray) -> Option<usize> {
    let hit = scene.nearest_hit(ray).map(|(index, _)| index);
    selection.set(hit);
    match hit {
        Some(index) => log::debug!("selected primitive {}", index),
        None => log::debug!("selection cleared"),
    }
    hit
}

/// Appends a primitive where `ray` meets the ground plane.
///
/// With a selection, the selected primitive is cloned and lifted so it rests on the plane
/// (by its radius for spheres, half its height for boxes). Without one, or when the selected
/// entry has no shape, a white unit sphere is placed one unit above the hit point. Returns the
/// new index, or `None` if the ray misses the plane; the store is left untouched in that case.
pub fn place_at_cursor(scene: &mut SceneStore, selection: &Selection, ray: &Ray) -> Option<usize> {
    let distance = Plane::intersect(ray)?;
    let point = ray.at(distance);

    let template = selection.index().and_then(|index| scene.primitive(index).copied());
    let resting_lift = |source: &Primitive| match source.kind {
        PrimitiveKind::Sphere => Some(source.scale.x),
        PrimitiveKind::Box => Some(source.scale.y / 2.0),
        PrimitiveKind::None => None,
    };
    let primitive = match template.and_then(|source| Some((source, resting_lift(&source)?))) {
        Some((source, lift)) => Primitive {
            position: point + Vec3::new(0.0, lift, 0.0),
            ..source
        },
        None => Primitive::sphere(point + Vec3::Y, 1.0, Material::neutral_white()),
    };

    let index = scene.add_primitive(primitive);
    log::debug!(
        "placed {:?} {} at {:?}",
        primitive.kind,
        index,
        primitive.position
    );
    Some(index)
}
