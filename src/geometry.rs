//! Analytic ray intersection for the primitives the editor can pick.
//!
//! Every test returns `None` for "no hit"; that is an ordinary outcome and callers skip it.
//! Ray directions are expected to be unit length.

use glam::Vec3;

/// Denominator threshold under which a ray counts as parallel to a plane. The same value is the
/// minimum accepted plane hit distance, which keeps the camera from hitting the ground at its
/// own origin.
pub const PLANE_EPSILON: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Geometric sphere test: project the center onto the ray, reject if the closest approach is
/// outside the radius, otherwise step back to the near surface.
///
/// Only a strictly positive near root counts, so a ray starting inside the sphere misses.
pub fn intersect_sphere(center: Vec3, radius: f32, ray: &Ray) -> Option<f32> {
    let t = (center - ray.origin).dot(ray.direction);
    let closest = ray.at(t);
    let y = (center - closest).length();
    if y >= radius {
        return None;
    }
    let x = (radius * radius - y * y).sqrt();
    let hit = t - x;
    (hit > 0.0).then_some(hit)
}

/// Slab test against the axis aligned box `center ± full_extent / 2`.
///
/// A zero direction component divides to ±infinity, which leaves that axis unconstrained in the
/// min/max reduction instead of needing a special case.
pub fn intersect_box(center: Vec3, full_extent: Vec3, ray: &Ray) -> Option<f32> {
    let half = full_extent / 2.0;
    let box_min = center - half;
    let box_max = center + half;

    let t0 = (box_min - ray.origin) / ray.direction;
    let t1 = (box_max - ray.origin) / ray.direction;

    let entry = t0.min(t1).max_element();
    let exit = t0.max(t1).min_element();

    (entry >= 0.0 && entry <= exit).then_some(entry)
}

pub fn intersect_plane(normal: Vec3, point_on_plane: Vec3, ray: &Ray) -> Option<f32> {
    let denom = normal.dot(ray.direction);
    if denom.abs() <= PLANE_EPSILON {
        return None;
    }
    let hit = (point_on_plane - ray.origin).dot(normal) / denom;
    (hit >= PLANE_EPSILON).then_some(hit)
}
