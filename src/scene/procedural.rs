//! Built-in starting scenes.

use crate::scene::{Material, PointLight, Primitive, SceneStore};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const RANDOM_SPHERE_COUNT: usize = 64;
const RANDOM_SPHERE_ATTEMPTS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Basic,
    MirrorSpheres,
    RandomSpheres { seed: u64 },
}

impl Preset {
    pub fn build(self) -> SceneStore {
        match self {
            Preset::Basic => basic_scene(),
            Preset::MirrorSpheres => mirror_spheres(),
            Preset::RandomSpheres { seed } => random_spheres(seed),
        }
    }
}

fn reflective_ground() -> Material {
    Material::new(Vec3::ONE, Vec3::splat(0.75), Vec3::ZERO, 0.0, 0.0, 0.0, 0.0)
}

fn overhead_light() -> PointLight {
    PointLight::new(Vec3::new(0.0, 5.0, 0.0), 0.5, Vec3::ONE, 1.0, 100.0)
}

/// One white sphere resting on a glossy ground plane.
pub fn basic_scene() -> SceneStore {
    let mut scene = SceneStore::new();
    scene.add_primitive(Primitive::sphere(
        Vec3::new(0.0, 0.5, 0.0),
        0.5,
        Material::new(Vec3::ONE, Vec3::ZERO, Vec3::ZERO, 0.0, 1.0, 0.0, 0.0),
    ));
    scene.set_plane_material(reflective_ground());
    scene.add_light(overhead_light());
    scene
}

/// 8x8 grid of mirror spheres hovering over a glossy ground plane.
pub fn mirror_spheres() -> SceneStore {
    let mut scene = SceneStore::new();
    let mirror = Material::new(Vec3::ZERO, Vec3::ONE, Vec3::ZERO, 0.0, 0.2, 0.0, 0.0);
    for i in -4..=3 {
        for j in -4..=3 {
            scene.add_primitive(Primitive::sphere(
                Vec3::new(i as f32, 1.0, j as f32),
                0.5,
                mirror,
            ));
        }
    }
    scene.set_plane_material(reflective_ground());
    scene.add_light(overhead_light());
    scene
}

/// Non-overlapping spheres with random materials scattered around a white center sphere.
/// The ground plane is hidden.
pub fn random_spheres(seed: u64) -> SceneStore {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut unit = move || rng.random_range(0..=1000u32) as f32 / 1000.0;

    let mut scene = SceneStore::new();
    let mut placed = 0;
    let mut attempts = 0;
    while placed < RANDOM_SPHERE_COUNT && attempts < RANDOM_SPHERE_ATTEMPTS {
        attempts += 1;
        let radius = unit();
        let direction = Vec3::new(unit() - 0.5, unit() - 0.5, unit() - 0.5);
        let length_squared = direction.length_squared();
        if length_squared <= f32::EPSILON {
            continue;
        }
        // Dividing by the squared length pushes short vectors further out.
        let position = direction / length_squared * 5.0;

        let collides = scene
            .primitives()
            .iter()
            .any(|other| position.distance(other.position) < radius + other.radius());
        if collides {
            continue;
        }

        let albedo = Vec3::new(unit(), unit(), unit());
        let specular = Vec3::new(unit(), unit(), unit());
        let roughness = unit();
        scene.add_primitive(Primitive::sphere(
            position,
            radius,
            Material::new(albedo, specular, Vec3::ZERO, 0.0, roughness, 0.0, 0.0),
        ));
        placed += 1;
    }
    if placed < RANDOM_SPHERE_COUNT {
        log::warn!(
            "placed only {} of {} random spheres after {} attempts",
            placed,
            RANDOM_SPHERE_COUNT,
            attempts
        );
    }

    scene.add_primitive(Primitive::sphere(
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        Material::diffuse(Vec3::ONE),
    ));
    scene.add_light(overhead_light());
    scene.set_plane_visible(false);
    scene
}
