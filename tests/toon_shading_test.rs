//! Shading-model tests against the public API. The pure functions in
//! `pipelines::toon` mirror the WGSL terms, so banding behaviour can be
//! checked without a GPU device.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};
use toonlab::camera::{Camera, CameraUniform, Projection};
use toonlab::light::{AmbientLight, DirectionalLight, LightUniform, ShadowSettings};
use toonlab::pipelines::toon::{diffuse_band, shade};

fn scene_light() -> (DirectionalLight, AmbientLight) {
    (
        DirectionalLight {
            position: Point3::new(4.0, 4.0, 4.0),
            color: [0.972, 0.945, 0.902],
            intensity: 0.5,
            shadow: ShadowSettings::default(),
        },
        AmbientLight {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        },
    )
}

#[test]
fn shading_is_banded_not_smooth() {
    let (directional, _) = scene_light();
    let light_dir = directional.direction();
    let view = Vector3::new(0.0, 0.2, 1.0).normalize();
    let base = [0.18, 0.45, 0.85];

    // Sweep normals from facing the light to facing away: the lit band
    // should produce exactly two output levels away from the band edge.
    let mut levels: Vec<u32> = Vec::new();
    for step in 0..=50 {
        let t = step as f32 / 50.0;
        let normal = (light_dir * (1.0 - 2.0 * t) + Vector3::unit_y() * 0.2).normalize();
        let out = shade(normal, view, light_dir, [0.5; 3], [0.1; 3], base, 20.0);
        // quantize to spot plateaus
        let key = (out[0] * 1e4).round() as u32;
        if levels.last() != Some(&key) {
            levels.push(key);
        }
    }
    // a smooth lambert ramp would produce ~50 distinct levels
    assert!(
        levels.len() <= 10,
        "expected a handful of flat bands, got {} levels",
        levels.len()
    );
}

#[test]
fn diffuse_band_splits_lit_from_unlit() {
    assert_eq!(diffuse_band(0.5), 1.0);
    assert_eq!(diffuse_band(-0.5), 0.0);
}

#[test]
fn light_uniform_layout_premultiplies_colours() {
    let (directional, ambient) = scene_light();
    let uniform = LightUniform::pack(&directional, &ambient);
    let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniform));
    // mat4 view_proj, then direction (pad), colour (pad), ambient (pad)
    assert_eq!(floats.len(), 16 + 12);
    let direction = Vector3::new(floats[16], floats[17], floats[18]);
    assert!((direction - Vector3::new(1.0, 1.0, 1.0).normalize()).magnitude() < 1e-6);
    assert!((floats[20] - 0.972 * 0.5).abs() < 1e-6);
    assert!((floats[21] - 0.945 * 0.5).abs() < 1e-6);
    assert_eq!(&floats[24..27], &[1.0, 1.0, 1.0]);
}

#[test]
fn camera_uniform_carries_eye_position_and_exposure() {
    let camera = Camera::new((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
    let projection = Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0);
    let mut uniform = CameraUniform::new();
    uniform.update_view_proj(&camera, &projection, 1.75);
    let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniform));
    assert_eq!(&floats[16..19], &[0.0, 1.0, 5.0]);
    assert_eq!(floats[19], 1.75);
}

#[test]
fn shadow_frustum_contains_the_demo_scene() {
    let (directional, _) = scene_light();
    let view_proj = directional.view_proj();
    // sphere poles, the ground beneath it and beyond, torus start position
    for point in [
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(-5.0, -1.0, -5.0),
        Point3::new(2.0, 0.0, 0.0),
    ] {
        let clip = view_proj * point.to_homogeneous();
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() <= 1.0, "{:?} outside shadow frustum", point);
        assert!(ndc.y.abs() <= 1.0, "{:?} outside shadow frustum", point);
        assert!(
            (0.0..=1.0).contains(&ndc.z),
            "{:?} outside shadow depth range",
            point
        );
    }
}
