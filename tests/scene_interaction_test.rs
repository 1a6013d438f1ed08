//! Interaction tests: orbit camera behaviour, gizmo axis picking and the
//! instance transforms feeding the vertex stream. Everything here runs on
//! the CPU side of the public API.

use cgmath::{Deg, InnerSpace, Point3, Rad, Transform, Vector3};
use instant::Duration;
use toonlab::camera::{Camera, OrbitController, Projection, Ray};
use toonlab::gizmo::{Axis, closest_params, pick_axis};
use toonlab::mesh::{plane_mesh, sphere_mesh, torus_mesh};
use toonlab::scene::Instance;

const FRAME: Duration = Duration::from_millis(16);

#[test]
fn orbit_eases_out_after_the_drag_stops() {
    let mut controller = OrbitController::looking_from((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
    let mut camera = Camera::new((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));

    controller.handle_mouse(80.0, 0.0);
    controller.update(&mut camera, FRAME);
    let yaw_after_drag = controller.yaw;

    // the camera keeps coasting for a few frames, then settles
    controller.update(&mut camera, FRAME);
    assert!(controller.yaw != yaw_after_drag);
    for _ in 0..300 {
        controller.update(&mut camera, FRAME);
    }
    let settled = controller.yaw;
    controller.update(&mut camera, FRAME);
    assert!((controller.yaw.0 - settled.0).abs() < 1e-6);
}

#[test]
fn orbit_keeps_the_target_centred() {
    let mut controller = OrbitController::looking_from((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
    let mut camera = Camera::new((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
    let distance = controller.distance;

    controller.handle_mouse(40.0, -25.0);
    for _ in 0..60 {
        controller.update(&mut camera, FRAME);
    }

    assert_eq!(camera.target, controller.target);
    assert!(((camera.position - controller.target).magnitude() - distance).abs() < 1e-4);
}

#[test]
fn zoom_clamps_at_the_near_limit() {
    let mut controller = OrbitController::new((0.0, 0.0, 0.0), 2.0, Rad(0.0), Rad(0.0));
    let mut camera = Camera::new((2.0, 0.0, 0.0), (0.0, 0.0, 0.0));
    // a wild zoom-in cannot push the eye through the target
    controller.distance = 0.05;
    controller.update(&mut camera, FRAME);
    assert_eq!(controller.distance, 0.5);
    assert!(((camera.position - controller.target).magnitude() - 0.5).abs() < 1e-5);
}

#[test]
fn screen_centre_ray_points_at_the_orbit_target() {
    let camera = Camera::new((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
    let projection = Projection::new(800, 600, Deg(75.0), 0.1, 1000.0);
    let ray = camera.ray_from_screen((400.0, 300.0).into(), 800.0, 600.0, &projection);

    let to_target = (Point3::new(0.0, 0.0, 0.0) - camera.position).normalize();
    assert!((ray.direction - to_target).magnitude() < 1e-3);
}

#[test]
fn gizmo_picks_the_axis_under_the_cursor() {
    let origin = Point3::new(2.0, 0.0, 0.0);
    // ray shooting straight down onto the +X arrow of a gizmo at (2, 0, 0)
    let ray = Ray {
        origin: Point3::new(2.6, 3.0, 0.05),
        direction: Vector3::new(0.0, -1.0, 0.0),
    };
    assert_eq!(pick_axis(&ray, origin), Some(Axis::X));

    // the same ray shifted off the arrows misses
    let miss = Ray {
        origin: Point3::new(2.6, 3.0, 0.5),
        direction: Vector3::new(0.0, -1.0, 0.0),
    };
    assert_eq!(pick_axis(&miss, origin), None);
}

#[test]
fn axis_drag_resolves_to_a_single_coordinate() {
    let origin = Point3::new(2.0, 0.0, 0.0);
    let grab = Ray {
        origin: Point3::new(2.5, 3.0, 0.0),
        direction: Vector3::new(0.0, -1.0, 0.0),
    };
    let (t0, _, _) = closest_params(&grab, origin, Axis::X.direction());
    let moved = Ray {
        origin: Point3::new(3.1, 3.0, 0.0),
        direction: Vector3::new(0.0, -1.0, 0.0),
    };
    let (t1, _, _) = closest_params(&moved, origin, Axis::X.direction());
    // dragging the cursor 0.6 units right moves the handle 0.6 along X
    assert!((t1 - t0 - 0.6).abs() < 1e-5);
}

#[test]
fn instance_transform_places_mesh_vertices() {
    let instance = Instance {
        position: Vector3::new(2.0, 0.0, 0.0),
        ..Default::default()
    };
    let (vertices, _) = torus_mesh(0.6, 0.25, 48, 24);
    let model = instance.to_matrix();
    for v in vertices.iter().take(8) {
        let world = model.transform_point(Point3::from(v.position));
        assert!((world.x - (v.position[0] + 2.0)).abs() < 1e-6);
        assert!((world - Point3::from(v.position)).magnitude() > 1.0);
    }
}

#[test]
fn demo_geometry_is_well_formed() {
    for (vertices, indices) in [
        sphere_mesh(1.0, 32, 32),
        plane_mesh(10.0),
        torus_mesh(0.6, 0.25, 48, 24),
    ] {
        assert!(indices.len() % 3 == 0);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        for v in &vertices {
            assert!((Vector3::from(v.normal).magnitude() - 1.0).abs() < 1e-4);
        }
    }
}
