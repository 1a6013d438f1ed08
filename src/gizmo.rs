//! A translate gizmo: three axis arrows attached to a scene node.
//!
//! Hovering an arrow highlights it; dragging moves the target along that
//! axis only. While a drag is active the orbit controller is disabled so
//! camera and gizmo never fight over the same mouse button.

use cgmath::{Deg, EuclideanSpace, InnerSpace, Point3, Quaternion, Rotation3, Vector3};
use winit::event::{ElementState, MouseButton, WindowEvent};

use crate::{
    camera::{OrbitController, Ray},
    context::Context,
    mesh::GpuMesh,
    pipelines::Material,
    scene::{Draw, Instance, Node, Render},
};

const ARROW_LENGTH: f32 = 1.2;
const ARROW_GIRTH: f32 = 0.03;
/// How close (world units) the mouse ray must pass to an axis to pick it.
const PICK_RADIUS: f32 = 0.15;

const HIGHLIGHT: [f32; 3] = [1.0, 0.85, 0.2];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn direction(&self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::unit_x(),
            Axis::Y => Vector3::unit_y(),
            Axis::Z => Vector3::unit_z(),
        }
    }

    pub fn color(&self) -> [f32; 3] {
        match self {
            Axis::X => [0.9, 0.2, 0.2],
            Axis::Y => [0.2, 0.85, 0.3],
            Axis::Z => [0.25, 0.4, 0.95],
        }
    }

    fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Rotation carrying the +X arrow mesh onto this axis.
    fn rotation(&self) -> Quaternion<f32> {
        match self {
            Axis::X => Quaternion::from_angle_y(Deg(0.0)),
            Axis::Y => Quaternion::from_angle_z(Deg(90.0)),
            Axis::Z => Quaternion::from_angle_y(Deg(-90.0)),
        }
    }
}

/// Parameters of the closest approach between an axis line and a ray:
/// `(t along the axis, s along the ray, distance)`.
pub fn closest_params(ray: &Ray, origin: Point3<f32>, dir: Vector3<f32>) -> (f32, f32, f32) {
    let w0 = origin - ray.origin;
    let a = dir.dot(dir);
    let b = dir.dot(ray.direction);
    let c = ray.direction.dot(ray.direction);
    let d = dir.dot(w0);
    let e = ray.direction.dot(w0);
    let denom = a * c - b * b;
    // near-parallel lines degrade to the axis origin
    let (t, s) = if denom.abs() < 1e-6 {
        (0.0, e / c)
    } else {
        ((b * e - c * d) / denom, (a * e - b * d) / denom)
    };
    let on_axis = origin + dir * t;
    let on_ray = ray.origin + ray.direction * s;
    (t, s, (on_axis - on_ray).magnitude())
}

/// Pick the axis whose handle passes closest to the ray, if any is within
/// reach and in front of the camera.
pub fn pick_axis(ray: &Ray, position: Point3<f32>) -> Option<Axis> {
    let mut best: Option<(Axis, f32)> = None;
    for axis in Axis::ALL {
        let (t, s, dist) = closest_params(ray, position, axis.direction());
        if !(0.0..=ARROW_LENGTH).contains(&t) || s <= 0.0 || dist > PICK_RADIUS {
            continue;
        }
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((axis, dist));
        }
    }
    best.map(|(axis, _)| axis)
}

#[derive(Clone, Copy, Debug)]
struct DragState {
    axis: Axis,
    /// Axis parameter under the cursor when the drag began.
    grab: f32,
    /// Target position when the drag began.
    start: Point3<f32>,
}

/// Hover and drag state, kept apart from the GPU-side arrows so the
/// transitions are plain math. Beginning a drag disables the orbit
/// controller; ending it re-enables it unconditionally.
#[derive(Debug, Default)]
struct Interaction {
    hovered: Option<Axis>,
    drag: Option<DragState>,
}

impl Interaction {
    fn dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn active_axis(&self) -> Option<Axis> {
        self.drag.map(|d| d.axis).or(self.hovered)
    }

    fn begin_drag(
        &mut self,
        axis: Axis,
        gizmo_position: Point3<f32>,
        ray: &Ray,
        target_start: Point3<f32>,
        controller: &mut OrbitController,
    ) {
        let (grab, _, _) = closest_params(ray, gizmo_position, axis.direction());
        self.drag = Some(DragState {
            axis,
            grab,
            start: target_start,
        });
        controller.enabled = false;
    }

    fn end_drag(&mut self, controller: &mut OrbitController) {
        self.drag = None;
        controller.enabled = true;
    }

    /// Where the target belongs for the current cursor ray: the start
    /// position moved along the dragged axis only.
    fn drag_to(&self, ray: &Ray) -> Option<Point3<f32>> {
        let drag = self.drag?;
        let (t, _, _) = closest_params(ray, drag.start, drag.axis.direction());
        Some(drag.start + drag.axis.direction() * (t - drag.grab))
    }
}

/// The gizmo itself: three overlay arrows plus hover/drag state. The scene
/// owns both the gizmo and the node it manipulates and forwards events via
/// [`on_window_events`](TranslateGizmo::on_window_events).
pub struct TranslateGizmo {
    arrows: [Node; 3],
    materials: [Material; 3],
    position: Point3<f32>,
    interaction: Interaction,
}

impl TranslateGizmo {
    pub fn new(ctx: &Context, position: Point3<f32>) -> Self {
        let arrows = Axis::ALL.map(|axis| {
            let mesh = GpuMesh::arrow(&ctx.device, ARROW_LENGTH, ARROW_GIRTH);
            let instance = Instance {
                position: position.to_vec(),
                rotation: axis.rotation(),
                ..Default::default()
            };
            Node::new(&ctx.device, mesh, instance)
        });
        let materials = Axis::ALL.map(|axis| {
            Material::new(
                &ctx.device,
                &ctx.pipelines.material_layout,
                "gizmo arrow",
                axis.color(),
                1.0,
            )
        });
        Self {
            arrows,
            materials,
            position,
            interaction: Interaction::default(),
        }
    }

    pub fn dragging(&self) -> bool {
        self.interaction.dragging()
    }

    /// Move the gizmo to follow its target.
    pub fn set_position(&mut self, queue: &wgpu::Queue, position: Point3<f32>) {
        self.position = position;
        for arrow in &mut self.arrows {
            arrow.instance.position = position.to_vec();
            arrow.write_to_buffer(queue);
        }
    }

    fn update_highlight(&mut self, queue: &wgpu::Queue) {
        let active = self.interaction.active_axis();
        for axis in Axis::ALL {
            let material = &mut self.materials[axis.index()];
            let color = if active == Some(axis) {
                HIGHLIGHT
            } else {
                axis.color()
            };
            if material.color != color {
                material.color = color;
                material.write(queue);
            }
        }
    }

    /// Forward a winit event. Takes `&mut Context` because drags flip the
    /// orbit controller off for their duration.
    pub fn on_window_events(&mut self, ctx: &mut Context, event: &WindowEvent, target: &mut Node) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let ray = ctx.camera.camera.ray_from_screen(
                    *position,
                    ctx.config.width as f32,
                    ctx.config.height as f32,
                    &ctx.projection,
                );
                if let Some(moved) = self.interaction.drag_to(&ray) {
                    target.instance.position = moved.to_vec();
                    target.write_to_buffer(&ctx.queue);
                    self.set_position(&ctx.queue, moved);
                } else {
                    self.interaction.hovered = pick_axis(&ray, self.position);
                }
                self.update_highlight(&ctx.queue);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(axis) = self.interaction.hovered {
                    let ray = ctx.camera.camera.ray_from_screen(
                        ctx.mouse.coords,
                        ctx.config.width as f32,
                        ctx.config.height as f32,
                        &ctx.projection,
                    );
                    self.interaction.begin_drag(
                        axis,
                        self.position,
                        &ray,
                        Point3::from_vec(target.instance.position),
                        &mut ctx.camera.controller,
                    );
                    self.update_highlight(&ctx.queue);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                self.interaction.end_drag(&mut ctx.camera.controller);
                self.update_highlight(&ctx.queue);
            }
            _ => (),
        }
    }

    pub fn on_render(&self) -> Render<'_> {
        Render::Composed(
            Axis::ALL
                .into_iter()
                .map(|axis| {
                    Render::Overlay(Draw {
                        node: &self.arrows[axis.index()],
                        material: &self.materials[axis.index()].bind_group,
                    })
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray(origin: [f32; 3], direction: [f32; 3]) -> Ray {
        Ray {
            origin: Point3::from(origin),
            direction: Vector3::from(direction).normalize(),
        }
    }

    #[test]
    fn closest_params_on_crossing_lines() {
        // ray along -Z passing over the X axis at x = 0.5, height 0.1
        let r = ray([0.5, 0.1, 5.0], [0.0, 0.0, -1.0]);
        let (t, s, dist) = closest_params(&r, Point3::new(0.0, 0.0, 0.0), Vector3::unit_x());
        assert!((t - 0.5).abs() < 1e-5);
        assert!((s - 5.0).abs() < 1e-5);
        assert!((dist - 0.1).abs() < 1e-5);
    }

    #[test]
    fn pick_prefers_the_nearest_axis() {
        // passes within reach of both X and Y, but closer to X
        let r = ray([0.6, 0.05, 5.0], [0.0, 0.0, -1.0]);
        assert_eq!(pick_axis(&r, Point3::new(0.0, 0.0, 0.0)), Some(Axis::X));
    }

    #[test]
    fn pick_misses_beyond_the_arrow_tip() {
        let r = ray([5.0, 0.0, 5.0], [0.0, 0.0, -1.0]);
        assert_eq!(pick_axis(&r, Point3::new(0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn pick_misses_outside_the_radius() {
        let r = ray([0.5, 1.0, 5.0], [0.0, 0.0, -1.0]);
        assert_eq!(pick_axis(&r, Point3::new(0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn parallel_ray_degrades_to_the_axis_origin() {
        let r = ray([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]);
        let (t, _, dist) = closest_params(&r, Point3::new(0.0, 0.0, 0.0), Vector3::unit_x());
        assert_eq!(t, 0.0);
        assert!((dist - 1.0).abs() < 1e-5);
    }

    #[test]
    fn drag_lifecycle_toggles_the_orbit_controller() {
        let mut controller = OrbitController::looking_from((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
        let mut interaction = Interaction::default();
        let origin = Point3::new(0.0, 0.0, 0.0);
        let grab = ray([0.5, 3.0, 0.0], [0.0, -1.0, 0.0]);

        interaction.begin_drag(Axis::X, origin, &grab, origin, &mut controller);
        assert!(interaction.dragging());
        assert!(!controller.enabled);

        // release always re-enables the camera, wherever the cursor is
        interaction.end_drag(&mut controller);
        assert!(!interaction.dragging());
        assert!(controller.enabled);
    }

    #[test]
    fn dragging_moves_along_the_grabbed_axis_only() {
        let mut controller = OrbitController::looking_from((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
        let mut interaction = Interaction::default();
        let origin = Point3::new(0.0, 0.0, 0.0);
        let grab = ray([0.5, 3.0, 0.0], [0.0, -1.0, 0.0]);
        interaction.begin_drag(Axis::X, origin, &grab, origin, &mut controller);

        let moved = ray([1.1, 3.0, 0.2], [0.0, -1.0, 0.0]);
        let target = interaction.drag_to(&moved).unwrap();
        assert!((target.x - 0.6).abs() < 1e-5);
        assert_eq!(target.y, 0.0);
        assert_eq!(target.z, 0.0);
    }

    #[test]
    fn drag_to_is_inert_without_an_active_drag() {
        let interaction = Interaction::default();
        let r = ray([0.5, 3.0, 0.0], [0.0, -1.0, 0.0]);
        assert_eq!(interaction.drag_to(&r).map(|p| p.x), None);
    }
}
