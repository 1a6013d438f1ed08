//! Camera, projection and the orbit controller.
//!
//! The camera orbits a target point: mouse drag rotates, the scroll wheel
//! zooms. Movement carries inertia and is damped every frame, so the
//! controller's [`update`](OrbitController::update) must run even on frames
//! without input. The gizmo flips [`OrbitController::enabled`] off while a
//! drag is active so the two controls never fight over the mouse.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2 - 0.0001;

/// Eye position and look target in world space.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    /// Cast a ray from a screen position into the world. Used by the gizmo
    /// to pick and drag its axis handles.
    pub fn ray_from_screen(
        &self,
        screen: winit::dpi::PhysicalPosition<f64>,
        width: f32,
        height: f32,
        projection: &Projection,
    ) -> Ray {
        let ndc_x = 2.0 * screen.x as f32 / width - 1.0;
        let ndc_y = 1.0 - 2.0 * screen.y as f32 / height;
        let view_proj = projection.calc_matrix() * self.calc_matrix();
        let inverse = view_proj.invert().unwrap_or_else(Matrix4::identity);
        let near = inverse * cgmath::Vector4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inverse * cgmath::Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = Point3::from_homogeneous(near);
        let far = Point3::from_homogeneous(far);
        Ray {
            origin: near,
            direction: (far - near).normalize(),
        }
    }
}

/// A world-space ray with normalized direction.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

/// Perspective projection, resized together with the surface.
#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// View-projection matrix, eye position and tone-mapping exposure as seen by
/// the shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view_pos: [f32; 3],
    exposure: f32,
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            view_pos: [0.0; 3],
            exposure: 1.0,
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection, exposure: f32) {
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
        self.view_pos = camera.position.into();
        self.exposure = exposure;
    }

    #[cfg(test)]
    pub(crate) fn view_pos(&self) -> [f32; 3] {
        self.view_pos
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Orbits the camera around a target with inertial damping.
#[derive(Clone, Debug)]
pub struct OrbitController {
    pub target: Point3<f32>,
    pub distance: f32,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub enabled: bool,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    damping: f32,
}

impl OrbitController {
    pub fn new<P: Into<Point3<f32>>, R: Into<Rad<f32>>>(
        target: P,
        distance: f32,
        yaw: R,
        pitch: R,
    ) -> Self {
        Self {
            target: target.into(),
            distance,
            yaw: yaw.into(),
            pitch: pitch.into(),
            enabled: true,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
            rotate_speed: 0.004,
            zoom_speed: 0.4,
            damping: 8.0,
        }
    }

    /// Orbit parameters that place the eye at `position` looking at `target`.
    pub fn looking_from<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        let position = position.into();
        let target = target.into();
        let offset = position - target;
        let distance = offset.magnitude().max(0.01);
        let pitch = Rad((offset.y / distance).asin());
        let yaw = Rad(offset.z.atan2(offset.x));
        Self::new(target, distance, yaw, pitch)
    }

    /// Feed a mouse drag delta. Ignored while the controller is disabled.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if !self.enabled {
            return;
        }
        self.yaw_velocity += dx as f32 * self.rotate_speed;
        self.pitch_velocity += dy as f32 * self.rotate_speed;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if !self.enabled {
            return;
        }
        if let WindowEvent::MouseWheel { delta, .. } = event {
            let scroll = match delta {
                MouseScrollDelta::LineDelta(_, lines) => *lines,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 60.0,
            };
            self.zoom_velocity -= scroll * self.zoom_speed;
        }
    }

    /// Advance the orbit state by `dt` and write the resulting eye position
    /// into `camera`. Velocities decay exponentially so motion eases out
    /// after the mouse stops.
    pub fn update(&mut self, camera: &mut Camera, dt: instant::Duration) {
        let dt = dt.as_secs_f32();
        self.yaw += Rad(self.yaw_velocity);
        self.pitch = Rad((self.pitch.0 + self.pitch_velocity).clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
        self.distance = (self.distance * (1.0 + self.zoom_velocity)).clamp(0.5, 100.0);

        let decay = (-self.damping * dt).exp();
        self.yaw_velocity *= decay;
        self.pitch_velocity *= decay;
        self.zoom_velocity *= decay;

        camera.position = self.target + self.eye_offset();
        camera.target = self.target;
    }

    pub(crate) fn eye_offset(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        Vector3::new(
            self.distance * cos_pitch * cos_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * sin_yaw,
        )
    }

    #[cfg(test)]
    pub(crate) fn velocity(&self) -> (f32, f32, f32) {
        (self.yaw_velocity, self.pitch_velocity, self.zoom_velocity)
    }
}

/// Camera state plus its GPU-side resources, bundled on the context.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, controller: OrbitController) -> Self {
        let uniform = CameraUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Deg;
    use instant::Duration;

    #[test]
    fn resize_tracks_aspect_ratio() {
        let mut projection = Projection::new(800, 600, Deg(75.0), 0.1, 1000.0);
        assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
        projection.resize(1920, 1080);
        assert!((projection.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn damping_decays_velocity_towards_zero() {
        let mut controller = OrbitController::new((0.0, 0.0, 0.0), 5.0, Deg(90.0), Deg(10.0));
        let mut camera = Camera::new((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
        controller.handle_mouse(100.0, 0.0);
        let (initial, _, _) = controller.velocity();
        assert!(initial > 0.0);
        for _ in 0..120 {
            controller.update(&mut camera, Duration::from_millis(16));
        }
        let (settled, _, _) = controller.velocity();
        assert!(settled.abs() < initial * 1e-3);
    }

    #[test]
    fn disabled_controller_ignores_input() {
        let mut controller = OrbitController::new((0.0, 0.0, 0.0), 5.0, Deg(90.0), Deg(10.0));
        controller.enabled = false;
        controller.handle_mouse(100.0, 50.0);
        assert_eq!(controller.velocity(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn looking_from_round_trips_the_eye_position() {
        let controller = OrbitController::looking_from((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
        let offset = controller.eye_offset();
        assert!((offset - Vector3::new(0.0, 1.0, 5.0)).magnitude() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped_below_the_pole() {
        let mut controller = OrbitController::new((0.0, 0.0, 0.0), 5.0, Deg(0.0), Deg(80.0));
        let mut camera = Camera::new((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
        for _ in 0..60 {
            controller.handle_mouse(0.0, 500.0);
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!(controller.pitch.0 <= SAFE_FRAC_PI_2);
    }
}
