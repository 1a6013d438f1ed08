//! Scene objects and the per-frame render contract.
//!
//! A [`Node`] couples a mesh with a transform and the GPU buffer holding the
//! packed matrices. A demo implements [`Scene`] to wire its nodes, react to
//! input, expose panel widgets and hand the engine a [`Render`] each frame.
//! The engine batches the returned draws by pipeline (toon, standard, unlit
//! overlay) the same way regardless of which scene produced them.

use cgmath::One;
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{DeviceEvent, WindowEvent};

use crate::{context::Context, mesh::GpuMesh};

/// Position, rotation and scale of one scene object.
#[derive(Clone, Debug)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // identity quaternion, no rotation
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// The packed per-instance data as stored in the GPU vertex stream: a model
/// matrix plus the rotation-only normal matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    /// Matrix columns occupy one vertex slot each; locations follow on from
    /// the mesh vertex attributes.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// One placed mesh: geometry, live transform and the instance buffer the
/// vertex stage reads. Mutate [`Node::instance`] freely and call
/// [`write_to_buffer`](Node::write_to_buffer) to make the change visible to
/// the next frame.
#[derive(Debug)]
pub struct Node {
    pub mesh: GpuMesh,
    pub instance: Instance,
    pub instance_buffer: wgpu::Buffer,
    pub cast_shadow: bool,
}

impl Node {
    pub fn new(device: &wgpu::Device, mesh: GpuMesh, instance: Instance) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Instance Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[instance.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            mesh,
            instance,
            instance_buffer,
            cast_shadow: false,
        }
    }

    pub fn with_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.instance.to_raw()]),
        );
    }
}

/// One draw call: a node plus the material bind group feeding group 0.
pub struct Draw<'a> {
    pub node: &'a Node,
    pub material: &'a wgpu::BindGroup,
}

/// Specifies how a scene's objects should be rendered this frame.
///
/// - `Toon` draws use the banded cel-shading pipeline
/// - `Standard` draws use the lambert + shadow-receiving pipeline
/// - `Overlay` draws use the unlit pipeline, on top of everything else
/// - `Composed` nests further renders
pub enum Render<'a> {
    None,
    Toon(Draw<'a>),
    Toons(Vec<Draw<'a>>),
    Standard(Draw<'a>),
    Overlay(Draw<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Sort the render tree into per-pipeline batches.
    pub(crate) fn batch(
        self,
        toons: &mut Vec<Draw<'a>>,
        standards: &mut Vec<Draw<'a>>,
        overlays: &mut Vec<Draw<'a>>,
    ) {
        match self {
            Render::Toon(draw) => toons.push(draw),
            Render::Toons(mut vec) => toons.append(&mut vec),
            Render::Standard(draw) => standards.push(draw),
            Render::Overlay(draw) => overlays.push(draw),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.batch(toons, standards, overlays)),
            Render::None => (),
        }
    }
}

/// Trait for a demo scene.
///
/// # Lifecycle
///
/// 1. the constructor passed to [`run`](crate::app::run) builds the scene
///    once the GPU context exists
/// 2. `on_init` configures the context (camera start position, lights, ...)
/// 3. `on_window_events` / `on_device_events` run for every winit event
/// 4. `on_update` runs every frame before the uniforms are uploaded
/// 5. `on_panel` adds widgets to the debug panel; widget writes land in
///    material and light fields and reach the GPU on the same frame
/// 6. `on_render` hands back the draws for this frame
pub trait Scene {
    fn on_init(&mut self, ctx: &mut Context);

    fn on_window_events(&mut self, ctx: &mut Context, event: &WindowEvent);

    fn on_device_events(&mut self, ctx: &mut Context, event: &DeviceEvent);

    fn on_update(&mut self, ctx: &Context, dt: Duration);

    fn on_panel(&mut self, ctx: &mut Context, ui: &mut egui::Ui);

    fn on_render(&self) -> Render<'_>;
}

/// Factory handed to [`run`](crate::app::run); invoked once the context is up.
pub type SceneConstructor = Box<dyn FnOnce(&Context) -> Box<dyn Scene>>;

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Matrix3, Quaternion, Rad, Rotation3, Vector3};

    #[test]
    fn raw_instance_packs_translation_in_last_column() {
        let instance = Instance {
            position: Vector3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let raw = instance.to_raw();
        assert_eq!(raw.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(Matrix3::from(raw.normal), Matrix3::from(Quaternion::one()));
    }

    #[test]
    fn normal_matrix_ignores_scale() {
        let rotation = Quaternion::from_angle_y(Rad(std::f32::consts::FRAC_PI_2));
        let instance = Instance {
            rotation,
            scale: Vector3::new(3.0, 3.0, 3.0),
            ..Default::default()
        };
        let raw = instance.to_raw();
        let expected = Matrix3::from(rotation);
        let packed = Matrix3::from(raw.normal);
        for c in 0..3 {
            for r in 0..3 {
                assert!((packed[c][r] - expected[c][r]).abs() < 1e-6);
            }
        }
    }
}
