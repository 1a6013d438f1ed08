//! Render pipeline definitions and the material uniform they share.
//!
//! Every pipeline binds the same three groups: material (0), camera (1) and
//! light (2); the shadow pass binds only the light uniform. WGSL sources live
//! next to their pipeline modules and are embedded at compile time.

pub mod shadow;
pub mod standard;
pub mod toon;
pub mod unlit;

use wgpu::util::DeviceExt;

use crate::light::LightResources;

/// The material parameters as seen by the shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    color: [f32; 3],
    glossiness: f32,
}

/// A flat-colour material with a toon glossiness exponent. The standard and
/// unlit pipelines read only the colour.
///
/// Mutate the public fields (the panel's colour picker and glossiness slider
/// do) and call [`write`](Material::write) to upload; the change is visible
/// on the next rendered frame.
#[derive(Debug)]
pub struct Material {
    pub color: [f32; 3],
    pub glossiness: f32,
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        color: [f32; 3],
        glossiness: f32,
    ) -> Self {
        let uniform = MaterialUniform { color, glossiness };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Material Buffer", label)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&format!("{:?} material_bind_group", label)),
        });
        Self {
            color,
            glossiness,
            buffer,
            bind_group,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue) {
        let uniform = MaterialUniform {
            color: self.color,
            glossiness: self.glossiness,
        };
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

pub fn mk_material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("material_bind_group_layout"),
    })
}

/// All pipelines, built once at context creation, plus the material layout
/// scenes need to create their own [`Material`]s.
#[derive(Debug)]
pub struct Pipelines {
    pub toon: wgpu::RenderPipeline,
    pub standard: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    pub unlit: wgpu::RenderPipeline,
    pub material_layout: wgpu::BindGroupLayout,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_layout: &wgpu::BindGroupLayout,
        light: &LightResources,
    ) -> Self {
        let material_layout = mk_material_bind_group_layout(device);
        Self {
            toon: toon::mk_toon_pipeline(
                device,
                config,
                &material_layout,
                camera_layout,
                &light.bind_group_layout,
            ),
            standard: standard::mk_standard_pipeline(
                device,
                config,
                &material_layout,
                camera_layout,
                &light.bind_group_layout,
            ),
            shadow: shadow::mk_shadow_pipeline(device, &light.shadow_pass_layout),
            unlit: unlit::mk_unlit_pipeline(device, config, &material_layout, camera_layout),
            material_layout,
        }
    }
}

/// Shared pipeline constructor: opaque triangles, back-face culling,
/// depth-tested against `depth_format` when given.
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    depth_compare: wgpu::CompareFunction,
    depth_write_enabled: bool,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_uniform_matches_wgsl_layout() {
        // vec3 + f32 pack into one 16-byte slot
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 16);
    }
}
