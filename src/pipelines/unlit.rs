//! Unlit overlay pipeline for the gizmo handles.
//!
//! Depth comparison is `Always` and depth writes are off: the handles stay
//! visible through scene geometry without occluding one another. Overlay
//! draws run last in the main pass.

use crate::{
    mesh::Vertex,
    pipelines::mk_render_pipeline,
    scene::InstanceRaw,
    texture::Texture,
};

pub fn mk_unlit_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    material_layout: &wgpu::BindGroupLayout,
    camera_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Unlit Pipeline Layout"),
        bind_group_layouts: &[material_layout, camera_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Unlit Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("unlit.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        wgpu::CompareFunction::Always,
        // overlays draw on top of the scene but must not occlude each other
        // in draw order, so they leave the depth buffer alone
        false,
        &[Vertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
