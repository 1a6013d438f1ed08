//! The banded toon pipeline and the pure shading math behind it.
//!
//! The band/specular/rim functions here mirror `toon.wgsl` term for term.
//! They are deterministic functions of the shading inputs, which keeps the
//! shading model testable on the CPU.

use cgmath::{InnerSpace, Vector3};

use crate::{
    mesh::Vertex,
    pipelines::mk_render_pipeline,
    scene::InstanceRaw,
    texture::Texture,
};

/// Rim lighting threshold: fragments whose rim value crosses this get the
/// full rim colour.
pub const RIM_AMOUNT: f32 = 0.716;
/// Exponent pulling the rim towards the lit side of the object.
pub const RIM_LIGHT_BLEND: f32 = 0.1;
/// Allowed glossiness range for the panel slider.
pub const GLOSSINESS_RANGE: std::ops::RangeInclusive<f32> = 1.0..=20.0;

pub fn mk_toon_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    material_layout: &wgpu::BindGroupLayout,
    camera_layout: &wgpu::BindGroupLayout,
    light_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Toon Pipeline Layout"),
        bind_group_layouts: &[material_layout, camera_layout, light_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Toon Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("toon.wgsl").into()),
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
        wgpu::CompareFunction::Less,
        true,
        &[Vertex::desc(), InstanceRaw::desc()],
        shader,
    )
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Hard-edged diffuse band over N.L.
pub fn diffuse_band(n_dot_l: f32) -> f32 {
    smoothstep(0.0, 0.01, n_dot_l)
}

/// Specular highlight banded the same way as the diffuse term. `band` is the
/// diffuse band so the highlight disappears on the dark side.
pub fn specular_band(n_dot_h: f32, band: f32, glossiness: f32) -> f32 {
    let spec = (n_dot_h.max(0.0) * band).powf(glossiness * glossiness);
    smoothstep(0.005, 0.01, spec)
}

/// Rim term thresholded on the view angle, faded in on the lit side.
pub fn rim_band(v_dot_n: f32, n_dot_l: f32) -> f32 {
    let rim = (1.0 - v_dot_n) * n_dot_l.max(0.0).powf(RIM_LIGHT_BLEND);
    smoothstep(RIM_AMOUNT - 0.01, RIM_AMOUNT + 0.01, rim)
}

/// The full toon shading formula, before tone mapping. All vectors are
/// expected in world space; `light_dir` points from the surface towards the
/// light.
pub fn shade(
    normal: Vector3<f32>,
    view_dir: Vector3<f32>,
    light_dir: Vector3<f32>,
    light_color: [f32; 3],
    ambient: [f32; 3],
    base_color: [f32; 3],
    glossiness: f32,
) -> [f32; 3] {
    let n = normal.normalize();
    let l = light_dir.normalize();
    let v = view_dir.normalize();

    let n_dot_l = n.dot(l);
    let band = diffuse_band(n_dot_l);
    let h = (l + v).normalize();
    let specular = specular_band(n.dot(h), band, glossiness);
    let rim = rim_band(v.dot(n), n_dot_l);

    let mut out = [0.0; 3];
    for c in 0..3 {
        let lit = ambient[c] + (band + specular + rim) * light_color[c];
        out[c] = base_color[c] * lit;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diffuse_band_is_a_hard_edge() {
        assert_eq!(diffuse_band(-0.5), 0.0);
        assert_eq!(diffuse_band(0.0), 0.0);
        assert_eq!(diffuse_band(0.01), 1.0);
        assert_eq!(diffuse_band(0.9), 1.0);
        let mid = diffuse_band(0.005);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn specular_vanishes_on_the_dark_side() {
        // bright highlight when facing the half vector and lit
        assert_eq!(specular_band(1.0, 1.0, 5.0), 1.0);
        // no highlight without a diffuse band, however aligned
        assert_eq!(specular_band(1.0, 0.0, 5.0), 0.0);
    }

    #[test]
    fn higher_glossiness_tightens_the_highlight() {
        let wide = specular_band(0.95, 1.0, 2.0);
        let tight = specular_band(0.95, 1.0, 20.0);
        assert!(wide >= tight);
        assert_eq!(specular_band(0.95, 1.0, 20.0), 0.0);
    }

    #[test]
    fn rim_triggers_at_grazing_view_angles_on_the_lit_side() {
        // head-on view, no rim
        assert_eq!(rim_band(1.0, 1.0), 0.0);
        // grazing view on the lit side, full rim
        assert_eq!(rim_band(0.1, 1.0), 1.0);
        // grazing view on the dark side, no rim
        assert_eq!(rim_band(0.1, 0.0), 0.0);
    }

    #[test]
    fn shade_is_deterministic() {
        let normal = Vector3::new(0.3, 0.8, 0.5);
        let view = Vector3::new(0.0, 0.2, 1.0);
        let light = Vector3::new(1.0, 1.0, 1.0);
        let a = shade(normal, view, light, [0.9, 0.9, 0.8], [0.1; 3], [0.4, 0.6, 0.9], 4.0);
        let b = shade(normal, view, light, [0.9, 0.9, 0.8], [0.1; 3], [0.4, 0.6, 0.9], 4.0);
        assert_eq!(a, b);
    }

    #[test]
    fn unlit_fragment_keeps_only_the_ambient_term() {
        // light from +X, normal facing -X: every directional term drops out
        let out = shade(
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(-1.0, 0.2, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            [1.0; 3],
            [0.25; 3],
            [1.0, 0.5, 0.2],
            10.0,
        );
        assert_eq!(out, [0.25, 0.125, 0.05]);
    }
}
