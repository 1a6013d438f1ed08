//! Directional and ambient lighting with shadow mapping.
//!
//! The live light state stays in [`DirectionalLight`] and [`AmbientLight`];
//! panel sliders write straight into those fields. Once per frame
//! [`LightResources::refresh`] repacks them into [`LightUniform`]
//! (intensities premultiplied into the colours, plus the light's
//! view-projection for shadow sampling) and uploads the buffer, so the last
//! write before a frame wins.

use cgmath::{EuclideanSpace, Matrix4, Point3, Vector3};
use wgpu::util::DeviceExt;

use crate::{camera::OPENGL_TO_WGPU_MATRIX, texture::Texture};

/// Shadow-map parameters of a directional light.
#[derive(Clone, Copy, Debug)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    /// Half-extent of the orthographic shadow frustum.
    pub extent: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 4096,
            near: 2.0,
            far: 15.0,
            extent: 8.0,
        }
    }
}

/// A sun-style light shining from `position` towards the origin.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    pub position: Point3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
    pub shadow: ShadowSettings,
}

impl DirectionalLight {
    /// Unit vector from the lit surfaces towards the light.
    pub fn direction(&self) -> Vector3<f32> {
        use cgmath::InnerSpace;
        self.position.to_vec().normalize()
    }

    /// View-projection from the light's point of view, used for both the
    /// shadow pass and shadow sampling in the main pass.
    pub fn view_proj(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(self.position, Point3::origin(), Vector3::unit_y());
        let e = self.shadow.extent;
        let proj = OPENGL_TO_WGPU_MATRIX
            * cgmath::ortho(-e, e, -e, e, self.shadow.near, self.shadow.far);
        proj * view
    }
}

/// Uniform, non-directional fill light.
#[derive(Clone, Copy, Debug)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// The packed light state as seen by the shaders. Colours arrive
/// premultiplied by their intensities.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    view_proj: [[f32; 4]; 4],
    direction: [f32; 3],
    // 16-byte spacing between vec3 fields, as required by WGSL uniform layout
    _pad0: f32,
    color: [f32; 3],
    _pad1: f32,
    ambient: [f32; 3],
    _pad2: f32,
}

impl LightUniform {
    pub fn pack(directional: &DirectionalLight, ambient: &AmbientLight) -> Self {
        let scale = |c: [f32; 3], i: f32| [c[0] * i, c[1] * i, c[2] * i];
        Self {
            view_proj: directional.view_proj().into(),
            direction: directional.direction().into(),
            _pad0: 0.0,
            color: scale(directional.color, directional.intensity),
            _pad1: 0.0,
            ambient: scale(ambient.color, ambient.intensity),
            _pad2: 0.0,
        }
    }

    #[cfg(test)]
    pub(crate) fn color(&self) -> [f32; 3] {
        self.color
    }

    #[cfg(test)]
    pub(crate) fn ambient(&self) -> [f32; 3] {
        self.ambient
    }

    #[cfg(test)]
    pub(crate) fn direction(&self) -> [f32; 3] {
        self.direction
    }
}

/// Light state plus its GPU-side resources, bundled on the context.
#[derive(Debug)]
pub struct LightResources {
    pub directional: DirectionalLight,
    pub ambient: AmbientLight,
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub shadow_texture: Texture,
    /// Uniform-only bind group for the shadow pass, which cannot bind the
    /// shadow texture it renders into.
    pub shadow_pass_bind_group: wgpu::BindGroup,
    pub shadow_pass_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(
        device: &wgpu::Device,
        directional: DirectionalLight,
        ambient: AmbientLight,
    ) -> Self {
        let uniform = LightUniform::pack(&directional, &ambient);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shadow_texture =
            Texture::create_shadow_texture(device, directional.shadow.map_size, "shadow_map");

        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(
                        shadow_texture
                            .sampler
                            .as_ref()
                            .expect("shadow texture carries a comparison sampler"),
                    ),
                },
            ],
            label: Some("light_bind_group"),
        });

        let shadow_pass_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("shadow_pass_bind_group_layout"),
            });
        let shadow_pass_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &shadow_pass_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("shadow_pass_bind_group"),
        });

        Self {
            directional,
            ambient,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
            shadow_texture,
            shadow_pass_bind_group,
            shadow_pass_layout,
        }
    }

    /// Repack the uniform from the live light fields and upload it.
    pub fn refresh(&mut self, queue: &wgpu::Queue) {
        self.uniform = LightUniform::pack(&self.directional, &self.ambient);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    fn lights() -> (DirectionalLight, AmbientLight) {
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
    fn uniform_premultiplies_intensity() {
        let (directional, ambient) = lights();
        let uniform = LightUniform::pack(&directional, &ambient);
        assert!((uniform.color()[0] - 0.972 * 0.5).abs() < 1e-6);
        assert_eq!(uniform.ambient(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn intensity_slider_changes_only_the_scaled_colour() {
        let (mut directional, ambient) = lights();
        let before = LightUniform::pack(&directional, &ambient);
        directional.intensity = 1.5;
        let after = LightUniform::pack(&directional, &ambient);
        assert!((after.color()[1] - 0.945 * 1.5).abs() < 1e-6);
        assert_eq!(before.direction(), after.direction());
        assert_eq!(before.ambient(), after.ambient());
        assert_eq!(before.view_proj, after.view_proj);
    }

    #[test]
    fn direction_points_at_the_light() {
        let (directional, _) = lights();
        let dir = Vector3::from(LightUniform::pack(&directional, &lights().1).direction());
        let expected = Vector3::new(1.0, 1.0, 1.0).normalize();
        assert!((dir - expected).magnitude() < 1e-6);
    }

    #[test]
    fn uniform_matches_wgsl_layout() {
        // mat4x4 + three padded vec3s
        assert_eq!(std::mem::size_of::<LightUniform>(), 64 + 48);
    }
}
