//! Central GPU and window context.
//!
//! [`Context`] owns the surface, device and queue, the camera and light
//! bundles, the pipeline set and the depth texture. Scenes receive it in
//! every lifecycle hook and configure it during `on_init`.

use std::sync::Arc;

use cgmath::Point3;
use winit::{dpi::PhysicalPosition, window::Window};

use crate::{
    camera::{self, CameraResources, OrbitController, Projection},
    light::{AmbientLight, DirectionalLight, LightResources, ShadowSettings},
    pipelines::Pipelines,
    texture::Texture,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButtonState {
    Left,
    Right,
    None,
}

/// Cursor position and button state, updated from window events before the
/// scene hooks run.
#[derive(Debug)]
pub struct MouseState {
    pub coords: PhysicalPosition<f64>,
    pub pressed: MouseButtonState,
}

#[derive(Debug)]
pub struct Context {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub depth_texture: Texture,
    pub mouse: MouseState,
    pub clear_colour: wgpu::Color,
    /// Tone-mapping exposure applied in the fragment shaders.
    pub exposure: f32,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        log::info!("surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // Prefer an sRGB surface so linear shader output lands correctly.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = camera::Camera::new((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
        let controller = OrbitController::looking_from((0.0, 1.0, 5.0), (0.0, 0.0, 0.0));
        let projection =
            Projection::new(config.width, config.height, cgmath::Deg(75.0), 0.1, 1000.0);
        let camera = CameraResources::new(&device, camera, controller);

        let directional = DirectionalLight {
            position: Point3::new(4.0, 4.0, 4.0),
            // warm white, #f8f1e6
            color: [0.972, 0.945, 0.902],
            intensity: 0.5,
            shadow: ShadowSettings::default(),
        };
        let ambient = AmbientLight {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        };
        let light = LightResources::new(&device, directional, ambient);

        let pipelines = Pipelines::new(&device, &config, &camera.bind_group_layout, &light);

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            depth_texture,
            mouse: MouseState {
                coords: (0.0, 0.0).into(),
                pressed: MouseButtonState::None,
            },
            clear_colour: wgpu::Color {
                r: 0.02,
                g: 0.02,
                b: 0.03,
                a: 1.0,
            },
            exposure: 1.75,
        })
    }

    /// Reconfigure the surface, projection and depth texture for a new
    /// window size. Read by the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }
}
