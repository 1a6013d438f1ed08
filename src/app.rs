//! Application event loop.
//!
//! Owns the window, the GPU context, the debug panel and the active scene,
//! and drives the per-frame tick: panel widgets run first so their writes
//! reach the GPU within the frame, then the orbit controller advances its
//! damping state, uniforms are uploaded, and the shadow, main and panel
//! passes are encoded and presented.

use std::{iter, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, MouseButtonState},
    panel::Panel,
    scene::{Node, Scene, SceneConstructor},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// GPU context, panel and surface status, created once the window exists.
struct AppState {
    ctx: Context,
    panel: Panel,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let panel = Panel::new(&ctx.device, ctx.config.format, &ctx.window);
        Ok(Self {
            ctx,
            panel,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.is_surface_configured = true;
            self.ctx.resize(width, height);
        }
    }

    fn render(&mut self, scene: &mut Box<dyn Scene>, dt: Duration) -> Result<(), wgpu::SurfaceError> {
        // keep the loop going
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        // Panel first: widget writes land in material/light fields and are
        // uploaded below, so they are visible this frame.
        let window = self.ctx.window.clone();
        let ctx = &mut self.ctx;
        let full_output = self.panel.run(&window, |egui_ctx| {
            egui::Window::new("controls")
                .resizable(false)
                .show(egui_ctx, |ui| scene.on_panel(ctx, ui));
        });

        scene.on_update(&self.ctx, dt);

        // Advance the orbit damping even on frames without input, then
        // upload the camera and light uniforms.
        {
            let crate::camera::CameraResources {
                camera,
                controller,
                uniform,
                buffer,
                ..
            } = &mut self.ctx.camera;
            controller.update(camera, dt);
            uniform.update_view_proj(camera, &self.ctx.projection, self.ctx.exposure);
            self.ctx
                .queue
                .write_buffer(buffer, 0, bytemuck::cast_slice(&[*uniform]));
        }
        self.ctx.light.refresh(&self.ctx.queue);

        let mut toons = Vec::new();
        let mut standards = Vec::new();
        let mut overlays = Vec::new();
        scene.on_render().batch(&mut toons, &mut standards, &mut overlays);

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        // Shadow pass: casters only, depth from the light's frustum.
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.light.shadow_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            shadow_pass.set_pipeline(&self.ctx.pipelines.shadow);
            shadow_pass.set_bind_group(0, &self.ctx.light.shadow_pass_bind_group, &[]);
            for draw in toons.iter().chain(standards.iter()) {
                if draw.node.cast_shadow {
                    draw_node(&mut shadow_pass, draw.node);
                }
            }
        }

        // Main pass: toon batch, standard batch, then overlays on top.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_bind_group(1, &self.ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &self.ctx.light.bind_group, &[]);

            render_pass.set_pipeline(&self.ctx.pipelines.toon);
            for draw in &toons {
                render_pass.set_bind_group(0, draw.material, &[]);
                draw_node(&mut render_pass, draw.node);
            }

            render_pass.set_pipeline(&self.ctx.pipelines.standard);
            for draw in &standards {
                render_pass.set_bind_group(0, draw.material, &[]);
                draw_node(&mut render_pass, draw.node);
            }

            render_pass.set_pipeline(&self.ctx.pipelines.unlit);
            for draw in &overlays {
                render_pass.set_bind_group(0, draw.material, &[]);
                draw_node(&mut render_pass, draw.node);
            }
        }

        self.panel.paint(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &window,
            &view,
            [self.ctx.config.width, self.ctx.config.height],
            full_output,
        );

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn draw_node(render_pass: &mut wgpu::RenderPass<'_>, node: &Node) {
    render_pass.set_vertex_buffer(0, node.mesh.vertex_buffer.slice(..));
    render_pass.set_vertex_buffer(1, node.instance_buffer.slice(..));
    render_pass.set_index_buffer(node.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    render_pass.draw_indexed(0..node.mesh.num_indices, 0, 0..1);
}

pub(crate) enum AppEvent {
    #[allow(dead_code)]
    Initialized(AppState),
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    state: Option<AppState>,
    scene: Option<Box<dyn Scene>>,
    // Held until the context exists, then taken to build the scene.
    constructor: Option<SceneConstructor>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>, constructor: SceneConstructor) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            scene: None,
            constructor: Some(constructor),
            last_time: Instant::now(),
        })
    }

    fn init_scene(&mut self) {
        let Some(state) = &mut self.state else { return };
        let Some(constructor) = self.constructor.take() else {
            return;
        };
        let mut scene = constructor(&state.ctx);
        scene.on_init(&mut state.ctx);
        self.scene = Some(scene);
        state.ctx.window.request_redraw();
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("toonlab");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut state = match self.async_runtime.block_on(AppState::new(window)) {
                Ok(state) => state,
                Err(e) => {
                    log::error!("App initialization failed: {}", e);
                    event_loop.exit();
                    return;
                }
            };
            let size = state.ctx.window.inner_size();
            state.resize(size.width, size.height);
            self.state = Some(state);
            self.init_scene();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match AppState::new(window).await {
                    Ok(state) => {
                        assert!(proxy.send_event(AppEvent::Initialized(state)).is_ok())
                    }
                    Err(e) => log::error!("App initialization failed: {}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(mut state) => {
                // The message from the wasm `spawn_local`; trigger a resize
                // and redraw now that we are initialized.
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                self.state = Some(state);
                self.init_scene();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else { return };

        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            // left-drag orbits, unless the gizmo grabbed the pointer
            if state.ctx.mouse.pressed == MouseButtonState::Left {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }

        if let Some(scene) = &mut self.scene {
            scene.on_device_events(&mut state.ctx, &event);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else { return };

        // The panel sees events first and may consume them. Button releases
        // always pass through: a drag that started on the scene must end
        // even when the cursor is over the panel at release time.
        let window = state.ctx.window.clone();
        let consumed = state.panel.on_window_event(&window, &event);
        let released = matches!(
            event,
            WindowEvent::MouseInput {
                state: ElementState::Released,
                ..
            }
        );

        if let WindowEvent::CursorMoved { position, .. } = &event {
            state.ctx.mouse.coords = *position;
        }

        if !consumed || released {
            state.ctx.camera.controller.handle_window_events(&event);

            if let WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } = &event
            {
                state.ctx.mouse.pressed = match (button, button_state.is_pressed()) {
                    (MouseButton::Left, true) => MouseButtonState::Left,
                    (MouseButton::Right, true) => MouseButtonState::Right,
                    _ => MouseButtonState::None,
                };
            }

            if let Some(scene) = &mut self.scene {
                scene.on_window_events(&mut state.ctx, &event);
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                let Some(scene) = &mut self.scene else { return };
                match state.render(scene, dt) {
                    Ok(_) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Initialise logging, build the event loop and run `constructor`'s scene
/// until the window closes.
pub fn run(constructor: SceneConstructor) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, constructor)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
