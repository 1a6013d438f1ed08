//! The debug panel, an egui window painted over the scene.
//!
//! Scenes add their widgets in [`Scene::on_panel`](crate::scene::Scene);
//! this module owns the egui context, winit event bridge and wgpu painter.
//! Widget writes land directly in material and light fields and are
//! uploaded later in the same frame.

use std::sync::Arc;

use winit::{event::WindowEvent, window::Window};

/// GUI pixel ratio, clamped so 4k-class displays don't quadruple the
/// panel's texture footprint.
pub fn pixel_ratio(window: &Window) -> f32 {
    (window.scale_factor() as f32).min(2.0)
}

pub struct Panel {
    pub context: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Panel {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, window: &Arc<Window>) -> Self {
        let context = egui::Context::default();
        let state = egui_winit::State::new(
            context.clone(),
            context.viewport_id(),
            window.as_ref(),
            Some(pixel_ratio(window)),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
        Self {
            context,
            state,
            renderer,
        }
    }

    /// Feed a window event to egui. Returns true when egui consumed it
    /// (pointer over the panel, text input, ...), in which case the scene
    /// and camera should not see it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Run the panel UI for this frame.
    pub fn run(
        &mut self,
        window: &Window,
        build: impl FnMut(&egui::Context),
    ) -> egui::FullOutput {
        let raw_input = self.state.take_egui_input(window);
        self.context.run(raw_input, build)
    }

    /// Tessellate and paint the output of [`run`](Panel::run) on top of the
    /// frame.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        view: &wgpu::TextureView,
        size: [u32; 2],
        full_output: egui::FullOutput,
    ) {
        self.state
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: size,
            pixels_per_point: pixel_ratio(window),
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(device, queue, *id, image_delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &paint_jobs, &screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Panel Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let mut render_pass = render_pass.forget_lifetime();
            self.renderer
                .render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
