//! toonlab
//!
//! A small cel-shading playground on wgpu. The crate exposes the handful of
//! pieces its demos are built from: an orbit camera, a directional light
//! with an orthographic shadow map, banded toon and lambert pipelines, an
//! unlit overlay pipeline for gizmos, and an egui debug panel. Scenes
//! implement the [`scene::Scene`] trait and hand the engine their draws each
//! frame; everything runs both natively and on the web.
//!
//! High-level modules
//! - `app`: the winit event loop and per-frame render tick
//! - `camera`: orbit camera, projection and view uniforms
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `gizmo`: a translate gizmo with axis picking and constrained drags
//! - `light`: directional + ambient lights and the shadow map resources
//! - `mesh`: procedural sphere, plane, torus and arrow geometry
//! - `panel`: the egui debug panel painted over the scene
//! - `pipelines`: toon, standard, shadow and unlit render pipelines
//! - `scene`: nodes, instances and the per-frame render contract
//!

pub mod app;
pub mod camera;
pub mod context;
pub mod gizmo;
pub mod light;
pub mod mesh;
pub mod panel;
pub mod pipelines;
pub mod scene;
pub mod texture;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use egui;
pub use wgpu::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
