//! A cel-shaded sphere over a shadow-receiving ground plane, with a colour
//! picker and glossiness slider in the debug panel. Drag to orbit, scroll to
//! zoom.

use toonlab::{
    DeviceEvent, Vector3, WindowEvent,
    context::Context,
    egui,
    mesh::GpuMesh,
    pipelines::{Material, toon::GLOSSINESS_RANGE},
    scene::{Draw, Instance, Node, Render, Scene, SceneConstructor},
};

struct ToonSphere {
    sphere: Node,
    sphere_material: Material,
    ground: Node,
    ground_material: Material,
}

impl ToonSphere {
    fn new(ctx: &Context) -> Self {
        let sphere = Node::new(
            &ctx.device,
            GpuMesh::sphere(&ctx.device, 1.0, 32, 32),
            Instance::default(),
        )
        .with_shadow();
        let sphere_material = Material::new(
            &ctx.device,
            &ctx.pipelines.material_layout,
            "sphere",
            [0.18, 0.45, 0.85],
            8.0,
        );

        let ground = Node::new(
            &ctx.device,
            GpuMesh::plane(&ctx.device, 10.0),
            Instance::from(Vector3::new(0.0, -1.0, 0.0)),
        );
        let ground_material = Material::new(
            &ctx.device,
            &ctx.pipelines.material_layout,
            "ground",
            [0.75, 0.75, 0.78],
            1.0,
        );

        Self {
            sphere,
            sphere_material,
            ground,
            ground_material,
        }
    }
}

impl Scene for ToonSphere {
    fn on_init(&mut self, _: &mut Context) {}

    fn on_window_events(&mut self, _: &mut Context, _: &WindowEvent) {}

    fn on_device_events(&mut self, _: &mut Context, _: &DeviceEvent) {}

    fn on_update(&mut self, _: &Context, _: std::time::Duration) {}

    fn on_panel(&mut self, ctx: &mut Context, ui: &mut egui::Ui) {
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("colour");
            changed |= ui
                .color_edit_button_rgb(&mut self.sphere_material.color)
                .changed();
        });
        changed |= ui
            .add(
                egui::Slider::new(&mut self.sphere_material.glossiness, GLOSSINESS_RANGE)
                    .text("glossiness"),
            )
            .changed();
        if changed {
            self.sphere_material.write(&ctx.queue);
        }
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(vec![
            Render::Toon(Draw {
                node: &self.sphere,
                material: &self.sphere_material.bind_group,
            }),
            Render::Standard(Draw {
                node: &self.ground,
                material: &self.ground_material.bind_group,
            }),
        ])
    }
}

fn main() -> anyhow::Result<()> {
    let constructor: SceneConstructor = Box::new(|ctx| Box::new(ToonSphere::new(ctx)));
    toonlab::app::run(constructor)
}
