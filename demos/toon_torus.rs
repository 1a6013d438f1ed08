//! The sphere scene extended with a torus on a translate gizmo and light
//! sliders. Drag an arrow to move the torus along that axis; the orbit
//! camera stays put while a drag is active.

use toonlab::{
    DeviceEvent, Vector3, WindowEvent,
    context::Context,
    egui,
    gizmo::TranslateGizmo,
    mesh::GpuMesh,
    pipelines::{Material, toon::GLOSSINESS_RANGE},
    scene::{Draw, Instance, Node, Render, Scene, SceneConstructor},
};

use cgmath::{EuclideanSpace, Point3};

struct ToonTorus {
    sphere: Node,
    sphere_material: Material,
    torus: Node,
    torus_material: Material,
    ground: Node,
    ground_material: Material,
    gizmo: TranslateGizmo,
}

impl ToonTorus {
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

        let torus_position = Vector3::new(2.0, 0.0, 0.0);
        let torus = Node::new(
            &ctx.device,
            GpuMesh::torus(&ctx.device, 0.6, 0.25, 48, 24),
            Instance::from(torus_position),
        )
        .with_shadow();
        let torus_material = Material::new(
            &ctx.device,
            &ctx.pipelines.material_layout,
            "torus",
            [0.9, 0.35, 0.25],
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

        let gizmo = TranslateGizmo::new(ctx, Point3::from_vec(torus_position));

        Self {
            sphere,
            sphere_material,
            torus,
            torus_material,
            ground,
            ground_material,
            gizmo,
        }
    }
}

impl Scene for ToonTorus {
    fn on_init(&mut self, _: &mut Context) {}

    fn on_window_events(&mut self, ctx: &mut Context, event: &WindowEvent) {
        self.gizmo.on_window_events(ctx, event, &mut self.torus);
    }

    fn on_device_events(&mut self, _: &mut Context, _: &DeviceEvent) {}

    fn on_update(&mut self, _: &Context, _: std::time::Duration) {}

    fn on_panel(&mut self, ctx: &mut Context, ui: &mut egui::Ui) {
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("sphere");
            changed |= ui
                .color_edit_button_rgb(&mut self.sphere_material.color)
                .changed();
        });
        changed |= ui
            .add(
                egui::Slider::new(&mut self.sphere_material.glossiness, GLOSSINESS_RANGE)
                    .text("sphere glossiness"),
            )
            .changed();
        if changed {
            self.sphere_material.write(&ctx.queue);
        }

        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("torus");
            changed |= ui
                .color_edit_button_rgb(&mut self.torus_material.color)
                .changed();
        });
        changed |= ui
            .add(
                egui::Slider::new(&mut self.torus_material.glossiness, GLOSSINESS_RANGE)
                    .text("torus glossiness"),
            )
            .changed();
        if changed {
            self.torus_material.write(&ctx.queue);
        }

        // The lights are refreshed every frame, no explicit upload needed.
        ui.separator();
        ui.horizontal(|ui| {
            ui.label("light");
            ui.color_edit_button_rgb(&mut ctx.light.directional.color);
        });
        ui.add(
            egui::Slider::new(&mut ctx.light.directional.intensity, 0.0..=2.0).text("intensity"),
        );
        ui.horizontal(|ui| {
            ui.label("ambient");
            ui.color_edit_button_rgb(&mut ctx.light.ambient.color);
        });
        ui.add(egui::Slider::new(&mut ctx.light.ambient.intensity, 0.0..=2.0).text("fill"));
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(vec![
            Render::Toons(vec![
                Draw {
                    node: &self.sphere,
                    material: &self.sphere_material.bind_group,
                },
                Draw {
                    node: &self.torus,
                    material: &self.torus_material.bind_group,
                },
            ]),
            Render::Standard(Draw {
                node: &self.ground,
                material: &self.ground_material.bind_group,
            }),
            self.gizmo.on_render(),
        ])
    }
}

fn main() -> anyhow::Result<()> {
    let constructor: SceneConstructor = Box::new(|ctx| Box::new(ToonTorus::new(ctx)));
    toonlab::app::run(constructor)
}
