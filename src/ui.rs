//! The tunables overlay, drawn with egui on top of the final image.
//!
//! [`draw_panel`] only touches the state it is handed, so it runs the same
//! against a headless `egui::Context` in tests. [`Overlay`] wires it to the
//! window and the GPU.

use std::sync::Arc;

use glam::Vec3;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::camera::CameraState;
use crate::gpu::GpuContext;
use crate::light::LightDescriptor;
use crate::settings::RenderSettings;

/// State the panel edits.
pub struct Controls<'a> {
    pub camera: &'a mut CameraState,
    pub light: &'a mut LightDescriptor,
    pub settings: &'a mut RenderSettings,
    /// Whether the mirror box can be drawn at all.
    pub reflective_available: bool,
}

fn vec3_drag(ui: &mut egui::Ui, label: &str, value: &mut Vec3, speed: f32) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let x = ui.add(egui::DragValue::new(&mut value.x).speed(speed)).changed();
        let y = ui.add(egui::DragValue::new(&mut value.y).speed(speed)).changed();
        let z = ui.add(egui::DragValue::new(&mut value.z).speed(speed)).changed();
        x || y || z
    })
    .inner
}

fn color_edit(ui: &mut egui::Ui, label: &str, value: &mut Vec3) {
    ui.horizontal(|ui| {
        let mut rgb = value.to_array();
        if ui.color_edit_button_rgb(&mut rgb).changed() {
            *value = Vec3::from(rgb);
        }
        ui.label(label);
    });
}

/// Build the tunables window.
pub fn draw_panel(ctx: &egui::Context, controls: &mut Controls) {
    egui::Window::new("shadowbox")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            let settings = &mut *controls.settings;
            ui.horizontal(|ui| {
                // Edit a copy; the widget's color conversion is lossy
                let mut rgba = settings.clear_color;
                if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
                    settings.clear_color = rgba;
                }
                ui.label("clear color");
            });
            ui.add(egui::Slider::new(&mut settings.gamma, RenderSettings::GAMMA_RANGE).text("gamma"));

            ui.checkbox(&mut settings.flashlight, "flashlight");
            ui.checkbox(&mut settings.blinn, "blinn specular");
            ui.checkbox(&mut settings.animation, "animation");
            ui.checkbox(&mut settings.depth_test, "depth test");
            ui.add_enabled(
                controls.reflective_available,
                egui::Checkbox::new(&mut settings.reflective, "reflective box"),
            );

            egui::CollapsingHeader::new("camera")
                .default_open(true)
                .show(ui, |ui| {
                    let camera = &mut *controls.camera;
                    let mut position = camera.position();
                    if vec3_drag(ui, "pos", &mut position, 0.01) {
                        camera.set_position(position);
                    }
                    let mut yaw = camera.yaw();
                    let mut pitch = camera.pitch();
                    let yaw_changed = ui
                        .add(egui::DragValue::new(&mut yaw).speed(0.5).prefix("yaw "))
                        .changed();
                    let pitch_changed = ui
                        .add(egui::DragValue::new(&mut pitch).speed(0.5).prefix("pitch "))
                        .changed();
                    if yaw_changed || pitch_changed {
                        camera.set_angles(yaw, pitch);
                    }
                    if ui.button("reset camera").clicked() {
                        camera.reset();
                    }
                });

            egui::CollapsingHeader::new("light")
                .default_open(true)
                .show(ui, |ui| {
                    let light = &mut *controls.light;
                    ui.checkbox(&mut light.directional, "directional");
                    vec3_drag(ui, "pos", &mut light.position, 0.01);
                    vec3_drag(ui, "dir", &mut light.direction, 0.01);

                    let mut cutoff = light.cutoff();
                    let inner = ui
                        .add(egui::DragValue::new(&mut cutoff.x).speed(0.5).prefix("cutoff "))
                        .changed();
                    let edge = ui
                        .add(egui::DragValue::new(&mut cutoff.y).speed(0.5).prefix("edge "))
                        .changed();
                    if inner || edge {
                        light.set_cutoff(cutoff.x, cutoff.y);
                    }

                    ui.add(
                        egui::DragValue::new(&mut light.distance)
                            .speed(0.5)
                            .range(0.0..=3000.0)
                            .prefix("distance "),
                    );
                    color_edit(ui, "ambient", &mut light.ambient);
                    color_edit(ui, "diffuse", &mut light.diffuse);
                    color_edit(ui, "specular", &mut light.specular);
                });
        });
}

/// Tessellated output of one [`Overlay::run`].
pub struct OverlayFrame {
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    pixels_per_point: f32,
}

/// egui context, winit glue and wgpu renderer for the overlay.
pub struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    window: Arc<Window>,
}

impl Overlay {
    pub fn new(window: Arc<Window>, gpu: &GpuContext) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.config.format,
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                depth_stencil_format: None,
                ..Default::default()
            },
        );
        Self {
            ctx,
            state,
            renderer,
            window,
        }
    }

    /// Feed a window event to egui. Returns `true` when egui consumed it and
    /// it should not reach the camera.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.state.on_window_event(&self.window, event).consumed
    }

    /// Run the panel for this frame. Edits land in `controls` immediately;
    /// the returned shapes are drawn later by [`Overlay::paint`].
    pub fn run(&mut self, controls: &mut Controls) -> OverlayFrame {
        let raw_input = self.state.take_egui_input(&self.window);
        let full_output = self.ctx.run(raw_input, |ctx| draw_panel(ctx, controls));
        self.state
            .handle_platform_output(&self.window, full_output.platform_output);

        OverlayFrame {
            paint_jobs: self
                .ctx
                .tessellate(full_output.shapes, full_output.pixels_per_point),
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        }
    }

    /// Record the overlay draw into `encoder`, on top of `view`.
    ///
    /// Returns command buffers that must be submitted before `encoder`.
    pub fn paint(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: OverlayFrame,
    ) -> Vec<wgpu::CommandBuffer> {
        let OverlayFrame {
            paint_jobs,
            textures_delta,
            pixels_per_point,
        } = frame;
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.width(), gpu.height()],
            pixels_per_point,
        };

        for (id, image_delta) in &textures_delta.set {
            self.renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let command_buffers = self.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Overlay Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }

        for id in &textures_delta.free {
            self.renderer.free_texture(id);
        }

        command_buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_panel(controls: &mut Controls) {
        let ctx = egui::Context::default();
        // Two passes so layout settles
        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| draw_panel(ctx, controls));
        }
    }

    #[test]
    fn panel_without_input_changes_nothing() {
        let mut camera = CameraState::default();
        let mut light = LightDescriptor::default();
        let mut settings = RenderSettings::default();
        let mut controls = Controls {
            camera: &mut camera,
            light: &mut light,
            settings: &mut settings,
            reflective_available: true,
        };
        run_panel(&mut controls);

        assert_eq!(settings, RenderSettings::default());
        assert_eq!(light, LightDescriptor::default());
        assert_eq!(camera.position(), CameraState::default().position());
        assert_eq!(camera.yaw(), CameraState::default().yaw());
    }

    #[test]
    fn showing_panel_keeps_exact_clear_color() {
        let mut camera = CameraState::default();
        let mut light = LightDescriptor::default();
        let mut settings = RenderSettings {
            clear_color: [0.1, 0.125, 0.15, 1.0],
            ..RenderSettings::default()
        };
        let mut controls = Controls {
            camera: &mut camera,
            light: &mut light,
            settings: &mut settings,
            reflective_available: true,
        };
        run_panel(&mut controls);
        assert_eq!(settings.clear_color, [0.1, 0.125, 0.15, 1.0]);
    }

    #[test]
    fn panel_runs_without_reflective_program() {
        let mut camera = CameraState::default();
        let mut light = LightDescriptor::default();
        let mut settings = RenderSettings::default();
        let mut controls = Controls {
            camera: &mut camera,
            light: &mut light,
            settings: &mut settings,
            reflective_available: false,
        };
        run_panel(&mut controls);
        assert!(settings.reflective);
    }
}
