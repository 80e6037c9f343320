//! Per-frame decisions, computed before any GPU work is recorded.

use glam::{Mat4, Vec3};

use crate::camera::CameraState;
use crate::light::{EffectiveLight, LightDescriptor};
use crate::render::uniforms::{FrameUniforms, LightTerms};
use crate::render_target::Viewport;
use crate::scene::Surface;
use crate::settings::RenderSettings;

/// Uniform scale of the skybox cube around the camera.
pub const SKYBOX_SCALE: f32 = 50.0;
/// Uniform scale of the light marker box.
pub const MARKER_SCALE: f32 = 0.1;

/// Everything the three passes need to know about this frame.
#[derive(Clone, Debug)]
pub struct FramePlan {
    pub viewport: Viewport,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub light: EffectiveLight,
    pub light_space: Mat4,
    /// Spin time for placements, `None` while animation is off.
    pub time: Option<f32>,
    pub draw_marker: bool,
    /// Reflective placements are drawn and cast shadows. Requires both the
    /// toggle and a working reflective program.
    pub draw_reflective: bool,
    pub depth_test: bool,
    pub clear_color: wgpu::Color,
    pub gamma: f32,
    uniforms: FrameUniforms,
}

impl FramePlan {
    pub fn new(
        camera: &CameraState,
        light: &LightDescriptor,
        settings: &RenderSettings,
        viewport: Viewport,
        seconds: f32,
    ) -> Self {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix(viewport.aspect());
        let effective = light.effective(camera, settings.flashlight);
        let light_space = effective.light_space_matrix(light);

        let terms = LightTerms {
            position: effective.position,
            direction: effective.direction,
            directional: effective.directional,
            attenuation: light.attenuation(),
            ambient: light.ambient,
            diffuse: light.diffuse,
            specular: light.specular,
            cutoff_cosines: light.cutoff_cosines(),
        };
        let uniforms = FrameUniforms::new(
            projection * view,
            light_space,
            camera.position(),
            settings.blinn,
            &terms,
        );

        let [r, g, b, a] = settings.clear_color.map(f64::from);

        Self {
            viewport,
            view,
            projection,
            camera_position: camera.position(),
            light: effective,
            light_space,
            time: settings.animation_time(seconds),
            draw_marker: !settings.flashlight && !light.directional,
            draw_reflective: settings.reflective,
            depth_test: settings.depth_test,
            clear_color: wgpu::Color { r, g, b, a },
            gamma: settings.gamma,
            uniforms,
        }
    }

    /// Record whether the reflective program exists. Without it reflective
    /// placements are neither drawn nor cast shadows, whatever the toggle says.
    pub fn with_reflective_program(mut self, available: bool) -> Self {
        self.draw_reflective &= available;
        self
    }

    /// Whether a placement with `surface` goes into the shadow map.
    pub fn casts_shadow(&self, surface: Surface) -> bool {
        match surface {
            Surface::Lit(_) => true,
            Surface::Reflective => self.draw_reflective,
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn uniforms(&self) -> &FrameUniforms {
        &self.uniforms
    }

    /// Skybox model matrix: a large cube centered on the camera.
    pub fn skybox_model(&self) -> Mat4 {
        Mat4::from_translation(self.camera_position) * Mat4::from_scale(Vec3::splat(SKYBOX_SCALE))
    }

    pub fn marker_model(&self) -> Mat4 {
        Mat4::from_translation(self.light.position) * Mat4::from_scale(Vec3::splat(MARKER_SCALE))
    }
}

/// Tracks the size the scene target should have.
///
/// Starts at the configured size. Requests with a zero dimension are
/// ignored; a changed size marks the target stale until the pipeline
/// reallocates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetSize {
    width: u32,
    height: u32,
    stale: bool,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            stale: false,
        }
    }

    /// Record a new size. Returns `false` for ignored requests.
    pub fn request(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.stale = true;
        }
        true
    }

    /// The new size if the target must be reallocated, clearing the flag.
    pub fn take_stale(&mut self) -> Option<(u32, u32)> {
        std::mem::take(&mut self.stale).then_some((self.width, self.height))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::full(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MaterialId;
    use winit::event::MouseButton;

    fn plan(settings: &RenderSettings, light: &LightDescriptor) -> FramePlan {
        FramePlan::new(
            &CameraState::default(),
            light,
            settings,
            Viewport::full(800, 600),
            1.0,
        )
    }

    fn plan_default() -> FramePlan {
        plan(&RenderSettings::default(), &LightDescriptor::default())
    }

    #[test]
    fn configured_size_before_any_resize() {
        let mut size = TargetSize::new(800, 600);
        assert_eq!(size.viewport(), Viewport::full(800, 600));
        assert_eq!(size.take_stale(), None);
    }

    #[test]
    fn resize_updates_viewport_and_marks_target_stale() {
        let mut size = TargetSize::new(800, 600);
        assert!(size.request(1280, 720));
        assert_eq!(size.viewport(), Viewport::full(1280, 720));
        assert_eq!(size.take_stale(), Some((1280, 720)));
        assert_eq!(size.take_stale(), None);
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let mut size = TargetSize::new(800, 600);
        assert!(!size.request(0, 720));
        assert!(!size.request(1280, 0));
        assert_eq!(size.dimensions(), (800, 600));
        assert_eq!(size.take_stale(), None);
    }

    #[test]
    fn same_size_is_not_stale() {
        let mut size = TargetSize::new(800, 600);
        assert!(size.request(800, 600));
        assert_eq!(size.take_stale(), None);
    }

    #[test]
    fn marker_hidden_in_flashlight_mode() {
        let light = LightDescriptor::default();
        let mut settings = RenderSettings::default();
        assert!(plan(&settings, &light).draw_marker);

        settings.flashlight = true;
        assert!(!plan(&settings, &light).draw_marker);
    }

    #[test]
    fn marker_hidden_for_directional_light() {
        let mut light = LightDescriptor::default();
        light.directional = true;
        assert!(!plan(&RenderSettings::default(), &light).draw_marker);
    }

    #[test]
    fn flashlight_uniforms_follow_camera() {
        let light = LightDescriptor::default();
        let settings = RenderSettings {
            flashlight: true,
            ..RenderSettings::default()
        };
        let mut camera = CameraState::default();
        camera.on_pointer_button(MouseButton::Right, true, 0.0, 0.0);
        camera.on_pointer_move(-40.0, 10.0);

        let plan = FramePlan::new(&camera, &light, &settings, Viewport::full(640, 480), 0.0);
        let uniforms = plan.uniforms();
        assert_eq!(uniforms.light_position, camera.position().to_array());
        assert_eq!(uniforms.view_pos, camera.position().to_array());
        assert_eq!(light, LightDescriptor::default());
    }

    #[test]
    fn missing_reflective_program_hides_box_and_its_shadow() {
        let settings = RenderSettings::default();
        assert!(settings.reflective);

        let plan = plan(&settings, &LightDescriptor::default()).with_reflective_program(false);
        assert!(!plan.draw_reflective);
        assert!(!plan.casts_shadow(Surface::Reflective));
        assert!(plan.casts_shadow(Surface::Lit(MaterialId(0))));
    }

    #[test]
    fn reflective_toggle_off_hides_shadow_too() {
        let settings = RenderSettings {
            reflective: false,
            ..RenderSettings::default()
        };
        let plan = plan(&settings, &LightDescriptor::default()).with_reflective_program(true);
        assert!(!plan.casts_shadow(Surface::Reflective));

        let shown = plan_default().with_reflective_program(true);
        assert!(shown.casts_shadow(Surface::Reflective));
    }

    #[test]
    fn projection_uses_viewport_aspect() {
        let plan = plan(&RenderSettings::default(), &LightDescriptor::default());
        let expected = CameraState::default().projection_matrix(800.0 / 600.0);
        assert_eq!(plan.projection, expected);
    }

    #[test]
    fn skybox_is_centered_on_camera() {
        let plan = plan(&RenderSettings::default(), &LightDescriptor::default());
        let center = plan.skybox_model().transform_point3(Vec3::ZERO);
        assert_eq!(center, CameraState::default().position());
        let corner = plan.skybox_model().transform_point3(Vec3::splat(0.5));
        assert!((corner - center).x > 20.0);
    }

    #[test]
    fn animation_off_freezes_time() {
        let settings = RenderSettings {
            animation: false,
            ..RenderSettings::default()
        };
        assert_eq!(plan(&settings, &LightDescriptor::default()).time, None);
    }

    #[test]
    fn clear_color_carries_through() {
        let settings = RenderSettings {
            clear_color: [0.5, 0.25, 0.0, 1.0],
            ..RenderSettings::default()
        };
        let plan = plan(&settings, &LightDescriptor::default());
        assert_eq!(plan.clear_color.r, 0.5);
        assert_eq!(plan.clear_color.g, 0.25);
    }
}
