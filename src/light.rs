//! The scene light: a spot light by default, optionally directional.
//!
//! [`LightDescriptor`] holds the stored parameters. Each frame the pipeline
//! asks for an [`EffectiveLight`], which is where flashlight mode swaps in the
//! camera pose without ever touching the stored values.

use glam::{Mat4, Vec2, Vec3};

use crate::camera::CameraState;

/// Near plane of the shadow-casting projection.
pub const SHADOW_NEAR: f32 = 1.0;
/// Far plane of the perspective shadow projection.
pub const SHADOW_FAR: f32 = 20.0;
/// Half extent and far plane of the orthographic projection used for
/// directional lights.
const ORTHO_HALF_EXTENT: f32 = 10.0;
const ORTHO_FAR: f32 = 30.0;

/// Reference distances mapped to (constant, linear, quadratic) attenuation.
///
/// Values in between are linearly interpolated; outside the table the
/// nearest entry is used.
const ATTENUATION_TABLE: [(f32, [f32; 3]); 12] = [
    (7.0, [1.0, 0.7, 1.8]),
    (13.0, [1.0, 0.35, 0.44]),
    (20.0, [1.0, 0.22, 0.20]),
    (32.0, [1.0, 0.14, 0.07]),
    (50.0, [1.0, 0.09, 0.032]),
    (65.0, [1.0, 0.07, 0.017]),
    (100.0, [1.0, 0.045, 0.0075]),
    (160.0, [1.0, 0.027, 0.0028]),
    (200.0, [1.0, 0.022, 0.0019]),
    (325.0, [1.0, 0.014, 0.0007]),
    (600.0, [1.0, 0.007, 0.0002]),
    (3250.0, [1.0, 0.0014, 0.000007]),
];

/// Attenuation coefficients `(constant, linear, quadratic)` for a light that
/// should fade out over roughly `distance` world units.
pub fn attenuation(distance: f32) -> Vec3 {
    let (first_distance, first) = ATTENUATION_TABLE[0];
    if distance <= first_distance || distance.is_nan() {
        return Vec3::from(first);
    }
    for pair in ATTENUATION_TABLE.windows(2) {
        let (d0, c0) = pair[0];
        let (d1, c1) = pair[1];
        if distance < d1 {
            let t = (distance - d0) / (d1 - d0);
            return Vec3::from(c0).lerp(Vec3::from(c1), t);
        }
    }
    Vec3::from(ATTENUATION_TABLE[ATTENUATION_TABLE.len() - 1].1)
}

/// Stored light parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct LightDescriptor {
    /// Treat the light as directional: no position, no attenuation, no cone.
    pub directional: bool,
    pub position: Vec3,
    pub direction: Vec3,
    /// `x`: inner cone half-angle, `y`: width of the soft edge beyond it.
    /// Both in degrees and never negative.
    cutoff: Vec2,
    /// Distance over which the light fades out.
    pub distance: f32,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for LightDescriptor {
    fn default() -> Self {
        Self {
            directional: false,
            position: Vec3::new(2.0, 4.0, 4.0),
            direction: Vec3::new(-0.5, -1.5, -1.0),
            cutoff: Vec2::new(50.0, 5.0),
            distance: 150.0,
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::splat(1.0),
        }
    }
}

impl LightDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inner cone angle and soft-edge width in degrees.
    pub fn cutoff(&self) -> Vec2 {
        self.cutoff
    }

    /// Set the cone angles; negative values are clamped to zero.
    pub fn set_cutoff(&mut self, inner: f32, edge: f32) {
        self.cutoff = Vec2::new(inner.max(0.0), edge.max(0.0));
    }

    /// Cosines of the inner and outer cone angles, as the lit shader
    /// compares them against `dot(-L, spot_dir)`.
    pub fn cutoff_cosines(&self) -> Vec2 {
        let inner = self.cutoff.x;
        let outer = self.cutoff.x + self.cutoff.y;
        Vec2::new(inner.to_radians().cos(), outer.to_radians().cos())
    }

    pub fn attenuation(&self) -> Vec3 {
        attenuation(self.distance)
    }

    /// The light as it should be rendered this frame.
    ///
    /// With `flashlight` on, position and direction follow the camera.
    pub fn effective(&self, camera: &CameraState, flashlight: bool) -> EffectiveLight {
        let (position, direction) = if flashlight {
            (camera.position(), camera.front())
        } else {
            (self.position, self.direction)
        };
        EffectiveLight {
            position,
            direction: direction.normalize_or(Vec3::NEG_Y),
            directional: self.directional,
        }
    }

    /// Projection used to render the shadow map.
    pub fn shadow_projection(&self) -> Mat4 {
        if self.directional {
            Mat4::orthographic_rh(
                -ORTHO_HALF_EXTENT,
                ORTHO_HALF_EXTENT,
                -ORTHO_HALF_EXTENT,
                ORTHO_HALF_EXTENT,
                SHADOW_NEAR,
                ORTHO_FAR,
            )
        } else {
            let fov = (2.0 * (self.cutoff.x + self.cutoff.y)).clamp(1.0, 179.0);
            Mat4::perspective_rh(fov.to_radians(), 1.0, SHADOW_NEAR, SHADOW_FAR)
        }
    }
}

/// Light position and direction after the flashlight override.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectiveLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub directional: bool,
}

impl EffectiveLight {
    /// View matrix looking from the light along its direction.
    pub fn view_matrix(&self) -> Mat4 {
        // look_at degenerates when direction is parallel to the up vector
        let up = if self.direction.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.position + self.direction, up)
    }

    /// World to light clip space, for rendering and sampling the shadow map.
    pub fn light_space_matrix(&self, descriptor: &LightDescriptor) -> Mat4 {
        descriptor.shadow_projection() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::MouseButton;

    #[test]
    fn attenuation_matches_reference_points() {
        assert_eq!(attenuation(50.0), Vec3::new(1.0, 0.09, 0.032));
        assert_eq!(attenuation(7.0), Vec3::new(1.0, 0.7, 1.8));
        assert_eq!(attenuation(3250.0), Vec3::new(1.0, 0.0014, 0.000007));
    }

    #[test]
    fn attenuation_interpolates_between_points() {
        let mid = attenuation(130.0);
        assert!((mid.y - 0.036).abs() < 1e-6);
        assert!((mid.z - 0.00515).abs() < 1e-6);
        assert_eq!(mid.x, 1.0);
    }

    #[test]
    fn attenuation_clamps_outside_table() {
        assert_eq!(attenuation(0.0), attenuation(7.0));
        assert_eq!(attenuation(-10.0), attenuation(7.0));
        assert_eq!(attenuation(1.0e6), attenuation(3250.0));
    }

    #[test]
    fn attenuation_is_monotonic() {
        let mut previous = attenuation(1.0);
        let mut d = 1.0;
        while d < 4000.0 {
            d += 3.7;
            let current = attenuation(d);
            assert!(current.y <= previous.y, "linear rose at {d}");
            assert!(current.z <= previous.z, "quadratic rose at {d}");
            previous = current;
        }
    }

    #[test]
    fn flashlight_overrides_pose_without_persisting() {
        let light = LightDescriptor::default();
        let mut camera = CameraState::default();
        camera.on_pointer_button(MouseButton::Right, true, 0.0, 0.0);
        camera.on_pointer_move(37.0, -12.0);

        let on = light.effective(&camera, true);
        assert_eq!(on.position, camera.position());
        assert!((on.direction - camera.front()).length() < 1e-6);
        assert_eq!(light, LightDescriptor::default());

        let off = light.effective(&camera, false);
        assert_eq!(off.position, light.position);
        assert!((off.direction - light.direction.normalize()).length() < 1e-6);
    }

    #[test]
    fn cutoff_cosines_use_inner_and_outer_angles() {
        let light = LightDescriptor::default();
        let cosines = light.cutoff_cosines();
        assert!((cosines.x - 50f32.to_radians().cos()).abs() < 1e-6);
        assert!((cosines.y - 55f32.to_radians().cos()).abs() < 1e-6);
        assert!(cosines.x > cosines.y);
    }

    #[test]
    fn cutoff_is_never_negative() {
        let mut light = LightDescriptor::default();
        light.set_cutoff(-10.0, -1.0);
        assert_eq!(light.cutoff(), Vec2::ZERO);
    }

    #[test]
    fn spot_shadow_projection_uses_cone_fov() {
        let light = LightDescriptor::default();
        let expected = Mat4::perspective_rh(110f32.to_radians(), 1.0, 1.0, 20.0);
        assert_eq!(light.shadow_projection(), expected);
    }

    #[test]
    fn light_space_maps_light_target_to_center() {
        let light = LightDescriptor::default();
        let effective = light.effective(&CameraState::default(), false);
        let matrix = effective.light_space_matrix(&light);
        let target = effective.position + effective.direction * 5.0;
        let clip = matrix * target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn straight_down_light_has_valid_view() {
        let light = EffectiveLight {
            position: Vec3::new(0.0, 10.0, 0.0),
            direction: Vec3::NEG_Y,
            directional: true,
        };
        assert!(light.view_matrix().is_finite());
    }
}
