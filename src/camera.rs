//! The viewer camera and its pointer-driven control state machine.
//!
//! [`CameraState`] stores position plus yaw/pitch in degrees. The front
//! vector is always derived from the angles, never stored.
//!
//! Control follows a two-state machine:
//!
//! - **Idle**: pointer motion and movement keys are ignored.
//! - **Orbiting**: entered while the secondary (right) pointer button is held.
//!   Pointer motion turns the camera and W/A/S/D/Q/E move it.
//!
//! # Example
//!
//! ```
//! use shadowbox::{CameraState, ControlState, MouseButton};
//!
//! let mut camera = CameraState::default();
//! camera.on_pointer_button(MouseButton::Right, true, 100.0, 100.0);
//! assert_eq!(camera.control(), ControlState::Orbiting);
//!
//! camera.on_pointer_move(110.0, 100.0);
//! assert_eq!(camera.yaw(), 355.0);
//! ```

use glam::{Mat3, Mat4, Vec2, Vec3};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Degrees of rotation per pixel of pointer motion.
pub const ROTATION_SPEED: f32 = 0.5;
/// World units moved per frame while a movement key is held.
pub const MOVE_SPEED: f32 = 0.05;
/// Pitch limit in degrees, both directions.
pub const PITCH_LIMIT: f32 = 89.0;

/// Vertical field of view of the viewer camera, in degrees.
pub const FOV_Y: f32 = 45.0;
/// Near clipping plane of the viewer camera.
pub const NEAR: f32 = 0.1;
/// Far clipping plane of the viewer camera.
pub const FAR: f32 = 80.0;

const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, 2.5, 8.0);
const DEFAULT_YAW: f32 = 0.0;
const DEFAULT_PITCH: f32 = -20.0;

/// Source of per-frame key state.
///
/// Implemented by [`Input`](crate::Input); tests use plain sets.
pub trait KeyState {
    fn key_down(&self, key: KeyCode) -> bool;
}

impl KeyState for std::collections::HashSet<KeyCode> {
    fn key_down(&self, key: KeyCode) -> bool {
        self.contains(&key)
    }
}

/// Whether pointer input currently steers the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ControlState {
    /// Pointer motion is ignored.
    #[default]
    Idle,
    /// Pointer motion updates yaw and pitch; movement keys are live.
    Orbiting,
}

/// The viewer camera.
#[derive(Clone, Debug)]
pub struct CameraState {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    up: Vec3,
    reference: Vec2,
    control: ControlState,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION,
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            up: Vec3::Y,
            reference: Vec2::ZERO,
            control: ControlState::Idle,
        }
    }
}

impl CameraState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the camera position.
    pub fn at(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    /// Set yaw and pitch in degrees. Values are wrapped and clamped.
    pub fn facing(mut self, yaw: f32, pitch: f32) -> Self {
        self.set_angles(yaw, pitch);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Yaw in degrees, always in `[0, 360)`.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees, always in `[-89, 89]`.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Set yaw and pitch in degrees, wrapping yaw and clamping pitch.
    pub fn set_angles(&mut self, yaw: f32, pitch: f32) {
        self.yaw = wrap_degrees(yaw);
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn control(&self) -> ControlState {
        self.control
    }

    pub fn is_orbiting(&self) -> bool {
        self.control == ControlState::Orbiting
    }

    /// Restore the initial pose and drop out of orbiting.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Unit view direction derived from yaw and pitch.
    pub fn front(&self) -> Vec3 {
        let rotation = Mat3::from_rotation_y(self.yaw.to_radians())
            * Mat3::from_rotation_x(self.pitch.to_radians());
        (rotation * Vec3::NEG_Z).normalize()
    }

    /// Strafe direction: `normalize(cross(up, -front))`.
    pub fn right(&self) -> Vec3 {
        self.up.cross(-self.front()).normalize()
    }

    /// Camera-relative up: `normalize(cross(-front, right))`.
    pub fn local_up(&self) -> Vec3 {
        (-self.front()).cross(self.right()).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y.to_radians(), aspect, NEAR, FAR)
    }

    /// Pointer button transition.
    ///
    /// Only the secondary button affects the camera: pressing it enters
    /// [`ControlState::Orbiting`] and records `(x, y)` as the reference
    /// point, releasing it returns to [`ControlState::Idle`].
    pub fn on_pointer_button(&mut self, button: MouseButton, pressed: bool, x: f32, y: f32) {
        if button != MouseButton::Right {
            return;
        }
        if pressed {
            self.reference = Vec2::new(x, y);
            self.control = ControlState::Orbiting;
        } else {
            self.control = ControlState::Idle;
        }
        log::debug!("camera control: {:?}", self.control);
    }

    /// Pointer motion. Turns the camera only while orbiting.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.control != ControlState::Orbiting {
            return;
        }
        let current = Vec2::new(x, y);
        let delta = current - self.reference;
        self.set_angles(
            self.yaw - delta.x * ROTATION_SPEED,
            self.pitch - delta.y * ROTATION_SPEED,
        );
        self.reference = current;
    }

    /// Apply one frame of keyboard movement. No-op while idle.
    pub fn apply_movement(&mut self, keys: &impl KeyState) {
        if self.control != ControlState::Orbiting {
            return;
        }
        let front = self.front();
        let right = self.right();
        let up = self.local_up();

        let mut offset = Vec3::ZERO;
        if keys.key_down(KeyCode::KeyW) {
            offset += front;
        }
        if keys.key_down(KeyCode::KeyS) {
            offset -= front;
        }
        if keys.key_down(KeyCode::KeyD) {
            offset += right;
        }
        if keys.key_down(KeyCode::KeyA) {
            offset -= right;
        }
        if keys.key_down(KeyCode::KeyE) {
            offset += up;
        }
        if keys.key_down(KeyCode::KeyQ) {
            offset -= up;
        }
        self.position += offset * MOVE_SPEED;
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn orbiting_at(x: f32, y: f32) -> CameraState {
        let mut camera = CameraState::default();
        camera.on_pointer_button(MouseButton::Right, true, x, y);
        camera
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn starts_idle_with_default_pose() {
        let camera = CameraState::default();
        assert_eq!(camera.control(), ControlState::Idle);
        assert_eq!(camera.position(), Vec3::new(0.0, 2.5, 8.0));
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.pitch(), -20.0);
    }

    #[test]
    fn orbit_scenario() {
        let mut camera = CameraState::default();
        camera.on_pointer_button(MouseButton::Right, true, 100.0, 100.0);
        assert_eq!(camera.control(), ControlState::Orbiting);

        camera.on_pointer_move(110.0, 100.0);
        assert!(approx(camera.yaw(), 355.0));
        assert!(approx(camera.pitch(), -20.0));

        camera.on_pointer_button(MouseButton::Right, false, 110.0, 100.0);
        assert_eq!(camera.control(), ControlState::Idle);

        camera.on_pointer_move(300.0, 250.0);
        assert!(approx(camera.yaw(), 355.0));
        assert!(approx(camera.pitch(), -20.0));
    }

    #[test]
    fn yaw_wraps_past_360() {
        let mut camera = CameraState::default().facing(350.0, 0.0);
        camera.on_pointer_button(MouseButton::Right, true, 0.0, 0.0);
        // yaw -= dx * 0.5, so dx = -40 turns by +20 degrees
        camera.on_pointer_move(-40.0, 0.0);
        assert!(approx(camera.yaw(), 10.0));
    }

    #[test]
    fn yaw_stays_in_range_for_many_deltas() {
        let mut camera = orbiting_at(0.0, 0.0);
        let mut x = 0.0;
        for step in [-1000.0, 733.0, 0.001, -0.001, 12345.0, -98765.0, 719.9, 720.0] {
            x += step;
            camera.on_pointer_move(x, 0.0);
            assert!(
                (0.0..360.0).contains(&camera.yaw()),
                "yaw {} out of range",
                camera.yaw()
            );
        }
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = CameraState::default().facing(0.0, 80.0);
        camera.on_pointer_button(MouseButton::Right, true, 0.0, 0.0);
        camera.on_pointer_move(0.0, -500.0);
        assert_eq!(camera.pitch(), 89.0);
        camera.on_pointer_move(0.0, 5000.0);
        assert_eq!(camera.pitch(), -89.0);
    }

    #[test]
    fn idle_ignores_pointer_motion() {
        let mut camera = CameraState::default();
        let before = camera.clone();
        for (x, y) in [(10.0, 10.0), (500.0, -20.0), (-3.0, 999.0)] {
            camera.on_pointer_move(x, y);
        }
        assert_eq!(camera.yaw(), before.yaw());
        assert_eq!(camera.pitch(), before.pitch());
        assert_eq!(camera.position(), before.position());
    }

    #[test]
    fn other_buttons_do_not_start_orbiting() {
        let mut camera = CameraState::default();
        camera.on_pointer_button(MouseButton::Left, true, 0.0, 0.0);
        camera.on_pointer_button(MouseButton::Middle, true, 0.0, 0.0);
        assert_eq!(camera.control(), ControlState::Idle);
    }

    #[test]
    fn reference_follows_pointer() {
        let mut camera = orbiting_at(100.0, 100.0);
        camera.on_pointer_move(110.0, 100.0);
        camera.on_pointer_move(110.0, 100.0);
        assert!(approx(camera.yaw(), 355.0));
    }

    #[test]
    fn movement_requires_orbiting() {
        let keys: HashSet<KeyCode> = [KeyCode::KeyW].into_iter().collect();

        let mut idle = CameraState::default();
        idle.apply_movement(&keys);
        assert_eq!(idle.position(), Vec3::new(0.0, 2.5, 8.0));

        let mut active = orbiting_at(0.0, 0.0);
        let front = active.front();
        active.apply_movement(&keys);
        let moved = active.position() - Vec3::new(0.0, 2.5, 8.0);
        assert!((moved - front * MOVE_SPEED).length() < 1e-5);
    }

    #[test]
    fn opposite_keys_cancel() {
        let keys: HashSet<KeyCode> = [KeyCode::KeyA, KeyCode::KeyD, KeyCode::KeyQ, KeyCode::KeyE]
            .into_iter()
            .collect();
        let mut camera = orbiting_at(0.0, 0.0);
        camera.apply_movement(&keys);
        assert!((camera.position() - Vec3::new(0.0, 2.5, 8.0)).length() < 1e-5);
    }

    #[test]
    fn front_is_unit_and_matches_angles() {
        let camera = CameraState::default().facing(0.0, 0.0);
        assert!((camera.front() - Vec3::NEG_Z).length() < 1e-5);

        let turned = CameraState::default().facing(90.0, 0.0);
        assert!((turned.front() - Vec3::NEG_X).length() < 1e-5);

        let tilted = CameraState::default().facing(123.0, -47.0);
        assert!(approx(tilted.front().length(), 1.0));
    }

    #[test]
    fn basis_is_orthonormal() {
        let camera = CameraState::default().facing(37.0, 21.0);
        let (f, r, u) = (camera.front(), camera.right(), camera.local_up());
        assert!(approx(f.dot(r), 0.0));
        assert!(approx(f.dot(u), 0.0));
        assert!(approx(r.dot(u), 0.0));
        // right-handed: strafing right from -Z looks toward +X
        let straight = CameraState::default().facing(0.0, 0.0);
        assert!((straight.right() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn reset_restores_default() {
        let mut camera = orbiting_at(0.0, 0.0).at([5.0, 5.0, 5.0]);
        camera.on_pointer_move(40.0, 40.0);
        camera.reset();
        assert_eq!(camera.position(), Vec3::new(0.0, 2.5, 8.0));
        assert_eq!(camera.control(), ControlState::Idle);
        assert_eq!(camera.yaw(), 0.0);
    }

    #[test]
    fn wrap_degrees_edges() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert!(approx(wrap_degrees(-5.0), 355.0));
        assert!(approx(wrap_degrees(725.0), 5.0));
        assert!(wrap_degrees(-1e-9) < 360.0);
    }
}
