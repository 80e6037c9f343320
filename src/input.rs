use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::KeyState;

/// Tracks keyboard state and the last known pointer position.
///
/// Pointer *events* are forwarded to the camera as they arrive; this struct
/// only answers "is this key held right now" and "where is the cursor",
/// which winit does not attach to button events.
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    pointer: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            self.keys_down.insert(key);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::Focused(false) => {
                // Releases are not delivered to unfocused windows
                self.keys_down.clear();
            }
            _ => {}
        }
    }

    /// Current pointer position in physical window coordinates.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }
}

impl KeyState for Input {
    fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }
}
