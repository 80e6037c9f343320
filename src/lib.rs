//! # shadowbox
//!
//! **A small shadow-mapped scene with an orbit camera and a live tunables panel.**
//!
//! Every frame goes through three passes: the scene is drawn into a depth-only
//! shadow map from the light, then lit into an offscreen target with Phong or
//! Blinn-Phong shading and filtered shadows, and finally gamma-corrected onto
//! the window surface. An egui panel on top edits the light, the camera and
//! the render toggles while it runs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use shadowbox::{AppConfig, run};
//!
//! fn main() -> anyhow::Result<()> {
//!     run(AppConfig::new().title("shadows").size(1280, 720))
//! }
//! ```
//!
//! The pieces that do not touch the GPU ([`CameraState`], [`LightDescriptor`],
//! [`Scene`], [`FramePlan`]) can be driven directly, which is how most of the
//! tests exercise them.

mod app;
pub mod camera;
mod error;
mod gpu;
mod input;
pub mod light;
pub mod mesh;
pub mod render;
pub mod render_target;
pub mod scene;
mod settings;
pub mod shader;
pub mod texture;
mod ui;

pub use app::{AppConfig, run};
pub use camera::{CameraState, ControlState, KeyState};
pub use error::SetupError;
pub use gpu::GpuContext;
pub use input::Input;
pub use light::{EffectiveLight, LightDescriptor, attenuation};
pub use mesh::{Mesh, Transform, Vertex3d};
pub use render::{DEFAULT_SHADOW_SIZE, FramePlan, FrameSkip, RenderPipeline, TargetSize};
pub use render_target::{RenderTarget, ShadowMap, Viewport};
pub use scene::{MaterialDescriptor, MaterialId, MeshKind, ObjectPlacement, Scene, Surface};
pub use settings::RenderSettings;
pub use shader::{Program, ShaderLibrary};
pub use texture::{CubeFace, CubeTexture, ImageData, Texture, TextureSource};
pub use ui::{Controls, Overlay, OverlayFrame, draw_panel};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
