//! Window, event loop and the per-frame driver.
//!
//! [`run`] opens the window and drives a winit [`ApplicationHandler`]. The
//! handler starts `Pending`, builds everything on the first `resumed` call and
//! becomes `Running`. A setup failure closes the event loop and is returned
//! from [`run`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::CameraState;
use crate::error::SetupError;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::light::LightDescriptor;
use crate::render::{DEFAULT_SHADOW_SIZE, RenderPipeline};
use crate::scene::Scene;
use crate::settings::RenderSettings;
use crate::shader::ShaderLibrary;
use crate::ui::{Controls, Overlay};

/// Configuration for the app window and renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Directory with image files; `None` uses procedural textures.
    pub assets: Option<PathBuf>,
    /// Directory with `.wgsl` overrides; `None` uses the embedded programs.
    pub shaders: Option<PathBuf>,
    pub shadow_size: u32,
    /// Show the tunables overlay.
    pub overlay: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "shadowbox".to_string(),
            width: 800,
            height: 600,
            assets: None,
            shaders: None,
            shadow_size: DEFAULT_SHADOW_SIZE,
            overlay: true,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn assets(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets = Some(dir.into());
        self
    }

    pub fn shaders(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shaders = Some(dir.into());
        self
    }

    pub fn shadow_size(mut self, size: u32) -> Self {
        self.shadow_size = size;
        self
    }

    pub fn overlay(mut self, enabled: bool) -> Self {
        self.overlay = enabled;
        self
    }

    fn shader_library(&self) -> ShaderLibrary {
        match &self.shaders {
            Some(dir) => ShaderLibrary::from_dir(dir),
            None => ShaderLibrary::embedded(),
        }
    }
}

/// Open the window and run until it is closed.
///
/// Returns an error when the event loop cannot start or renderer setup
/// fails.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::Pending { config };
    event_loop
        .run_app(&mut app)
        .context("event loop exited with an error")?;

    match app {
        App::Failed(err) => Err(anyhow::Error::new(err).context("renderer setup failed")),
        _ => Ok(()),
    }
}

/// Everything alive while the window is open.
struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    pipeline: RenderPipeline,
    overlay: Option<Overlay>,
    camera: CameraState,
    light: LightDescriptor,
    settings: RenderSettings,
    input: Input,
    start_time: Instant,
}

impl Running {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self, SetupError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;

        let scene = Scene::demo(config.assets.as_deref());
        let pipeline = RenderPipeline::new(&gpu, &scene, &config.shader_library(), config.shadow_size)?;
        let overlay = config
            .overlay
            .then(|| Overlay::new(window.clone(), &gpu));

        Ok(Self {
            window,
            gpu,
            pipeline,
            overlay,
            camera: CameraState::default(),
            light: LightDescriptor::default(),
            settings: RenderSettings::default(),
            input: Input::new(),
            start_time: Instant::now(),
        })
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) {
        self.input.handle_event(&event);
        let consumed = self
            .overlay
            .as_mut()
            .is_some_and(|overlay| overlay.on_window_event(&event));

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.gpu.resize(size.width, size.height);
                self.pipeline.resize(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } if !consumed => {
                self.camera
                    .on_pointer_move(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                // Releases always go through so the camera cannot stay stuck orbiting
                if !consumed || !pressed {
                    let pointer = self.input.pointer();
                    self.camera
                        .on_pointer_button(button, pressed, pointer.x, pointer.y);
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                self.window.request_redraw();
            }
            _ => {}
        }
    }

    fn frame(&mut self) {
        self.camera.apply_movement(&self.input);

        let Ok(output) = self.pipeline.acquire(&self.gpu) else {
            return;
        };

        let overlay_frame = self.overlay.as_mut().map(|overlay| {
            overlay.run(&mut Controls {
                camera: &mut self.camera,
                light: &mut self.light,
                settings: &mut self.settings,
                reflective_available: self.pipeline.has_reflective_program(),
            })
        });

        let seconds = self.start_time.elapsed().as_secs_f32();
        let overlay = &mut self.overlay;
        self.pipeline.render(
            &self.gpu,
            output,
            &self.camera,
            &self.light,
            &self.settings,
            seconds,
            |gpu, encoder, view| match (overlay.as_mut(), overlay_frame) {
                (Some(overlay), Some(frame)) => overlay.paint(gpu, encoder, view, frame),
                _ => Vec::new(),
            },
        );
    }
}

enum App {
    Pending { config: AppConfig },
    Running(Box<Running>),
    Failed(SetupError),
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let App::Pending { config } = self {
            log::info!("starting '{}' at {}x{}", config.title, config.width, config.height);
            match Running::new(event_loop, config) {
                Ok(running) => {
                    running.window.request_redraw();
                    *self = App::Running(Box::new(running));
                }
                Err(err) => {
                    *self = App::Failed(err);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let App::Running(running) = self {
            running.window_event(event_loop, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = AppConfig::new()
            .title("demo")
            .size(1280, 720)
            .assets("assets")
            .shadow_size(2048)
            .overlay(false);
        assert_eq!(config.title, "demo");
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.assets, Some(PathBuf::from("assets")));
        assert_eq!(config.shadow_size, 2048);
        assert!(!config.overlay);
    }

    #[test]
    fn default_config_is_self_contained() {
        let config = AppConfig::default();
        assert_eq!(config.assets, None);
        assert_eq!(config.shadow_size, 1024);
        assert!(config.shader_library().dir().is_none());
    }

    #[test]
    fn shader_directory_reaches_library() {
        let config = AppConfig::new().shaders("wgsl");
        assert_eq!(
            config.shader_library().dir(),
            Some(std::path::Path::new("wgsl"))
        );
    }
}
