use std::path::PathBuf;

/// Errors that abort renderer setup.
///
/// Everything that can fail while the window, device, programs and textures
/// are being created ends up here. Once the main loop is running no
/// operation returns a `SetupError`.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("failed to read shader '{}': {source}", path.display())]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile program '{label}': {message}")]
    ShaderCompile { label: String, message: String },

    #[error("failed to load image '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture '{label}' is {width}x{height}, the device allows at most {max}")]
    TextureTooLarge {
        label: String,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("cube map face {face} is {got:?}, expected {expected:?}")]
    CubeFaceMismatch {
        face: usize,
        got: (u32, u32),
        expected: (u32, u32),
    },
}
