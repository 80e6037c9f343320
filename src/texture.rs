//! Image decoding, procedural patterns and GPU texture upload.
//!
//! Everything that ends up sampled in a shader starts as an [`ImageData`]:
//! either decoded from disk with [`ImageData::load`] or generated from a
//! [`TextureSource`] pattern. Uploading is a separate step so the CPU side
//! can be tested without a device.

use std::path::{Path, PathBuf};

use crate::error::SetupError;
use crate::gpu::GpuContext;

/// Edge length of generated pattern textures.
const PATTERN_SIZE: u32 = 256;

/// Decoded RGBA8 pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Channel count of the source image before expansion to RGBA.
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Decode an image file into RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| SetupError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let channels = image.color().channel_count();
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::info!(
            "loaded image '{}' ({width}x{height}, {channels} channels)",
            path.display()
        );
        Ok(Self {
            width,
            height,
            channels,
            pixels: rgba.into_raw(),
        })
    }

    /// Build a square RGBA image by evaluating `f` per pixel.
    fn generate(size: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width: size,
            height: size,
            channels: 4,
            pixels,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Face of a cube map, in wgpu layer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Conventional skybox file name for this face.
    pub fn file_stem(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "right",
            CubeFace::NegativeX => "left",
            CubeFace::PositiveY => "top",
            CubeFace::NegativeY => "bottom",
            CubeFace::PositiveZ => "front",
            CubeFace::NegativeZ => "back",
        }
    }
}

/// Where the pixels of a texture come from.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    /// An image file, decoded at setup. A missing or corrupt file is fatal.
    File(PathBuf),
    /// Veined white stone.
    Marble,
    /// Wooden planks.
    Crate,
    /// Metal-framed crate diffuse map.
    CrateFramed,
    /// Specular map matching [`TextureSource::CrateFramed`]: bright frame,
    /// dark wood.
    CrateFramedSpecular,
    /// Vertical sky gradient for one cube map face.
    Sky(CubeFace),
    /// A single color.
    Flat([u8; 4]),
}

impl TextureSource {
    /// Decode or generate the pixels.
    pub fn resolve(&self) -> Result<ImageData, SetupError> {
        let image = match self {
            TextureSource::File(path) => return ImageData::load(path),
            TextureSource::Marble => ImageData::generate(PATTERN_SIZE, marble),
            TextureSource::Crate => ImageData::generate(PATTERN_SIZE, |x, y| planks(x, y, 11)),
            TextureSource::CrateFramed => ImageData::generate(PATTERN_SIZE, |x, y| {
                if on_frame(x, y) {
                    let shade = 120 + (hash(x, y, 7) % 24) as u8;
                    [shade, shade, shade + 8, 255]
                } else {
                    planks(x, y, 23)
                }
            }),
            TextureSource::CrateFramedSpecular => ImageData::generate(PATTERN_SIZE, |x, y| {
                if on_frame(x, y) {
                    let v = 200 + (hash(x, y, 31) % 40) as u8;
                    [v, v, v, 255]
                } else {
                    [0, 0, 0, 255]
                }
            }),
            TextureSource::Sky(face) => sky(*face),
            TextureSource::Flat(color) => ImageData::generate(1, |_, _| *color),
        };
        Ok(image)
    }

    /// Short human-readable name for labels and logs.
    pub fn label(&self) -> String {
        match self {
            TextureSource::File(path) => path.display().to_string(),
            other => format!("{other:?}"),
        }
    }
}

fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

fn marble(x: u32, y: u32) -> [u8; 4] {
    let fx = x as f32 / PATTERN_SIZE as f32;
    let fy = y as f32 / PATTERN_SIZE as f32;
    let turbulence = (hash(x / 8, y / 8, 3) % 100) as f32 / 100.0;
    let vein = ((fx * 6.0 + fy * 3.0 + turbulence * 1.5) * std::f32::consts::PI)
        .sin()
        .abs();
    let base = 190.0 + vein * 55.0 + (hash(x, y, 5) % 8) as f32;
    let v = base.min(255.0) as u8;
    [v, v, v.saturating_sub(6), 255]
}

fn planks(x: u32, y: u32, seed: u32) -> [u8; 4] {
    const PLANK: u32 = 32;
    let plank = y / PLANK;
    let grain = (hash(x / 16, y, seed + plank) % 18) as i32 - 9;
    let seam = if y % PLANK == 0 { -40 } else { 0 };
    let tone = (hash(plank, 0, seed) % 20) as i32;
    let r = (150 + tone + grain + seam).clamp(0, 255) as u8;
    let g = (100 + tone / 2 + grain + seam).clamp(0, 255) as u8;
    let b = (55 + grain + seam).clamp(0, 255) as u8;
    [r, g, b, 255]
}

fn on_frame(x: u32, y: u32) -> bool {
    const BORDER: u32 = 20;
    x < BORDER || y < BORDER || x >= PATTERN_SIZE - BORDER || y >= PATTERN_SIZE - BORDER
}

fn sky(face: CubeFace) -> ImageData {
    const HORIZON: [f32; 3] = [0.85, 0.9, 0.95];
    const ZENITH: [f32; 3] = [0.25, 0.45, 0.8];
    const GROUND: [f32; 3] = [0.35, 0.33, 0.3];
    let size = PATTERN_SIZE / 2;
    let mix = |a: [f32; 3], b: [f32; 3], t: f32| {
        let c = |i: usize| ((a[i] + (b[i] - a[i]) * t) * 255.0) as u8;
        [c(0), c(1), c(2), 255]
    };
    ImageData::generate(size, |_, y| {
        // v runs from +1 at the top row to -1 at the bottom row
        let v = 1.0 - 2.0 * (y as f32 + 0.5) / size as f32;
        match face {
            CubeFace::PositiveY => mix(ZENITH, ZENITH, 0.0),
            CubeFace::NegativeY => mix(GROUND, GROUND, 0.0),
            _ if v >= 0.0 => mix(HORIZON, ZENITH, v),
            _ => mix(HORIZON, GROUND, -v),
        }
    })
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    ///
    /// Pixels are stored as-is (`Rgba8Unorm`); output encoding happens once
    /// in the gamma pass.
    pub fn from_rgba(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Result<Self, SetupError> {
        use wgpu::util::DeviceExt;

        check_texture_size(&gpu.device.limits(), label, width, height)?;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
            width,
            height,
        })
    }

    pub fn from_image(
        gpu: &GpuContext,
        image: &ImageData,
        label: &str,
    ) -> Result<Self, SetupError> {
        Self::from_rgba(gpu, &image.pixels, image.width, image.height, label)
    }

    /// Resolve a source and upload it.
    pub fn from_source(gpu: &GpuContext, source: &TextureSource) -> Result<Self, SetupError> {
        let image = source.resolve()?;
        Self::from_image(gpu, &image, &source.label())
    }
}

/// Reject 2D texture sizes the device cannot allocate.
///
/// wgpu reports oversized textures through its uncaptured error handler,
/// which panics, so sizes are checked before any texture is created.
pub fn check_texture_size(
    limits: &wgpu::Limits,
    label: &str,
    width: u32,
    height: u32,
) -> Result<(), SetupError> {
    let max = limits.max_texture_dimension_2d;
    if width > max || height > max {
        return Err(SetupError::TextureTooLarge {
            label: label.to_string(),
            width,
            height,
            max,
        });
    }
    Ok(())
}

/// Check that six cube faces are square and share one size.
///
/// Returns the common edge length.
pub fn validate_cube_faces(faces: &[ImageData; 6]) -> Result<u32, SetupError> {
    let expected = faces[0].dimensions();
    for (face, image) in faces.iter().enumerate() {
        let got = image.dimensions();
        if got != expected || got.0 != got.1 {
            return Err(SetupError::CubeFaceMismatch {
                face,
                got,
                expected: (expected.0, expected.0),
            });
        }
    }
    Ok(expected.0)
}

/// A six-layer cube map sampled by direction.
#[derive(Debug)]
pub struct CubeTexture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub size: u32,
}

impl CubeTexture {
    /// Upload six faces, in [`CubeFace::ALL`] order.
    pub fn from_faces(
        gpu: &GpuContext,
        faces: &[ImageData; 6],
        label: &str,
    ) -> Result<Self, SetupError> {
        use wgpu::util::DeviceExt;

        let size = validate_cube_faces(faces)?;
        check_texture_size(&gpu.device.limits(), label, size, size)?;
        let data: Vec<u8> = faces.iter().flat_map(|f| f.pixels.iter().copied()).collect();

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{label} View")),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
            size,
        })
    }

    /// Resolve six sources and upload them.
    pub fn from_sources(
        gpu: &GpuContext,
        sources: &[TextureSource; 6],
        label: &str,
    ) -> Result<Self, SetupError> {
        let [a, b, c, d, e, f] = sources;
        let faces = [
            a.resolve()?,
            b.resolve()?,
            c.resolve()?,
            d.resolve()?,
            e.resolve()?,
            f.resolve()?,
        ];
        Self::from_faces(gpu, &faces, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_image_error() {
        let err = ImageData::load("definitely/not/here.png").unwrap_err();
        match err {
            SetupError::Image { path, .. } => {
                assert_eq!(path, PathBuf::from("definitely/not/here.png"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decodes_rgb_png_into_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        let mut img = image::RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([10, 20, 30]));
        img.save(&path).unwrap();

        let data = ImageData::load(&path).unwrap();
        assert_eq!(data.dimensions(), (3, 2));
        assert_eq!(data.channels, 3);
        assert_eq!(data.pixels.len(), 3 * 2 * 4);
        assert_eq!(&data.pixels[(3 + 2) * 4..][..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn corrupt_file_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();
        assert!(matches!(
            TextureSource::File(path).resolve(),
            Err(SetupError::Image { .. })
        ));
    }

    #[test]
    fn procedural_sources_are_opaque_and_sized() {
        let sources = [
            TextureSource::Marble,
            TextureSource::Crate,
            TextureSource::CrateFramed,
            TextureSource::CrateFramedSpecular,
        ];
        for source in sources {
            let image = source.resolve().unwrap();
            assert_eq!(image.dimensions(), (PATTERN_SIZE, PATTERN_SIZE));
            assert_eq!(image.pixels.len(), (PATTERN_SIZE * PATTERN_SIZE * 4) as usize);
            assert!(image.pixels.chunks(4).all(|p| p[3] == 255), "{source:?}");
        }
    }

    #[test]
    fn crate_specular_is_dark_inside_the_frame() {
        let image = TextureSource::CrateFramedSpecular.resolve().unwrap();
        let at = |x: u32, y: u32| image.pixels[((y * image.width + x) * 4) as usize];
        assert_eq!(at(PATTERN_SIZE / 2, PATTERN_SIZE / 2), 0);
        assert!(at(2, PATTERN_SIZE / 2) >= 200);
    }

    #[test]
    fn flat_source_is_one_pixel() {
        let image = TextureSource::Flat([1, 2, 3, 4]).resolve().unwrap();
        assert_eq!(image.dimensions(), (1, 1));
        assert_eq!(image.pixels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn sky_faces_validate_as_a_cube() {
        let faces = CubeFace::ALL.map(|face| TextureSource::Sky(face).resolve().unwrap());
        assert_eq!(validate_cube_faces(&faces).unwrap(), PATTERN_SIZE / 2);
    }

    #[test]
    fn oversized_texture_is_rejected_before_creation() {
        let limits = wgpu::Limits::default();
        let max = limits.max_texture_dimension_2d;
        match check_texture_size(&limits, "Shadow Map", max * 2, max * 2) {
            Err(SetupError::TextureTooLarge {
                label,
                width,
                max: reported,
                ..
            }) => {
                assert_eq!(label, "Shadow Map");
                assert_eq!(width, max * 2);
                assert_eq!(reported, max);
            }
            other => panic!("expected size error, got {other:?}"),
        }
    }

    #[test]
    fn texture_at_the_limit_is_accepted() {
        let limits = wgpu::Limits::downlevel_webgl2_defaults();
        let max = limits.max_texture_dimension_2d;
        assert!(check_texture_size(&limits, "scene", max, 1).is_ok());
        assert!(check_texture_size(&limits, "scene", 1, max + 1).is_err());
    }

    #[test]
    fn cube_face_size_mismatch_names_the_face() {
        let mut faces = CubeFace::ALL.map(|face| TextureSource::Sky(face).resolve().unwrap());
        faces[4] = TextureSource::Marble.resolve().unwrap();
        match validate_cube_faces(&faces) {
            Err(SetupError::CubeFaceMismatch { face, got, .. }) => {
                assert_eq!(face, 4);
                assert_eq!(got, (PATTERN_SIZE, PATTERN_SIZE));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }
}
