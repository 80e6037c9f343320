//! The three-pass frame renderer.
//!
//! Each frame is recorded into one command encoder, in this order:
//!
//! 1. **Shadow**: every placement into the [`ShadowMap`] from the light.
//! 2. **Lit**: skybox, light marker, lit placements and the mirror box into
//!    the scene [`RenderTarget`].
//! 3. **Gamma**: a fullscreen triangle from the scene color to the surface.
//!
//! The caller may append more work (the UI overlay) to the same encoder
//! before it is submitted.
//!
//! All GPU objects are created by [`RenderPipeline::new`]; any failure there
//! is a [`SetupError`] and no partial pipeline is returned.

mod bindings;
mod frame;
mod lit_pass;
mod post_process;
mod shadow_pass;
mod uniforms;

pub use frame::{FramePlan, MARKER_SCALE, SKYBOX_SCALE, TargetSize};
pub use uniforms::{FrameUniforms, LightTerms, ModelUniforms};

use crate::camera::CameraState;
use crate::error::SetupError;
use crate::gpu::GpuContext;
use crate::light::LightDescriptor;
use crate::mesh::Mesh;
use crate::render_target::{RenderTarget, ShadowMap, Viewport};
use crate::scene::{MeshKind, Scene, Surface};
use crate::settings::RenderSettings;
use crate::shader::ShaderLibrary;
use crate::texture::{CubeTexture, Texture};
use bindings::{Layouts, UniformBinding};
use lit_pass::LitPass;
use post_process::GammaPass;
use shadow_pass::ShadowPass;
use uniforms::{MaterialUniforms, ModelUniforms as Model};

/// Default edge length of the shadow map.
pub const DEFAULT_SHADOW_SIZE: u32 = 1024;

pub(crate) struct Meshes {
    pub cube: Mesh,
    pub plane: Mesh,
}

impl Meshes {
    pub fn get(&self, kind: MeshKind) -> &Mesh {
        match kind {
            MeshKind::Box => &self.cube,
            MeshKind::Plane => &self.plane,
        }
    }
}

pub(crate) struct MaterialBinding {
    pub bind_group: wgpu::BindGroup,
    #[allow(dead_code)]
    params: wgpu::Buffer,
    #[allow(dead_code)]
    textures: (Texture, Texture),
}

/// GPU-side copy of one placement.
pub(crate) struct ObjectBinding {
    pub mesh: MeshKind,
    pub surface: Surface,
    pub model: UniformBinding,
}

/// Scene content uploaded to the GPU.
pub(crate) struct SceneResources {
    pub meshes: Meshes,
    pub materials: Vec<MaterialBinding>,
    pub objects: Vec<ObjectBinding>,
    #[allow(dead_code)]
    sky: CubeTexture,
    pub sky_group: wgpu::BindGroup,
}

impl SceneResources {
    fn new(gpu: &GpuContext, layouts: &Layouts, scene: &Scene) -> Result<Self, SetupError> {
        let device = &gpu.device;

        let meshes = Meshes {
            cube: Mesh::cube(gpu),
            plane: Mesh::plane(gpu),
        };

        let mut materials = Vec::with_capacity(scene.materials().len());
        for material in scene.materials() {
            let diffuse = Texture::from_source(gpu, &material.diffuse)?;
            let specular = Texture::from_source(gpu, &material.specular)?;
            let params = {
                use wgpu::util::DeviceExt;
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Material", material.name)),
                    contents: bytemuck::bytes_of(&MaterialUniforms {
                        shininess: material.shininess,
                        _pad: [0.0; 3],
                    }),
                    usage: wgpu::BufferUsages::UNIFORM,
                })
            };
            let bind_group = layouts.material_group(
                device,
                &format!("{} Material Bind Group", material.name),
                &diffuse,
                &specular,
                &params,
            );
            log::info!("material '{}' ready", material.name);
            materials.push(MaterialBinding {
                bind_group,
                params,
                textures: (diffuse, specular),
            });
        }

        let objects = scene
            .placements()
            .iter()
            .enumerate()
            .map(|(i, placement)| ObjectBinding {
                mesh: placement.mesh,
                surface: placement.surface,
                model: UniformBinding::new::<Model>(
                    device,
                    &layouts.model,
                    &format!("Object {i} Model"),
                ),
            })
            .collect();

        let sky = CubeTexture::from_sources(gpu, scene.skybox(), "Skybox")?;
        let sky_group = layouts.cube_group(device, &sky);

        Ok(Self {
            meshes,
            materials,
            objects,
            sky,
            sky_group,
        })
    }

    pub fn reflective(&self) -> impl Iterator<Item = &ObjectBinding> {
        self.objects
            .iter()
            .filter(|o| o.surface == Surface::Reflective)
    }
}

/// Why no surface texture was available this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSkip {
    /// The surface was lost or outdated and has been reconfigured.
    Reconfigured,
    /// Acquiring the surface texture timed out.
    TimedOut,
    /// Any other surface error; logged.
    Dropped,
}

/// Owns every GPU object needed to draw the scene.
pub struct RenderPipeline {
    scene: SceneResources,
    placements: Vec<crate::scene::ObjectPlacement>,
    shadow_map: ShadowMap,
    target: RenderTarget,
    size: TargetSize,
    shadow_pass: ShadowPass,
    lit_pass: LitPass,
    gamma_pass: GammaPass,
}

impl RenderPipeline {
    /// Compile programs, load textures and allocate targets at the surface's
    /// current size.
    pub fn new(
        gpu: &GpuContext,
        scene: &Scene,
        library: &ShaderLibrary,
        shadow_size: u32,
    ) -> Result<Self, SetupError> {
        let device = &gpu.device;
        let layouts = Layouts::new(device);

        let size = TargetSize::new(gpu.width(), gpu.height());
        let (width, height) = size.dimensions();
        let target = RenderTarget::new(gpu, width, height)?;
        let shadow_map = ShadowMap::new(gpu, shadow_size.max(1))?;

        let shadow_pass = ShadowPass::new(device, library, &layouts)?;
        let lit_pass = LitPass::new(device, library, &layouts, &shadow_map)?;
        let gamma_pass = GammaPass::new(gpu, library, &target)?;

        let resources = SceneResources::new(gpu, &layouts, scene)?;
        log::info!(
            "render pipeline ready: {} placements, shadow map {}px",
            scene.placements().len(),
            shadow_map.size()
        );

        Ok(Self {
            scene: resources,
            placements: scene.placements().to_vec(),
            shadow_map,
            target,
            size,
            shadow_pass,
            lit_pass,
            gamma_pass,
        })
    }

    /// Record a new viewport size. Zero dimensions are ignored; the scene
    /// target is reallocated before the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.size.request(width, height) {
            log::debug!("viewport resized to {width}x{height}");
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.size.viewport()
    }

    pub fn has_reflective_program(&self) -> bool {
        self.lit_pass.has_env_map()
    }

    fn ensure_target(&mut self, gpu: &GpuContext) {
        if let Some((width, height)) = self.size.take_stale() {
            match RenderTarget::new(gpu, width, height) {
                Ok(target) => {
                    // Old attachments are dropped here
                    self.target = target;
                    self.gamma_pass.rebind(&gpu.device, &self.target);
                }
                Err(err) => {
                    log::error!("keeping previous scene target: {err}");
                    self.size = TargetSize::new(self.target.width(), self.target.height());
                }
            }
        }
    }

    /// Write uniforms and record all three passes into `encoder`, ending
    /// with the gamma pass into `output`.
    fn encode(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        output_size: (u32, u32),
        plan: &FramePlan,
    ) {
        for (object, placement) in self.scene.objects.iter().zip(&self.placements) {
            object
                .model
                .write(&gpu.queue, &Model::new(placement.model_matrix(plan.time)));
        }
        self.shadow_pass.prepare(&gpu.queue, plan.light_space);
        self.lit_pass.prepare(&gpu.queue, plan);
        self.gamma_pass.prepare(&gpu.queue, plan.gamma);

        let casters = self
            .scene
            .objects
            .iter()
            .filter(|o| plan.casts_shadow(o.surface));
        self.shadow_pass
            .encode(encoder, &self.shadow_map, &self.scene.meshes, casters);
        self.lit_pass
            .encode(encoder, &self.target, &self.scene, plan);
        self.gamma_pass
            .encode(encoder, output, Viewport::full(output_size.0, output_size.1));
    }

    /// Get the next surface texture, handling surface errors.
    ///
    /// Lost and outdated surfaces are reconfigured; in every error case the
    /// frame is skipped without retrying.
    pub fn acquire(&self, gpu: &GpuContext) -> Result<wgpu::SurfaceTexture, FrameSkip> {
        match gpu.surface.get_current_texture() {
            Ok(output) => Ok(output),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                gpu.reconfigure();
                Err(FrameSkip::Reconfigured)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface acquire timed out, skipping frame");
                Err(FrameSkip::TimedOut)
            }
            Err(err) => {
                log::error!("dropping frame: {err}");
                Err(FrameSkip::Dropped)
            }
        }
    }

    /// Render one frame into `output` and present it.
    ///
    /// `overlay` runs after the three passes with the same encoder and the
    /// surface view; it returns any extra command buffers that must be
    /// submitted first.
    #[allow(clippy::too_many_arguments)]
    pub fn render<F>(
        &mut self,
        gpu: &GpuContext,
        output: wgpu::SurfaceTexture,
        camera: &CameraState,
        light: &LightDescriptor,
        settings: &RenderSettings,
        seconds: f32,
        overlay: F,
    ) where
        F: FnOnce(&GpuContext, &mut wgpu::CommandEncoder, &wgpu::TextureView) -> Vec<wgpu::CommandBuffer>,
    {
        self.ensure_target(gpu);
        let plan = FramePlan::new(camera, light, settings, self.viewport(), seconds)
            .with_reflective_program(self.has_reflective_program());

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let output_size = (output.texture.width(), output.texture.height());
        self.encode(gpu, &mut encoder, &view, output_size, &plan);
        let extra = overlay(gpu, &mut encoder, &view);

        gpu.queue
            .submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();
    }
}
