//! The main pass: skybox, light marker, lit placements and the mirror box,
//! rendered into the scene target.

use crate::error::SetupError;
use crate::mesh::Vertex3d;
use crate::render::SceneResources;
use crate::render::bindings::{Layouts, UniformBinding};
use crate::render::frame::FramePlan;
use crate::render::uniforms::{FrameUniforms, ModelUniforms};
use crate::render_target::{RenderTarget, SCENE_COLOR_FORMAT, SCENE_DEPTH_FORMAT, ShadowMap};
use crate::scene::Surface;
use crate::shader::{Program, ShaderLibrary, checked, optional};

/// The same program built twice: with depth testing and without.
struct DepthPair {
    tested: wgpu::RenderPipeline,
    untested: wgpu::RenderPipeline,
}

impl DepthPair {
    fn select(&self, depth_test: bool) -> &wgpu::RenderPipeline {
        if depth_test { &self.tested } else { &self.untested }
    }
}

/// Fixed parts of a scene-pass pipeline.
struct PipelineSpec<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    cull_mode: Option<wgpu::Face>,
}

impl PipelineSpec<'_> {
    fn build(
        &self,
        device: &wgpu::Device,
        depth_write_enabled: bool,
        depth_compare: wgpu::CompareFunction,
    ) -> Result<wgpu::RenderPipeline, SetupError> {
        checked(device, self.label, || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(self.label),
                layout: Some(self.layout),
                vertex: wgpu::VertexState {
                    module: self.shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: self.shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: SCENE_COLOR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: self.cull_mode,
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: SCENE_DEPTH_FORMAT,
                    depth_write_enabled,
                    depth_compare,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })
    }

    fn build_pair(&self, device: &wgpu::Device) -> Result<DepthPair, SetupError> {
        Ok(DepthPair {
            tested: self.build(device, true, wgpu::CompareFunction::Less)?,
            untested: self.build(device, true, wgpu::CompareFunction::Always)?,
        })
    }
}

pub(crate) struct LitPass {
    frame: UniformBinding,
    sky_model: UniformBinding,
    marker_model: UniformBinding,
    shadow_group: wgpu::BindGroup,
    skybox: wgpu::RenderPipeline,
    marker: DepthPair,
    lit: DepthPair,
    env_map: Option<DepthPair>,
}

impl LitPass {
    pub fn new(
        device: &wgpu::Device,
        library: &ShaderLibrary,
        layouts: &Layouts,
        shadow_map: &ShadowMap,
    ) -> Result<Self, SetupError> {
        let layout = |label: &str, groups: &[&wgpu::BindGroupLayout]| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: groups,
                push_constant_ranges: &[],
            })
        };

        let lit_layout = layout(
            "Lit Pipeline Layout",
            &[&layouts.frame, &layouts.material, &layouts.shadow, &layouts.model],
        );
        let cube_layout = layout(
            "Cube Map Pipeline Layout",
            &[&layouts.frame, &layouts.cube, &layouts.model],
        );
        let marker_layout = layout("Marker Pipeline Layout", &[&layouts.frame, &layouts.model]);

        let lit_shader = library.module(device, Program::Lit)?;
        let lit = PipelineSpec {
            label: "lit pipeline",
            layout: &lit_layout,
            shader: &lit_shader,
            cull_mode: Some(wgpu::Face::Back),
        }
        .build_pair(device)?;

        let skybox_shader = library.module(device, Program::Skybox)?;
        let skybox = PipelineSpec {
            label: "skybox pipeline",
            layout: &cube_layout,
            shader: &skybox_shader,
            cull_mode: None,
        }
        .build(device, false, wgpu::CompareFunction::Always)?;

        let marker_shader = library.module(device, Program::Marker)?;
        let marker = PipelineSpec {
            label: "marker pipeline",
            layout: &marker_layout,
            shader: &marker_shader,
            cull_mode: Some(wgpu::Face::Back),
        }
        .build_pair(device)?;

        let env_map = optional(
            Program::EnvMap,
            library.module(device, Program::EnvMap).and_then(|shader| {
                PipelineSpec {
                    label: "env map pipeline",
                    layout: &cube_layout,
                    shader: &shader,
                    cull_mode: Some(wgpu::Face::Back),
                }
                .build_pair(device)
            }),
        )?;

        Ok(Self {
            frame: UniformBinding::new::<FrameUniforms>(device, &layouts.frame, "Frame Uniforms"),
            sky_model: UniformBinding::new::<ModelUniforms>(device, &layouts.model, "Skybox Model"),
            marker_model: UniformBinding::new::<ModelUniforms>(
                device,
                &layouts.model,
                "Marker Model",
            ),
            shadow_group: layouts.shadow_group(device, shadow_map),
            skybox,
            marker,
            lit,
            env_map,
        })
    }

    /// Whether the optional reflective program is available.
    pub fn has_env_map(&self) -> bool {
        self.env_map.is_some()
    }

    pub fn prepare(&self, queue: &wgpu::Queue, plan: &FramePlan) {
        self.frame.write(queue, plan.uniforms());
        self.sky_model
            .write(queue, &ModelUniforms::new(plan.skybox_model()));
        if plan.draw_marker {
            self.marker_model
                .write(queue, &ModelUniforms::new(plan.marker_model()));
        }
    }

    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &RenderTarget,
        scene: &SceneResources,
        plan: &FramePlan,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Lit Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(plan.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        plan.viewport.apply(&mut pass);

        // Skybox first; it never writes depth so everything after covers it
        pass.set_pipeline(&self.skybox);
        pass.set_bind_group(0, &self.frame.bind_group, &[]);
        pass.set_bind_group(1, &scene.sky_group, &[]);
        pass.set_bind_group(2, &self.sky_model.bind_group, &[]);
        scene.meshes.cube.draw(&mut pass);

        if plan.draw_marker {
            pass.set_pipeline(self.marker.select(plan.depth_test));
            pass.set_bind_group(0, &self.frame.bind_group, &[]);
            pass.set_bind_group(1, &self.marker_model.bind_group, &[]);
            scene.meshes.cube.draw(&mut pass);
        }

        pass.set_pipeline(self.lit.select(plan.depth_test));
        pass.set_bind_group(0, &self.frame.bind_group, &[]);
        pass.set_bind_group(2, &self.shadow_group, &[]);
        for object in &scene.objects {
            let Surface::Lit(material) = object.surface else {
                continue;
            };
            let Some(material) = scene.materials.get(material.index()) else {
                continue;
            };
            pass.set_bind_group(1, &material.bind_group, &[]);
            pass.set_bind_group(3, &object.model.bind_group, &[]);
            scene.meshes.get(object.mesh).draw(&mut pass);
        }

        if let (true, Some(env_map)) = (plan.draw_reflective, &self.env_map) {
            pass.set_pipeline(env_map.select(plan.depth_test));
            pass.set_bind_group(0, &self.frame.bind_group, &[]);
            pass.set_bind_group(1, &scene.sky_group, &[]);
            for object in scene.reflective() {
                pass.set_bind_group(2, &object.model.bind_group, &[]);
                scene.meshes.get(object.mesh).draw(&mut pass);
            }
        }
    }
}
