use crate::error::SetupError;
use crate::mesh::Vertex3d;
use crate::render::bindings::{Layouts, UniformBinding};
use crate::render::uniforms::ShadowUniforms;
use crate::render::{Meshes, ObjectBinding};
use crate::render_target::{SHADOW_FORMAT, ShadowMap};
use crate::shader::{Program, ShaderLibrary, checked};

/// Depth-only pass rendering every placement from the light.
pub(crate) struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
    light: UniformBinding,
}

impl ShadowPass {
    pub fn new(
        device: &wgpu::Device,
        library: &ShaderLibrary,
        layouts: &Layouts,
    ) -> Result<Self, SetupError> {
        let shader = library.module(device, Program::Shadow)?;

        // The light block has the same shape as a model block: one
        // vertex-stage uniform
        let light = UniformBinding::new::<ShadowUniforms>(device, &layouts.model, "Shadow Light");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&layouts.model, &layouts.model],
            push_constant_ranges: &[],
        });

        let pipeline = checked(device, "shadow pipeline", || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Shadow Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: None,
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: SHADOW_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState {
                        constant: 2,
                        slope_scale: 2.0,
                        clamp: 0.0,
                    },
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        Ok(Self { pipeline, light })
    }

    pub fn prepare(&self, queue: &wgpu::Queue, light_space: glam::Mat4) {
        self.light.write(
            queue,
            &ShadowUniforms {
                light_view_proj: light_space.to_cols_array_2d(),
            },
        );
    }

    pub fn encode<'a>(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        shadow_map: &ShadowMap,
        meshes: &Meshes,
        objects: impl IntoIterator<Item = &'a ObjectBinding>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        shadow_map.viewport().apply(&mut pass);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.light.bind_group, &[]);

        for object in objects {
            pass.set_bind_group(1, &object.model.bind_group, &[]);
            meshes.get(object.mesh).draw(&mut pass);
        }
    }
}
