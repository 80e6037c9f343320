//! GPU uniform blocks. Layouts mirror the WGSL structs in `src/shaders`.

use glam::{Mat4, Vec2, Vec3};

/// Per-frame camera and light parameters, bound at group 0 by every
/// scene program. Programs that need only a prefix declare a shorter struct.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub blinn: u32,
    pub light_position: [f32; 3],
    pub directional: u32,
    pub light_direction: [f32; 3],
    pub _pad0: f32,
    pub attenuation: [f32; 3],
    pub _pad1: f32,
    pub ambient: [f32; 3],
    pub _pad2: f32,
    pub diffuse: [f32; 3],
    pub _pad3: f32,
    pub specular: [f32; 3],
    pub _pad4: f32,
    /// Cosines of the inner and outer cone angles.
    pub cutoff: [f32; 2],
    pub _pad5: [f32; 2],
}

/// Light colors and cone as they go to the shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightTerms {
    pub position: Vec3,
    pub direction: Vec3,
    pub directional: bool,
    pub attenuation: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub cutoff_cosines: Vec2,
}

impl FrameUniforms {
    pub fn new(
        view_proj: Mat4,
        light_view_proj: Mat4,
        view_pos: Vec3,
        blinn: bool,
        light: &LightTerms,
    ) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_view_proj: light_view_proj.to_cols_array_2d(),
            view_pos: view_pos.to_array(),
            blinn: blinn as u32,
            light_position: light.position.to_array(),
            directional: light.directional as u32,
            light_direction: light.direction.to_array(),
            _pad0: 0.0,
            attenuation: light.attenuation.to_array(),
            _pad1: 0.0,
            ambient: light.ambient.to_array(),
            _pad2: 0.0,
            diffuse: light.diffuse.to_array(),
            _pad3: 0.0,
            specular: light.specular.to_array(),
            _pad4: 0.0,
            cutoff: light.cutoff_cosines.to_array(),
            _pad5: [0.0; 2],
        }
    }
}

/// Model matrix plus the inverse-transpose used for normals.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl ModelUniforms {
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
        }
    }
}

/// Light view-projection for the shadow pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniforms {
    pub light_view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    pub shininess: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GammaUniforms {
    pub gamma: f32,
    pub _pad: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn frame_layout_matches_wgsl() {
        assert_eq!(offset_of!(FrameUniforms, view_pos), 128);
        assert_eq!(offset_of!(FrameUniforms, blinn), 140);
        assert_eq!(offset_of!(FrameUniforms, light_position), 144);
        assert_eq!(offset_of!(FrameUniforms, light_direction), 160);
        assert_eq!(offset_of!(FrameUniforms, attenuation), 176);
        assert_eq!(offset_of!(FrameUniforms, specular), 224);
        assert_eq!(offset_of!(FrameUniforms, cutoff), 240);
        assert_eq!(size_of::<FrameUniforms>(), 256);
    }

    #[test]
    fn small_blocks_are_16_byte_multiples() {
        assert_eq!(size_of::<ModelUniforms>(), 128);
        assert_eq!(size_of::<ShadowUniforms>(), 64);
        assert_eq!(size_of::<MaterialUniforms>(), 16);
        assert_eq!(size_of::<GammaUniforms>(), 16);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(10.0, 1.0, 10.0));
        let uniforms = ModelUniforms::new(model);
        let normal = Mat4::from_cols_array_2d(&uniforms.normal);
        let n = normal.transform_vector3(Vec3::Y).normalize();
        assert!((n - Vec3::Y).length() < 1e-6);
        let slanted = normal.transform_vector3(Vec3::new(1.0, 1.0, 0.0));
        assert!(slanted.y > slanted.x);
    }
}
