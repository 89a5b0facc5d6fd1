use bytemuck::{Pod, Zeroable};
use foundation::math::Mat4;

use crate::plan::EyePass;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MeshKind {
    /// Unit sphere, scaled by the model matrix.
    Sphere,
    /// Unit quad in the XY plane, facing +Z.
    Quad,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// The textured panorama sphere (current photo).
    Panorama { model: Mat4 },
    Mesh {
        model: Mat4,
        mesh: MeshKind,
        color: [f32; 4],
        /// Icon asset path; `None` draws flat colour.
        icon: Option<String>,
    },
}

/// Draw list for one frame, replayed once per [`EyePass`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderFrame {
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn mesh_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Mesh { .. }))
            .count()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct EyeUniforms {
    pub view_proj: [[f32; 4]; 4],
}

impl EyeUniforms {
    pub fn for_pass(pass: &EyePass) -> Self {
        Self {
            view_proj: pass.camera.view_proj().to_f32(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct InstanceUniforms {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// 1.0 when an icon texture is bound.
    pub textured: f32,
    pub _pad: [f32; 3],
}

impl InstanceUniforms {
    pub fn new(model: &Mat4, color: [f32; 4], textured: bool) -> Self {
        Self {
            model: model.to_f32(),
            color,
            textured: if textured { 1.0 } else { 0.0 },
            _pad: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{RenderPlan, ViewParams};
    use crate::viewport::Viewport;

    #[test]
    fn counts_meshes_only() {
        let frame = RenderFrame {
            commands: vec![
                RenderCommand::Panorama {
                    model: Mat4::IDENTITY,
                },
                RenderCommand::Mesh {
                    model: Mat4::IDENTITY,
                    mesh: MeshKind::Sphere,
                    color: [1.0; 4],
                    icon: Some("/icons/elevator.svg".to_string()),
                },
            ],
        };
        assert_eq!(frame.mesh_count(), 1);
    }

    #[test]
    fn uniforms_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<EyeUniforms>(), 64);
        assert_eq!(std::mem::size_of::<InstanceUniforms>(), 96);

        let plan = RenderPlan::build(
            Viewport::default(),
            ViewParams {
                lon: 0.0,
                lat: 0.0,
                fov: 75.0,
                look_radius: 500.0,
                stereo: None,
            },
        );
        let u = EyeUniforms::for_pass(&plan.passes[0]);
        assert!(u.view_proj.iter().flatten().all(|v| v.is_finite()));
    }
}
