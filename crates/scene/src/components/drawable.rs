use gpu::MeshKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    /// The textured photo sphere.
    Panorama,
    Mesh {
        mesh: MeshKind,
        color: [f32; 4],
        icon: Option<String>,
    },
}

impl Drawable {
    pub fn mesh(mesh: MeshKind, color: [f32; 4]) -> Self {
        Drawable::Mesh {
            mesh,
            color,
            icon: None,
        }
    }

    pub fn icon(icon: impl Into<String>) -> Self {
        Drawable::Mesh {
            mesh: MeshKind::Quad,
            color: [1.0, 1.0, 1.0, 1.0],
            icon: Some(icon.into()),
        }
    }
}
