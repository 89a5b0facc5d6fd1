use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Default)]
pub struct SphereMesh {
    pub vertices: Vec<SphereVertex>,
    pub indices: Vec<u32>,
}

/// Equirectangular sphere in the panorama root's local space.
///
/// Vertices follow the usual UV-sphere layout with `x = -r sin(v) cos(u)`;
/// the root's `(-1, 1, 1)` scale mirrors it back, which turns the faces
/// inward and lines texture column `u` up with heading `u * 360`.
pub fn inverted_sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> SphereMesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    for row in 0..=height_segments {
        let v = row as f32 / height_segments as f32;
        let polar = v * std::f32::consts::PI;
        let (sin_p, cos_p) = polar.sin_cos();

        for col in 0..=width_segments {
            let u = col as f32 / width_segments as f32;
            let azimuth = u * std::f32::consts::TAU;
            let (sin_a, cos_a) = azimuth.sin_cos();
            vertices.push(SphereVertex {
                position: [-radius * sin_p * cos_a, radius * cos_p, radius * sin_p * sin_a],
                uv: [u, v],
            });
        }
    }

    let stride = width_segments + 1;
    let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    for row in 0..height_segments {
        for col in 0..width_segments {
            let a = row * stride + col;
            let b = a + stride;
            let c = b + 1;
            let d = a + 1;
            // Degenerate triangles at the poles are skipped.
            if row != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if row != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    SphereMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_and_index_counts() {
        let mesh = inverted_sphere_mesh(500.0, 8, 4);
        assert_eq!(mesh.vertices.len(), 9 * 5);
        // Two triangles per quad, minus one per quad on each pole row.
        assert_eq!(mesh.indices.len(), (8 * 4 * 2 - 8 * 2) * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn mirrored_columns_match_headings() {
        let mesh = inverted_sphere_mesh(500.0, 4, 2);
        // Equator row, u = 0.25: after the root mirror this is heading 90 (+Z).
        let v = mesh.vertices[(4 + 1) + 1];
        assert_eq!(v.uv, [0.25, 0.5]);
        let world = [-v.position[0], v.position[1], v.position[2]];
        assert!(world[0].abs() < 1e-3);
        assert!((world[2] - 500.0).abs() < 1e-3);
    }

    #[test]
    fn vertices_lie_on_the_sphere() {
        let mesh = inverted_sphere_mesh(2.0, 12, 6);
        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            assert!(((x * x + y * y + z * z).sqrt() - 2.0).abs() < 1e-4);
        }
    }
}
