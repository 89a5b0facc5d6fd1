use super::Vec3;

/// Column-major 4x4 matrix (`m[col][row]`), the layout WGSL expects.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4(pub [[f64; 4]; 4]);

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    /// `T * R * S` where `R` is given by its column basis vectors.
    pub fn from_trs(translation: Vec3, basis: [Vec3; 3], scale: Vec3) -> Self {
        let [bx, by, bz] = basis;
        let cx = bx * scale.x;
        let cy = by * scale.y;
        let cz = bz * scale.z;
        Mat4([
            [cx.x, cx.y, cx.z, 0.0],
            [cy.x, cy.y, cy.z, 0.0],
            [cz.x, cz.y, cz.z, 0.0],
            [translation.x, translation.y, translation.z, 1.0],
        ])
    }

    /// Right-handed perspective with a [0, 1] depth range.
    pub fn perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (0.5 * fov_y_rad).tan();
        let aspect = aspect.max(1e-6);
        Mat4([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, far / (near - far), -1.0],
            [0.0, 0.0, (near * far) / (near - far), 0.0],
        ])
    }

    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let f = (target - eye).normalized().unwrap_or(Vec3::new(0.0, 0.0, -1.0));
        let s = f.cross(up).normalized().unwrap_or(Vec3::new(1.0, 0.0, 0.0));
        let u = s.cross(f);

        Mat4([
            [s.x, u.x, -f.x, 0.0],
            [s.y, u.y, -f.y, 0.0],
            [s.z, u.z, -f.z, 0.0],
            [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
        ])
    }

    pub fn mul(&self, b: &Mat4) -> Mat4 {
        let a = &self.0;
        let b = &b.0;
        let mut c = [[0.0f64; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                c[col][row] = a[0][row] * b[col][0]
                    + a[1][row] * b[col][1]
                    + a[2][row] * b[col][2]
                    + a[3][row] * b[col][3];
            }
        }
        Mat4(c)
    }

    pub fn mul_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let m = &self.0;
        let mut out = [0.0f64; 4];
        for (row, o) in out.iter_mut().enumerate() {
            *o = m[0][row] * v[0] + m[1][row] * v[1] + m[2][row] * v[2] + m[3][row] * v[3];
        }
        out
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let [x, y, z, _] = self.mul_vec4([p.x, p.y, p.z, 1.0]);
        Vec3::new(x, y, z)
    }

    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        let [x, y, z, _] = self.mul_vec4([v.x, v.y, v.z, 0.0]);
        Vec3::new(x, y, z)
    }

    /// Length of the longest basis column (largest axis scale).
    pub fn max_scale(&self) -> f64 {
        (0..3)
            .map(|c| Vec3::new(self.0[c][0], self.0[c][1], self.0[c][2]).length())
            .fold(0.0, f64::max)
    }

    pub fn to_f32(&self) -> [[f32; 4]; 4] {
        let mut out = [[0.0f32; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, v) in out_col.iter_mut().enumerate() {
                *v = self.0[col][row] as f32;
            }
        }
        out
    }
}
