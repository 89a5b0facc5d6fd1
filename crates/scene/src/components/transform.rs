use foundation::math::{Mat4, Vec3};

/// Local transform relative to the parent entity.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Rotation as orthonormal column basis vectors.
    pub basis: [Vec3; 3],
    pub scale: Vec3,
}

const IDENTITY_BASIS: [Vec3; 3] = [
    Vec3 {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    },
    Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    },
    Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    },
];

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            basis: IDENTITY_BASIS,
            scale: Vec3::ONE,
        }
    }

    pub fn translate(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Places an object at `position` with its local +Z pointing at `target`.
    pub fn facing(position: Vec3, target: Vec3) -> Self {
        let Some(z) = (target - position).normalized() else {
            return Self::translate(position);
        };
        let x = Vec3::Y
            .cross(z)
            .normalized()
            .unwrap_or(Vec3::new(1.0, 0.0, 0.0));
        let y = z.cross(x);
        Self {
            translation: position,
            basis: [x, y, z],
            scale: Vec3::ONE,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_trs(self.translation, self.basis, self.scale)
    }
}
