use foundation::math::{Mat4, Vec2, Vec3, heading_to_cartesian};

/// Perspective camera sitting inside the panorama sphere.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EyeCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

/// Where a world point lands on a viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenPoint {
    /// Pixels from the viewport's left/top corner.
    pub x: f64,
    pub y: f64,
    pub ndc: Vec3,
    /// Inside the frustum side planes (and in front of the camera).
    pub in_view: bool,
}

/// Look-at target for heading `lon_deg` / elevation `lat_deg`.
pub fn look_target(lon_deg: f64, lat_deg: f64, radius: f64) -> Vec3 {
    heading_to_cartesian(radius, lon_deg, lat_deg)
}

impl EyeCamera {
    pub fn looking(lon_deg: f64, lat_deg: f64, fov_y_deg: f64, aspect: f64, look_radius: f64) -> Self {
        Self {
            position: Vec3::ZERO,
            target: look_target(lon_deg, lat_deg, look_radius),
            up: Vec3::Y,
            fov_y_deg,
            aspect,
            near: 0.1,
            far: 1100.0,
        }
    }

    /// Same camera shifted sideways along its right vector.
    pub fn offset_sideways(&self, distance: f64) -> Self {
        let shift = self.right() * distance;
        Self {
            position: self.position + shift,
            target: self.target + shift,
            ..*self
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position)
            .normalized()
            .unwrap_or(Vec3::new(1.0, 0.0, 0.0))
    }

    pub fn right(&self) -> Vec3 {
        self.forward()
            .cross(self.up)
            .normalized()
            .unwrap_or(Vec3::Z)
    }

    pub fn true_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_z0(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection().mul(&self.view())
    }

    /// Ray direction through normalized device coordinates `ndc`.
    pub fn ray_direction(&self, ndc: Vec2) -> Vec3 {
        let tan_half = (0.5 * self.fov_y_deg.to_radians()).tan();
        let dir = self.forward()
            + self.right() * (ndc.x * tan_half * self.aspect)
            + self.true_up() * (ndc.y * tan_half);
        dir.normalized().unwrap_or(self.forward())
    }

    /// Projects `point` onto a `width` x `height` viewport.
    ///
    /// Returns `None` for points behind the camera.
    pub fn project(&self, point: Vec3, width: f64, height: f64) -> Option<ScreenPoint> {
        let [x, y, z, w] = self.view_proj().mul_vec4([point.x, point.y, point.z, 1.0]);
        if w <= 1e-9 {
            return None;
        }
        let ndc = Vec3::new(x / w, y / w, z / w);
        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * width,
            y: (1.0 - ndc.y) * 0.5 * height,
            ndc,
            in_view: ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0,
        })
    }
}
