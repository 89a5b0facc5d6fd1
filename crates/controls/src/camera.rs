use formats::ControlsConfig;

/// Elevation limit in either direction; keeps the camera off the poles.
pub const MAX_LAT: f64 = 85.0;
pub const MIN_FOV: f64 = 10.0;
pub const MAX_FOV: f64 = 120.0;

/// Orientation and zoom of the panorama camera, in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    /// Heading. Not wrapped; consumers compare headings modulo 360.
    pub lon: f64,
    /// Elevation, clamped to `[-MAX_LAT, MAX_LAT]`.
    pub lat: f64,
    /// Vertical field of view, clamped to `[MIN_FOV, MAX_FOV]`.
    pub fov: f64,
    pub is_dragging: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::initial(&ControlsConfig::default(), 0.0)
    }
}

impl CameraState {
    pub fn initial(config: &ControlsConfig, lon: f64) -> Self {
        Self {
            lon,
            lat: 0.0,
            fov: clamp_fov(config.default_fov),
            is_dragging: false,
        }
    }
}

pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-MAX_LAT, MAX_LAT)
}

pub fn clamp_fov(fov: f64) -> f64 {
    fov.clamp(MIN_FOV, MAX_FOV)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_fov_is_clamped_into_range() {
        let wide = ControlsConfig {
            default_fov: 170.0,
            ..ControlsConfig::default()
        };
        assert_eq!(CameraState::initial(&wide, 0.0).fov, MAX_FOV);
        let narrow = ControlsConfig {
            default_fov: 1.0,
            ..ControlsConfig::default()
        };
        assert_eq!(CameraState::initial(&narrow, 0.0).fov, MIN_FOV);
    }

    #[test]
    fn clamps_hold_the_fixed_bounds() {
        assert_eq!(clamp_lat(90.0), 85.0);
        assert_eq!(clamp_lat(-400.0), -85.0);
        assert_eq!(clamp_fov(1.0), 10.0);
        assert_eq!(clamp_fov(130.0), 120.0);
        assert_eq!(clamp_fov(75.0), 75.0);
    }
}
