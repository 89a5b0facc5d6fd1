use formats::ArrowConfig;
use foundation::math::{Vec3, angle_delta_degrees, spherical_to_cartesian};

/// Floor-level position of the arrow for compass heading `angle_deg`.
pub fn arrow_position(angle_deg: f64, config: &ArrowConfig) -> Vec3 {
    spherical_to_cartesian(
        config.floor_radius,
        config.polar_angle_deg.to_radians(),
        angle_deg.to_radians(),
    )
}

/// Whether the camera heading is within the configured tolerance of `angle_deg`.
pub fn heading_matches(camera_lon: f64, angle_deg: f64, config: &ArrowConfig) -> bool {
    angle_delta_degrees(camera_lon, angle_deg).abs() <= config.heading_tolerance_deg
}

/// Arrow visibility for the current heading. With `heading_gated` off every
/// arrow stays visible.
pub fn arrow_visible(camera_lon: f64, angle_deg: f64, config: &ArrowConfig) -> bool {
    !config.heading_gated || heading_matches(camera_lon, angle_deg, config)
}
