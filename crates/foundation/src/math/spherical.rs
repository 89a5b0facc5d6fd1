//! Panorama angle conventions.
//!
//! Headings (`lon`) and elevations (`lat`) are in degrees. A heading/elevation
//! pair maps to a point on a sphere through `phi = 90 - lat` (polar angle from
//! +Y) and `theta = lon` (azimuth from +X towards +Z):
//!
//! ```text
//! x = r * sin(phi) * cos(theta)
//! y = r * cos(phi)
//! z = r * sin(phi) * sin(theta)
//! ```

use super::Vec3;

/// Cartesian point for polar angle `phi_rad` and azimuth `theta_rad`.
pub fn spherical_to_cartesian(radius: f64, phi_rad: f64, theta_rad: f64) -> Vec3 {
    Vec3::new(
        radius * phi_rad.sin() * theta_rad.cos(),
        radius * phi_rad.cos(),
        radius * phi_rad.sin() * theta_rad.sin(),
    )
}

/// Point at `radius` in the direction of heading `lon_deg`, elevation `lat_deg`.
pub fn heading_to_cartesian(radius: f64, lon_deg: f64, lat_deg: f64) -> Vec3 {
    let phi = (90.0 - lat_deg).to_radians();
    let theta = lon_deg.to_radians();
    spherical_to_cartesian(radius, phi, theta)
}

/// Inverse of [`heading_to_cartesian`]: `(lon_deg, lat_deg)` of a direction.
///
/// `lon_deg` is wrapped into `[0, 360)`. Returns `None` for a zero vector.
pub fn cartesian_to_heading(v: Vec3) -> Option<(f64, f64)> {
    let n = v.normalized()?;
    let lat = n.y.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = wrap_degrees(n.z.atan2(n.x).to_degrees());
    Some((lon, lat))
}

/// Wraps an angle into `[0, 360)`.
pub fn wrap_degrees(deg: f64) -> f64 {
    let w = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if w >= 360.0 { 0.0 } else { w }
}

/// Shortest signed difference `to - from` in `(-180, 180]`.
pub fn angle_delta_degrees(from: f64, to: f64) -> f64 {
    let d = wrap_degrees(to - from);
    if d > 180.0 { d - 360.0 } else { d }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_zero_looks_down_positive_x() {
        let p = heading_to_cartesian(500.0, 0.0, 0.0);
        assert!((p.x - 500.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        assert!(p.z.abs() < 1e-9);
    }

    #[test]
    fn positive_lat_looks_up() {
        let p = heading_to_cartesian(1.0, 0.0, 85.0);
        assert!(p.y > 0.99);
    }

    #[test]
    fn heading_round_trips() {
        for (lon, lat) in [(10.0, 5.0), (200.0, -30.0), (359.0, 60.0)] {
            let p = heading_to_cartesian(3.0, lon, lat);
            let (lon2, lat2) = cartesian_to_heading(p).expect("direction");
            assert!(angle_delta_degrees(lon, lon2).abs() < 1e-9, "{lon} vs {lon2}");
            assert!((lat - lat2).abs() < 1e-9);
        }
    }

    #[test]
    fn wraps_and_deltas() {
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(720.0), 0.0);
        assert_eq!(angle_delta_degrees(350.0, 10.0), 20.0);
        assert_eq!(angle_delta_degrees(10.0, 350.0), -20.0);
        assert_eq!(angle_delta_degrees(0.0, 180.0), 180.0);
    }
}
