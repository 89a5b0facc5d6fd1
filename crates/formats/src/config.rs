use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Tunables for the viewer. Every field has a default, so a partial JSON
/// document (or `{}`) is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub controls: ControlsConfig,
    pub sphere: SphereConfig,
    pub markers: MarkerConfig,
    pub arrows: ArrowConfig,
    pub playback: PlaybackConfig,
    pub dialog: DialogConfig,
    pub stereo: StereoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Degrees of rotation per pixel dragged.
    pub drag_sensitivity: f64,
    /// Field of view change per wheel delta unit.
    pub wheel_fov_step: f64,
    /// Field of view change per explicit zoom in/out command.
    pub zoom_step: f64,
    /// Field of view on arrival; clamped into the fixed zoom range.
    pub default_fov: f64,
    pub click_suppress_ms: f64,
    /// Pointer travel below which a press/release still counts as a click.
    pub drag_threshold_px: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.2,
            wheel_fov_step: 0.05,
            zoom_step: 5.0,
            default_fov: 75.0,
            click_suppress_ms: 100.0,
            drag_threshold_px: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    pub radius: f64,
    pub width_segments: u32,
    pub height_segments: u32,
    /// Distance of the camera look-at target.
    pub look_radius: f64,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            radius: 500.0,
            width_segments: 60,
            height_segments: 40,
            look_radius: 500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub body_radius: f64,
    pub icon_size: f64,
    /// Lower bound for stairs/elevator/door marker scale.
    pub min_navigation_scale: f64,
    pub hidden_location_multiplier: f64,
    /// Extra enlargement on touch devices (navigation and information only).
    pub touch_multiplier: f64,
    pub icon_root: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            body_radius: 15.0,
            icon_size: 24.0,
            min_navigation_scale: 1.0,
            hidden_location_multiplier: 0.6,
            touch_multiplier: 1.4,
            icon_root: "/icons".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowConfig {
    pub floor_radius: f64,
    /// Polar angle (degrees from straight up) of the arrow ring.
    pub polar_angle_deg: f64,
    pub size: f64,
    pub heading_tolerance_deg: f64,
    /// Hide arrows whose heading is outside the tolerance of the camera.
    pub heading_gated: bool,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            floor_radius: 200.0,
            polar_angle_deg: 120.0,
            size: 18.0,
            heading_tolerance_deg: 20.0,
            heading_gated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub slow_ms: f64,
    pub normal_ms: f64,
    pub fast_ms: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            slow_ms: 3000.0,
            normal_ms: 2000.0,
            fast_ms: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    pub width: f64,
    pub height: f64,
    /// Gap between the marker and the dialog edge.
    pub offset: f64,
    /// Minimum distance kept from the viewport border.
    pub margin: f64,
    /// Interval for re-projecting a pending confirmation.
    pub track_interval_ms: f64,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            width: 280.0,
            height: 160.0,
            offset: 24.0,
            margin: 16.0,
            track_interval_ms: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoConfig {
    pub eye_separation: f64,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            eye_separation: 0.064,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
            ConfigError::Invalid { field, reason } => {
                write!(f, "invalid config value for {field}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ViewerConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(payload).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the viewer cannot work with. Zoom and elevation limits
    /// are fixed by the controller and are not configurable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.controls;
        let p = &self.playback;
        let checks: [(&'static str, f64, bool); 9] = [
            ("controls.drag_sensitivity", c.drag_sensitivity, true),
            ("controls.wheel_fov_step", c.wheel_fov_step, false),
            ("controls.zoom_step", c.zoom_step, false),
            ("controls.default_fov", c.default_fov, true),
            ("controls.click_suppress_ms", c.click_suppress_ms, false),
            ("sphere.radius", self.sphere.radius, true),
            ("playback.slow_ms", p.slow_ms, false),
            ("playback.normal_ms", p.normal_ms, false),
            ("playback.fast_ms", p.fast_ms, false),
        ];
        for (field, value, positive) in checks {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be a finite number",
                });
            }
            if positive && value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be positive",
                });
            }
            if value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be negative",
                });
            }
        }
        if self.sphere.width_segments < 3 || self.sphere.height_segments < 2 {
            return Err(ConfigError::Invalid {
                field: "sphere.segments",
                reason: "too few segments for a sphere",
            });
        }
        Ok(())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload)
    }
}
