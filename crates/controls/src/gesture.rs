use formats::ControlsConfig;
use foundation::time::Millis;
use tracing::debug;

use crate::camera::{CameraState, clamp_fov, clamp_lat};

#[derive(Debug, Copy, Clone, PartialEq)]
struct DragAnchor {
    x: f64,
    y: f64,
    lon: f64,
    lat: f64,
    /// Largest pointer distance from the anchor seen during this drag.
    travel: f64,
}

/// What the host should do with a `click` event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClickDisposition {
    Accept,
    /// The click is the tail of a drag and must not reach the markers.
    Suppress,
}

/// Turns pointer, touch and wheel input into [`CameraState`] changes.
///
/// Knows nothing about the scene. The host attaches document-level move/up
/// listeners while [`GestureController::has_document_capture`] is true and
/// removes them as soon as it turns false.
#[derive(Debug, Clone)]
pub struct GestureController {
    config: ControlsConfig,
    camera: CameraState,
    drag: Option<DragAnchor>,
    suppress_clicks_until: Option<Millis>,
    document_capture: bool,
}

impl GestureController {
    pub fn new(config: ControlsConfig) -> Self {
        let camera = CameraState::initial(&config, 0.0);
        Self {
            config,
            camera,
            drag: None,
            suppress_clicks_until: None,
            document_capture: false,
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    pub fn has_document_capture(&self) -> bool {
        self.document_capture
    }

    /// Pointer or touch pressed over the viewer surface.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.drag = Some(DragAnchor {
            x,
            y,
            lon: self.camera.lon,
            lat: self.camera.lat,
            travel: 0.0,
        });
        self.camera.is_dragging = true;
        self.document_capture = true;
    }

    /// Returns `true` if the camera moved.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let Some(anchor) = self.drag.as_mut() else {
            return false;
        };
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let dx = anchor.x - x;
        let dy = y - anchor.y;
        anchor.travel = anchor.travel.max(dx.hypot(dy));

        let s = self.config.drag_sensitivity;
        let lon = dx * s + anchor.lon;
        let lat = clamp_lat(dy * s + anchor.lat);
        let changed = lon != self.camera.lon || lat != self.camera.lat;
        self.camera.lon = lon;
        self.camera.lat = lat;
        changed
    }

    /// Pointer or touch released. Keeps the last orientation.
    pub fn pointer_up(&mut self, now: Millis) {
        self.document_capture = false;
        self.camera.is_dragging = false;
        let Some(anchor) = self.drag.take() else {
            return;
        };
        if anchor.travel > self.config.drag_threshold_px {
            self.suppress_clicks_until = Some(now.after(self.config.click_suppress_ms));
        }
    }

    /// Classifies the `click` that browsers fire after a release.
    pub fn click(&mut self, now: Millis) -> ClickDisposition {
        if self.camera.is_dragging {
            return ClickDisposition::Suppress;
        }
        match self.suppress_clicks_until {
            Some(until) if now.0 <= until.0 => ClickDisposition::Suppress,
            _ => {
                self.suppress_clicks_until = None;
                ClickDisposition::Accept
            }
        }
    }

    /// True while a drag is active or its release is inside the suppression window.
    pub fn was_dragging(&self, now: Millis) -> bool {
        self.camera.is_dragging || self.suppress_clicks_until.is_some_and(|until| now.0 <= until.0)
    }

    /// Wheel input; positive `delta_y` zooms out.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        if !delta_y.is_finite() {
            return false;
        }
        self.set_fov(self.camera.fov + delta_y * self.config.wheel_fov_step)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_fov(self.camera.fov - self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_fov(self.camera.fov + self.config.zoom_step)
    }

    /// Returns `true` if the clamped fov differs from the current one.
    pub fn set_fov(&mut self, fov: f64) -> bool {
        if !fov.is_finite() {
            return false;
        }
        let fov = clamp_fov(fov);
        let changed = fov != self.camera.fov;
        self.camera.fov = fov;
        changed
    }

    pub fn look_at(&mut self, lon: f64, lat: f64) {
        if lon.is_finite() {
            self.camera.lon = lon;
        }
        if lat.is_finite() {
            self.camera.lat = clamp_lat(lat);
        }
    }

    /// Resets the camera for a newly entered node.
    pub fn arrive_at(&mut self, starting_angle: Option<f64>) {
        self.release_all();
        self.camera = CameraState::initial(&self.config, starting_angle.unwrap_or(0.0));
    }

    /// Drops any drag in progress. Returns `true` if document listeners were
    /// attached and must now be removed.
    pub fn release_all(&mut self) -> bool {
        let had_capture = self.document_capture;
        if had_capture {
            debug!("releasing document pointer capture");
        }
        self.document_capture = false;
        self.drag = None;
        self.suppress_clicks_until = None;
        self.camera.is_dragging = false;
        had_capture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> GestureController {
        GestureController::new(ControlsConfig::default())
    }

    #[test]
    fn drag_follows_anchor_formula() {
        let mut c = controller();
        c.look_at(10.0, 5.0);
        c.pointer_down(100.0, 100.0);
        assert!(c.camera().is_dragging);
        assert!(c.has_document_capture());

        assert!(c.pointer_move(50.0, 120.0));
        // lon = (100 - 50) * 0.2 + 10, lat = (120 - 100) * 0.2 + 5
        assert!((c.camera().lon - 20.0).abs() < 1e-9);
        assert!((c.camera().lat - 9.0).abs() < 1e-9);

        // Moves are absolute relative to the anchor, not cumulative.
        c.pointer_move(50.0, 120.0);
        assert!((c.camera().lon - 20.0).abs() < 1e-9);
    }

    #[test]
    fn lat_is_clamped_for_any_drag() {
        let mut c = controller();
        c.pointer_down(0.0, 0.0);
        for y in [1.0e6, -1.0e6, 437.0, -9_999.5] {
            c.pointer_move(0.0, y);
            assert!(c.camera().lat <= 85.0 && c.camera().lat >= -85.0);
        }
        c.pointer_move(0.0, 1.0e9);
        assert_eq!(c.camera().lat, 85.0);
    }

    #[test]
    fn fov_is_clamped_for_any_wheel_delta() {
        let mut c = controller();
        for delta in [1.0e7, -1.0e7, 33.0, -0.5] {
            c.wheel(delta);
            assert!(c.camera().fov >= 10.0 && c.camera().fov <= 120.0);
        }
        c.wheel(1.0e7);
        assert_eq!(c.camera().fov, 120.0);
        assert!(!c.wheel(f64::NAN));
        let lon = c.camera().lon;
        c.wheel(-100.0);
        assert_eq!(c.camera().lon, lon);
    }

    #[test]
    fn zoom_commands_step_and_clamp() {
        let mut c = controller();
        assert!(c.zoom_in());
        assert_eq!(c.camera().fov, 70.0);
        c.set_fov(12.0);
        c.zoom_in();
        assert_eq!(c.camera().fov, 10.0);
        assert!(!c.zoom_in());
    }

    #[test]
    fn click_after_real_drag_is_suppressed_briefly() {
        let mut c = controller();
        c.pointer_down(0.0, 0.0);
        c.pointer_move(40.0, 0.0);
        c.pointer_up(Millis(1000.0));
        assert!(!c.has_document_capture());
        assert!(c.was_dragging(Millis(1050.0)));
        assert_eq!(c.click(Millis(1050.0)), ClickDisposition::Suppress);
        assert_eq!(c.click(Millis(1101.0)), ClickDisposition::Accept);
    }

    #[test]
    fn click_without_movement_is_accepted() {
        let mut c = controller();
        c.pointer_down(10.0, 10.0);
        c.pointer_move(12.0, 11.0);
        c.pointer_up(Millis(500.0));
        assert_eq!(c.click(Millis(501.0)), ClickDisposition::Accept);
    }

    #[test]
    fn release_all_drops_capture() {
        let mut c = controller();
        assert!(!c.release_all());
        c.pointer_down(0.0, 0.0);
        assert!(c.release_all());
        assert!(!c.has_document_capture());
        assert!(!c.pointer_move(100.0, 100.0));
        assert_eq!(c.camera().lon, 0.0);
    }

    #[test]
    fn arrival_seeds_heading() {
        let mut c = controller();
        c.look_at(123.0, 40.0);
        c.set_fov(30.0);
        c.arrive_at(Some(270.0));
        assert_eq!(c.camera().lon, 270.0);
        assert_eq!(c.camera().lat, 0.0);
        assert_eq!(c.camera().fov, 75.0);
        c.arrive_at(None);
        assert_eq!(c.camera().lon, 0.0);
    }
}
