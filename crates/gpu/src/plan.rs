use crate::camera::EyeCamera;
use crate::viewport::{Rect, Viewport};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Eye {
    Mono,
    Left,
    Right,
}

/// One draw of the scene: a camera, the viewport it renders into and an
/// optional scissor rectangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EyePass {
    pub eye: Eye,
    pub camera: EyeCamera,
    pub viewport: Rect,
    pub scissor: Option<Rect>,
}

/// Camera inputs for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewParams {
    pub lon: f64,
    pub lat: f64,
    pub fov: f64,
    pub look_radius: f64,
    /// `Some(eye separation)` renders side-by-side stereo.
    pub stereo: Option<f64>,
}

/// Passes to execute for a frame: one full-viewport pass in mono mode, or two
/// scissored half-viewport passes in stereo mode.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub passes: Vec<EyePass>,
}

impl RenderPlan {
    pub fn build(viewport: Viewport, params: ViewParams) -> Self {
        let full = viewport.rect();
        let Some(separation) = params.stereo else {
            let camera = EyeCamera::looking(
                params.lon,
                params.lat,
                params.fov,
                full.aspect(),
                params.look_radius,
            );
            return Self {
                passes: vec![EyePass {
                    eye: Eye::Mono,
                    camera,
                    viewport: full,
                    scissor: None,
                }],
            };
        };

        let half_w = full.width * 0.5;
        let left = Rect::new(0.0, 0.0, half_w, full.height);
        let right = Rect::new(half_w, 0.0, full.width - half_w, full.height);
        let centre = EyeCamera::looking(
            params.lon,
            params.lat,
            params.fov,
            left.aspect(),
            params.look_radius,
        );
        let half_sep = separation * 0.5;

        Self {
            passes: vec![
                EyePass {
                    eye: Eye::Left,
                    camera: centre.offset_sideways(-half_sep),
                    viewport: left,
                    scissor: Some(left),
                },
                EyePass {
                    eye: Eye::Right,
                    camera: centre.offset_sideways(half_sep),
                    viewport: right,
                    scissor: Some(right),
                },
            ],
        }
    }

    pub fn is_stereo(&self) -> bool {
        self.passes.len() > 1
    }

    /// The pass whose viewport contains pixel `(x, y)`.
    pub fn pass_at(&self, x: f64, y: f64) -> Option<&EyePass> {
        self.passes
            .iter()
            .find(|p| p.viewport.contains(x, y))
            .or_else(|| self.passes.first())
    }

    /// Pass used for projecting overlays (dialog anchors) into screen space.
    pub fn primary(&self) -> Option<&EyePass> {
        self.passes.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(stereo: Option<f64>) -> ViewParams {
        ViewParams {
            lon: 10.0,
            lat: 0.0,
            fov: 75.0,
            look_radius: 500.0,
            stereo,
        }
    }

    #[test]
    fn mono_renders_once_full_viewport() {
        let plan = RenderPlan::build(Viewport::new(1600.0, 900.0, 1.0), params(None));
        assert_eq!(plan.passes.len(), 1);
        let pass = plan.passes[0];
        assert_eq!(pass.eye, Eye::Mono);
        assert_eq!(pass.viewport, Rect::new(0.0, 0.0, 1600.0, 900.0));
        assert!(pass.scissor.is_none());
        assert!((pass.camera.aspect - 16.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn stereo_splits_viewport_and_offsets_eyes() {
        let plan = RenderPlan::build(Viewport::new(1600.0, 900.0, 1.0), params(Some(0.064)));
        assert!(plan.is_stereo());
        let [l, r] = [plan.passes[0], plan.passes[1]];
        assert_eq!(l.eye, Eye::Left);
        assert_eq!(r.eye, Eye::Right);
        assert_eq!(l.scissor, Some(Rect::new(0.0, 0.0, 800.0, 900.0)));
        assert_eq!(r.scissor, Some(Rect::new(800.0, 0.0, 800.0, 900.0)));

        let gap = (r.camera.position - l.camera.position).length();
        assert!((gap - 0.064).abs() < 1e-9);
        assert!((l.camera.aspect - 800.0 / 900.0).abs() < 1e-9);
        assert_eq!(l.camera.fov_y_deg, 75.0);
    }

    #[test]
    fn pass_lookup_by_pixel() {
        let plan = RenderPlan::build(Viewport::new(1000.0, 500.0, 1.0), params(Some(0.064)));
        assert_eq!(plan.pass_at(100.0, 10.0).map(|p| p.eye), Some(Eye::Left));
        assert_eq!(plan.pass_at(900.0, 10.0).map(|p| p.eye), Some(Eye::Right));
    }
}
