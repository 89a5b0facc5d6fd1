use foundation::time::Millis;
use formats::DialogConfig;
use gpu::{Rect, RenderPlan, ScreenPoint};
use tracing::debug;

use crate::World;
use crate::entity::EntityId;
use crate::interaction::{DialogAnchor, dialog_anchor, project_marker};

#[derive(Debug, Clone, PartialEq)]
pub enum TrackUpdate {
    /// Nothing to do this tick.
    Unchanged,
    Moved {
        screen: ScreenPoint,
        anchor: DialogAnchor,
    },
    /// The marker left the visible front hemisphere or no longer exists.
    Dismissed,
}

/// Keeps a pending confirmation dialog attached to its marker while the
/// camera moves.
#[derive(Debug, Clone)]
pub struct ConfirmationTracker {
    config: DialogConfig,
    marker: Option<EntityId>,
    next_check: Millis,
    last: Option<(f64, f64)>,
}

impl ConfirmationTracker {
    pub fn new(config: DialogConfig) -> Self {
        Self {
            config,
            marker: None,
            next_check: Millis::ZERO,
            last: None,
        }
    }

    pub fn tracked(&self) -> Option<EntityId> {
        self.marker
    }

    pub fn start(&mut self, marker: EntityId, now: Millis) {
        self.marker = Some(marker);
        self.next_check = now.after(self.config.track_interval_ms);
        self.last = None;
    }

    pub fn stop(&mut self) {
        self.marker = None;
        self.last = None;
    }

    pub fn tick(&mut self, world: &World, plan: &RenderPlan, viewport: Rect, now: Millis) -> TrackUpdate {
        let Some(marker) = self.marker else {
            return TrackUpdate::Unchanged;
        };
        if now < self.next_check {
            return TrackUpdate::Unchanged;
        }
        self.next_check = now.after(self.config.track_interval_ms);

        let visible = world.is_alive(marker) && world.is_visible(marker);
        let screen = project_marker(world, plan, marker).filter(|s| visible && s.in_view);
        let Some(screen) = screen else {
            debug!(?marker, "pending marker left the view");
            self.stop();
            return TrackUpdate::Dismissed;
        };

        let position = (screen.x, screen.y);
        if self
            .last
            .is_some_and(|(x, y)| (x - position.0).abs() < 0.5 && (y - position.1).abs() < 0.5)
        {
            return TrackUpdate::Unchanged;
        }
        self.last = Some(position);
        TrackUpdate::Moved {
            screen,
            anchor: dialog_anchor(screen.x, screen.y, viewport, &self.config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Visibility;
    use crate::markers::MarkerKind;
    use crate::projector::RaceState;
    use crate::projector::tests::built;
    use gpu::{ViewParams, Viewport};

    fn plan(lon: f64) -> RenderPlan {
        RenderPlan::build(
            Viewport::new(1000.0, 600.0, 1.0),
            ViewParams {
                lon,
                lat: 0.0,
                fov: 75.0,
                look_radius: 500.0,
                stereo: None,
            },
        )
    }

    fn view() -> Rect {
        Rect::new(0.0, 0.0, 1000.0, 600.0)
    }

    #[test]
    fn follows_marker_on_interval_then_dismisses_behind_camera() {
        let (world, projector, _graph) = built("n-f1-mid-7", &RaceState::default());
        let marker = projector
            .placed()
            .iter()
            .find(|m| m.kind == MarkerKind::Elevator)
            .expect("elevator")
            .entity;
        let mut tracker = ConfirmationTracker::new(DialogConfig::default());
        tracker.start(marker, Millis(0.0));

        // Before the interval elapses nothing is re-projected.
        assert_eq!(tracker.tick(&world, &plan(0.0), view(), Millis(50.0)), TrackUpdate::Unchanged);
        assert!(matches!(
            tracker.tick(&world, &plan(0.0), view(), Millis(100.0)),
            TrackUpdate::Moved { .. }
        ));
        // Same camera, same spot.
        assert_eq!(tracker.tick(&world, &plan(0.0), view(), Millis(200.0)), TrackUpdate::Unchanged);
        assert!(matches!(
            tracker.tick(&world, &plan(5.0), view(), Millis(300.0)),
            TrackUpdate::Moved { .. }
        ));

        assert_eq!(tracker.tick(&world, &plan(180.0), view(), Millis(400.0)), TrackUpdate::Dismissed);
        assert_eq!(tracker.tracked(), None);
    }

    #[test]
    fn hidden_or_removed_markers_dismiss() {
        let (mut world, projector, _graph) = built("n-f1-mid-7", &RaceState::default());
        let marker = projector.placed()[1].entity;
        let mut tracker = ConfirmationTracker::new(DialogConfig::default());

        tracker.start(marker, Millis(0.0));
        world.set_visibility(marker, Visibility::hidden());
        assert_eq!(tracker.tick(&world, &plan(0.0), view(), Millis(100.0)), TrackUpdate::Dismissed);

        tracker.start(marker, Millis(0.0));
        world.despawn_recursive(marker);
        assert_eq!(tracker.tick(&world, &plan(0.0), view(), Millis(100.0)), TrackUpdate::Dismissed);
    }
}
