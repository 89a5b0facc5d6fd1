use formats::{DialogConfig, DirectionKey};
use foundation::math::Vec3;
use gpu::{Rect, RenderPlan, ScreenPoint};
use graph::LocationGraph;

use crate::World;
use crate::components::Interaction;
use crate::entity::EntityId;
use crate::markers::NavigationType;
use crate::picking::{PickOptions, Ray, pick_screen};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Over an interactive marker.
    Pointer,
    Grab,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DialogSide {
    Left,
    Right,
}

/// Top-left corner of the confirmation dialog in viewport pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DialogAnchor {
    pub x: f64,
    pub y: f64,
    pub side: DialogSide,
}

/// A navigation marker waiting for the user to confirm the move.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNavigation {
    pub marker: EntityId,
    pub navigation_type: NavigationType,
    pub direction: Option<DirectionKey>,
    /// More than one entry means the user has to pick a destination.
    pub destinations: Vec<String>,
    pub screen: ScreenPoint,
    pub dialog_anchor: DialogAnchor,
    pub area_name: Option<String>,
    /// Destination floor; stairs only.
    pub floor_level: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    HiddenLocationFound {
        id: String,
        name: String,
        description: String,
    },
    Information {
        title: Option<String>,
        description: Option<String>,
    },
    Navigate {
        direction: DirectionKey,
        destination: String,
    },
    PendingConfirmation(PendingNavigation),
}

/// Camera ray under viewport pixel `(x, y)`, taken from the eye pass that
/// owns the pixel.
pub fn screen_ray(plan: &RenderPlan, x: f64, y: f64) -> Option<Ray> {
    let pass = plan.pass_at(x, y)?;
    let ndc = pass.viewport.to_ndc(x, y);
    Some(Ray::new(pass.camera.position, pass.camera.ray_direction(ndc)))
}

/// Interactive entity under the pointer, resolved to the ancestor that
/// carries the interaction.
pub fn pick_interaction<'w>(
    world: &'w World,
    plan: &RenderPlan,
    x: f64,
    y: f64,
) -> Option<(EntityId, &'w Interaction)> {
    let hit = pick_screen(
        world,
        x,
        y,
        |px, py| screen_ray(plan, px, py),
        PickOptions::default(),
    )?;
    world.interaction_ancestor(hit.entity)
}

pub fn hover(world: &World, plan: &RenderPlan, x: f64, y: f64) -> Cursor {
    match pick_interaction(world, plan, x, y) {
        Some(_) => Cursor::Pointer,
        None => Cursor::Grab,
    }
}

/// Resolves a click at viewport pixel `(x, y)`.
///
/// Callers drop clicks that end a drag before getting here. Nothing in the
/// world is mutated: every outcome is an intent for the caller to act on.
pub fn resolve_click(
    world: &World,
    graph: &LocationGraph,
    plan: &RenderPlan,
    dialog: &DialogConfig,
    viewport: Rect,
    x: f64,
    y: f64,
) -> ClickOutcome {
    let Some((entity, interaction)) = pick_interaction(world, plan, x, y) else {
        return ClickOutcome::Ignored;
    };

    match interaction {
        Interaction::HiddenLocation {
            id,
            name,
            description,
        } => ClickOutcome::HiddenLocationFound {
            id: id.clone(),
            name: name.clone(),
            description: description.clone(),
        },
        Interaction::Information { title, description } => ClickOutcome::Information {
            title: title.clone(),
            description: description.clone(),
        },
        Interaction::Arrow {
            direction,
            destination,
            ..
        } => ClickOutcome::Navigate {
            direction: *direction,
            destination: destination.clone(),
        },
        Interaction::Navigation {
            kind,
            direction,
            destinations,
            ..
        } => {
            let Some(navigation_type) = kind.navigation_type() else {
                return ClickOutcome::Ignored;
            };
            let Some(first) = destinations.first() else {
                return ClickOutcome::Ignored;
            };
            let screen = project_marker(world, plan, entity).unwrap_or(ScreenPoint {
                x,
                y,
                ndc: Vec3::ZERO,
                in_view: true,
            });
            let area = graph.get_area(first);
            ClickOutcome::PendingConfirmation(PendingNavigation {
                marker: entity,
                navigation_type,
                direction: *direction,
                destinations: destinations.clone(),
                screen,
                dialog_anchor: dialog_anchor(screen.x, screen.y, viewport, dialog),
                area_name: area.map(|a| a.name.clone()),
                floor_level: match navigation_type {
                    NavigationType::Stairs => area.map(|a| a.floor_level),
                    _ => None,
                },
            })
        }
    }
}

/// Projects the origin of `entity` through the primary eye pass into
/// viewport pixels.
pub fn project_marker(world: &World, plan: &RenderPlan, entity: EntityId) -> Option<ScreenPoint> {
    if !world.is_alive(entity) {
        return None;
    }
    let pass = plan.primary()?;
    let point = world.world_matrix(entity).transform_point(Vec3::ZERO);
    let mut screen = pass
        .camera
        .project(point, pass.viewport.width, pass.viewport.height)?;
    screen.x += pass.viewport.x;
    screen.y += pass.viewport.y;
    Some(screen)
}

/// Places the dialog beside a marker at `(x, y)`: to the right when it fits,
/// otherwise to the left, then clamped inside the viewport margins.
pub fn dialog_anchor(x: f64, y: f64, viewport: Rect, config: &DialogConfig) -> DialogAnchor {
    let right_edge = viewport.x + viewport.width - config.margin;
    let (side, raw_x) = if x + config.offset + config.width <= right_edge {
        (DialogSide::Right, x + config.offset)
    } else {
        (DialogSide::Left, x - config.offset - config.width)
    };

    let clamp = |value: f64, lo: f64, hi: f64| if hi < lo { lo } else { value.clamp(lo, hi) };
    let min_x = viewport.x + config.margin;
    let max_x = viewport.x + viewport.width - config.margin - config.width;
    let min_y = viewport.y + config.margin;
    let max_y = viewport.y + viewport.height - config.margin - config.height;

    DialogAnchor {
        x: clamp(raw_x, min_x, max_x),
        y: clamp(y - config.height * 0.5, min_y, max_y),
        side,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::RaceState;
    use crate::projector::tests::built;
    use foundation::math::cartesian_to_heading;
    use gpu::{ViewParams, Viewport};
    use pretty_assertions::assert_eq;

    const W: f64 = 1200.0;
    const H: f64 = 800.0;

    fn plan_towards(world_point: Vec3, stereo: Option<f64>) -> RenderPlan {
        let (lon, lat) = cartesian_to_heading(world_point).expect("non-zero");
        RenderPlan::build(
            Viewport::new(W, H, 1.0),
            ViewParams {
                lon,
                lat,
                fov: 75.0,
                look_radius: 500.0,
                stereo,
            },
        )
    }

    fn full() -> Rect {
        Rect::new(0.0, 0.0, W, H)
    }

    #[test]
    fn elevator_click_opens_confirmation() {
        let (world, _projector, graph) = built("n-f1-mid-7", &RaceState::default());
        // Authored at (-400, -20, -60) under the mirrored root.
        let plan = plan_towards(Vec3::new(400.0, -20.0, -60.0), None);

        assert_eq!(hover(&world, &plan, W / 2.0, H / 2.0), Cursor::Pointer);
        let outcome = resolve_click(&world, &graph, &plan, &DialogConfig::default(), full(), W / 2.0, H / 2.0);
        let ClickOutcome::PendingConfirmation(pending) = outcome else {
            panic!("expected confirmation, got {outcome:?}");
        };
        assert_eq!(pending.navigation_type, NavigationType::Elevator);
        assert_eq!(pending.direction, Some(DirectionKey::Elevator));
        assert_eq!(pending.destinations, vec!["elev-n-f1".to_string()]);
        assert_eq!(pending.area_name.as_deref(), Some("Block N Elevator"));
        assert_eq!(pending.floor_level, None);
        assert!((pending.screen.x - W / 2.0).abs() < 1.0);
        assert!((pending.screen.y - H / 2.0).abs() < 1.0);
        assert_eq!(pending.dialog_anchor.side, DialogSide::Right);
    }

    #[test]
    fn stairs_confirmation_reports_floor() {
        let (world, _projector, graph) = built("n-f1-stairs", &RaceState::default());
        let plan = plan_towards(Vec3::new(300.0, 150.0, 200.0), None);
        let outcome = resolve_click(&world, &graph, &plan, &DialogConfig::default(), full(), W / 2.0, H / 2.0);
        let ClickOutcome::PendingConfirmation(pending) = outcome else {
            panic!("expected confirmation, got {outcome:?}");
        };
        assert_eq!(pending.navigation_type, NavigationType::Stairs);
        assert_eq!(pending.floor_level, Some(2));
    }

    #[test]
    fn empty_sky_is_ignored() {
        let (world, _projector, graph) = built("n-f1-mid-7", &RaceState::default());
        let plan = plan_towards(Vec3::new(0.0, 1.0, 0.01), None);
        assert_eq!(hover(&world, &plan, W / 2.0, H / 2.0), Cursor::Grab);
        assert_eq!(
            resolve_click(&world, &graph, &plan, &DialogConfig::default(), full(), W / 2.0, H / 2.0),
            ClickOutcome::Ignored
        );
    }

    #[test]
    fn hidden_location_click_reports_find() {
        let race = RaceState {
            enabled: true,
            ..RaceState::default()
        };
        let (world, _projector, graph) = built("n-f1-mid-7", &race);
        let plan = plan_towards(Vec3::new(-350.0, -120.0, 150.0), None);
        let entities = world.entity_count();
        let outcome = resolve_click(&world, &graph, &plan, &DialogConfig::default(), full(), W / 2.0, H / 2.0);
        assert!(matches!(
            outcome,
            ClickOutcome::HiddenLocationFound { ref id, .. } if id == "hidden-clock"
        ));
        assert_eq!(world.entity_count(), entities);
    }

    #[test]
    fn information_click_reports_text() {
        let (world, _projector, graph) = built("n-f1-mid-6", &RaceState::default());
        let plan = plan_towards(Vec3::new(0.0, 60.0, -380.0), None);
        let outcome = resolve_click(&world, &graph, &plan, &DialogConfig::default(), full(), W / 2.0, H / 2.0);
        assert!(matches!(outcome, ClickOutcome::Information { .. }), "{outcome:?}");
    }

    #[test]
    fn arrow_click_navigates_immediately() {
        let (world, _projector, graph) = built("n-f1-mid-7", &RaceState::default());
        let arrow = crate::arrows::arrow_position(180.0, &formats::ArrowConfig::default());
        let plan = plan_towards(arrow, None);
        assert_eq!(
            resolve_click(&world, &graph, &plan, &DialogConfig::default(), full(), W / 2.0, H / 2.0),
            ClickOutcome::Navigate {
                direction: DirectionKey::Back,
                destination: "n-f1-mid-6".to_string(),
            }
        );
    }

    #[test]
    fn stereo_clicks_use_the_eye_under_the_pointer() {
        let (world, _projector, graph) = built("n-f1-mid-7", &RaceState::default());
        let plan = plan_towards(Vec3::new(400.0, -20.0, -60.0), Some(0.064));
        for x in [W / 4.0, 3.0 * W / 4.0] {
            let outcome = resolve_click(&world, &graph, &plan, &DialogConfig::default(), full(), x, H / 2.0);
            assert!(matches!(outcome, ClickOutcome::PendingConfirmation(_)), "x={x}");
        }
    }

    #[test]
    fn dialog_prefers_right_then_flips_and_clamps() {
        let cfg = DialogConfig::default();
        let view = full();

        let a = dialog_anchor(100.0, 400.0, view, &cfg);
        assert_eq!(a.side, DialogSide::Right);
        assert_eq!(a.x, 100.0 + cfg.offset);
        assert_eq!(a.y, 400.0 - cfg.height / 2.0);

        let b = dialog_anchor(W - 50.0, 400.0, view, &cfg);
        assert_eq!(b.side, DialogSide::Left);
        assert_eq!(b.x, W - 50.0 - cfg.offset - cfg.width);

        let c = dialog_anchor(W - 50.0, 5.0, view, &cfg);
        assert_eq!(c.y, cfg.margin);
        let d = dialog_anchor(10.0, H, view, &cfg);
        assert_eq!(d.y, H - cfg.margin - cfg.height);
    }
}
