//! End-to-end runs through a whole session, the way a host drives it.

use formats::{TourDataset, ViewerConfig};
use foundation::math::{Vec3, cartesian_to_heading};
use foundation::time::Millis;
use gpu::ResourceKind;
use navigation::{EngineEvent, EngineState, Speed};
use pretty_assertions::assert_eq;
use runtime::Generation;
use scene::{BuildOutcome, ClickOutcome, MarkerKind, NavigationType, project_marker};
use streaming::{AssetError, LoadTicket};

use crate::{TourSession, ViewerEvent};

const W: f64 = 1200.0;
const H: f64 = 800.0;

fn session() -> TourSession {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../apps/viewer_web/assets/tour.json");
    let dataset = TourDataset::from_path(path).expect("load");
    let mut session = TourSession::new(dataset, ViewerConfig::default()).expect("graph");
    session.resize(W, H, 1.0);
    session
}

fn requested_builds(session: &mut TourSession) -> Vec<Generation> {
    session
        .drain_events()
        .into_iter()
        .filter_map(|e| match e.payload {
            ViewerEvent::MarkersRequested { generation, .. } => Some(generation),
            _ => None,
        })
        .collect()
}

fn photo_tickets(session: &TourSession) -> Vec<LoadTicket> {
    session
        .events()
        .iter()
        .filter_map(|e| match &e.payload {
            ViewerEvent::PhotoRequested(ticket) => Some(ticket.clone()),
            _ => None,
        })
        .collect()
}

/// Jumps to `node_id` and lets every requested build finish. Returns the
/// photo loads the arrival started.
fn arrive(session: &mut TourSession, node_id: &str) -> Vec<LoadTicket> {
    assert!(session.jump_to(node_id));
    let tickets = photo_tickets(session);
    for generation in requested_builds(session) {
        session.finish_markers(generation, |_| true);
    }
    tickets
}

fn marker_world_position(session: &TourSession, kind: MarkerKind) -> (scene::EntityId, Vec3) {
    let marker = session
        .projector()
        .placed()
        .iter()
        .find(|m| m.kind == kind)
        .expect("marker present");
    let position = session
        .world()
        .world_matrix(marker.entity)
        .transform_point(Vec3::ZERO);
    (marker.entity, position)
}

/// Turns the camera onto the first elevator marker and returns its
/// on-screen position.
fn face_elevator(session: &mut TourSession) -> (f64, f64) {
    let (entity, position) = marker_world_position(session, MarkerKind::Elevator);
    let (lon, lat) = cartesian_to_heading(position).expect("not at origin");
    session.look_at(lon, lat);
    let screen = project_marker(session.world(), &session.render_plan(), entity).expect("projects");
    assert!(screen.in_view);
    (screen.x, screen.y)
}

#[test]
fn elevator_click_confirm_moves_into_the_elevator() {
    let mut s = session();
    arrive(&mut s, "n-f1-mid-7");
    let (x, y) = face_elevator(&mut s);

    let outcome = s.click(x, y, Millis(10.0));
    let ClickOutcome::PendingConfirmation(pending) = outcome else {
        panic!("expected a pending move, got {outcome:?}");
    };
    assert_eq!(pending.navigation_type, NavigationType::Elevator);
    assert_eq!(pending.destinations.first().map(String::as_str), Some("elev-n-f1"));
    assert_eq!(s.current(), Some("n-f1-mid-7"));

    assert_eq!(s.confirm(None), Ok("elev-n-f1".to_string()));
    assert_eq!(s.current(), Some("elev-n-f1"));
    assert!(s.pending_confirmation().is_none());
}

#[test]
fn elevator_click_cancel_stays_put() {
    let mut s = session();
    arrive(&mut s, "n-f1-mid-7");
    let (x, y) = face_elevator(&mut s);

    assert!(matches!(
        s.click(x, y, Millis(10.0)),
        ClickOutcome::PendingConfirmation(_)
    ));
    assert!(s.cancel_confirmation());
    assert_eq!(s.current(), Some("n-f1-mid-7"));
    assert!(s.engine().pending_confirmation().is_none());
    assert!(s.confirm(None).is_err());
}

#[test]
fn autoplay_hop_drops_a_confirmation_left_open() {
    let mut s = session();
    arrive(&mut s, "n-f1-mid-7");
    let (x, y) = face_elevator(&mut s);
    assert!(matches!(
        s.click(x, y, Millis(10.0)),
        ClickOutcome::PendingConfirmation(_)
    ));

    s.start_tour(vec!["n-f1-mid-6".into(), "n-f1-mid-5".into()])
        .expect("start");
    let due = s.engine().next_hop_due().expect("first hop scheduled");
    s.tick(due);
    assert_eq!(s.current(), Some("n-f1-mid-6"));
    assert!(s.pending_confirmation().is_none());
    assert!(s.engine().pending_confirmation().is_none());

    assert!(s.confirm(None).is_err());
    assert_eq!(s.current(), Some("n-f1-mid-6"));
    assert_eq!(s.engine().state(), EngineState::Sequential);
}

#[test]
fn drag_release_over_marker_does_not_navigate() {
    let mut s = session();
    arrive(&mut s, "n-f1-mid-7");
    let (x, y) = face_elevator(&mut s);

    s.pointer_down(x - 60.0, y);
    s.pointer_move(x, y);
    s.pointer_up(Millis(100.0));
    assert_eq!(s.click(x, y, Millis(150.0)), ClickOutcome::Ignored);
    assert!(s.pending_confirmation().is_none());
}

#[test]
fn fast_autoplay_ends_on_last_node_and_idle() {
    let mut s = session();
    s.set_speed(Speed::Fast);
    s.start_tour(vec!["n-f1-mid-5".into(), "n-f1-mid-6".into(), "n-f1-mid-7".into()])
        .expect("start");
    for t in [1000.0, 2000.0, 3000.0] {
        s.tick(Millis(t));
    }
    assert_eq!(s.current(), Some("n-f1-mid-7"));
    assert_eq!(s.engine().state(), EngineState::Idle);
    assert!(s.events().iter().any(|e| e.payload
        == ViewerEvent::Navigation(EngineEvent::SequenceFinished)));
}

#[test]
fn cancel_before_first_hop_leaves_session_untouched() {
    let mut s = session();
    s.start_tour(vec!["n-f1-mid-5".into(), "n-f1-mid-6".into()])
        .expect("start");
    assert!(s.cancel_navigation());
    s.tick(Millis(10_000.0));
    assert_eq!(s.current(), None);
    assert!(photo_tickets(&s).is_empty());
}

#[test]
fn autoplay_can_wait_for_each_photo() {
    let mut s = session();
    s.set_hold_for_photo(true);
    s.set_speed(Speed::Fast);
    s.start_tour(vec!["n-f1-mid-5".into(), "n-f1-mid-6".into()])
        .expect("start");

    s.tick(Millis(1000.0));
    s.tick(Millis(5000.0));
    assert_eq!(s.current(), Some("n-f1-mid-5"));
    assert_eq!(s.engine().pending_timers(), 0);

    let ticket = photo_tickets(&s).pop().expect("photo requested");
    assert!(s.photo_loaded(ticket, Ok(())));
    assert_eq!(s.engine().next_hop_due(), Some(Millis(6000.0)));
    s.tick(Millis(6000.0));
    assert_eq!(s.current(), Some("n-f1-mid-6"));
}

#[test]
fn superseded_photo_loads_are_inert() {
    let mut s = session();
    s.jump_to("n-f1-mid-5");
    s.jump_to("n-f1-mid-6");
    let tickets = photo_tickets(&s);
    assert_eq!(tickets.len(), 2);

    assert!(s.photo_loaded(tickets[1].clone(), Ok(())));
    assert!(!s.photo_loaded(tickets[0].clone(), Ok(())));
    assert_eq!(s.photo_status().url(), Some("/photos/n-f1-mid-6.jpg"));
    assert_eq!(s.displayed_photo(), Some("/photos/n-f1-mid-6.jpg"));
    assert_eq!(s.world().ledger().counts(ResourceKind::Texture).live(), 1);
}

#[test]
fn next_photo_reports_loading_while_previous_stays_displayed() {
    let mut s = session();
    let ticket = arrive(&mut s, "n-f1-mid-5").pop().expect("photo");
    assert!(s.photo_loaded(ticket, Ok(())));

    let ticket = arrive(&mut s, "n-f1-mid-6").pop().expect("photo");
    assert!(s.photo_status().is_loading());
    assert_eq!(s.displayed_photo(), Some("/photos/n-f1-mid-5.jpg"));
    assert!(s.photo_loaded(ticket, Ok(())));
    assert_eq!(s.displayed_photo(), Some("/photos/n-f1-mid-6.jpg"));
    assert_eq!(s.world().ledger().counts(ResourceKind::Texture).live(), 1);
}

#[test]
fn photo_failure_surfaces_error_state() {
    let mut s = session();
    s.jump_to("n-f1-mid-5");
    let ticket = photo_tickets(&s).pop().expect("photo requested");
    let error = AssetError::Http {
        url: ticket.url.clone(),
        status: 404,
    };
    s.photo_loaded(ticket, Err(error.clone()));
    assert!(s.events().iter().any(|e| matches!(
        &e.payload,
        ViewerEvent::PhotoFailed { error: reported, .. } if *reported == error
    )));
}

#[test]
fn rebuilding_twice_keeps_marker_count_and_resources() {
    let mut s = session();
    arrive(&mut s, "n-f1-mid-7");
    let markers = s.projector().placed().len();
    let live = s.world().ledger().live_count();

    for _ in 0..2 {
        s.rebuild_markers();
        for generation in requested_builds(&mut s) {
            s.finish_markers(generation, |_| true);
        }
        assert_eq!(s.projector().placed().len(), markers);
        assert_eq!(s.world().ledger().live_count(), live);
    }
    for kind in [ResourceKind::Geometry, ResourceKind::Material] {
        let counts = s.world().ledger().counts(kind);
        assert_eq!(counts.allocated, counts.disposed + counts.live());
    }
}

#[test]
fn stale_marker_builds_are_disposed() {
    let mut s = session();
    s.jump_to("n-f1-mid-7");
    s.jump_to("n-f1-mid-6");
    let builds = requested_builds(&mut s);
    assert_eq!(builds.len(), 2);

    assert!(matches!(
        s.finish_markers(builds[0], |_| true),
        Some(BuildOutcome::Stale { .. })
    ));
    assert!(matches!(
        s.finish_markers(builds[1], |_| true),
        Some(BuildOutcome::Applied { .. })
    ));
    assert_eq!(s.finish_markers(builds[1], |_| true), None);
    // Forward, back and right arrows plus the information marker.
    assert_eq!(s.projector().placed().len(), 4);
}

#[test]
fn pending_confirmation_dismisses_when_marker_leaves_view() {
    let mut s = session();
    arrive(&mut s, "n-f1-mid-7");
    let (x, y) = face_elevator(&mut s);
    s.click(x, y, Millis(0.0));
    assert!(s.pending_confirmation().is_some());

    let lon = s.camera().lon;
    s.look_at(lon + 180.0, 0.0);
    s.tick(Millis(150.0));
    assert!(s.pending_confirmation().is_none());
    assert!(s.engine().pending_confirmation().is_none());
    assert!(s.events().iter().any(|e| e.payload == ViewerEvent::ConfirmationClosed));
}

#[test]
fn hidden_location_found_then_removed_on_rebuild() {
    let mut s = session();
    s.set_race_mode(true);
    arrive(&mut s, "n-f1-mid-7");
    let (entity, position) = marker_world_position(&s, MarkerKind::HiddenLocation);
    let (lon, lat) = cartesian_to_heading(position).expect("not at origin");
    s.look_at(lon, lat);
    let screen = project_marker(s.world(), &s.render_plan(), entity).expect("projects");

    let outcome = s.click(screen.x, screen.y, Millis(0.0));
    assert!(matches!(
        outcome,
        ClickOutcome::HiddenLocationFound { ref id, .. } if id == "hidden-clock"
    ));

    assert!(s.mark_found("hidden-clock"));
    for generation in requested_builds(&mut s) {
        s.finish_markers(generation, |_| true);
    }
    assert!(s
        .projector()
        .placed()
        .iter()
        .all(|m| m.kind != MarkerKind::HiddenLocation));
}

#[test]
fn reciprocal_round_trip_returns_home() {
    let mut s = session();
    s.jump_to("n-f1-stairs");
    s.follow(formats::DirectionKey::Up);
    assert_eq!(s.current(), Some("n-f2-stairs"));
    s.follow(formats::DirectionKey::Down);
    assert_eq!(s.current(), Some("n-f1-stairs"));
}

#[test]
fn route_to_autoplays_shortest_path() {
    let mut s = session();
    s.jump_to("n-f1-mid-5");
    s.set_speed(Speed::Fast);
    s.route_to("n-f2-stairs").expect("route");
    assert_eq!(
        s.engine().path(),
        ["n-f1-mid-6", "n-f1-stairs", "n-f2-stairs"].map(String::from)
    );
    s.tick(Millis(10_000.0));
    assert_eq!(s.current(), Some("n-f2-stairs"));
}

#[test]
fn arrival_resets_camera_to_starting_angle() {
    let mut s = session();
    s.look_at(123.0, 40.0);
    s.wheel(400.0);
    s.jump_to("n-f1-stairs");
    let camera = *s.camera();
    assert_eq!(camera.lon, 270.0);
    assert_eq!(camera.lat, 0.0);
    assert_eq!(camera.fov, s.config().controls.default_fov);
}

#[test]
fn configured_limits_cannot_widen_the_camera_range() {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../apps/viewer_web/assets/tour.json");
    let dataset = TourDataset::from_path(path).expect("load");
    let config = ViewerConfig::from_json_str(
        r#"{ "controls": { "max_lat": 90, "min_fov": 130, "max_fov": 1 } }"#,
    )
    .expect("config");
    let mut s = TourSession::new(dataset, config).expect("graph");
    s.resize(W, H, 1.0);
    s.jump_to("n-f1-mid-5");

    s.look_at(0.0, 90.0);
    assert_eq!(s.camera().lat, 85.0);
    for _ in 0..50 {
        s.zoom_in();
    }
    assert_eq!(s.camera().fov, 10.0);
    for _ in 0..50 {
        s.zoom_out();
    }
    assert_eq!(s.camera().fov, 120.0);
}

#[test]
fn teardown_disposes_everything_once() {
    let mut s = session();
    let ticket = arrive(&mut s, "n-f1-mid-7").pop().expect("photo");
    assert!(s.photo_loaded(ticket, Ok(())));
    assert_eq!(s.world().ledger().counts(ResourceKind::Texture).live(), 1);

    let disposed = s.teardown();
    assert!(disposed > 0);
    assert_eq!(s.world().ledger().live_count(), 0);
    assert_eq!(s.teardown(), 0);
    assert!(!s.gestures().has_document_capture());

    assert!(s.mount());
    assert_eq!(s.world().ledger().live_count(), 2);
}

#[test]
fn builds_started_before_teardown_never_match_after_mount() {
    let mut s = session();
    assert!(s.jump_to("n-f1-mid-7"));
    let before = requested_builds(&mut s);
    assert_eq!(before.len(), 1);

    s.teardown();
    assert!(s.mount());
    let after = requested_builds(&mut s);
    assert_eq!(after.len(), 1);
    assert_ne!(after[0], before[0]);
    assert!(s.finish_markers(before[0], |_| false).is_none());

    let outcome = s.finish_markers(after[0], |_| true).expect("current build");
    assert!(matches!(outcome, BuildOutcome::Applied { .. }));
}

#[test]
fn stereo_plan_splits_the_viewport() {
    let mut s = session();
    assert_eq!(s.render_plan().passes.len(), 1);
    s.set_stereo(true);
    let plan = s.render_plan();
    assert!(plan.is_stereo());
    assert_eq!(plan.passes[0].viewport.width, W / 2.0);
}
