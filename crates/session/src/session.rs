use std::rc::Rc;

use controls::{CameraState, ClickDisposition, GestureController};
use formats::{DirectionKey, TourDataset, ViewerConfig};
use foundation::time::Millis;
use gpu::{RenderFrame, RenderPlan, ResourceId, ResourceKind, ViewParams, Viewport};
use graph::{GraphError, LocationGraph};
use navigation::{
    ConfirmError, EngineEvent, FollowOutcome, Hop, HopHandler, HopOrigin, HopResult, HopToken,
    NavigationEngine, NavigationError, PendingMove, Progress, Speed,
};
use runtime::{Event, EventBus, Frame, Generation};
use scene::prefabs::spawn_panorama_sphere;
use scene::{
    BuildOutcome, BuildRequest, ClickOutcome, ConfirmationTracker, Cursor, EntityId,
    HotspotProjector, PendingNavigation, RaceState, TrackUpdate, World, hover, resolve_click,
};
use streaming::{AssetError, Completion, LoadStatus, LoadTicket, PhotoSlot};
use tracing::{debug, info};

use crate::events::ViewerEvent;

/// Collects hops performed during one engine call.
struct Arrivals {
    hops: Vec<(Hop, HopResult)>,
    hold_sequence: bool,
}

impl HopHandler for Arrivals {
    fn hop(&mut self, hop: &Hop) -> HopResult {
        let result = match hop.origin {
            HopOrigin::Sequence { .. } if self.hold_sequence => HopResult::Pending,
            _ => HopResult::Complete,
        };
        self.hops.push((hop.clone(), result));
        result
    }
}

/// One mounted viewer.
///
/// The host forwards input and time, performs the loads requested through
/// [`ViewerEvent`]s, and draws [`TourSession::render_plan`] /
/// [`TourSession::render_frame`] every animation frame.
#[derive(Debug)]
pub struct TourSession {
    config: ViewerConfig,
    graph: Rc<LocationGraph>,
    engine: NavigationEngine,
    gestures: GestureController,
    world: World,
    sphere_root: EntityId,
    projector: HotspotProjector,
    tracker: ConfirmationTracker,
    viewport: Viewport,
    stereo: bool,
    touch: bool,
    race: RaceState,
    photo: PhotoSlot<ResourceId>,
    builds: Vec<BuildRequest>,
    pending: Option<PendingNavigation>,
    cursor: Cursor,
    hold_for_photo: bool,
    photo_hop: Option<(Generation, HopToken)>,
    frame: Frame,
    events: EventBus<ViewerEvent>,
    mounted: bool,
}

impl TourSession {
    pub fn new(dataset: TourDataset, config: ViewerConfig) -> Result<Self, GraphError> {
        let graph = Rc::new(LocationGraph::new(dataset)?);
        let mut world = World::new();
        let sphere_root = spawn_panorama_sphere(&mut world);
        info!(nodes = graph.len(), "tour session created");
        Ok(Self {
            engine: NavigationEngine::new(Rc::clone(&graph), config.playback.clone()),
            gestures: GestureController::new(config.controls.clone()),
            projector: HotspotProjector::new(config.markers.clone(), config.arrows.clone(), sphere_root),
            tracker: ConfirmationTracker::new(config.dialog.clone()),
            graph,
            world,
            sphere_root,
            viewport: Viewport::default(),
            stereo: false,
            touch: false,
            race: RaceState::default(),
            photo: PhotoSlot::new(),
            builds: Vec::new(),
            pending: None,
            cursor: Cursor::Grab,
            hold_for_photo: false,
            photo_hop: None,
            frame: Frame::first(Millis::ZERO),
            events: EventBus::new(),
            mounted: true,
            config,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn graph(&self) -> &LocationGraph {
        &self.graph
    }

    pub fn engine(&self) -> &NavigationEngine {
        &self.engine
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn projector(&self) -> &HotspotProjector {
        &self.projector
    }

    pub fn camera(&self) -> &CameraState {
        self.gestures.camera()
    }

    pub fn gestures(&self) -> &GestureController {
        &self.gestures
    }

    pub fn current(&self) -> Option<&str> {
        self.engine.current()
    }

    pub fn photo_status(&self) -> &LoadStatus {
        self.photo.status()
    }

    /// Url of the photo bound to the sphere; may lag behind a load in flight.
    pub fn displayed_photo(&self) -> Option<&str> {
        self.photo.bound_url()
    }

    pub fn pending_confirmation(&self) -> Option<&PendingNavigation> {
        self.pending.as_ref()
    }

    pub fn progress(&self) -> Progress {
        self.engine.progress()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_stereo(&self) -> bool {
        self.stereo
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn events(&self) -> &[Event<ViewerEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event<ViewerEvent>> {
        self.events.drain()
    }

    /// When set, autoplay waits for each photo to finish loading before the
    /// next delay starts.
    pub fn set_hold_for_photo(&mut self, hold: bool) {
        self.hold_for_photo = hold;
    }

    pub fn set_touch(&mut self, touch: bool) {
        self.touch = touch;
    }

    pub fn set_stereo(&mut self, stereo: bool) {
        self.stereo = stereo;
    }

    /// Returns whether the size actually changed.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) -> bool {
        self.viewport.resize(width, height, device_pixel_ratio)
    }

    pub fn render_plan(&self) -> RenderPlan {
        let camera = self.gestures.camera();
        RenderPlan::build(
            self.viewport,
            ViewParams {
                lon: camera.lon,
                lat: camera.lat,
                fov: camera.fov,
                look_radius: self.config.sphere.look_radius,
                stereo: self.stereo.then_some(self.config.stereo.eye_separation),
            },
        )
    }

    pub fn render_frame(&self) -> RenderFrame {
        self.world.render_frame()
    }

    // ---- input ----

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.gestures.pointer_down(x, y);
    }

    /// Drags the camera while a pointer is down, otherwise updates the hover
    /// cursor.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Cursor {
        if self.gestures.pointer_move(x, y) {
            return self.cursor;
        }
        let cursor = hover(&self.world, &self.render_plan(), x, y);
        if cursor != self.cursor {
            self.cursor = cursor;
            self.emit(ViewerEvent::CursorChanged(cursor));
        }
        cursor
    }

    pub fn pointer_up(&mut self, now: Millis) {
        self.gestures.pointer_up(now);
    }

    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.gestures.wheel(delta_y)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.gestures.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.gestures.zoom_out()
    }

    pub fn look_at(&mut self, lon: f64, lat: f64) {
        self.gestures.look_at(lon, lat);
    }

    /// Resolves a click and acts on it. Clicks that end a drag are dropped.
    pub fn click(&mut self, x: f64, y: f64, now: Millis) -> ClickOutcome {
        if self.gestures.click(now) == ClickDisposition::Suppress {
            debug!("click suppressed after drag");
            return ClickOutcome::Ignored;
        }
        let outcome = resolve_click(
            &self.world,
            &self.graph,
            &self.render_plan(),
            &self.config.dialog,
            self.viewport.rect(),
            x,
            y,
        );
        match &outcome {
            ClickOutcome::Ignored => {}
            ClickOutcome::Navigate { destination, .. } => {
                self.jump_to(destination);
            }
            ClickOutcome::PendingConfirmation(pending) => {
                self.open_confirmation(pending.clone(), now);
            }
            ClickOutcome::HiddenLocationFound {
                id,
                name,
                description,
            } => self.emit(ViewerEvent::HiddenLocationFound {
                id: id.clone(),
                name: name.clone(),
                description: description.clone(),
            }),
            ClickOutcome::Information { title, description } => {
                self.emit(ViewerEvent::InformationOpened {
                    title: title.clone(),
                    description: description.clone(),
                })
            }
        }
        outcome
    }

    // ---- navigation ----

    pub fn jump_to(&mut self, node_id: &str) -> bool {
        let mut arrivals = self.arrivals();
        let moved = self.engine.jump_to(node_id, &mut arrivals);
        self.arrive(arrivals);
        moved
    }

    pub fn follow(&mut self, direction: DirectionKey) -> FollowOutcome {
        let mut arrivals = self.arrivals();
        let outcome = self.engine.follow(direction, &mut arrivals);
        self.arrive(arrivals);
        if let FollowOutcome::ChoiceRequired(pending) = &outcome {
            self.emit(ViewerEvent::ChoiceRequired(pending.clone()));
        }
        outcome
    }

    pub fn confirm(&mut self, choice: Option<&str>) -> Result<String, ConfirmError> {
        let mut arrivals = self.arrivals();
        let result = self.engine.confirm(choice, &mut arrivals);
        self.arrive(arrivals);
        result
    }

    pub fn cancel_confirmation(&mut self) -> bool {
        let had_gate = self.engine.dismiss_confirmation();
        let had_dialog = self.close_confirmation();
        had_gate || had_dialog
    }

    pub fn start_tour(&mut self, path: Vec<String>) -> Result<(), NavigationError> {
        let result = self.engine.start_navigation(path);
        self.forward_engine_events();
        result
    }

    /// Autoplays the shortest route from the current node to `destination`.
    pub fn route_to(&mut self, destination: &str) -> Result<(), NavigationError> {
        let from = self.current().map(str::to_string);
        let path = from
            .and_then(|from| self.graph.shortest_path(&from, destination))
            .ok_or_else(|| NavigationError::UnknownNode {
                id: destination.to_string(),
            })?;
        let hops: Vec<String> = path.into_iter().skip(1).collect();
        if hops.is_empty() {
            return Ok(());
        }
        self.start_tour(hops)
    }

    pub fn pause(&mut self) -> bool {
        let changed = self.engine.pause();
        self.forward_engine_events();
        changed
    }

    pub fn resume(&mut self) -> bool {
        let changed = self.engine.resume();
        self.forward_engine_events();
        changed
    }

    pub fn step_forward(&mut self) -> bool {
        let mut arrivals = self.arrivals();
        let moved = self.engine.step_forward(&mut arrivals);
        self.arrive(arrivals);
        moved
    }

    pub fn step_backward(&mut self) -> bool {
        let mut arrivals = self.arrivals();
        let moved = self.engine.step_backward(&mut arrivals);
        self.arrive(arrivals);
        moved
    }

    pub fn skip_to_end(&mut self) -> bool {
        let mut arrivals = self.arrivals();
        let moved = self.engine.skip_to_end(&mut arrivals);
        self.arrive(arrivals);
        moved
    }

    pub fn cancel_navigation(&mut self) -> bool {
        self.photo_hop = None;
        let changed = self.engine.cancel_navigation();
        self.forward_engine_events();
        changed
    }

    pub fn restart_navigation(&mut self) -> bool {
        let mut arrivals = self.arrivals();
        let moved = self.engine.restart_navigation(&mut arrivals);
        self.arrive(arrivals);
        moved
    }

    pub fn set_speed(&mut self, speed: Speed) -> bool {
        self.engine.set_speed(speed)
    }

    // ---- race mode ----

    pub fn set_race_mode(&mut self, enabled: bool) {
        if self.race.enabled != enabled {
            self.race.enabled = enabled;
            self.rebuild_markers();
        }
    }

    /// Records a found hidden location; its marker disappears on rebuild.
    pub fn mark_found(&mut self, id: &str) -> bool {
        let inserted = self.race.found.insert(id.to_string());
        if inserted {
            self.rebuild_markers();
        }
        inserted
    }

    // ---- async completions ----

    /// Result of a photo fetch started by [`ViewerEvent::PhotoRequested`].
    /// Returns whether it became the displayed photo.
    pub fn photo_loaded(&mut self, ticket: LoadTicket, result: Result<(), AssetError>) -> bool {
        let generation = ticket.generation;
        let url = ticket.url.clone();
        let result = if self.mounted && self.photo.is_current(&ticket) {
            result.and_then(|()| {
                self.world
                    .attach_resource(self.sphere_root, ResourceKind::Texture)
                    .ok_or(AssetError::Cancelled)
            })
        } else {
            Err(AssetError::Cancelled)
        };

        match self.photo.complete(ticket, result) {
            Completion::Superseded { value } => {
                if let Some(id) = value {
                    self.world.release_resource(self.sphere_root, id);
                }
                false
            }
            Completion::Applied { replaced } => {
                if let Some(old) = replaced {
                    self.world.release_resource(self.sphere_root, old);
                }
                let event = match self.photo.status() {
                    LoadStatus::Error { error, .. } => ViewerEvent::PhotoFailed {
                        url,
                        error: error.clone(),
                    },
                    _ => ViewerEvent::PhotoReady { url },
                };
                self.emit(event);
                if let Some((awaited, token)) = self.photo_hop
                    && awaited == generation
                {
                    self.photo_hop = None;
                    self.engine.hop_complete(token);
                    self.forward_engine_events();
                }
                true
            }
        }
    }

    /// Completes the marker build announced by [`ViewerEvent::MarkersRequested`].
    pub fn finish_markers(
        &mut self,
        generation: Generation,
        icon_ready: impl Fn(&str) -> bool,
    ) -> Option<BuildOutcome> {
        let index = self.builds.iter().position(|b| b.generation == generation)?;
        let request = self.builds.remove(index);
        let outcome = self
            .projector
            .finish_build(&mut self.world, &request, icon_ready);
        if let BuildOutcome::Applied { markers } = outcome {
            self.update_markers();
            self.emit(ViewerEvent::MarkersReady { count: markers });
        }
        Some(outcome)
    }

    // ---- frame loop ----

    /// Advances time: fires due hops, re-anchors the pending dialog and
    /// rescales markers.
    pub fn tick(&mut self, now: Millis) {
        self.frame = self.frame.next(now);

        let mut arrivals = self.arrivals();
        self.engine.tick(now, &mut arrivals);
        self.arrive(arrivals);

        if self.pending.is_some() {
            let plan = self.render_plan();
            match self
                .tracker
                .tick(&self.world, &plan, self.viewport.rect(), now)
            {
                TrackUpdate::Unchanged => {}
                TrackUpdate::Moved { screen, anchor } => {
                    if let Some(pending) = self.pending.as_mut() {
                        pending.screen = screen;
                        pending.dialog_anchor = anchor;
                    }
                    self.emit(ViewerEvent::ConfirmationMoved { anchor });
                }
                TrackUpdate::Dismissed => {
                    self.cancel_confirmation();
                }
            }
        }

        self.update_markers();
    }

    // ---- lifecycle ----

    /// Releases listeners and disposes every GPU resource. Later completions
    /// are inert. Returns the number of resources disposed.
    pub fn teardown(&mut self) -> usize {
        if !self.mounted {
            return 0;
        }
        self.mounted = false;
        self.gestures.release_all();
        self.engine.cancel_navigation();
        self.engine.dismiss_confirmation();
        self.engine.drain_events();
        self.tracker.stop();
        self.pending = None;
        self.builds.clear();
        self.photo_hop = None;
        let photo = self.photo.reset();
        let mut disposed = self.projector.clear(&mut self.world);
        if let Some(id) = photo {
            disposed += usize::from(self.world.release_resource(self.sphere_root, id));
        }
        disposed += self.world.clear();
        info!(disposed, "viewer torn down");
        disposed
    }

    /// Recreates the scene after [`TourSession::teardown`] and reloads the
    /// current node.
    pub fn mount(&mut self) -> bool {
        if self.mounted {
            return false;
        }
        self.mounted = true;
        self.sphere_root = spawn_panorama_sphere(&mut self.world);
        self.projector.reattach(&mut self.world, self.sphere_root);
        if let Some(node_id) = self.current().map(str::to_string) {
            self.request_photo(&node_id);
            self.rebuild_markers();
        }
        true
    }

    /// Starts a fresh marker build for the current node.
    pub fn rebuild_markers(&mut self) {
        if !self.mounted {
            return;
        }
        let Some(node_id) = self.engine.current().map(str::to_string) else {
            return;
        };
        let request = self
            .projector
            .begin_build(&mut self.world, &self.graph, &node_id, &self.race);
        self.emit(ViewerEvent::MarkersRequested {
            generation: request.generation,
            icons: request.icon_paths().into_iter().map(str::to_string).collect(),
        });
        self.builds.push(request);
    }

    fn arrivals(&self) -> Arrivals {
        Arrivals {
            hops: Vec::new(),
            hold_sequence: self.hold_for_photo,
        }
    }

    fn arrive(&mut self, arrivals: Arrivals) {
        self.forward_engine_events();
        let Some((last, result)) = arrivals.hops.last().cloned() else {
            return;
        };
        for (hop, _) in &arrivals.hops {
            let area = self.graph.get_area(&hop.node_id);
            self.emit(ViewerEvent::NodeChanged {
                node_id: hop.node_id.clone(),
                area_name: area.map(|a| a.name.clone()),
                floor_level: area.map(|a| a.floor_level),
            });
        }

        self.close_confirmation();
        self.gestures.arrive_at(last.starting_angle);
        self.photo_hop = None;
        if let Some(ticket) = self.request_photo(&last.node_id)
            && result == HopResult::Pending
        {
            self.photo_hop = Some((ticket.generation, last.token));
        }
        self.rebuild_markers();
    }

    fn request_photo(&mut self, node_id: &str) -> Option<LoadTicket> {
        if !self.mounted {
            return None;
        }
        let url = self.graph.get_node(node_id)?.image_url.clone();
        let ticket = self.photo.begin(url);
        self.emit(ViewerEvent::PhotoRequested(ticket.clone()));
        Some(ticket)
    }

    fn open_confirmation(&mut self, pending: PendingNavigation, now: Millis) {
        self.engine.request_confirmation(PendingMove {
            direction: pending.direction,
            destinations: pending.destinations.clone(),
        });
        self.forward_engine_events();
        self.tracker.start(pending.marker, now);
        self.pending = Some(pending.clone());
        self.emit(ViewerEvent::ConfirmationOpened(pending));
    }

    fn close_confirmation(&mut self) -> bool {
        self.tracker.stop();
        if self.pending.take().is_some() {
            self.emit(ViewerEvent::ConfirmationClosed);
            true
        } else {
            false
        }
    }

    fn update_markers(&mut self) {
        let camera = *self.gestures.camera();
        self.projector
            .update(&mut self.world, camera.lon, camera.fov, self.touch);
    }

    fn forward_engine_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::Hopped { .. }
                | EngineEvent::ConfirmationRequested(_)
                | EngineEvent::ConfirmationClosed => {}
                other => self.emit(ViewerEvent::Navigation(other)),
            }
        }
    }

    fn emit(&mut self, event: ViewerEvent) {
        self.events.emit(self.frame, event);
    }
}
