use std::cell::RefCell;
use std::collections::BTreeSet;

use console_error_panic_hook::set_once;
use formats::{DirectionKey, SphereConfig};
use foundation::time::Millis;
use futures::future::{join, join_all};
use gpu::RenderCommand;
use navigation::{FollowOutcome, Speed};
use runtime::{Event, Generation};
use scene::{ClickOutcome, Cursor};
use session::{TourSession, ViewerEvent};
use streaming::{AssetCache, LoadTicket};
use tracing::{debug, error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::ImageBitmap;

mod host;
mod loader;
mod wgpu;

use host::{HostEvent, ProgressJson};
use wgpu::{Renderer, init_renderer};

#[derive(Debug)]
struct ViewerState {
    session: Option<TourSession>,
    renderer: Option<Renderer>,
    /// Bitmap behind the session's current photo, kept for (re)uploads.
    photo: Option<(String, ImageBitmap)>,
    canvas_width: f64,
    canvas_height: f64,
    device_pixel_ratio: f64,
}

thread_local! {
    static STATE: RefCell<ViewerState> = RefCell::new(ViewerState {
        session: None,
        renderer: None,
        photo: None,
        canvas_width: 1280.0,
        canvas_height: 720.0,
        device_pixel_ratio: 1.0,
    });

    /// Decoded marker icons, shared by every viewer on the page.
    static ICONS: AssetCache<ImageBitmap> = AssetCache::new();
}

fn with_state<R>(f: impl FnOnce(&RefCell<ViewerState>) -> R) -> R {
    STATE.with(f)
}

/// Runs `f` against the session, if a tour is loaded.
fn with_session<R>(f: impl FnOnce(&mut TourSession) -> R) -> Option<R> {
    with_state(|state| state.borrow_mut().session.as_mut().map(f))
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(js_err)?;
    js_sys::JSON::parse(&json)
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    tracing_wasm::set_as_global_default();
    Ok(())
}

/// Fetches the tour (and optional viewer config) and enters `start_node`,
/// or the first photo of the dataset.
#[wasm_bindgen]
pub fn load_tour(tour_url: String, config_url: Option<String>, start_node: Option<String>) {
    spawn_local(async move {
        if let Err(err) =
            load_tour_inner(&tour_url, config_url.as_deref(), start_node.as_deref()).await
        {
            error!(%err, url = %tour_url, "tour failed to load");
        }
    });
}

async fn load_tour_inner(
    tour_url: &str,
    config_url: Option<&str>,
    start_node: Option<&str>,
) -> Result<(), String> {
    let (dataset, config) =
        join(loader::fetch_dataset(tour_url), loader::fetch_config(config_url)).await;
    let mut session = TourSession::new(dataset?, config?).map_err(|e| e.to_string())?;

    let start = start_node.map(str::to_string).or_else(|| {
        session
            .graph()
            .dataset()
            .nodes()
            .next()
            .map(|node| node.id.clone())
    });

    with_state(|state| {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        session.resize(s.canvas_width, s.canvas_height, s.device_pixel_ratio);
        if let Some(start) = &start {
            session.jump_to(start);
        }
        if let Some(previous) = s.session.as_mut() {
            previous.teardown();
        }
        if let Some(renderer) = s.renderer.as_mut() {
            renderer.release_textures();
        }
        s.photo = None;
        info!(nodes = session.graph().len(), start = ?start, "tour loaded");
        s.session = Some(session);
    });
    Ok(())
}

#[wasm_bindgen]
pub fn init_wgpu(canvas_id: String) {
    spawn_local(async move {
        let (sphere, dpr) = with_state(|state| {
            let s = state.borrow();
            let sphere = s
                .session
                .as_ref()
                .map(|session| session.config().sphere.clone())
                .unwrap_or_else(SphereConfig::default);
            (sphere, s.device_pixel_ratio)
        });
        match init_renderer(&canvas_id, &sphere, dpr).await {
            Ok(renderer) => with_state(|state| state.borrow_mut().renderer = Some(renderer)),
            Err(err) => error!(?err, "wgpu init failed"),
        }
    });
}

/// Called by the page's resize observer with the container's CSS size.
#[wasm_bindgen]
pub fn set_canvas_sizes(width: f64, height: f64, device_pixel_ratio: f64) {
    with_state(|state| {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        s.canvas_width = width;
        s.canvas_height = height;
        s.device_pixel_ratio = device_pixel_ratio;
        if let Some(session) = s.session.as_mut() {
            session.resize(width, height, device_pixel_ratio);
        }
        if let Some(renderer) = s.renderer.as_mut() {
            let w = (width * device_pixel_ratio).round().max(1.0) as u32;
            let h = (height * device_pixel_ratio).round().max(1.0) as u32;
            renderer.resize(w, h, device_pixel_ratio);
        }
    });
}

// ---- input ----

#[wasm_bindgen]
pub fn pointer_down(x_px: f64, y_px: f64) {
    with_session(|s| s.pointer_down(x_px, y_px));
}

/// Returns the CSS cursor for the surface.
#[wasm_bindgen]
pub fn pointer_move(x_px: f64, y_px: f64) -> String {
    let cursor = with_session(|s| s.pointer_move(x_px, y_px)).unwrap_or(Cursor::Grab);
    match cursor {
        Cursor::Pointer => "pointer".to_string(),
        Cursor::Grab => "grab".to_string(),
    }
}

#[wasm_bindgen]
pub fn pointer_up(now_ms: f64) {
    with_session(|s| s.pointer_up(Millis(now_ms)));
}

/// Returns what the click did; dialogs follow as events on the next frame.
#[wasm_bindgen]
pub fn click(x_px: f64, y_px: f64, now_ms: f64) -> String {
    let outcome = with_session(|s| s.click(x_px, y_px, Millis(now_ms)));
    match outcome {
        None | Some(ClickOutcome::Ignored) => "ignored",
        Some(ClickOutcome::HiddenLocationFound { .. }) => "hiddenLocationFound",
        Some(ClickOutcome::Information { .. }) => "information",
        Some(ClickOutcome::Navigate { .. }) => "navigate",
        Some(ClickOutcome::PendingConfirmation(_)) => "pendingConfirmation",
    }
    .to_string()
}

#[wasm_bindgen]
pub fn wheel(delta_y: f64) -> bool {
    with_session(|s| s.wheel(delta_y)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn zoom_in() -> bool {
    with_session(|s| s.zoom_in()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn zoom_out() -> bool {
    with_session(|s| s.zoom_out()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn look_at(lon_deg: f64, lat_deg: f64) {
    with_session(|s| s.look_at(lon_deg, lat_deg));
}

#[wasm_bindgen]
pub fn set_touch(touch: bool) {
    with_session(|s| s.set_touch(touch));
}

#[wasm_bindgen]
pub fn set_stereo(enabled: bool) {
    with_session(|s| s.set_stereo(enabled));
}

#[wasm_bindgen]
pub fn set_race_mode(enabled: bool) {
    with_session(|s| s.set_race_mode(enabled));
}

#[wasm_bindgen]
pub fn mark_found(id: &str) -> bool {
    with_session(|s| s.mark_found(id)).unwrap_or(false)
}

// ---- navigation ----

#[wasm_bindgen]
pub fn jump_to(node_id: &str) -> bool {
    with_session(|s| s.jump_to(node_id)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn follow(direction: &str) -> Result<String, JsValue> {
    let key: DirectionKey = direction.parse().map_err(js_err)?;
    let outcome = with_session(|s| s.follow(key));
    Ok(match outcome {
        None | Some(FollowOutcome::NoEdge) => "noEdge",
        Some(FollowOutcome::Moved { .. }) => "moved",
        Some(FollowOutcome::ChoiceRequired(_)) => "choiceRequired",
    }
    .to_string())
}

/// Confirms the pending move; `choice` picks among several destinations.
#[wasm_bindgen]
pub fn confirm(choice: Option<String>) -> Result<String, JsValue> {
    with_session(|s| s.confirm(choice.as_deref()))
        .ok_or_else(|| JsValue::from_str("no tour loaded"))?
        .map_err(js_err)
}

#[wasm_bindgen]
pub fn cancel_confirmation() -> bool {
    with_session(|s| s.cancel_confirmation()).unwrap_or(false)
}

/// `path_json` is a JSON array of node ids.
#[wasm_bindgen]
pub fn start_tour(path_json: &str) -> Result<(), JsValue> {
    let path: Vec<String> = serde_json::from_str(path_json).map_err(js_err)?;
    with_session(|s| s.start_tour(path))
        .ok_or_else(|| JsValue::from_str("no tour loaded"))?
        .map_err(js_err)
}

#[wasm_bindgen]
pub fn route_to(destination: &str) -> Result<(), JsValue> {
    with_session(|s| s.route_to(destination))
        .ok_or_else(|| JsValue::from_str("no tour loaded"))?
        .map_err(js_err)
}

#[wasm_bindgen]
pub fn pause() -> bool {
    with_session(|s| s.pause()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn resume() -> bool {
    with_session(|s| s.resume()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn step_forward() -> bool {
    with_session(|s| s.step_forward()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn step_backward() -> bool {
    with_session(|s| s.step_backward()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn skip_to_end() -> bool {
    with_session(|s| s.skip_to_end()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn cancel_navigation() -> bool {
    with_session(|s| s.cancel_navigation()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn restart_navigation() -> bool {
    with_session(|s| s.restart_navigation()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn set_speed(speed: &str) -> Result<bool, JsValue> {
    let speed: Speed = speed.parse().map_err(js_err)?;
    Ok(with_session(|s| s.set_speed(speed)).unwrap_or(false))
}

#[wasm_bindgen]
pub fn get_progress() -> Result<JsValue, JsValue> {
    match with_session(|s| ProgressJson::from(s.progress())) {
        Some(progress) => to_js(&progress),
        None => Ok(JsValue::NULL),
    }
}

#[wasm_bindgen]
pub fn get_current_node() -> Option<String> {
    with_session(|s| s.current().map(str::to_string)).flatten()
}

// ---- lifecycle ----

/// Unmounts the viewer: drops listeners' state and every GPU resource.
#[wasm_bindgen]
pub fn teardown() -> u32 {
    with_state(|state| {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        if let Some(renderer) = s.renderer.as_mut() {
            renderer.release_textures();
        }
        s.photo = None;
        s.session.as_mut().map_or(0, |session| session.teardown() as u32)
    })
}

#[wasm_bindgen]
pub fn mount() -> bool {
    with_session(|s| s.mount()).unwrap_or(false)
}

/// Advances the viewer to `now_ms` (the rAF timestamp), services photo and
/// icon requests, draws, and returns the frame's UI events.
#[wasm_bindgen]
pub fn advance_frame(now_ms: f64) -> Result<JsValue, JsValue> {
    let events = with_state(|state| {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        let Some(session) = s.session.as_mut() else {
            return Ok(Vec::new());
        };
        session.tick(Millis(now_ms));
        let events = service(&session.drain_events());
        draw(s)?;
        Ok::<_, JsValue>(events)
    })?;
    to_js(&events)
}

fn service(events: &[Event<ViewerEvent>]) -> Vec<HostEvent> {
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        match &event.payload {
            ViewerEvent::PhotoRequested(ticket) => spawn_photo_load(ticket.clone()),
            ViewerEvent::MarkersRequested { generation, icons } => {
                spawn_marker_build(*generation, icons.clone())
            }
            _ => {}
        }
        out.extend(HostEvent::from_viewer(&event.payload));
    }
    out
}

fn draw(s: &mut ViewerState) -> Result<(), JsValue> {
    let (Some(session), Some(renderer)) = (s.session.as_ref(), s.renderer.as_mut()) else {
        return Ok(());
    };
    if !session.is_mounted() {
        return Ok(());
    }

    if let Some(url) = session.displayed_photo()
        && renderer.panorama_url() != Some(url)
        && let Some((photo_url, bitmap)) = &s.photo
        && photo_url == url
    {
        renderer.set_panorama(url, bitmap);
    }

    let frame = session.render_frame();
    for command in &frame.commands {
        if let RenderCommand::Mesh {
            icon: Some(path), ..
        } = command
            && !renderer.has_icon(path)
            && let Some(bitmap) = ICONS.with(|icons| icons.peek(path))
        {
            renderer.insert_icon(path, &bitmap);
        }
    }
    renderer.render(&session.render_plan(), &frame)
}

fn spawn_photo_load(ticket: LoadTicket) {
    spawn_local(async move {
        let result = loader::load_bitmap(ticket.url.clone()).await;
        with_state(|state| {
            let mut guard = state.borrow_mut();
            let s = &mut *guard;
            let Some(session) = s.session.as_mut() else {
                return;
            };
            let url = ticket.url.clone();
            let status = result.as_ref().map(|_| ()).map_err(|e| e.clone());
            if session.photo_loaded(ticket, status)
                && let Ok(bitmap) = result
            {
                s.photo = Some((url, bitmap));
            }
        });
    });
}

fn spawn_marker_build(generation: Generation, icons: Vec<String>) {
    let cache = ICONS.with(|icons| icons.clone());
    spawn_local(async move {
        let results = join_all(
            icons
                .iter()
                .map(|path| cache.get_or_load(path, loader::load_bitmap)),
        )
        .await;
        let ready: BTreeSet<&str> = icons
            .iter()
            .zip(&results)
            .filter(|(_, result)| result.is_ok())
            .map(|(path, _)| path.as_str())
            .collect();
        debug!(
            generation = generation.0,
            ready = ready.len(),
            requested = icons.len(),
            "marker icons settled"
        );
        with_session(|s| s.finish_markers(generation, |path| ready.contains(path)));
    });
}
