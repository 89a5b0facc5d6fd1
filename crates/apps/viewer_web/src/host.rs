//! JSON shapes handed to the page script.

use navigation::{EngineEvent, Progress};
use scene::{Cursor, DialogAnchor, DialogSide, PendingNavigation};
use serde::Serialize;
use session::ViewerEvent;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorJson {
    pub x: f64,
    pub y: f64,
    pub side: &'static str,
}

impl From<DialogAnchor> for AnchorJson {
    fn from(anchor: DialogAnchor) -> Self {
        Self {
            x: anchor.x,
            y: anchor.y,
            side: match anchor.side {
                DialogSide::Left => "left",
                DialogSide::Right => "right",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationJson {
    pub navigation_type: &'static str,
    pub direction: Option<&'static str>,
    pub destinations: Vec<String>,
    pub area_name: Option<String>,
    pub floor_level: Option<i32>,
    pub screen_x: f64,
    pub screen_y: f64,
    pub anchor: AnchorJson,
}

impl From<&PendingNavigation> for ConfirmationJson {
    fn from(pending: &PendingNavigation) -> Self {
        Self {
            navigation_type: pending.navigation_type.as_str(),
            direction: pending.direction.map(|d| d.as_str()),
            destinations: pending.destinations.clone(),
            area_name: pending.area_name.clone(),
            floor_level: pending.floor_level,
            screen_x: pending.screen.x,
            screen_y: pending.screen.y,
            anchor: pending.dialog_anchor.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    #[serde(rename_all = "camelCase")]
    NodeChanged {
        node_id: String,
        area_name: Option<String>,
        floor_level: Option<i32>,
    },
    PhotoLoading { url: String },
    PhotoReady { url: String },
    PhotoFailed { url: String, message: String },
    MarkersReady { count: usize },
    Cursor { cursor: &'static str },
    ConfirmationOpened(ConfirmationJson),
    ConfirmationMoved { anchor: AnchorJson },
    ConfirmationClosed,
    ChoiceRequired {
        direction: Option<&'static str>,
        destinations: Vec<String>,
    },
    HiddenLocationFound {
        id: String,
        name: String,
        description: String,
    },
    Information {
        title: Option<String>,
        description: Option<String>,
    },
    SequenceStarted { total: usize },
    SequencePaused,
    SequenceResumed,
    SequenceFinished,
    SequenceCancelled,
}

impl HostEvent {
    /// `None` for events the glue services itself.
    pub fn from_viewer(event: &ViewerEvent) -> Option<Self> {
        Some(match event {
            ViewerEvent::NodeChanged {
                node_id,
                area_name,
                floor_level,
            } => HostEvent::NodeChanged {
                node_id: node_id.clone(),
                area_name: area_name.clone(),
                floor_level: *floor_level,
            },
            ViewerEvent::PhotoRequested(ticket) => HostEvent::PhotoLoading {
                url: ticket.url.clone(),
            },
            ViewerEvent::PhotoReady { url } => HostEvent::PhotoReady { url: url.clone() },
            ViewerEvent::PhotoFailed { url, error } => HostEvent::PhotoFailed {
                url: url.clone(),
                message: error.to_string(),
            },
            ViewerEvent::MarkersRequested { .. } => return None,
            ViewerEvent::MarkersReady { count } => HostEvent::MarkersReady { count: *count },
            ViewerEvent::CursorChanged(cursor) => HostEvent::Cursor {
                cursor: match cursor {
                    Cursor::Pointer => "pointer",
                    Cursor::Grab => "grab",
                },
            },
            ViewerEvent::ConfirmationOpened(pending) => HostEvent::ConfirmationOpened(pending.into()),
            ViewerEvent::ConfirmationMoved { anchor } => HostEvent::ConfirmationMoved {
                anchor: (*anchor).into(),
            },
            ViewerEvent::ConfirmationClosed => HostEvent::ConfirmationClosed,
            ViewerEvent::ChoiceRequired(pending) => HostEvent::ChoiceRequired {
                direction: pending.direction.map(|d| d.as_str()),
                destinations: pending.destinations.clone(),
            },
            ViewerEvent::HiddenLocationFound {
                id,
                name,
                description,
            } => HostEvent::HiddenLocationFound {
                id: id.clone(),
                name: name.clone(),
                description: description.clone(),
            },
            ViewerEvent::InformationOpened { title, description } => HostEvent::Information {
                title: title.clone(),
                description: description.clone(),
            },
            ViewerEvent::Navigation(event) => match event {
                EngineEvent::SequenceStarted { total } => {
                    HostEvent::SequenceStarted { total: *total }
                }
                EngineEvent::Paused => HostEvent::SequencePaused,
                EngineEvent::Resumed => HostEvent::SequenceResumed,
                EngineEvent::SequenceFinished => HostEvent::SequenceFinished,
                EngineEvent::SequenceCancelled => HostEvent::SequenceCancelled,
                EngineEvent::Hopped { .. }
                | EngineEvent::ConfirmationRequested(_)
                | EngineEvent::ConfirmationClosed => return None,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressJson {
    pub current_index: Option<usize>,
    pub total_steps: usize,
    pub active: bool,
    pub paused: bool,
    pub speed: &'static str,
}

impl From<Progress> for ProgressJson {
    fn from(p: Progress) -> Self {
        Self {
            current_index: p.current_index,
            total_steps: p.total_steps,
            active: p.active,
            paused: p.paused,
            speed: p.speed.as_str(),
        }
    }
}
