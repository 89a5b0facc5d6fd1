use navigation::{EngineEvent, PendingMove};
use runtime::Generation;
use scene::{Cursor, DialogAnchor, PendingNavigation};
use streaming::{AssetError, LoadTicket};

/// Everything the host (DOM, dialogs, texture loader) has to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    NodeChanged {
        node_id: String,
        area_name: Option<String>,
        floor_level: Option<i32>,
    },
    /// Fetch the photo and report back with `TourSession::photo_loaded`.
    PhotoRequested(LoadTicket),
    PhotoReady { url: String },
    PhotoFailed { url: String, error: AssetError },
    /// Make the icons available, then call `TourSession::finish_markers`.
    MarkersRequested {
        generation: Generation,
        icons: Vec<String>,
    },
    MarkersReady { count: usize },
    CursorChanged(Cursor),
    ConfirmationOpened(PendingNavigation),
    ConfirmationMoved { anchor: DialogAnchor },
    ConfirmationClosed,
    /// An edge with several destinations; the host offers the choice.
    ChoiceRequired(PendingMove),
    HiddenLocationFound {
        id: String,
        name: String,
        description: String,
    },
    InformationOpened {
        title: Option<String>,
        description: Option<String>,
    },
    /// Autoplay transitions.
    Navigation(EngineEvent),
}
