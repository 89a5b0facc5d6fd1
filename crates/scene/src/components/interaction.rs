use foundation::math::Vec3;
use formats::DirectionKey;

use crate::markers::MarkerKind;

/// Intent attached to an interactive entity at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// Stairs, elevator or door marker; moving needs confirmation.
    Navigation {
        kind: MarkerKind,
        direction: Option<DirectionKey>,
        /// Candidate destinations. More than one means the user must choose.
        destinations: Vec<String>,
        original_position: Vec3,
    },
    /// Compass arrow; moves immediately.
    Arrow {
        direction: DirectionKey,
        destination: String,
        angle: f64,
    },
    HiddenLocation {
        id: String,
        name: String,
        description: String,
    },
    Information {
        title: Option<String>,
        description: Option<String>,
    },
}
