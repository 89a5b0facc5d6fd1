use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Outgoing edge key of a photo node.
///
/// The first eight keys are compass directions laid out on the floor of the
/// panorama; the rest are vertical or portal connections.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DirectionKey {
    Forward,
    ForwardRight,
    Right,
    BackRight,
    Back,
    BackLeft,
    Left,
    ForwardLeft,
    Up,
    Down,
    Elevator,
    Door,
    Floor1,
    Floor2,
    Floor3,
    Floor4,
}

impl DirectionKey {
    pub const ALL: [DirectionKey; 16] = [
        DirectionKey::Forward,
        DirectionKey::ForwardRight,
        DirectionKey::Right,
        DirectionKey::BackRight,
        DirectionKey::Back,
        DirectionKey::BackLeft,
        DirectionKey::Left,
        DirectionKey::ForwardLeft,
        DirectionKey::Up,
        DirectionKey::Down,
        DirectionKey::Elevator,
        DirectionKey::Door,
        DirectionKey::Floor1,
        DirectionKey::Floor2,
        DirectionKey::Floor3,
        DirectionKey::Floor4,
    ];

    pub const COMPASS: [DirectionKey; 8] = [
        DirectionKey::Forward,
        DirectionKey::ForwardRight,
        DirectionKey::Right,
        DirectionKey::BackRight,
        DirectionKey::Back,
        DirectionKey::BackLeft,
        DirectionKey::Left,
        DirectionKey::ForwardLeft,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DirectionKey::Forward => "forward",
            DirectionKey::ForwardRight => "forwardRight",
            DirectionKey::Right => "right",
            DirectionKey::BackRight => "backRight",
            DirectionKey::Back => "back",
            DirectionKey::BackLeft => "backLeft",
            DirectionKey::Left => "left",
            DirectionKey::ForwardLeft => "forwardLeft",
            DirectionKey::Up => "up",
            DirectionKey::Down => "down",
            DirectionKey::Elevator => "elevator",
            DirectionKey::Door => "door",
            DirectionKey::Floor1 => "floor1",
            DirectionKey::Floor2 => "floor2",
            DirectionKey::Floor3 => "floor3",
            DirectionKey::Floor4 => "floor4",
        }
    }

    pub fn is_compass(self) -> bool {
        Self::COMPASS.contains(&self)
    }

    /// Heading (degrees, clockwise from forward) used when a compass edge has
    /// no authored angle.
    pub fn default_angle(self) -> Option<f64> {
        let angle = match self {
            DirectionKey::Forward => 0.0,
            DirectionKey::ForwardRight => 45.0,
            DirectionKey::Right => 90.0,
            DirectionKey::BackRight => 135.0,
            DirectionKey::Back => 180.0,
            DirectionKey::BackLeft => 225.0,
            DirectionKey::Left => 270.0,
            DirectionKey::ForwardLeft => 315.0,
            _ => return None,
        };
        Some(angle)
    }

    /// The key a destination is expected to use to lead back here.
    ///
    /// Portal keys (elevator, door, floorN) have no fixed reciprocal.
    pub fn reciprocal(self) -> Option<DirectionKey> {
        let key = match self {
            DirectionKey::Forward => DirectionKey::Back,
            DirectionKey::Back => DirectionKey::Forward,
            DirectionKey::Left => DirectionKey::Right,
            DirectionKey::Right => DirectionKey::Left,
            DirectionKey::ForwardLeft => DirectionKey::BackRight,
            DirectionKey::BackRight => DirectionKey::ForwardLeft,
            DirectionKey::ForwardRight => DirectionKey::BackLeft,
            DirectionKey::BackLeft => DirectionKey::ForwardRight,
            DirectionKey::Up => DirectionKey::Down,
            DirectionKey::Down => DirectionKey::Up,
            _ => return None,
        };
        Some(key)
    }

    pub fn floor_number(self) -> Option<u8> {
        match self {
            DirectionKey::Floor1 => Some(1),
            DirectionKey::Floor2 => Some(2),
            DirectionKey::Floor3 => Some(3),
            DirectionKey::Floor4 => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for DirectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl fmt::Display for UnknownDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown direction key: {}", self.0)
    }
}

impl std::error::Error for UnknownDirection {}

impl FromStr for DirectionKey {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DirectionKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownDirection(s.to_string()))
    }
}

/// A compass edge with an optional authored heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    pub connection: String,
}

/// Value of a `directions` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirectionEntry {
    Edge(StructuralEdge),
    Single(String),
    /// Several candidate destinations, e.g. an elevator serving many floors.
    Many(Vec<String>),
}

impl DirectionEntry {
    pub fn targets(&self) -> Vec<&str> {
        match self {
            DirectionEntry::Edge(edge) => vec![edge.connection.as_str()],
            DirectionEntry::Single(id) => vec![id.as_str()],
            DirectionEntry::Many(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    pub fn angle(&self) -> Option<f64> {
        match self {
            DirectionEntry::Edge(edge) => edge.angle,
            _ => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, DirectionEntry::Edge(_))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HotspotKind {
    Up,
    Down,
    Elevator,
    Door,
    Floor1,
    Floor2,
    Floor3,
    Floor4,
    Information,
    HiddenLocation,
}

impl HotspotKind {
    /// Direction key used to look up a destination when the hotspot has none.
    pub fn direction_key(self) -> Option<DirectionKey> {
        match self {
            HotspotKind::Up => Some(DirectionKey::Up),
            HotspotKind::Down => Some(DirectionKey::Down),
            HotspotKind::Elevator => Some(DirectionKey::Elevator),
            HotspotKind::Door => Some(DirectionKey::Door),
            HotspotKind::Floor1 => Some(DirectionKey::Floor1),
            HotspotKind::Floor2 => Some(DirectionKey::Floor2),
            HotspotKind::Floor3 => Some(DirectionKey::Floor3),
            HotspotKind::Floor4 => Some(DirectionKey::Floor4),
            HotspotKind::Information | HotspotKind::HiddenLocation => None,
        }
    }

    pub fn is_navigation(self) -> bool {
        self.direction_key().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HotspotKind::Information => "information",
            HotspotKind::HiddenLocation => "hiddenLocation",
            other => other.direction_key().map(DirectionKey::as_str).unwrap_or(""),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Explicitly placed marker on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub position: Position,
    #[serde(alias = "type")]
    pub direction: HotspotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoNode {
    pub id: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_angle: Option<f64>,
    #[serde(default)]
    pub directions: BTreeMap<DirectionKey, DirectionEntry>,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nearby_rooms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_context: Option<String>,
}

impl PhotoNode {
    pub fn direction(&self, key: DirectionKey) -> Option<&DirectionEntry> {
        self.directions.get(&key)
    }

    /// Compass edges in heading order with their effective angle.
    pub fn compass_edges(&self) -> Vec<(DirectionKey, f64, &str)> {
        DirectionKey::COMPASS
            .into_iter()
            .filter_map(|key| {
                let DirectionEntry::Edge(edge) = self.directions.get(&key)? else {
                    return None;
                };
                let angle = edge.angle.or(key.default_angle())?;
                Some((key, angle, edge.connection.as_str()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub building_block: String,
    #[serde(default)]
    pub floor_level: i32,
    #[serde(default)]
    pub photos: Vec<PhotoNode>,
}

/// The whole tour: regular areas plus elevator cabins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourDataset {
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub elevators: Vec<Area>,
}

#[derive(Debug)]
pub enum DatasetError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io { path, source } => {
                write!(f, "failed to read dataset {}: {source}", path.display())
            }
            DatasetError::Parse(err) => write!(f, "dataset parse error: {err}"),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io { source, .. } => Some(source),
            DatasetError::Parse(err) => Some(err),
        }
    }
}

impl TourDataset {
    pub fn from_json_str(payload: &str) -> Result<Self, DatasetError> {
        serde_json::from_str(payload).map_err(DatasetError::Parse)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload)
    }

    /// Every node, regular areas first, in authored order.
    pub fn nodes(&self) -> impl Iterator<Item = &PhotoNode> {
        self.areas
            .iter()
            .chain(self.elevators.iter())
            .flat_map(|area| area.photos.iter())
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }
}
