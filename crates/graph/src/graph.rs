use std::collections::{HashMap, HashSet};
use std::fmt;

use formats::{Area, DirectionEntry, DirectionKey, PhotoNode, TourDataset};
use tracing::{debug, warn};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AreaKind {
    Floor,
    Elevator,
}

/// Destination(s) of an edge. `Many` is an ambiguous edge that needs a
/// user choice before it can be followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTarget {
    One(String),
    Many(Vec<String>),
}

impl EdgeTarget {
    pub fn candidates(&self) -> Vec<&str> {
        match self {
            EdgeTarget::One(id) => vec![id.as_str()],
            EdgeTarget::Many(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, EdgeTarget::Many(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DuplicateNode { id: String },
    DuplicateArea { id: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DuplicateNode { id } => write!(f, "duplicate photo node id: {id}"),
            GraphError::DuplicateArea { id } => write!(f, "duplicate area id: {id}"),
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Debug, Copy, Clone)]
struct NodeSlot {
    area: usize,
    photo: usize,
}

#[derive(Debug, Copy, Clone)]
struct AreaSlot {
    kind: AreaKind,
    index: usize,
}

/// Immutable lookup structure over a [`TourDataset`].
///
/// All lookups are pure; an unknown id yields `None` and callers treat that
/// as "no such move".
#[derive(Debug, Clone)]
pub struct LocationGraph {
    dataset: TourDataset,
    areas: Vec<AreaSlot>,
    nodes: HashMap<String, NodeSlot>,
    order: Vec<String>,
}

impl LocationGraph {
    pub fn new(dataset: TourDataset) -> Result<Self, GraphError> {
        let mut areas = Vec::new();
        let mut nodes = HashMap::new();
        let mut order = Vec::new();
        let mut area_ids = HashSet::new();

        let lists = [
            (AreaKind::Floor, &dataset.areas),
            (AreaKind::Elevator, &dataset.elevators),
        ];
        for (kind, list) in lists {
            for (index, area) in list.iter().enumerate() {
                if !area_ids.insert(area.id.clone()) {
                    return Err(GraphError::DuplicateArea {
                        id: area.id.clone(),
                    });
                }
                let area_slot = areas.len();
                areas.push(AreaSlot { kind, index });
                for (photo, node) in area.photos.iter().enumerate() {
                    let slot = NodeSlot {
                        area: area_slot,
                        photo,
                    };
                    if nodes.insert(node.id.clone(), slot).is_some() {
                        return Err(GraphError::DuplicateNode {
                            id: node.id.clone(),
                        });
                    }
                    order.push(node.id.clone());
                }
            }
        }

        debug!(
            nodes = order.len(),
            areas = areas.len(),
            "location graph indexed"
        );

        Ok(Self {
            dataset,
            areas,
            nodes,
            order,
        })
    }

    pub fn dataset(&self) -> &TourDataset {
        &self.dataset
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Node ids in authored order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PhotoNode> {
        self.order.iter().filter_map(|id| self.get_node(id))
    }

    pub fn get_node(&self, node_id: &str) -> Option<&PhotoNode> {
        let slot = self.nodes.get(node_id)?;
        self.area_at(slot.area)?.photos.get(slot.photo)
    }

    /// Area that contains `node_id`.
    pub fn get_area(&self, node_id: &str) -> Option<&Area> {
        let slot = self.nodes.get(node_id)?;
        self.area_at(slot.area)
    }

    pub fn area_kind(&self, node_id: &str) -> Option<AreaKind> {
        let slot = self.nodes.get(node_id)?;
        self.areas.get(slot.area).map(|a| a.kind)
    }

    /// Every area, floors first, then elevators.
    pub fn areas(&self) -> impl Iterator<Item = (AreaKind, &Area)> {
        self.areas
            .iter()
            .filter_map(|slot| Some((slot.kind, self.list(slot.kind).get(slot.index)?)))
    }

    /// Follows `key` from `node_id`.
    ///
    /// Destinations missing from the graph are dropped; an edge left with no
    /// destination resolves to `None`.
    pub fn resolve_edge(&self, node_id: &str, key: DirectionKey) -> Option<EdgeTarget> {
        let entry = self.get_node(node_id)?.direction(key)?;
        self.resolve_entry(entry)
    }

    pub(crate) fn resolve_entry(&self, entry: &DirectionEntry) -> Option<EdgeTarget> {
        let mut ids: Vec<String> = entry
            .targets()
            .into_iter()
            .filter(|id| {
                let known = self.contains(id);
                if !known {
                    warn!(destination = %id, "dropping edge to unknown node");
                }
                known
            })
            .map(str::to_string)
            .collect();
        match ids.len() {
            0 => None,
            1 => ids.pop().map(EdgeTarget::One),
            _ => Some(EdgeTarget::Many(ids)),
        }
    }

    /// Outgoing neighbours in a stable order: direction keys first, then
    /// hotspot destinations. Duplicates are removed.
    pub fn neighbours(&self, node_id: &str) -> Vec<&str> {
        let Some(node) = self.get_node(node_id) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = Vec::new();
        let mut push = |id: &str| {
            if let Some(existing) = self.nodes.get_key_value(id).map(|(k, _)| k.as_str())
                && !out.contains(&existing)
            {
                out.push(existing);
            }
        };
        for entry in node.directions.values() {
            for id in entry.targets() {
                push(id);
            }
        }
        for hotspot in &node.hotspots {
            if let Some(dest) = hotspot.destination.as_deref() {
                push(dest);
            } else if let Some(entry) = hotspot
                .direction
                .direction_key()
                .and_then(|k| node.direction(k))
            {
                for id in entry.targets() {
                    push(id);
                }
            }
        }
        out
    }

    fn area_at(&self, slot: usize) -> Option<&Area> {
        let slot = self.areas.get(slot)?;
        self.list(slot.kind).get(slot.index)
    }

    fn list(&self, kind: AreaKind) -> &[Area] {
        match kind {
            AreaKind::Floor => &self.dataset.areas,
            AreaKind::Elevator => &self.dataset.elevators,
        }
    }
}
