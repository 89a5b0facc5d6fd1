use std::fmt;

use formats::{DirectionEntry, DirectionKey, HotspotKind};
use tracing::warn;

use crate::LocationGraph;

/// Dataset problem found by [`LocationGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    DanglingEdge {
        node: String,
        key: DirectionKey,
        target: String,
    },
    EmptyEdge {
        node: String,
        key: DirectionKey,
    },
    DanglingHotspot {
        node: String,
        index: usize,
        target: String,
    },
    /// A navigation hotspot with no destination and no matching direction.
    UnresolvedHotspot {
        node: String,
        index: usize,
        kind: HotspotKind,
    },
    HiddenLocationWithoutId {
        node: String,
        index: usize,
    },
    EmptyImageUrl {
        node: String,
    },
    EmptyArea {
        area: String,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DanglingEdge { node, key, target } => {
                write!(f, "{node}: {key} points at unknown node {target}")
            }
            IntegrityIssue::EmptyEdge { node, key } => write!(f, "{node}: {key} has no destination"),
            IntegrityIssue::DanglingHotspot {
                node,
                index,
                target,
            } => write!(f, "{node}: hotspot #{index} points at unknown node {target}"),
            IntegrityIssue::UnresolvedHotspot { node, index, kind } => write!(
                f,
                "{node}: {} hotspot #{index} has no destination",
                kind.as_str()
            ),
            IntegrityIssue::HiddenLocationWithoutId { node, index } => {
                write!(f, "{node}: hidden location #{index} has no id")
            }
            IntegrityIssue::EmptyImageUrl { node } => write!(f, "{node}: empty image url"),
            IntegrityIssue::EmptyArea { area } => write!(f, "area {area} has no photos"),
        }
    }
}

/// Edge whose destination does not lead back with the reciprocal key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReciprocityIssue {
    pub from: String,
    pub key: DirectionKey,
    pub to: String,
    pub expected: DirectionKey,
}

impl fmt::Display for ReciprocityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -{}-> {} has no {} edge back",
            self.from, self.key, self.to, self.expected
        )
    }
}

impl LocationGraph {
    /// Walks every node and reports references that do not resolve.
    pub fn validate(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        for (_, area) in self.areas() {
            if area.photos.is_empty() {
                issues.push(IntegrityIssue::EmptyArea {
                    area: area.id.clone(),
                });
            }
        }

        for node in self.nodes() {
            if node.image_url.trim().is_empty() {
                issues.push(IntegrityIssue::EmptyImageUrl {
                    node: node.id.clone(),
                });
            }

            for (key, entry) in &node.directions {
                let targets = entry.targets();
                if targets.is_empty() {
                    issues.push(IntegrityIssue::EmptyEdge {
                        node: node.id.clone(),
                        key: *key,
                    });
                }
                for target in targets.into_iter().filter(|t| !self.contains(t)) {
                    issues.push(IntegrityIssue::DanglingEdge {
                        node: node.id.clone(),
                        key: *key,
                        target: target.to_string(),
                    });
                }
            }

            for (index, hotspot) in node.hotspots.iter().enumerate() {
                match hotspot.direction {
                    HotspotKind::Information => {}
                    HotspotKind::HiddenLocation => {
                        if hotspot.id.is_none() {
                            issues.push(IntegrityIssue::HiddenLocationWithoutId {
                                node: node.id.clone(),
                                index,
                            });
                        }
                    }
                    kind => {
                        if let Some(dest) = hotspot.destination.as_deref() {
                            if !self.contains(dest) {
                                issues.push(IntegrityIssue::DanglingHotspot {
                                    node: node.id.clone(),
                                    index,
                                    target: dest.to_string(),
                                });
                            }
                        } else if kind
                            .direction_key()
                            .and_then(|k| node.direction(k))
                            .is_none()
                        {
                            issues.push(IntegrityIssue::UnresolvedHotspot {
                                node: node.id.clone(),
                                index,
                                kind,
                            });
                        }
                    }
                }
            }
        }

        for issue in &issues {
            warn!(%issue, "dataset integrity");
        }
        issues
    }

    /// Reports edges whose destination does not lead back with the
    /// reciprocal key. Portal keys (elevator, door, floorN) are skipped.
    pub fn reciprocity_issues(&self) -> Vec<ReciprocityIssue> {
        let mut issues = Vec::new();
        for node in self.nodes() {
            for (key, entry) in &node.directions {
                let Some(expected) = key.reciprocal() else {
                    continue;
                };
                // Ambiguous edges cannot be expected to lead back.
                if !matches!(entry, DirectionEntry::Edge(_) | DirectionEntry::Single(_)) {
                    continue;
                }
                for target in entry.targets() {
                    let Some(dest) = self.get_node(target) else {
                        continue;
                    };
                    let leads_back = dest
                        .direction(expected)
                        .is_some_and(|back| back.targets().contains(&node.id.as_str()));
                    if !leads_back {
                        issues.push(ReciprocityIssue {
                            from: node.id.clone(),
                            key: *key,
                            to: target.to_string(),
                            expected,
                        });
                    }
                }
            }
        }
        issues
    }
}
