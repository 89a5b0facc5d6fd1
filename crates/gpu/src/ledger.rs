use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Texture,
    Geometry,
    Material,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub serial: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct KindCounts {
    pub allocated: u64,
    pub disposed: u64,
}

impl KindCounts {
    pub fn live(&self) -> u64 {
        self.allocated - self.disposed
    }
}

/// Book-keeping for GPU objects owned by the scene.
///
/// Every allocation gets an id; disposing the same id twice is ignored, so
/// allocation and disposal counts always pair up 1:1.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    next_serial: u64,
    live: BTreeSet<ResourceId>,
    counts: BTreeMap<ResourceKind, KindCounts>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, kind: ResourceKind) -> ResourceId {
        let id = ResourceId {
            kind,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        self.live.insert(id);
        self.counts.entry(kind).or_default().allocated += 1;
        id
    }

    /// Returns `false` if `id` was not live.
    pub fn dispose(&mut self, id: ResourceId) -> bool {
        if !self.live.remove(&id) {
            warn!(?id, "dispose of a resource that is not live");
            return false;
        }
        self.counts.entry(id.kind).or_default().disposed += 1;
        true
    }

    pub fn dispose_all(&mut self) -> usize {
        let ids: Vec<ResourceId> = self.live.iter().copied().collect();
        ids.into_iter().filter(|id| self.dispose(*id)).count()
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.contains(&id)
    }

    pub fn counts(&self, kind: ResourceKind) -> KindCounts {
        self.counts.get(&kind).copied().unwrap_or_default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
