use foundation::handles::Handle;
use foundation::math::Mat4;
use gpu::{RenderCommand, RenderFrame, ResourceId, ResourceKind, ResourceLedger};

use crate::components::{Drawable, Interaction, Shape, Transform, Visibility};
use crate::entity::EntityId;

/// Scene graph with per-component columns indexed by entity slot.
///
/// Slots are recycled after despawn; the handle generation keeps stale ids
/// from aliasing the new occupant. GPU resources attached to an entity are
/// tracked in the world's [`ResourceLedger`] and disposed with it.
#[derive(Debug, Default)]
pub struct World {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    parents: Vec<Option<EntityId>>,
    children: Vec<Vec<EntityId>>,
    transforms: Vec<Option<Transform>>,
    visibility: Vec<Option<Visibility>>,
    shapes: Vec<Option<Shape>>,
    drawables: Vec<Option<Drawable>>,
    interactions: Vec<Option<Interaction>>,
    resources: Vec<Vec<ResourceId>>,
    ledger: ResourceLedger,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        if let Some(index) = self.free.pop() {
            let idx = index as usize;
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.alive[idx] = true;
            return EntityId(Handle::new(index, self.generations[idx]));
        }
        let idx = self.alive.len();
        self.generations.push(0);
        self.alive.push(true);
        self.parents.push(None);
        self.children.push(Vec::new());
        self.transforms.push(None);
        self.visibility.push(None);
        self.shapes.push(None);
        self.drawables.push(None);
        self.interactions.push(None);
        self.resources.push(Vec::new());
        EntityId(Handle::new(idx as u32, 0))
    }

    pub fn spawn_child(&mut self, parent: EntityId) -> EntityId {
        let child = self.spawn();
        self.set_parent(child, Some(parent));
        child
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.slot(entity).is_some()
    }

    pub fn entity_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) {
        let Some(c) = self.slot(child) else { return };
        if let Some(old) = self.parents[c].take()
            && let Some(p) = self.slot(old)
        {
            self.children[p].retain(|e| *e != child);
        }
        let Some(parent) = parent else { return };
        let Some(p) = self.slot(parent) else { return };
        self.parents[c] = Some(parent);
        self.children[p].push(child);
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.slot(entity).and_then(|i| self.parents[i])
    }

    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        match self.slot(entity) {
            Some(i) => &self.children[i],
            None => &[],
        }
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        if let Some(i) = self.slot(entity) {
            self.transforms[i] = Some(transform);
        }
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.slot(entity).and_then(|i| self.transforms[i])
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        let i = self.slot(entity)?;
        self.transforms[i].as_mut()
    }

    pub fn set_visibility(&mut self, entity: EntityId, visibility: Visibility) {
        if let Some(i) = self.slot(entity) {
            self.visibility[i] = Some(visibility);
        }
    }

    /// Visible itself and through every ancestor. Entities without a
    /// visibility component count as visible.
    pub fn is_visible(&self, entity: EntityId) -> bool {
        let mut cursor = Some(entity);
        while let Some(e) = cursor {
            let Some(i) = self.slot(e) else { return false };
            if !self.visibility[i].unwrap_or_default().visible {
                return false;
            }
            cursor = self.parents[i];
        }
        true
    }

    pub fn set_shape(&mut self, entity: EntityId, shape: Shape) {
        if let Some(i) = self.slot(entity) {
            self.shapes[i] = Some(shape);
        }
    }

    pub fn set_drawable(&mut self, entity: EntityId, drawable: Drawable) {
        if let Some(i) = self.slot(entity) {
            self.drawables[i] = Some(drawable);
        }
    }

    pub fn drawable(&self, entity: EntityId) -> Option<&Drawable> {
        self.slot(entity).and_then(|i| self.drawables[i].as_ref())
    }

    pub fn set_interaction(&mut self, entity: EntityId, interaction: Interaction) {
        if let Some(i) = self.slot(entity) {
            self.interactions[i] = Some(interaction);
        }
    }

    pub fn interaction(&self, entity: EntityId) -> Option<&Interaction> {
        self.slot(entity).and_then(|i| self.interactions[i].as_ref())
    }

    /// Nearest entity, starting at `entity` and walking up the parents, that
    /// carries an [`Interaction`].
    pub fn interaction_ancestor(&self, entity: EntityId) -> Option<(EntityId, &Interaction)> {
        let mut cursor = Some(entity);
        while let Some(e) = cursor {
            let i = self.slot(e)?;
            if let Some(interaction) = self.interactions[i].as_ref() {
                return Some((e, interaction));
            }
            cursor = self.parents[i];
        }
        None
    }

    /// Allocates a GPU resource owned by `entity`.
    pub fn attach_resource(&mut self, entity: EntityId, kind: ResourceKind) -> Option<ResourceId> {
        let i = self.slot(entity)?;
        let id = self.ledger.allocate(kind);
        self.resources[i].push(id);
        Some(id)
    }

    /// Disposes one resource owned by `entity`.
    pub fn release_resource(&mut self, entity: EntityId, id: ResourceId) -> bool {
        let Some(i) = self.slot(entity) else {
            return false;
        };
        let before = self.resources[i].len();
        self.resources[i].retain(|r| *r != id);
        before != self.resources[i].len() && self.ledger.dispose(id)
    }

    pub fn resources(&self, entity: EntityId) -> &[ResourceId] {
        match self.slot(entity) {
            Some(i) => &self.resources[i],
            None => &[],
        }
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Removes `entity` and its whole subtree, disposing their resources.
    /// Returns the number of resources disposed.
    pub fn despawn_recursive(&mut self, entity: EntityId) -> usize {
        if self.slot(entity).is_none() {
            return 0;
        }
        self.set_parent(entity, None);

        let mut disposed = 0;
        let mut stack = vec![entity];
        while let Some(e) = stack.pop() {
            let Some(i) = self.slot(e) else { continue };
            stack.extend(std::mem::take(&mut self.children[i]));
            for id in std::mem::take(&mut self.resources[i]) {
                if self.ledger.dispose(id) {
                    disposed += 1;
                }
            }
            self.parents[i] = None;
            self.transforms[i] = None;
            self.visibility[i] = None;
            self.shapes[i] = None;
            self.drawables[i] = None;
            self.interactions[i] = None;
            self.alive[i] = false;
            self.free.push(i as u32);
        }
        disposed
    }

    /// Despawns every entity. Returns the number of resources disposed.
    pub fn clear(&mut self) -> usize {
        let roots: Vec<EntityId> = self
            .live_entities()
            .filter(|e| self.parent(*e).is_none())
            .collect();
        roots.into_iter().map(|e| self.despawn_recursive(e)).sum()
    }

    /// Local-to-world matrix.
    pub fn world_matrix(&self, entity: EntityId) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        let mut cursor = Some(entity);
        while let Some(e) = cursor {
            let Some(i) = self.slot(e) else { break };
            if let Some(t) = self.transforms[i] {
                m = t.matrix().mul(&m);
            }
            cursor = self.parents[i];
        }
        m
    }

    /// Visible entities with a pick shape, in slot order.
    pub fn pickables(&self) -> Vec<(EntityId, Mat4, Shape)> {
        self.live_entities()
            .filter(|e| self.is_visible(*e))
            .filter_map(|e| {
                let shape = self.shapes[e.index() as usize]?;
                Some((e, self.world_matrix(e), shape))
            })
            .collect()
    }

    /// Draw list for the visible drawables, in slot order.
    pub fn render_frame(&self) -> RenderFrame {
        let mut frame = RenderFrame::default();
        for e in self.live_entities() {
            let Some(drawable) = self.drawables[e.index() as usize].as_ref() else {
                continue;
            };
            if !self.is_visible(e) {
                continue;
            }
            let model = self.world_matrix(e);
            frame.commands.push(match drawable {
                Drawable::Panorama => RenderCommand::Panorama { model },
                Drawable::Mesh { mesh, color, icon } => RenderCommand::Mesh {
                    model,
                    mesh: *mesh,
                    color: *color,
                    icon: icon.clone(),
                },
            });
        }
        frame
    }

    fn live_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| EntityId(Handle::new(i as u32, self.generations[i])))
    }

    fn slot(&self, entity: EntityId) -> Option<usize> {
        let i = entity.index() as usize;
        let alive = *self.alive.get(i)?;
        (alive && self.generations[i] == entity.0.generation()).then_some(i)
    }
}
