use foundation::math::Vec3;
use gpu::ResourceKind;

use crate::World;
use crate::components::{Drawable, Transform};
use crate::entity::EntityId;

/// Spawns the photo sphere root.
///
/// The root is mirrored on X so the sphere faces inward; markers parented to
/// it share that mirror, which is the space hotspot positions are authored in.
pub fn spawn_panorama_sphere(world: &mut World) -> EntityId {
    let entity = world.spawn();
    world.set_transform(
        entity,
        Transform::identity().with_scale(Vec3::new(-1.0, 1.0, 1.0)),
    );
    world.set_drawable(entity, Drawable::Panorama);
    world.attach_resource(entity, ResourceKind::Geometry);
    world.attach_resource(entity, ResourceKind::Material);
    entity
}
