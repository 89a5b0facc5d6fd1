use foundation::bounds::Aabb3;
use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{Mat4, Vec3};

use crate::World;
use crate::components::Shape;
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
        }
    }
}

/// Deterministic ray picking over visible pick shapes.
///
/// Ordering contract:
/// - If multiple entities are hit at the same distance, the lower `EntityId::index()` wins.
/// - Otherwise, the closest hit along the (normalized) ray wins.
///
/// Notes:
/// - Spheres are tested exactly (radius scaled by the largest world axis scale).
/// - Quads are tested against the world-space box around their corners.
/// - Entities hidden directly or through an ancestor are skipped.
pub fn pick_ray(world: &World, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let dir = ray.dir.normalized()?;
    let mut best: Option<(f64, EntityId)> = None;

    for (entity, matrix, shape) in world.pickables() {
        let Some(t) = hit_shape(ray.origin, dir, &matrix, shape, opts.max_distance) else {
            continue;
        };

        best = match best {
            None => Some((t, entity)),
            Some((bt, be)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| entity.index().cmp(&be.index()));
                if ord.is_lt() {
                    Some((t, entity))
                } else {
                    Some((bt, be))
                }
            }
        };
    }

    let (t, entity) = best?;
    Some(PickHit {
        entity,
        distance: t,
        point: ray.origin + dir * t,
    })
}

/// Screen picking wrapper.
///
/// The caller supplies a deterministic screen->ray mapping via `make_ray`.
pub fn pick_screen<F>(
    world: &World,
    x_px: f64,
    y_px: f64,
    mut make_ray: F,
    opts: PickOptions,
) -> Option<PickHit>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let ray = make_ray(x_px, y_px)?;
    pick_ray(world, ray, opts)
}

fn hit_shape(origin: Vec3, dir: Vec3, matrix: &Mat4, shape: Shape, max_t: f64) -> Option<f64> {
    match shape {
        Shape::Sphere { radius } => {
            let centre = matrix.transform_point(Vec3::ZERO);
            ray_sphere_hit_t(origin, dir, centre, radius * matrix.max_scale(), max_t)
        }
        Shape::Quad { width, height } => {
            let (hw, hh) = (width * 0.5, height * 0.5);
            let corners = [
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ]
            .map(|c| matrix.transform_point(c));
            let bounds = Aabb3::from_points(&corners)?;
            ray_aabb_hit_t(origin, dir, bounds, 0.0, max_t)
        }
    }
}

fn ray_sphere_hit_t(origin: Vec3, dir: Vec3, centre: Vec3, radius: f64, max_t: f64) -> Option<f64> {
    let oc = origin - centre;
    let b = oc.dot(dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let near = -b - root;
    let t = if near >= 0.0 { near } else { -b + root };
    (t >= 0.0 && t <= max_t).then_some(t)
}

fn ray_aabb_hit_t(
    origin: Vec3,
    dir: Vec3,
    bounds: Aabb3,
    mut t_min: f64,
    mut t_max: f64,
) -> Option<f64> {
    // Slabs intersection; returns entry distance.
    for axis in 0..3 {
        let (o, d, min, max) = match axis {
            0 => (origin.x, dir.x, bounds.min.x, bounds.max.x),
            1 => (origin.y, dir.y, bounds.min.y, bounds.max.y),
            _ => (origin.z, dir.z, bounds.min.z, bounds.max.z),
        };

        if d.abs() < 1e-12 {
            if o < min || o > max {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (min - o) * inv;
        let mut t2 = (max - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_max < t_min {
            return None;
        }
    }

    Some(t_min.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::{PickOptions, Ray, pick_ray, pick_screen};
    use crate::World;
    use crate::components::{Shape, Transform, Visibility};
    use foundation::math::Vec3;

    fn sphere_at(world: &mut World, x: f64, radius: f64) -> crate::entity::EntityId {
        let e = world.spawn();
        world.set_transform(e, Transform::translate(Vec3::new(x, 0.0, 0.0)));
        world.set_shape(e, Shape::sphere(radius));
        e
    }

    #[test]
    fn ray_picks_nearest_hit() {
        let mut world = World::new();
        let far = sphere_at(&mut world, 10.0, 1.0);
        let near = sphere_at(&mut world, 5.0, 1.0);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let hit = pick_ray(&world, ray, PickOptions::default()).expect("hit");
        assert_eq!(hit.entity, near);
        assert!((hit.distance - 4.0).abs() < 1e-9);
        assert_ne!(hit.entity, far);
    }

    #[test]
    fn tie_breaks_by_entity_index() {
        let mut world = World::new();
        let first = sphere_at(&mut world, 5.0, 1.0);
        let _second = sphere_at(&mut world, 5.0, 1.0);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let hit = pick_ray(&world, ray, PickOptions::default()).expect("hit");
        assert_eq!(hit.entity, first);
    }

    #[test]
    fn hidden_shapes_are_ignored() {
        let mut world = World::new();
        let near = sphere_at(&mut world, 5.0, 1.0);
        let far = sphere_at(&mut world, 10.0, 1.0);
        world.set_visibility(near, Visibility::hidden());

        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let hit = pick_ray(&world, ray, PickOptions::default()).expect("hit");
        assert_eq!(hit.entity, far);
    }

    #[test]
    fn parent_scale_grows_child_spheres() {
        let mut world = World::new();
        let root = world.spawn();
        world.set_transform(root, Transform::identity().with_scale(Vec3::splat(3.0)));
        let child = world.spawn_child(root);
        world.set_transform(child, Transform::translate(Vec3::new(10.0, 0.0, 0.0)));
        world.set_shape(child, Shape::sphere(1.0));

        // Centre at x=30 with radius 3: a ray at y=2.5 still hits.
        let ray = Ray::new(Vec3::new(0.0, 2.5, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(pick_ray(&world, ray, PickOptions::default()).is_some());
    }

    #[test]
    fn quads_are_hit_through_their_bounds() {
        let mut world = World::new();
        let quad = world.spawn();
        world.set_transform(
            quad,
            Transform::facing(Vec3::new(0.0, 0.0, -8.0), Vec3::ZERO),
        );
        world.set_shape(quad, Shape::quad(2.0));

        let hit = pick_screen(
            &world,
            0.0,
            0.0,
            |_, _| Some(Ray::new(Vec3::ZERO, Vec3::new(0.05, 0.05, -1.0))),
            PickOptions::default(),
        )
        .expect("hit");
        assert_eq!(hit.entity, quad);

        let miss = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(pick_ray(&world, miss, PickOptions::default()).is_none());
    }
}
