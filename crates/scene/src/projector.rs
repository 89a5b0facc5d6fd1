use std::collections::BTreeSet;

use formats::{ArrowConfig, HotspotKind, MarkerConfig};
use foundation::math::Vec3;
use gpu::{MeshKind, ResourceKind};
use graph::LocationGraph;
use runtime::{Generation, GenerationCounter};
use tracing::{debug, warn};

use crate::World;
use crate::arrows::{arrow_position, arrow_visible};
use crate::components::{Drawable, Interaction, Shape, Transform, Visibility};
use crate::entity::EntityId;
use crate::markers::{MarkerKind, marker_scale};

/// Hidden-location markers for the race game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceState {
    pub enabled: bool,
    pub found: BTreeSet<String>,
}

impl RaceState {
    fn shows(&self, id: &str) -> bool {
        self.enabled && !self.found.contains(id)
    }
}

/// One marker to construct.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub kind: MarkerKind,
    /// Sphere-root space for hotspots, world space for arrows.
    pub position: Vec3,
    pub icon: String,
    pub interaction: Interaction,
}

/// Marker set for one node, tagged with the generation it was started in.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    pub generation: Generation,
    pub node_id: String,
    pub specs: Vec<MarkerSpec>,
}

impl BuildRequest {
    /// Distinct icon assets the build needs, sorted.
    pub fn icon_paths(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.specs.iter().map(|s| s.icon.as_str()).collect();
        set.into_iter().collect()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Applied { markers: usize },
    /// A newer build started meanwhile; the constructed markers were disposed.
    Stale { disposed: usize },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacedMarker {
    pub entity: EntityId,
    pub kind: MarkerKind,
    /// Compass heading for arrows.
    pub angle: Option<f64>,
}

/// Builds and maintains the interactive markers of the current node.
///
/// Key properties:
/// - Every rebuild bumps a generation and destroys the previous markers.
/// - Results of a build are attached only if their generation is still current.
/// - Per-frame updates only touch scale and visibility.
#[derive(Debug)]
pub struct HotspotProjector {
    markers: MarkerConfig,
    arrows: ArrowConfig,
    sphere_root: EntityId,
    generation: GenerationCounter,
    applied: Option<Generation>,
    placed: Vec<PlacedMarker>,
}

impl HotspotProjector {
    pub fn new(markers: MarkerConfig, arrows: ArrowConfig, sphere_root: EntityId) -> Self {
        Self {
            markers,
            arrows,
            sphere_root,
            generation: GenerationCounter::new(),
            applied: None,
            placed: Vec::new(),
        }
    }

    /// Moves the projector onto a freshly spawned sphere root. Generations
    /// keep counting, so builds started before the move can never match one
    /// started after it.
    pub fn reattach(&mut self, world: &mut World, sphere_root: EntityId) -> usize {
        let disposed = self.clear(world);
        self.generation.bump();
        self.applied = None;
        self.sphere_root = sphere_root;
        disposed
    }

    pub fn placed(&self) -> &[PlacedMarker] {
        &self.placed
    }

    pub fn generation(&self) -> Generation {
        self.generation.current()
    }

    /// Starts a rebuild for `node_id`: invalidates in-flight builds, disposes
    /// the current markers and lists what to construct.
    pub fn begin_build(
        &mut self,
        world: &mut World,
        graph: &LocationGraph,
        node_id: &str,
        race: &RaceState,
    ) -> BuildRequest {
        let generation = self.generation.bump();
        self.clear(world);

        let specs = match graph.get_node(node_id) {
            Some(_) => self.marker_specs(graph, node_id, race),
            None => Vec::new(),
        };
        debug!(
            node = node_id,
            generation = generation.0,
            markers = specs.len(),
            "hotspot build started"
        );
        BuildRequest {
            generation,
            node_id: node_id.to_string(),
            specs,
        }
    }

    /// Constructs the markers of `request`. `icon_ready` reports whether an
    /// icon texture is available; missing icons fall back to flat colour.
    pub fn finish_build(
        &mut self,
        world: &mut World,
        request: &BuildRequest,
        icon_ready: impl Fn(&str) -> bool,
    ) -> BuildOutcome {
        let staged: Vec<PlacedMarker> = request
            .specs
            .iter()
            .map(|spec| self.construct(world, spec, icon_ready(&spec.icon)))
            .collect();

        let current = self.generation.is_current(request.generation)
            && self.applied != Some(request.generation);
        if !current {
            let disposed = staged
                .iter()
                .map(|m| world.despawn_recursive(m.entity))
                .sum();
            debug!(
                generation = request.generation.0,
                disposed, "discarded stale hotspot build"
            );
            return BuildOutcome::Stale { disposed };
        }

        for marker in &staged {
            if marker.kind != MarkerKind::Arrow {
                world.set_parent(marker.entity, Some(self.sphere_root));
            }
        }
        self.applied = Some(request.generation);
        self.placed = staged;
        BuildOutcome::Applied {
            markers: self.placed.len(),
        }
    }

    /// Removes every marker. Returns the number of resources disposed.
    pub fn clear(&mut self, world: &mut World) -> usize {
        self.placed
            .drain(..)
            .map(|m| world.despawn_recursive(m.entity))
            .sum()
    }

    /// Per-frame update from the live camera.
    pub fn update(&self, world: &mut World, camera_lon: f64, fov: f64, touch: bool) {
        for marker in &self.placed {
            let scale = marker_scale(marker.kind, fov, touch, &self.markers);
            if let Some(t) = world.transform_mut(marker.entity) {
                t.scale = Vec3::splat(scale);
            }
            if let Some(angle) = marker.angle {
                let visible = arrow_visible(camera_lon, angle, &self.arrows);
                world.set_visibility(marker.entity, Visibility::from_bool(visible));
            }
        }
    }

    fn marker_specs(&self, graph: &LocationGraph, node_id: &str, race: &RaceState) -> Vec<MarkerSpec> {
        let Some(node) = graph.get_node(node_id) else {
            return Vec::new();
        };
        let mut specs = Vec::new();

        for (direction, angle, destination) in node.compass_edges() {
            if !graph.contains(destination) {
                warn!(node = node_id, %direction, destination, "arrow points at unknown node");
                continue;
            }
            specs.push(MarkerSpec {
                kind: MarkerKind::Arrow,
                position: arrow_position(angle, &self.arrows),
                icon: MarkerKind::Arrow.icon_path(&self.markers.icon_root),
                interaction: Interaction::Arrow {
                    direction,
                    destination: destination.to_string(),
                    angle,
                },
            });
        }

        for hotspot in &node.hotspots {
            let kind = MarkerKind::from_hotspot(hotspot.direction);
            let position = hotspot.position.to_vec3();
            let interaction = match hotspot.direction {
                HotspotKind::HiddenLocation => {
                    let Some(id) = hotspot.id.as_deref() else {
                        continue;
                    };
                    if !race.shows(id) {
                        continue;
                    }
                    Interaction::HiddenLocation {
                        id: id.to_string(),
                        name: hotspot.name.clone().unwrap_or_default(),
                        description: hotspot.description.clone().unwrap_or_default(),
                    }
                }
                HotspotKind::Information => Interaction::Information {
                    title: hotspot.name.clone(),
                    description: hotspot.description.clone(),
                },
                other => {
                    let direction = other.direction_key();
                    let destinations: Vec<String> = match hotspot.destination.as_deref() {
                        Some(dest) if graph.contains(dest) => vec![dest.to_string()],
                        Some(_) => Vec::new(),
                        None => direction
                            .and_then(|key| graph.resolve_edge(node_id, key))
                            .map(|target| target.candidates().into_iter().map(str::to_string).collect())
                            .unwrap_or_default(),
                    };
                    Interaction::Navigation {
                        kind,
                        direction,
                        destinations,
                        original_position: position,
                    }
                }
            };
            specs.push(MarkerSpec {
                kind,
                position,
                icon: kind.icon_path(&self.markers.icon_root),
                interaction,
            });
        }
        specs
    }

    /// Spawns a detached marker group for `spec`.
    fn construct(&self, world: &mut World, spec: &MarkerSpec, icon_ready: bool) -> PlacedMarker {
        let group = world.spawn();
        world.set_transform(group, Transform::facing(spec.position, Vec3::ZERO));
        world.set_interaction(group, spec.interaction.clone());

        if !icon_ready {
            warn!(icon = %spec.icon, "icon unavailable, using untextured marker");
        }

        let angle = match spec.interaction {
            Interaction::Arrow { angle, .. } => Some(angle),
            _ => None,
        };

        if spec.kind == MarkerKind::Arrow {
            let size = self.arrows.size;
            let face = world.spawn_child(group);
            world.set_shape(face, Shape::quad(1.0));
            world.set_drawable(
                face,
                if icon_ready {
                    Drawable::icon(spec.icon.clone())
                } else {
                    Drawable::mesh(MeshKind::Quad, spec.kind.color())
                },
            );
            world.set_transform(face, Transform::identity().with_scale(Vec3::new(size, size, 1.0)));
            world.attach_resource(face, ResourceKind::Geometry);
            world.attach_resource(face, ResourceKind::Material);
        } else {
            let radius = self.markers.body_radius;
            let body = world.spawn_child(group);
            world.set_transform(body, Transform::identity().with_scale(Vec3::splat(radius)));
            world.set_shape(body, Shape::sphere(1.0));
            world.set_drawable(body, Drawable::mesh(MeshKind::Sphere, spec.kind.color()));
            world.attach_resource(body, ResourceKind::Geometry);
            world.attach_resource(body, ResourceKind::Material);

            if icon_ready {
                let size = self.markers.icon_size;
                let icon = world.spawn_child(group);
                world.set_transform(
                    icon,
                    Transform::translate(Vec3::new(0.0, 0.0, radius * 1.05))
                        .with_scale(Vec3::new(size, size, 1.0)),
                );
                world.set_drawable(icon, Drawable::icon(spec.icon.clone()));
                world.attach_resource(icon, ResourceKind::Geometry);
                world.attach_resource(icon, ResourceKind::Material);
            }
        }

        PlacedMarker {
            entity: group,
            kind: spec.kind,
            angle,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::prefabs::spawn_panorama_sphere;
    use formats::TourDataset;
    use pretty_assertions::assert_eq;

    pub(crate) fn sample_graph() -> LocationGraph {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../apps/viewer_web/assets/tour.json");
        LocationGraph::new(TourDataset::from_path(path).expect("load")).expect("index")
    }

    fn setup() -> (World, HotspotProjector, LocationGraph) {
        let mut world = World::new();
        let root = spawn_panorama_sphere(&mut world);
        let projector = HotspotProjector::new(MarkerConfig::default(), ArrowConfig::default(), root);
        (world, projector, sample_graph())
    }

    /// World with the markers of `node_id` applied.
    pub(crate) fn built(node_id: &str, race: &RaceState) -> (World, HotspotProjector, LocationGraph) {
        let (mut world, mut projector, graph) = setup();
        let request = projector.begin_build(&mut world, &graph, node_id, race);
        projector.finish_build(&mut world, &request, |_| true);
        (world, projector, graph)
    }

    #[test]
    fn builds_arrows_and_hotspots_for_a_node() {
        let (mut world, mut projector, graph) = setup();
        let request = projector.begin_build(&mut world, &graph, "n-f1-mid-7", &RaceState::default());
        // back arrow + two elevator hotspots; hidden location needs race mode.
        assert_eq!(request.specs.len(), 3);
        assert_eq!(
            request.icon_paths(),
            vec!["/icons/arrow.svg", "/icons/elevator.svg"]
        );

        let outcome = projector.finish_build(&mut world, &request, |_| true);
        assert_eq!(outcome, BuildOutcome::Applied { markers: 3 });

        let elevator = projector
            .placed()
            .iter()
            .find(|m| m.kind == MarkerKind::Elevator)
            .expect("elevator marker");
        match world.interaction(elevator.entity) {
            Some(Interaction::Navigation { destinations, .. }) => {
                assert_eq!(destinations, &vec!["elev-n-f1".to_string()]);
            }
            other => panic!("unexpected interaction: {other:?}"),
        }
        // Parented to the mirrored sphere root.
        let p = world.world_matrix(elevator.entity).transform_point(Vec3::ZERO);
        assert!(p.x > 0.0);
    }

    #[test]
    fn hidden_locations_follow_race_state() {
        let (mut world, mut projector, graph) = setup();
        let mut race = RaceState {
            enabled: true,
            ..RaceState::default()
        };
        let request = projector.begin_build(&mut world, &graph, "n-f1-mid-7", &race);
        assert_eq!(request.specs.len(), 4);

        race.found.insert("hidden-clock".to_string());
        let request = projector.begin_build(&mut world, &graph, "n-f1-mid-7", &race);
        assert_eq!(request.specs.len(), 3);
    }

    #[test]
    fn destinations_fall_back_to_direction_lookup() {
        let (mut world, mut projector, graph) = setup();
        let request = projector.begin_build(&mut world, &graph, "n-f1-stairs", &RaceState::default());
        let stairs = request
            .specs
            .iter()
            .find(|s| s.kind == MarkerKind::StairsUp)
            .expect("stairs");
        assert!(matches!(
            &stairs.interaction,
            Interaction::Navigation { destinations, .. } if destinations == &vec!["n-f2-stairs".to_string()]
        ));
    }

    #[test]
    fn stale_builds_are_disposed_not_attached() {
        let (mut world, mut projector, graph) = setup();
        let first = projector.begin_build(&mut world, &graph, "n-f1-mid-7", &RaceState::default());
        let second = projector.begin_build(&mut world, &graph, "n-f1-mid-6", &RaceState::default());

        let live_before = world.ledger().live_count();
        let outcome = projector.finish_build(&mut world, &first, |_| true);
        assert!(matches!(outcome, BuildOutcome::Stale { disposed } if disposed > 0));
        assert_eq!(world.ledger().live_count(), live_before);
        assert!(projector.placed().is_empty());

        assert!(matches!(
            projector.finish_build(&mut world, &second, |_| true),
            BuildOutcome::Applied { .. }
        ));
        // Applying the same request twice does not duplicate markers.
        assert!(matches!(
            projector.finish_build(&mut world, &second, |_| true),
            BuildOutcome::Stale { .. }
        ));
    }

    #[test]
    fn rebuilding_same_node_does_not_leak() {
        let (mut world, mut projector, graph) = setup();
        let race = RaceState::default();

        let request = projector.begin_build(&mut world, &graph, "n-f1-mid-7", &race);
        projector.finish_build(&mut world, &request, |_| true);
        let markers = projector.placed().len();
        let live = world.ledger().live_count();
        let entities = world.entity_count();

        let request = projector.begin_build(&mut world, &graph, "n-f1-mid-7", &race);
        projector.finish_build(&mut world, &request, |_| true);
        assert_eq!(projector.placed().len(), markers);
        assert_eq!(world.ledger().live_count(), live);
        assert_eq!(world.entity_count(), entities);

        let geometry = world.ledger().counts(ResourceKind::Geometry);
        let material = world.ledger().counts(ResourceKind::Material);
        assert_eq!(geometry.live(), material.live());
        assert!(geometry.disposed > 0);
    }

    #[test]
    fn icon_failure_falls_back_to_plain_marker() {
        let (mut world, mut projector, graph) = setup();
        let request = projector.begin_build(&mut world, &graph, "n-f1-mid-7", &RaceState::default());
        projector.finish_build(&mut world, &request, |path| !path.ends_with("elevator.svg"));

        let elevator = projector
            .placed()
            .iter()
            .find(|m| m.kind == MarkerKind::Elevator)
            .expect("elevator marker");
        let children = world.children(elevator.entity);
        assert_eq!(children.len(), 1);
        assert!(matches!(
            world.drawable(children[0]),
            Some(Drawable::Mesh { icon: None, .. })
        ));
    }

    #[test]
    fn update_scales_markers_and_gates_arrows() {
        let mut world = World::new();
        let root = spawn_panorama_sphere(&mut world);
        let arrows = ArrowConfig {
            heading_gated: true,
            ..ArrowConfig::default()
        };
        let mut projector = HotspotProjector::new(MarkerConfig::default(), arrows, root);
        let graph = sample_graph();
        let request = projector.begin_build(&mut world, &graph, "n-f1-mid-7", &RaceState::default());
        projector.finish_build(&mut world, &request, |_| true);

        projector.update(&mut world, 0.0, 20.0, false);
        let arrow = projector.placed()[0];
        assert_eq!(arrow.kind, MarkerKind::Arrow);
        assert!(!world.is_visible(arrow.entity));
        let elevator = projector.placed()[1];
        let scale = world.transform(elevator.entity).expect("transform").scale;
        assert!((scale.x - 1.5).abs() < 1e-12);

        projector.update(&mut world, 175.0, 20.0, false);
        assert!(world.is_visible(arrow.entity));
    }
}
