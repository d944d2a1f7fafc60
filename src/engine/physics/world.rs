use glam::Vec2;
use log::debug;
use rapier2d::prelude::*;
use std::collections::HashMap;

use super::body::{presets, to_vec2, to_vector};
use super::collision::{ordered_pair, CollisionEventQueue};
use crate::game::rig::{
    BodyPartRegistry, ColliderId, CollisionReport, ContactPhase, ContactPoint, PartId, Skeleton,
};

/// Physics-side mirror of one character rig: a kinematic body per body part
/// carrying that part's colliders
#[derive(Debug, Clone)]
pub struct RigBodies {
    /// Indexed by `PartId`
    part_bodies: Vec<RigidBodyHandle>,
    colliders: HashMap<ColliderHandle, ColliderId>,
    /// Indexed by `ColliderId`: handle, local offset, local angle
    placements: Vec<(ColliderHandle, Vec2, Real)>,
    facing: f32,
}

impl RigBodies {
    pub fn body(&self, part: PartId) -> Option<RigidBodyHandle> {
        self.part_bodies.get(part.0).copied()
    }

    /// The rig collider behind a rapier collider, if any
    pub fn collider(&self, handle: ColliderHandle) -> Option<ColliderId> {
        self.colliders.get(&handle).copied()
    }

    pub fn collider_handle(&self, collider: ColliderId) -> Option<ColliderHandle> {
        self.placements.get(collider.0).map(|(handle, _, _)| *handle)
    }

    pub fn len(&self) -> usize {
        self.part_bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.part_bodies.is_empty()
    }
}

/// Collider placement inside a part body; mirroring flips the part's local y axis
fn mirrored_placement(offset: Vec2, angle: Real, facing: f32) -> Isometry<Real> {
    if facing >= 0.0 {
        Isometry::new(to_vector(offset), angle)
    } else {
        Isometry::new(vector![offset.x, -offset.y], -angle)
    }
}

/// Physics world that manages all physics simulation
pub struct PhysicsWorld {
    /// Gravity vector (default: -9.81 m/s² in y-axis)
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Query pipeline for raycasts and sensor lookups
    query_pipeline: QueryPipeline,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    collision_event_queue: CollisionEventQueue,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::with_gravity(vector![0.0, -9.81])
    }

    pub fn with_gravity(gravity: Vector<Real>) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = 1.0 / 60.0;

        Self {
            gravity,
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            collision_event_queue: CollisionEventQueue::new(),
        }
    }

    /// Step the physics simulation forward by one timestep
    pub fn step(&mut self) {
        self.collision_event_queue.clear();
        let event_handler = &self.collision_event_queue;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            event_handler,
        );
    }

    pub fn add_rigid_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.rigid_body_set.insert(body)
    }

    pub fn add_collider(&mut self, collider: Collider, parent_handle: RigidBodyHandle) -> ColliderHandle {
        self.collider_set
            .insert_with_parent(collider, parent_handle, &mut self.rigid_body_set)
    }

    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.collider_set
            .remove(handle, &mut self.island_manager, &mut self.rigid_body_set, true);
    }

    pub fn get_rigid_body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    pub fn get_collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.collider_set.get(handle)
    }

    /// Linear velocity of the body carrying a collider (zero when it has none)
    pub fn collider_velocity(&self, handle: ColliderHandle) -> Vec2 {
        self.collider_set
            .get(handle)
            .and_then(|collider| collider.parent())
            .and_then(|body| self.rigid_body_set.get(body))
            .map_or(Vec2::ZERO, |body| to_vec2(*body.linvel()))
    }

    /// Create kinematic bodies and colliders for every part of a rig
    pub fn spawn_rig(&mut self, registry: &BodyPartRegistry, skeleton: &Skeleton) -> RigBodies {
        let facing = skeleton.facing();
        let part_bodies: Vec<RigidBodyHandle> = (0..registry.len())
            .map(|index| {
                let id = PartId(index);
                let body = presets::part_body(skeleton.world_position(id), skeleton.world_rotation(id));
                self.add_rigid_body(body)
            })
            .collect();

        let mut colliders = HashMap::with_capacity(registry.colliders().len());
        let mut placements = Vec::with_capacity(registry.colliders().len());
        for entry in registry.colliders() {
            let angle = entry.rotation_deg.to_radians();
            let mut collider = presets::part_collider(&entry.shape, entry.offset, angle);
            collider.set_position_wrt_parent(mirrored_placement(entry.offset, angle, facing));
            let handle = self.add_collider(collider, part_bodies[entry.part.0]);
            colliders.insert(handle, entry.id);
            placements.push((handle, entry.offset, angle));
        }

        debug!(
            "Spawned rig bodies: {} parts, {} colliders",
            part_bodies.len(),
            placements.len()
        );
        RigBodies {
            part_bodies,
            colliders,
            placements,
            facing,
        }
    }

    /// Move the part bodies to the skeleton's current pose for the next step
    pub fn sync_rig(&mut self, bodies: &mut RigBodies, skeleton: &Skeleton) {
        let facing = skeleton.facing();
        if facing != bodies.facing {
            for (handle, offset, angle) in &bodies.placements {
                if let Some(collider) = self.collider_set.get_mut(*handle) {
                    collider.set_position_wrt_parent(mirrored_placement(*offset, *angle, facing));
                }
            }
            bodies.facing = facing;
        }

        for (index, handle) in bodies.part_bodies.iter().enumerate() {
            let id = PartId(index);
            if let Some(body) = self.rigid_body_set.get_mut(*handle) {
                let target = Isometry::new(
                    to_vector(skeleton.world_position(id)),
                    skeleton.world_rotation(id),
                );
                body.set_next_kinematic_position(target);
            }
        }
    }

    /// Convert every contact pair touching the rig into a collision report
    pub fn contact_reports(&self, bodies: &RigBodies) -> Vec<CollisionReport> {
        let started = self.collision_event_queue.started_pairs();
        let mut reports = Vec::new();

        for pair in self.narrow_phase.contact_pairs() {
            let (rig_handle, rig_id, other_handle, rig_is_first) =
                match (bodies.collider(pair.collider1), bodies.collider(pair.collider2)) {
                    (Some(id), None) => (pair.collider1, id, pair.collider2, true),
                    (None, Some(id)) => (pair.collider2, id, pair.collider1, false),
                    _ => continue,
                };
            let Some(rig_collider) = self.collider_set.get(rig_handle) else {
                continue;
            };

            let rig_body = rig_collider.parent().and_then(|h| self.rigid_body_set.get(h));
            let other_body = self
                .collider_set
                .get(other_handle)
                .and_then(|c| c.parent())
                .and_then(|h| self.rigid_body_set.get(h));
            // Only pairs involving a dynamic body go through the solver
            let solved = rig_body.is_some_and(|b| b.is_dynamic()) || other_body.is_some_and(|b| b.is_dynamic());
            let other_mass = other_body.filter(|b| b.is_dynamic()).map(|b| b.mass());

            let mut contacts = Vec::new();
            let mut relative_velocity = None;
            for manifold in &pair.manifolds {
                // rapier's normal points from collider1 to collider2
                let normal = to_vec2(manifold.data.normal) * if rig_is_first { -1.0 } else { 1.0 };
                for point in &manifold.points {
                    if point.dist > 0.0 {
                        continue;
                    }
                    let local = if rig_is_first { point.local_p1 } else { point.local_p2 };
                    let world = rig_collider.position() * local;

                    if relative_velocity.is_none() {
                        let other = other_body.map_or(Vector::zeros(), |b| b.velocity_at_point(&world));
                        let own = rig_body.map_or(Vector::zeros(), |b| b.velocity_at_point(&world));
                        relative_velocity = Some(to_vec2(other - own));
                    }

                    contacts.push(ContactPoint {
                        collider: rig_id,
                        point: Vec2::new(world.x, world.y),
                        normal,
                        normal_impulse: if solved { point.data.impulse } else { f32::NAN },
                    });
                }
            }
            if contacts.is_empty() {
                continue;
            }

            let phase = if started.contains(&ordered_pair(pair.collider1, pair.collider2)) {
                ContactPhase::Enter
            } else {
                ContactPhase::Stay
            };
            reports.push(CollisionReport {
                phase,
                contacts,
                relative_velocity: relative_velocity.unwrap_or(Vec2::ZERO),
                other_mass,
            });
        }

        reports
    }

    /// Colliders currently overlapping a sensor
    pub fn intersections_with(&self, sensor: ColliderHandle) -> Vec<ColliderHandle> {
        self.narrow_phase
            .intersection_pairs_with(sensor)
            .filter(|(_, _, intersecting)| *intersecting)
            .map(|(a, b, _)| if a == sensor { b } else { a })
            .collect()
    }

    /// Distance to the first collider below `origin` within `max_distance`,
    /// ignoring the given collision groups
    pub fn ground_distance(&self, origin: Vec2, max_distance: Real, ignore: InteractionGroups) -> Option<Real> {
        let ray = Ray::new(point![origin.x, origin.y], vector![0.0, -1.0]);
        let filter = QueryFilter::default()
            .exclude_sensors()
            .groups(InteractionGroups::new(ignore.memberships, !ignore.memberships));
        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(_, toi)| toi)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
