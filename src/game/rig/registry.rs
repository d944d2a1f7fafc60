// Body part registry: resolves the designer configuration into an arena of
// parts, a collider ownership map and the matching skeleton.

use std::collections::HashMap;

use glam::Vec2;
use log::debug;
use parry2d::math::{Isometry, Vector};
use parry2d::shape::{Ball, Capsule, Cuboid, Shape};

use super::body_part::{BendTarget, BodyPart, ColliderId, PartId};
use super::config::{BendConfig, ColliderConfig, ColliderShape, RigConfig};
use super::error::RigError;
use super::skeleton::{Bone, Skeleton};

/// A collider owned by a body part
#[derive(Debug, Clone)]
pub struct ColliderEntry {
    pub id: ColliderId,
    pub name: String,
    pub part: PartId,
    pub shape: ColliderShape,
    /// Placement in the owning part's local space
    pub offset: Vec2,
    pub rotation_deg: f32,
}

/// Owns every body part of a character
#[derive(Debug, Clone)]
pub struct BodyPartRegistry {
    parts: Vec<BodyPart>,
    colliders: Vec<ColliderEntry>,
    part_names: HashMap<String, PartId>,
    collider_names: HashMap<String, ColliderId>,
}

impl BodyPartRegistry {
    /// Build the registry and its skeleton from a rig description
    pub fn build(config: &RigConfig) -> Result<(Self, Skeleton), RigError> {
        if !(config.body_mass.is_finite() && config.body_mass > 0.0) {
            return Err(RigError::NonPositiveMass(config.body_mass));
        }

        let mut part_names = HashMap::with_capacity(config.parts.len());
        for (index, def) in config.parts.iter().enumerate() {
            if part_names.insert(def.name.clone(), PartId(index)).is_some() {
                return Err(RigError::DuplicatePart(def.name.clone()));
            }
            if !(def.weakness.is_finite() && def.weakness > 0.0) {
                return Err(RigError::InvalidWeakness {
                    part: def.name.clone(),
                    weakness: def.weakness,
                });
            }
        }

        let mut parents = Vec::with_capacity(config.parts.len());
        for def in &config.parts {
            let parent = match &def.parent {
                Some(name) => Some(*part_names.get(name).ok_or_else(|| RigError::UnknownParent {
                    part: def.name.clone(),
                    parent: name.clone(),
                })?),
                None => None,
            };
            parents.push(parent);
        }
        let order = traversal_order(config, &parents)?;

        let mut parts = Vec::with_capacity(config.parts.len());
        let mut colliders = Vec::new();
        let mut collider_names: HashMap<String, ColliderId> = HashMap::new();
        for (index, def) in config.parts.iter().enumerate() {
            let id = PartId(index);
            for collider in &def.colliders {
                if let Some(existing) = collider_names.get(&collider.name) {
                    let owner: &ColliderEntry = &colliders[existing.0];
                    return Err(RigError::DuplicateCollider {
                        collider: collider.name.clone(),
                        first: config.parts[owner.part.0].name.clone(),
                        second: def.name.clone(),
                    });
                }
                let collider_id = ColliderId(colliders.len());
                collider_names.insert(collider.name.clone(), collider_id);
                colliders.push(ColliderEntry {
                    id: collider_id,
                    name: collider.name.clone(),
                    part: id,
                    shape: collider.shape,
                    offset: collider.offset,
                    rotation_deg: collider.rotation_deg,
                });
            }

            let tip = tip_vector(&def.colliders);
            debug!("Body part '{}' tip at {:?}", def.name, tip);
            let mut part = BodyPart::new(&def.name, parents[index], tip, def.weakness, def.is_leg);
            part.bend_left = resolve_bends(&def.name, &def.bend_left, &part_names)?;
            part.bend_right = resolve_bends(&def.name, &def.bend_right, &part_names)?;
            parts.push(part);
        }

        let legs: Vec<PartId> = (0..parts.len())
            .map(PartId)
            .filter(|id| parts[id.0].is_leg)
            .collect();
        for &leg in &legs {
            parts[leg.0].linked_legs = legs.iter().copied().filter(|&other| other != leg).collect();
        }

        let bones = config
            .parts
            .iter()
            .zip(&parents)
            .map(|(def, parent)| Bone::new(*parent, def.rest_offset, def.rest_rotation_deg.to_radians()))
            .collect();
        let skeleton = Skeleton::new(bones, order);
        for (index, part) in parts.iter_mut().enumerate() {
            let right = skeleton.right(PartId(index));
            part.right = right;
            part.post_right = right;
        }

        Ok((
            Self {
                parts,
                colliders,
                part_names,
                collider_names,
            },
            skeleton,
        ))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> &BodyPart {
        &self.parts[id.0]
    }

    pub(super) fn part_mut(&mut self, id: PartId) -> &mut BodyPart {
        &mut self.parts[id.0]
    }

    pub(super) fn parts_mut(&mut self) -> &mut [BodyPart] {
        &mut self.parts
    }

    /// Look up a part by name
    pub fn part_id(&self, name: &str) -> Option<PartId> {
        self.part_names.get(name).copied()
    }

    pub fn colliders(&self) -> &[ColliderEntry] {
        &self.colliders
    }

    pub fn collider_id(&self, name: &str) -> Option<ColliderId> {
        self.collider_names.get(name).copied()
    }

    /// The part owning a collider
    pub fn collider_part(&self, collider: ColliderId) -> Option<PartId> {
        self.colliders.get(collider.0).map(|entry| entry.part)
    }
}

/// Parent-before-child order; fails on cycles
fn traversal_order(config: &RigConfig, parents: &[Option<PartId>]) -> Result<Vec<PartId>, RigError> {
    let mut depths = Vec::with_capacity(parents.len());
    for (index, def) in config.parts.iter().enumerate() {
        let mut depth = 0;
        let mut current = parents[index];
        while let Some(parent) = current {
            depth += 1;
            if depth > parents.len() {
                return Err(RigError::ParentCycle(def.name.clone()));
            }
            current = parents[parent.0];
        }
        depths.push(depth);
    }

    let mut order: Vec<PartId> = (0..parents.len()).map(PartId).collect();
    order.sort_by_key(|id| (depths[id.0], id.0));
    Ok(order)
}

fn resolve_bends(
    part: &str,
    bends: &[BendConfig],
    names: &HashMap<String, PartId>,
) -> Result<Vec<BendTarget>, RigError> {
    bends
        .iter()
        .map(|bend| {
            names
                .get(&bend.target)
                .map(|&id| BendTarget {
                    part: id,
                    fraction: bend.fraction,
                })
                .ok_or_else(|| RigError::UnknownBendTarget {
                    part: part.to_string(),
                    target: bend.target.clone(),
                })
        })
        .collect()
}

/// Bounding box centre and half extents of a collider in part-local space
fn local_bounds(collider: &ColliderConfig) -> (Vec2, Vec2) {
    let position = Isometry::new(
        Vector::new(collider.offset.x, collider.offset.y),
        collider.rotation_deg.to_radians(),
    );
    let aabb = match collider.shape {
        ColliderShape::Cuboid { half_extents } => {
            Cuboid::new(Vector::new(half_extents.x, half_extents.y)).compute_aabb(&position)
        }
        ColliderShape::Ball { radius } => Ball::new(radius).compute_aabb(&position),
        ColliderShape::Capsule {
            half_length,
            radius,
        } => Capsule::new_x(half_length, radius).compute_aabb(&position),
    };
    let center = aabb.center();
    let half_extents = aabb.half_extents();
    (
        Vec2::new(center.x, center.y),
        Vec2::new(half_extents.x, half_extents.y),
    )
}

/// Farthest point of the part's colliders, projected on its local x axis
fn tip_vector(colliders: &[ColliderConfig]) -> Vec2 {
    let mut farthest: Option<(Vec2, Vec2)> = None;
    for collider in colliders {
        let (center, half_extents) = local_bounds(collider);
        if farthest.map_or(true, |(far, _)| center.length() >= far.length()) {
            farthest = Some((center, half_extents));
        }
    }
    let Some((center, half_extents)) = farthest else {
        return Vec2::ZERO;
    };

    let plus = center + half_extents;
    let minus = center - half_extents;
    let tip = if plus.length() < minus.length() { minus } else { plus };
    Vec2::new(tip.x, 0.0)
}
