// Hit-reaction rig
//
// Layers a physical rotation response on top of a fully animated skeleton:
// - Body part registry built once from the designer configuration
// - Per-part hit response with force transfer up the part tree
// - Pose compositor: animated pose reset, then crouch and hit rotation overlay
// - Touch handling against surfaces the animation rotates into
// - Router from engine contact reports to the hit response

mod body_part;
mod config;
mod error;
mod overlay;
mod registry;
mod response;
mod router;
mod skeleton;

use std::collections::HashMap;

use glam::Vec2;
use log::{debug, info};

// Re-export commonly used types
pub use body_part::{BodyPart, BendTarget, ColliderId, ContactState, CrouchState, HitState, PartId};
pub use config::{BendConfig, ColliderConfig, ColliderShape, PartConfig, RigConfig, Tuning};
pub use error::{ConfigError, RigError};
pub use registry::{BodyPartRegistry, ColliderEntry};
pub use response::Hit;
pub use router::{CollisionReport, ContactPhase, ContactPoint};
pub use skeleton::Skeleton;

use response::ResponseContext;

/// Source of animated target rotations, looked up by part name
pub trait PoseSource {
    /// Character-space rotation in radians, None when the animation leaves the part alone
    fn target_rotation(&self, part: &str) -> Option<f32>;
}

/// A sampled animation pose: part name -> character-space rotation (radians)
#[derive(Debug, Clone, Default)]
pub struct AnimatedPose {
    rotations: HashMap<String, f32>,
}

impl AnimatedPose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, part: &str, radians: f32) {
        self.rotations.insert(part.to_string(), radians);
    }

    pub fn set_degrees(&mut self, part: &str, degrees: f32) {
        self.set(part, degrees.to_radians());
    }

    pub fn clear(&mut self) {
        self.rotations.clear();
    }
}

impl PoseSource for AnimatedPose {
    fn target_rotation(&self, part: &str) -> Option<f32> {
        self.rotations.get(part).copied()
    }
}

/// The character-level hit reaction controller
#[derive(Debug, Clone)]
pub struct HitReactionRig {
    registry: BodyPartRegistry,
    skeleton: Skeleton,
    tuning: Tuning,
    body_mass: f32,
}

impl HitReactionRig {
    /// Build the rig; fails on any inconsistency in the part tree
    pub fn from_config(config: &RigConfig) -> Result<Self, RigError> {
        let (registry, skeleton) = BodyPartRegistry::build(config)?;
        info!(
            "Built hit-reaction rig: {} parts, {} colliders",
            registry.len(),
            registry.colliders().len()
        );
        Ok(Self {
            registry,
            skeleton,
            tuning: config.tuning.clone(),
            body_mass: config.body_mass,
        })
    }

    /// Per rendered frame: capture the animation-only orientation of every
    /// part and the character's facing
    pub fn frame_update(&mut self, pose: &impl PoseSource, facing_right: bool) {
        self.skeleton.set_facing_right(facing_right);
        for (index, part) in self.registry.parts_mut().iter_mut().enumerate() {
            let target = pose
                .target_rotation(&part.name)
                .unwrap_or_else(|| self.skeleton.rest_rotation(PartId(index)));
            part.right = Vec2::from_angle(target);
        }
    }

    /// Per fixed physics step: reset to the animated pose, then overlay the
    /// crouch and hit rotation, then resolve touching
    pub fn physics_tick(&mut self, pose: &impl PoseSource, dt: f32) {
        for index in 0..self.skeleton.order().len() {
            let id = self.skeleton.order()[index];
            let target = pose
                .target_rotation(self.registry.part(id).name())
                .unwrap_or_else(|| self.skeleton.rest_rotation(id));
            self.skeleton.reset_local_position(id);
            self.skeleton.set_rotation(id, target);
        }

        overlay::crouch_pass(&mut self.registry, &mut self.skeleton, &self.tuning, dt);
        overlay::hit_rotation_pass(&mut self.registry, &mut self.skeleton, &self.tuning, dt);
        overlay::touch_pass(&mut self.registry, &self.tuning, dt);
        overlay::capture_post_rotation(&mut self.registry, &self.skeleton);
    }

    /// Feed an engine contact report (Enter or Stay) into the hit response
    pub fn on_collision(&mut self, report: &CollisionReport, dt: f32) -> usize {
        let ctx = ResponseContext {
            skeleton: &self.skeleton,
            tuning: &self.tuning,
            body_mass: self.body_mass,
        };
        let routed = router::route_collision(&mut self.registry, ctx, report, dt);
        debug!(
            "{:?} report: {} of {} contacts routed",
            report.phase,
            routed,
            report.contacts.len()
        );
        routed
    }

    /// Apply one hit directly to a part, bypassing the router
    pub fn apply_hit(&mut self, part: PartId, hit: Hit) {
        let ctx = ResponseContext {
            skeleton: &self.skeleton,
            tuning: &self.tuning,
            body_mass: self.body_mass,
        };
        response::hit_calc(&mut self.registry, ctx, part, hit);
    }

    pub fn registry(&self) -> &BodyPartRegistry {
        &self.registry
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Engine-side transform access (root placement, position drift)
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn body_mass(&self) -> f32 {
        self.body_mass
    }

    /// Look up a part by name
    pub fn part(&self, name: &str) -> Option<&BodyPart> {
        self.registry.part_id(name).map(|id| self.registry.part(id))
    }

    /// True when no part carries collision energy
    pub fn is_settled(&self) -> bool {
        self.registry.parts().iter().all(|part| !part.is_decaying())
            && self
                .registry
                .parts()
                .iter()
                .filter_map(BodyPart::crouch)
                .all(|crouch| {
                    crouch.amount.abs() < self.tuning.crouch_idle
                        && crouch.impulse.abs() < self.tuning.crouch_idle
                })
    }
}
