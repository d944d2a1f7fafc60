// Per-part hit response
//
// Turns a collision impulse into torque on the struck part, splits leg hits
// into rotation and crouch, and hands the residual force up to the parent.

use glam::Vec2;
use log::debug;

use super::body_part::{ContactState, PartId};
use super::config::Tuning;
use super::registry::BodyPartRegistry;
use super::skeleton::Skeleton;
use crate::core::math::{cross_z, mirror_x, sign};

/// One collision contribution to a body part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// World contact point
    pub point: Vec2,
    /// Contact normal, pointing into the part
    pub normal: Vec2,
    pub impulse: Vec2,
    /// Mass of the colliding body
    pub mass: f32,
}

/// Read-only inputs shared by a chain of hit calculations
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub skeleton: &'a Skeleton,
    pub tuning: &'a Tuning,
    pub body_mass: f32,
}

/// Apply a direct contact to `id`, then transfer the residue to its ancestors
pub fn hit_calc(registry: &mut BodyPartRegistry, ctx: ResponseContext<'_>, id: PartId, hit: Hit) {
    apply_hit(registry, ctx, id, hit, true);
}

/// `direct` marks a contact on this part itself; only direct contacts feed
/// touch handling, transferred hits just add torque.
fn apply_hit(
    registry: &mut BodyPartRegistry,
    ctx: ResponseContext<'_>,
    id: PartId,
    hit: Hit,
    direct: bool,
) {
    if !(hit.point.is_finite() && hit.normal.is_finite() && hit.impulse.is_finite()) {
        debug!("Dropping non-finite hit on '{}': {:?}", registry.part(id).name(), hit);
        return;
    }

    // Torque drives rotations in character space, so bring the world hit there
    let facing = ctx.skeleton.facing();
    let origin = ctx.skeleton.world_position(id);
    let position_vector = mirror_x(hit.point - origin, facing);
    let normal = mirror_x(hit.normal, facing);
    let impulse = mirror_x(hit.impulse, facing);
    let tip = mirror_x(ctx.skeleton.world_point(id, registry.part(id).tip()) - origin, facing);
    let up_down = up_down_ratio(tip, position_vector);

    let pre_force = impulse.dot(normal) * normal * up_down;
    let part = registry.part_mut(id);
    let (force, crouch) = if part.is_leg {
        let horizontal = Vec2::new(pre_force.x, 0.0);
        (horizontal, pre_force - horizontal)
    } else {
        (pre_force, Vec2::ZERO)
    };

    let mass_influence = if ctx.tuning.mass_damping {
        mass_influence(hit.mass, part.weakness, direct)
    } else {
        1.0
    };
    part.torque += mass_influence * force.length() * sign(cross_z(position_vector, force));
    part.wake();
    if direct {
        part.touching = true;
        part.contact = ContactState {
            position_vector,
            normal,
            up_down,
            mass_influence,
        };
    }

    if part.is_leg && crouch.length() / ctx.body_mass > ctx.tuning.crouch_threshold {
        let amount = crouch.length();
        let linked = part.linked_legs.clone();
        part.add_crouch_impulse(amount);
        for leg in linked {
            registry.part_mut(leg).add_crouch_impulse(amount);
        }
    }

    if let Some(parent) = registry.part(id).parent {
        let transferred = transfer(hit, origin, up_down, ctx.tuning);
        apply_hit(registry, ctx, parent, transferred, false);
    }
}

/// Where along the part a contact landed: -1 at the base, 1 at the tip.
/// A degenerate tip gives 0, leaving the contact inert.
pub fn up_down_ratio(tip: Vec2, position_vector: Vec2) -> f32 {
    let length_squared = tip.length_squared();
    if length_squared <= f32::EPSILON {
        return 0.0;
    }
    (tip.dot(position_vector) / length_squared).clamp(-1.0, 1.0)
}

/// Residual hit passed to the parent: applied at the child's origin along the
/// impulse direction, scaled up for hits near the child's base
pub fn transfer(hit: Hit, child_origin: Vec2, up_down: f32, tuning: &Tuning) -> Hit {
    Hit {
        point: child_origin,
        normal: hit.impulse.normalize_or_zero(),
        impulse: hit.impulse * (tuning.transfer_base - up_down),
        mass: hit.mass,
    }
}

/// Sigmoid influence of the colliding mass, 0 to 1
fn mass_influence(mass: f32, weakness: f32, direct: bool) -> f32 {
    let relative = mass * weakness;
    if direct {
        1.0 / (1.0 + (-(relative - 20.0) / 20.0).exp())
    } else {
        (-9.0 / (relative + 2.0)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rig::body_part::HitState;
    use crate::game::rig::config::{ColliderShape, PartConfig, RigConfig};
    use approx::assert_abs_diff_eq;

    /// Arm hanging from (0, 1): upper arm and forearm both pointing down
    fn arm_config() -> RigConfig {
        RigConfig {
            body_mass: 10.0,
            tuning: Tuning::default(),
            parts: vec![
                PartConfig::new("upper_arm", None, Vec2::new(0.0, 1.0), -90.0).with_collider(
                    "upper_arm",
                    ColliderShape::capsule(0.14, 0.05),
                    Vec2::new(0.14, 0.0),
                ),
                PartConfig::new("forearm", Some("upper_arm"), Vec2::new(0.3, 0.0), -90.0)
                    .with_collider(
                        "forearm",
                        ColliderShape::capsule(0.13, 0.05),
                        Vec2::new(0.13, 0.0),
                    ),
            ],
        }
    }

    /// Two thighs hanging from a hip root
    fn legs_config() -> RigConfig {
        let thigh = |name: &str| {
            PartConfig::new(name, Some("hips"), Vec2::ZERO, -90.0)
                .with_collider(name, ColliderShape::capsule(0.2, 0.05), Vec2::new(0.2, 0.0))
                .leg()
        };
        RigConfig {
            body_mass: 10.0,
            tuning: Tuning::default(),
            parts: vec![
                PartConfig::new("hips", None, Vec2::new(0.0, 1.0), 90.0),
                thigh("thigh_l"),
                thigh("thigh_r"),
                PartConfig::new("arm", Some("hips"), Vec2::new(0.5, 0.0), -90.0).with_collider(
                    "arm",
                    ColliderShape::capsule(0.1, 0.05),
                    Vec2::new(0.1, 0.0),
                ),
            ],
        }
    }

    fn build(config: &RigConfig) -> (BodyPartRegistry, Skeleton) {
        BodyPartRegistry::build(config).unwrap()
    }

    fn ctx<'a>(skeleton: &'a Skeleton, tuning: &'a Tuning) -> ResponseContext<'a> {
        ResponseContext {
            skeleton,
            tuning,
            body_mass: 10.0,
        }
    }

    #[test]
    fn test_forearm_hit_sets_torque_and_flags() {
        let config = arm_config();
        let (mut registry, skeleton) = build(&config);
        let forearm = registry.part_id("forearm").unwrap();
        let upper = registry.part_id("upper_arm").unwrap();

        let origin = skeleton.world_position(forearm);
        let point = origin + Vec2::new(0.05, -0.15);
        let normal = Vec2::new(1.0, 0.0);
        // normal impulse of a 10 kg body at 5 m/s, scaled as the router does
        let impulse = 50.0 * 60.0 * 0.001 * normal;
        let hit = Hit {
            point,
            normal,
            impulse,
            mass: 10.0,
        };
        hit_calc(&mut registry, ctx(&skeleton, &config.tuning), forearm, hit);

        let part = registry.part(forearm);
        let position_vector = point - origin;
        let tip = skeleton.world_point(forearm, part.tip()) - origin;
        let up_down = up_down_ratio(tip, position_vector);
        let force = impulse * up_down;
        assert!(part.torque() != 0.0);
        assert_eq!(sign(part.torque()), sign(cross_z(position_vector, force)));
        assert_abs_diff_eq!(part.torque().abs(), force.length(), epsilon = 1e-5);
        assert_eq!(part.hit_state(), HitState::Decaying);
        assert!(part.is_touching());

        let parent = registry.part(upper);
        assert!(parent.torque() != 0.0);
        assert_eq!(parent.hit_state(), HitState::Decaying);
        assert!(!parent.is_touching());
    }

    #[test]
    fn test_tip_hit_transfers_less_than_base_hit() {
        let tuning = Tuning::default();
        let hit = Hit {
            point: Vec2::ZERO,
            normal: Vec2::X,
            impulse: Vec2::new(4.0, 0.0),
            mass: 10.0,
        };
        let at_tip = transfer(hit, Vec2::ZERO, 1.0, &tuning);
        let at_base = transfer(hit, Vec2::ZERO, -1.0, &tuning);
        assert_abs_diff_eq!(at_tip.impulse.length(), 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(at_base.impulse.length(), 10.0, epsilon = 1e-6);
        assert!(at_tip.impulse.length() < at_base.impulse.length());
        assert_eq!(at_tip.normal, Vec2::X);
    }

    #[test]
    fn test_up_down_ratio_is_clamped() {
        let tip = Vec2::new(0.0, -0.4);
        assert_eq!(up_down_ratio(tip, Vec2::new(0.0, -2.0)), 1.0);
        assert_eq!(up_down_ratio(tip, Vec2::new(0.0, 2.0)), -1.0);
        assert_abs_diff_eq!(up_down_ratio(tip, Vec2::new(0.0, -0.2)), 0.5, epsilon = 1e-6);
        assert_eq!(up_down_ratio(Vec2::ZERO, Vec2::new(0.0, -0.2)), 0.0);
    }

    #[test]
    fn test_vertical_leg_hit_crouches_without_torque() {
        let config = legs_config();
        let (mut registry, skeleton) = build(&config);
        let left = registry.part_id("thigh_l").unwrap();
        let right = registry.part_id("thigh_r").unwrap();
        let arm = registry.part_id("arm").unwrap();

        // strike the tip of the left thigh straight up: up_down = 1
        let origin = skeleton.world_position(left);
        let tip = skeleton.world_point(left, registry.part(left).tip());
        let hit = Hit {
            point: tip,
            normal: Vec2::Y,
            impulse: Vec2::new(0.0, 5.0),
            mass: 1000.0,
        };
        assert!(tip.y < origin.y);
        hit_calc(&mut registry, ctx(&skeleton, &config.tuning), left, hit);

        assert_eq!(registry.part(left).torque(), 0.0);
        let left_crouch = registry.part(left).crouch().unwrap().impulse;
        let right_crouch = registry.part(right).crouch().unwrap().impulse;
        assert_abs_diff_eq!(left_crouch, 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(right_crouch, 5.0, epsilon = 1e-5);
        assert!(registry.part(arm).crouch().is_none());
    }

    #[test]
    fn test_small_vertical_leg_hit_is_ignored() {
        let config = legs_config();
        let (mut registry, skeleton) = build(&config);
        let left = registry.part_id("thigh_l").unwrap();
        let tip = skeleton.world_point(left, registry.part(left).tip());
        let hit = Hit {
            point: tip,
            normal: Vec2::Y,
            impulse: Vec2::new(0.0, 1.5),
            mass: 1000.0,
        };
        hit_calc(&mut registry, ctx(&skeleton, &config.tuning), left, hit);
        assert_eq!(registry.part(left).crouch().unwrap().impulse, 0.0);
    }

    #[test]
    fn test_horizontal_leg_hit_rotates_without_crouch() {
        let config = legs_config();
        let (mut registry, skeleton) = build(&config);
        let left = registry.part_id("thigh_l").unwrap();
        let right = registry.part_id("thigh_r").unwrap();
        let tip = skeleton.world_point(left, registry.part(left).tip());
        let hit = Hit {
            point: tip,
            normal: Vec2::X,
            impulse: Vec2::new(5.0, 0.0),
            mass: 1000.0,
        };
        hit_calc(&mut registry, ctx(&skeleton, &config.tuning), left, hit);
        assert!(registry.part(left).torque().abs() > 0.0);
        assert_eq!(registry.part(left).crouch().unwrap().impulse, 0.0);
        assert_eq!(registry.part(right).crouch().unwrap().impulse, 0.0);
    }

    #[test]
    fn test_non_finite_hit_is_dropped() {
        let config = arm_config();
        let (mut registry, skeleton) = build(&config);
        let forearm = registry.part_id("forearm").unwrap();
        let hit = Hit {
            point: Vec2::ZERO,
            normal: Vec2::X,
            impulse: Vec2::new(f32::NAN, 0.0),
            mass: 1.0,
        };
        hit_calc(&mut registry, ctx(&skeleton, &config.tuning), forearm, hit);
        assert_eq!(registry.part(forearm).hit_state(), HitState::Quiescent);
        assert!(!registry.part(forearm).is_touching());
    }

    #[test]
    fn test_contacts_accumulate_independently() {
        let config = arm_config();
        let (mut registry, skeleton) = build(&config);
        let forearm = registry.part_id("forearm").unwrap();
        let origin = skeleton.world_position(forearm);
        let hit = Hit {
            point: origin + Vec2::new(0.05, -0.2),
            normal: Vec2::X,
            impulse: Vec2::new(2.0, 0.0),
            mass: 5.0,
        };
        hit_calc(&mut registry, ctx(&skeleton, &config.tuning), forearm, hit);
        let once = registry.part(forearm).torque();
        hit_calc(&mut registry, ctx(&skeleton, &config.tuning), forearm, hit);
        assert_abs_diff_eq!(registry.part(forearm).torque(), 2.0 * once, epsilon = 1e-6);
    }

    #[test]
    fn test_mass_damping_scales_torque() {
        let mut config = arm_config();
        config.tuning.mass_damping = true;
        let (mut registry, skeleton) = build(&config);
        let forearm = registry.part_id("forearm").unwrap();
        let origin = skeleton.world_position(forearm);
        let hit = Hit {
            point: origin + Vec2::new(0.05, -0.2),
            normal: Vec2::X,
            impulse: Vec2::new(2.0, 0.0),
            mass: 20.0,
        };
        hit_calc(&mut registry, ctx(&skeleton, &config.tuning), forearm, hit);
        let part = registry.part(forearm);
        // weakness 1, mass 20 sits on the sigmoid midpoint
        assert_abs_diff_eq!(part.contact().mass_influence, 0.5, epsilon = 1e-6);
    }
}
