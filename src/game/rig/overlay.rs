// Procedural overlay applied on top of the animated pose every physics tick:
// crouch bending for legs, hit rotation with decay, and touch push-back.
// Everything here works in character space; only world queries mirror.

use glam::Vec2;

use super::body_part::{HitState, PartId};
use super::config::Tuning;
use super::registry::BodyPartRegistry;
use super::skeleton::Skeleton;
use crate::core::math::{angle_between_deg, cross_z, exp_damp, sign};

/// Bend every leg's crouch targets by its smoothed crouch amount
pub fn crouch_pass(registry: &mut BodyPartRegistry, skeleton: &mut Skeleton, tuning: &Tuning, dt: f32) {
    for part in registry.parts_mut() {
        let Some(crouch) = part.crouch.as_mut() else {
            continue;
        };
        if crouch.amount.abs() < tuning.crouch_idle && crouch.impulse.abs() < tuning.crouch_idle {
            continue;
        }

        crouch.amount = exp_damp(crouch.amount, crouch.impulse, tuning.crouch_smooth_time, dt);
        let step = tuning.crouch_decay_rate * dt;
        crouch.impulse = if crouch.impulse.abs() <= step {
            0.0
        } else {
            crouch.impulse - step * sign(crouch.impulse)
        };

        let amount = crouch.amount;
        for bend in &part.bend_left {
            skeleton.rotate_local(bend.part, (amount * bend.fraction).to_radians());
        }
        for bend in &part.bend_right {
            skeleton.rotate_local(bend.part, (-amount * bend.fraction).to_radians());
        }
    }
}

/// Rotate decaying parts by their accumulated rotation and bleed off energy
pub fn hit_rotation_pass(registry: &mut BodyPartRegistry, skeleton: &mut Skeleton, tuning: &Tuning, dt: f32) {
    for (index, part) in registry.parts_mut().iter_mut().enumerate() {
        if part.hit_state != HitState::Decaying {
            continue;
        }

        part.rotation += part.torque * dt;
        let applied = part.weakness * part.rotation * tuning.rotation_scale;
        skeleton.rotate_local(PartId(index), applied.to_radians());

        part.torque -= part.torque * tuning.torque_decay * dt;
        part.rotation = exp_damp(
            part.rotation,
            part.rotation * tuning.rotation_return_ratio,
            tuning.rotation_return_time,
            dt,
        );

        if part.rotation.abs() * part.weakness < tuning.quiescence_threshold {
            part.settle();
        }
    }
}

/// Push back against parts rotating further into whatever they touch.
/// The touching flag is consumed; a fresh contact must set it again.
pub fn touch_pass(registry: &mut BodyPartRegistry, tuning: &Tuning, dt: f32) {
    for index in 0..registry.len() {
        let part = registry.part_mut(PartId(index));
        if !part.touching {
            continue;
        }
        part.touching = false;

        let contact = part.contact;
        let delta = (part.post_right - part.right).normalize_or_zero();
        // rotating into the surface moves the right vector against its normal
        if -contact.normal.dot(delta) <= tuning.touch_threshold {
            continue;
        }

        let leg_factor = if part.is_leg { contact.normal.dot(Vec2::X) } else { 1.0 };
        let torque = -tuning.touch_torque_gain
            * contact.mass_influence
            * contact.position_vector.length()
            * angle_between_deg(part.post_right, part.right)
            * sign(cross_z(contact.normal, part.post_right))
            * contact.up_down
            * leg_factor;
        part.torque += torque * dt;
        part.wake();

        let parent = part.parent;
        if let Some(parent) = parent {
            registry.part_mut(parent).wake();
        }
    }
}

/// Record where each part points after this tick's overlay
pub fn capture_post_rotation(registry: &mut BodyPartRegistry, skeleton: &Skeleton) {
    for (index, part) in registry.parts_mut().iter_mut().enumerate() {
        part.post_right = skeleton.right(PartId(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rig::config::{BendConfig, ColliderShape, PartConfig, RigConfig};
    use approx::assert_abs_diff_eq;

    const DT: f32 = 1.0 / 60.0;

    fn arm() -> (BodyPartRegistry, Skeleton) {
        let config = RigConfig {
            body_mass: 10.0,
            tuning: Tuning::default(),
            parts: vec![PartConfig::new("arm", None, Vec2::ZERO, -90.0).with_collider(
                "arm",
                ColliderShape::capsule(0.2, 0.05),
                Vec2::new(0.2, 0.0),
            )],
        };
        BodyPartRegistry::build(&config).unwrap()
    }

    fn legs() -> (BodyPartRegistry, Skeleton) {
        let mut thigh = PartConfig::new("thigh_l", Some("hips"), Vec2::ZERO, -90.0).leg();
        thigh.bend_left = vec![BendConfig::new("thigh_l", 0.5)];
        thigh.bend_right = vec![BendConfig::new("shin_l", 1.0)];
        let config = RigConfig {
            body_mass: 10.0,
            tuning: Tuning::default(),
            parts: vec![
                PartConfig::new("hips", None, Vec2::new(0.0, 1.0), 90.0),
                thigh,
                PartConfig::new("shin_l", Some("thigh_l"), Vec2::new(0.4, 0.0), -90.0).leg(),
                PartConfig::new("thigh_r", Some("hips"), Vec2::ZERO, -90.0).leg(),
                PartConfig::new("arm", Some("hips"), Vec2::new(0.5, 0.0), -90.0),
            ],
        };
        BodyPartRegistry::build(&config).unwrap()
    }

    #[test]
    fn test_decay_converges_to_quiescence() {
        let (mut registry, mut skeleton) = arm();
        let tuning = Tuning::default();
        let id = PartId(0);
        registry.part_mut(id).torque = 50.0;
        registry.part_mut(id).wake();

        let mut previous_torque = f32::INFINITY;
        let mut ticks = 0;
        while registry.part(id).is_decaying() {
            let torque = registry.part(id).torque().abs();
            assert!(torque < previous_torque || torque == 0.0);
            previous_torque = torque;
            hit_rotation_pass(&mut registry, &mut skeleton, &tuning, DT);
            ticks += 1;
            assert!(ticks < 1_000, "hit rotation never settled");
        }
        assert_eq!(registry.part(id).rotation(), 0.0);
        assert_eq!(registry.part(id).torque(), 0.0);
    }

    #[test]
    fn test_rotation_shrinks_monotonically_without_torque() {
        let (mut registry, mut skeleton) = arm();
        let tuning = Tuning::default();
        let id = PartId(0);
        registry.part_mut(id).rotation = 20.0;
        registry.part_mut(id).wake();

        let mut previous = registry.part(id).rotation();
        for _ in 0..50 {
            hit_rotation_pass(&mut registry, &mut skeleton, &tuning, DT);
            let current = registry.part(id).rotation();
            assert!(current.abs() < previous.abs());
            previous = current;
        }
    }

    #[test]
    fn test_quiescent_part_is_left_alone() {
        let (mut registry, mut skeleton) = arm();
        let tuning = Tuning::default();
        let before = skeleton.rotation(PartId(0));
        registry.part_mut(PartId(0)).torque = 10.0;
        hit_rotation_pass(&mut registry, &mut skeleton, &tuning, DT);
        assert_eq!(skeleton.rotation(PartId(0)), before);
        assert_eq!(registry.part(PartId(0)).torque(), 10.0);
    }

    #[test]
    fn test_hit_rotation_rotates_pose() {
        let (mut registry, mut skeleton) = arm();
        let tuning = Tuning::default();
        let id = PartId(0);
        let before = skeleton.rotation(id);
        registry.part_mut(id).torque = 60.0;
        registry.part_mut(id).wake();
        hit_rotation_pass(&mut registry, &mut skeleton, &tuning, DT);
        // rotation = 60 * dt = 1 degree, applied at half strength
        assert_abs_diff_eq!(
            skeleton.rotation(id) - before,
            0.5f32.to_radians(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_crouch_bends_targets_by_fraction() {
        let (mut registry, mut skeleton) = legs();
        let tuning = Tuning::default();
        let thigh = registry.part_id("thigh_l").unwrap();
        let shin = registry.part_id("shin_l").unwrap();
        registry.part_mut(thigh).add_crouch_impulse(5.0);

        let thigh_before = skeleton.local_rotation(thigh);
        let shin_before = skeleton.local_rotation(shin);
        crouch_pass(&mut registry, &mut skeleton, &tuning, DT);

        let amount = registry.part(thigh).crouch().unwrap().amount;
        assert!(amount > 0.0);
        assert_abs_diff_eq!(
            skeleton.local_rotation(thigh) - thigh_before,
            (amount * 0.5).to_radians(),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            skeleton.local_rotation(shin) - shin_before,
            -amount.to_radians(),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            registry.part(thigh).crouch().unwrap().impulse,
            5.0 - DT,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_crouch_bends_the_same_way_facing_left() {
        let (mut registry, mut skeleton) = legs();
        let tuning = Tuning::default();
        let thigh = registry.part_id("thigh_l").unwrap();
        skeleton.set_facing_right(false);
        registry.part_mut(thigh).add_crouch_impulse(5.0);
        let before = skeleton.local_rotation(thigh);
        crouch_pass(&mut registry, &mut skeleton, &tuning, DT);
        // world queries mirror the bend, so the knee still folds forward
        assert!(skeleton.local_rotation(thigh) > before);
    }

    #[test]
    fn test_idle_crouch_is_skipped() {
        let (mut registry, mut skeleton) = legs();
        let tuning = Tuning::default();
        let thigh = registry.part_id("thigh_l").unwrap();
        registry.part_mut(thigh).add_crouch_impulse(0.05);
        crouch_pass(&mut registry, &mut skeleton, &tuning, DT);
        let crouch = registry.part(thigh).crouch().unwrap();
        assert_eq!(crouch.amount, 0.0);
        assert_eq!(crouch.impulse, 0.05);
    }

    #[test]
    fn test_touch_opposes_rotation_into_surface() {
        let (mut registry, _) = arm();
        let tuning = Tuning::default();
        let id = PartId(0);
        {
            let part = registry.part_mut(id);
            part.touching = true;
            // arm points down and has swung toward -x, into a wall whose normal is +x
            part.right = Vec2::new(0.0, -1.0);
            part.post_right = Vec2::from_angle(-100f32.to_radians());
            part.contact.normal = Vec2::X;
            part.contact.position_vector = Vec2::new(0.0, -0.3);
            part.contact.up_down = 0.7;
        }
        touch_pass(&mut registry, &tuning, DT);
        let part = registry.part(id);
        assert!(!part.is_touching());
        assert!(part.is_decaying());
        // the swing was clockwise; push back counter-clockwise
        assert!(part.torque() > 0.0);
    }

    #[test]
    fn test_touch_ignores_rotation_away_from_surface() {
        let (mut registry, _) = arm();
        let tuning = Tuning::default();
        let id = PartId(0);
        {
            let part = registry.part_mut(id);
            part.touching = true;
            part.right = Vec2::new(0.0, -1.0);
            part.post_right = Vec2::from_angle(-80f32.to_radians());
            part.contact.normal = Vec2::X;
            part.contact.position_vector = Vec2::new(0.0, -0.3);
            part.contact.up_down = 0.7;
        }
        touch_pass(&mut registry, &tuning, DT);
        let part = registry.part(id);
        assert!(!part.is_touching());
        assert_eq!(part.torque(), 0.0);
        assert!(!part.is_decaying());
    }

    #[test]
    fn test_capture_post_rotation_follows_skeleton() {
        let (mut registry, mut skeleton) = arm();
        skeleton.set_rotation(PartId(0), 0.0);
        capture_post_rotation(&mut registry, &skeleton);
        let post = registry.part(PartId(0)).post_right;
        assert_abs_diff_eq!(post.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(post.y, 0.0, epsilon = 1e-6);
    }
}
