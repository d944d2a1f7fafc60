// Collision event router: engine contact reports -> per-part hit response

use glam::Vec2;
use log::debug;

use super::body_part::ColliderId;
use super::registry::BodyPartRegistry;
use super::response::{hit_calc, Hit, ResponseContext};

/// Lifecycle of a contact pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    /// The pair started touching during the last step
    Enter,
    /// The pair was already touching before the last step
    Stay,
}

/// One contact on a rig collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Rig collider that was touched
    pub collider: ColliderId,
    /// World contact point
    pub point: Vec2,
    /// Contact normal, pointing into the rig part
    pub normal: Vec2,
    /// Normal impulse the solver applied; NaN when the engine has none
    pub normal_impulse: f32,
}

/// Contacts between the rig and one other body during one engine step
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionReport {
    pub phase: ContactPhase,
    pub contacts: Vec<ContactPoint>,
    /// Velocity of the other body relative to the rig part
    pub relative_velocity: Vec2,
    /// Mass of the other body, None for static geometry
    pub other_mass: Option<f32>,
}

/// Impulse fed to the hit response for a single contact
pub fn contact_impulse(contact: &ContactPoint, relative_velocity: Vec2, dt: f32, scale: f32) -> Vec2 {
    if contact.normal_impulse.is_nan() || dt <= 0.0 {
        return relative_velocity;
    }
    contact.normal_impulse / dt * contact.normal * scale
}

/// Feed every contact of a report to the part owning its collider.
/// Returns how many contacts reached a body part.
pub fn route_collision(
    registry: &mut BodyPartRegistry,
    ctx: ResponseContext<'_>,
    report: &CollisionReport,
    dt: f32,
) -> usize {
    let mass = report.other_mass.unwrap_or(ctx.tuning.static_mass);
    let mut routed = 0;

    for contact in &report.contacts {
        let Some(part) = registry.collider_part(contact.collider) else {
            debug!("Skipping contact on unknown collider {:?}", contact.collider);
            continue;
        };

        let impulse = contact_impulse(contact, report.relative_velocity, dt, ctx.tuning.impulse_scale);
        let hit = Hit {
            point: contact.point,
            normal: contact.normal,
            impulse,
            mass,
        };
        hit_calc(registry, ctx, part, hit);
        routed += 1;
    }

    routed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rig::config::{ColliderShape, PartConfig, RigConfig, Tuning};
    use crate::game::rig::skeleton::Skeleton;
    use approx::assert_abs_diff_eq;

    const DT: f32 = 1.0 / 60.0;

    fn forearm() -> (BodyPartRegistry, Skeleton) {
        let config = RigConfig {
            body_mass: 10.0,
            tuning: Tuning::default(),
            parts: vec![PartConfig::new("forearm", None, Vec2::new(0.0, 1.0), -90.0)
                .with_collider("forearm", ColliderShape::capsule(0.13, 0.05), Vec2::new(0.13, 0.0))
                .with_collider("fist", ColliderShape::cuboid(0.05, 0.05), Vec2::new(0.3, 0.0))],
        };
        BodyPartRegistry::build(&config).unwrap()
    }

    fn report(collider: ColliderId, normal_impulse: f32) -> CollisionReport {
        CollisionReport {
            phase: ContactPhase::Enter,
            contacts: vec![ContactPoint {
                collider,
                point: Vec2::new(0.0, 0.8),
                normal: Vec2::X,
                normal_impulse,
            }],
            relative_velocity: Vec2::new(5.0, 0.0),
            other_mass: Some(10.0),
        }
    }

    #[test]
    fn test_impulse_scales_normal_impulse_by_dt() {
        let contact = ContactPoint {
            collider: ColliderId(0),
            point: Vec2::ZERO,
            normal: Vec2::new(0.0, -1.0),
            normal_impulse: 0.5,
        };
        let impulse = contact_impulse(&contact, Vec2::new(9.0, 9.0), DT, 0.001);
        assert_abs_diff_eq!(impulse.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(impulse.y, -0.5 * 60.0 * 0.001, epsilon = 1e-6);
    }

    #[test]
    fn test_nan_impulse_falls_back_to_relative_velocity() {
        let contact = ContactPoint {
            collider: ColliderId(0),
            point: Vec2::ZERO,
            normal: Vec2::X,
            normal_impulse: f32::NAN,
        };
        let impulse = contact_impulse(&contact, Vec2::new(3.0, -1.0), DT, 0.001);
        assert_eq!(impulse, Vec2::new(3.0, -1.0));
    }

    #[test]
    fn test_routes_contact_to_owning_part() {
        let (mut registry, skeleton) = forearm();
        let tuning = Tuning::default();
        let ctx = ResponseContext {
            skeleton: &skeleton,
            tuning: &tuning,
            body_mass: 10.0,
        };
        let fist = registry.collider_id("fist").unwrap();
        let routed = route_collision(&mut registry, ctx, &report(fist, 50.0), DT);
        assert_eq!(routed, 1);

        let part = registry.part(registry.part_id("forearm").unwrap());
        assert!(part.is_decaying());
        assert!(part.is_touching());
        assert!(part.torque() != 0.0);
    }

    #[test]
    fn test_unknown_collider_is_skipped() {
        let (mut registry, skeleton) = forearm();
        let tuning = Tuning::default();
        let ctx = ResponseContext {
            skeleton: &skeleton,
            tuning: &tuning,
            body_mass: 10.0,
        };
        let routed = route_collision(&mut registry, ctx, &report(ColliderId(42), 50.0), DT);
        assert_eq!(routed, 0);
        assert!(!registry.parts()[0].is_decaying());
    }

    #[test]
    fn test_static_geometry_uses_default_mass() {
        let (mut registry, skeleton) = forearm();
        let mut tuning = Tuning::default();
        tuning.mass_damping = true;
        let ctx = ResponseContext {
            skeleton: &skeleton,
            tuning: &tuning,
            body_mass: 10.0,
        };
        let collider = registry.collider_id("forearm").unwrap();
        let mut wall = report(collider, 50.0);
        wall.other_mass = None;
        route_collision(&mut registry, ctx, &wall, DT);
        // a 1000 kg wall saturates the influence sigmoid
        let influence = registry.parts()[0].contact().mass_influence;
        assert!(influence > 0.99);
    }

    #[test]
    fn test_each_contact_accumulates() {
        let (mut registry, skeleton) = forearm();
        let tuning = Tuning::default();
        let ctx = ResponseContext {
            skeleton: &skeleton,
            tuning: &tuning,
            body_mass: 10.0,
        };
        let collider = registry.collider_id("forearm").unwrap();
        let single = report(collider, 50.0);
        route_collision(&mut registry, ctx, &single, DT);
        let once = registry.parts()[0].torque();

        let (mut registry, skeleton) = forearm();
        let ctx = ResponseContext {
            skeleton: &skeleton,
            tuning: &tuning,
            body_mass: 10.0,
        };
        let mut double = single.clone();
        double.contacts.push(double.contacts[0]);
        assert_eq!(route_collision(&mut registry, ctx, &double, DT), 2);
        assert_abs_diff_eq!(registry.parts()[0].torque(), 2.0 * once, epsilon = 1e-5);
    }
}
