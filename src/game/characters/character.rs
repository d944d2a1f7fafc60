// Character entity: hit-reaction rig, locomotion, weapon and physics bodies

use glam::Vec2;
use log::{debug, info};

use crate::engine::physics::{body::presets, ColliderHandle, CollisionGroups, PhysicsWorld, RigBodies};
use crate::game::combat::{
    AnimationEvent, AnimatorParams, AttackInput, BladeContact, Damageable, Sword, Weapon,
};
use crate::game::rig::{HitReactionRig, PoseSource, RigConfig, RigError};

use super::locomotion::Locomotion;

/// Unique identifier for a character
pub type CharacterId = u32;

/// Height above the root the ground ray starts from
const GROUND_PROBE_HEIGHT: f32 = 0.5;

/// Extra distance below the root still counted as standing
const GROUND_TOLERANCE: f32 = 0.05;

/// Blade trigger volume: half length, half width, offset from the hand
const BLADE_HALF_LENGTH: f32 = 0.4;
const BLADE_HALF_WIDTH: f32 = 0.03;

/// A rigged, physically reacting character
#[derive(Debug)]
pub struct Character {
    pub id: CharacterId,
    /// Character name (for logging)
    pub name: String,
    pub rig: HitReactionRig,
    pub locomotion: Locomotion,
    /// Animator parameters driven by the weapon, read back by the host
    pub animator: AnimatorParams,
    bodies: RigBodies,
    weapon: Option<Sword>,
    blade: Option<ColliderHandle>,
}

impl Character {
    /// Build the rig and its kinematic bodies with the root at `root`
    pub fn spawn(
        id: CharacterId,
        name: &str,
        config: &RigConfig,
        physics: &mut PhysicsWorld,
        root: Vec2,
    ) -> Result<Self, RigError> {
        let mut rig = HitReactionRig::from_config(config)?;
        rig.skeleton_mut().set_root(root);
        let bodies = physics.spawn_rig(rig.registry(), rig.skeleton());
        info!("Spawned character '{}' at ({:.2}, {:.2})", name, root.x, root.y);

        Ok(Self {
            id,
            name: name.to_string(),
            rig,
            locomotion: Locomotion::new(true),
            animator: AnimatorParams::new(),
            bodies,
            weapon: None,
            blade: None,
        })
    }

    pub fn bodies(&self) -> &RigBodies {
        &self.bodies
    }

    pub fn weapon(&self) -> Option<&Sword> {
        self.weapon.as_ref()
    }

    /// Per rendered frame: weapon input, then capture the animated pose
    pub fn frame_update(&mut self, pose: &impl PoseSource, input: &AttackInput, dt: f32) {
        if let Some(weapon) = self.weapon.as_mut() {
            weapon.update(input, dt, &mut self.animator, &mut self.locomotion);
        }
        self.rig.frame_update(pose, self.locomotion.facing_right());
    }

    /// Per physics tick, before the engine step: pose the rig and move its bodies
    pub fn physics_tick(&mut self, pose: &impl PoseSource, physics: &mut PhysicsWorld, dt: f32) {
        self.rig.physics_tick(pose, dt);
        physics.sync_rig(&mut self.bodies, self.rig.skeleton());
    }

    /// After the engine step: feed this step's contacts into the rig
    pub fn collect_contacts(&mut self, physics: &PhysicsWorld, dt: f32) -> usize {
        physics
            .contact_reports(&self.bodies)
            .iter()
            .map(|report| self.rig.on_collision(report, dt))
            .sum()
    }

    /// Probe for ground below the root and update the grounded flag
    pub fn update_grounded(&mut self, physics: &PhysicsWorld) -> bool {
        let origin = self.rig.skeleton().root() + Vec2::new(0.0, GROUND_PROBE_HEIGHT);
        let own = CollisionGroups::Character.to_interaction_groups();
        self.locomotion.grounded = physics
            .ground_distance(origin, GROUND_PROBE_HEIGHT + GROUND_TOLERANCE, own)
            .is_some();
        self.locomotion.grounded
    }

    /// Put a sword in the named part's hand and attach its blade trigger
    pub fn equip(&mut self, mut sword: Sword, hand: &str, physics: &mut PhysicsWorld) -> bool {
        let Some(body) = self.rig.registry().part_id(hand).and_then(|id| self.bodies.body(id)) else {
            return false;
        };
        self.drop_weapon(physics);

        let blade = presets::weapon_sensor(
            BLADE_HALF_LENGTH,
            BLADE_HALF_WIDTH,
            Vec2::new(BLADE_HALF_LENGTH, 0.0),
        );
        self.blade = Some(physics.add_collider(blade, body));
        sword.on_equip();
        self.weapon = Some(sword);
        debug!("'{}' equipped a sword in '{}'", self.name, hand);
        true
    }

    /// Remove the sword and its blade trigger
    pub fn drop_weapon(&mut self, physics: &mut PhysicsWorld) -> Option<Sword> {
        if let Some(blade) = self.blade.take() {
            physics.remove_collider(blade);
        }
        let mut sword = self.weapon.take()?;
        // an attack in flight still holds a flip lock
        if sword.core().is_attacking() {
            self.locomotion.unlock_flip();
        }
        sword.on_drop();
        Some(sword)
    }

    pub fn animation_event(&mut self, event: AnimationEvent) {
        if let Some(weapon) = self.weapon.as_mut() {
            weapon.receive_animation_event(event, &mut self.animator, &mut self.locomotion);
        }
    }

    /// Let the blade hit `damageable` if its trigger overlaps `target`
    pub fn strike(&mut self, physics: &PhysicsWorld, target: ColliderHandle, damageable: &mut dyn Damageable) -> bool {
        let (Some(blade), Some(sword)) = (self.blade, self.weapon.as_mut()) else {
            return false;
        };
        if !physics.intersections_with(blade).contains(&target) {
            return false;
        }
        let Some(target_collider) = physics.get_collider(target) else {
            return false;
        };

        let translation = target_collider.position().translation;
        let contact = BladeContact {
            point: Vec2::new(translation.x, translation.y),
            blade_velocity: physics.collider_velocity(blade),
            target_velocity: target_collider.parent().map(|_| physics.collider_velocity(target)),
            holder_right: Vec2::X,
            facing_right: self.locomotion.facing_right(),
        };
        sword.on_trigger(damageable, &contact)
    }
}
