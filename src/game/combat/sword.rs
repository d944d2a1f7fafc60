// Sword: jab on tap, swing on hold, one hit per swing

use glam::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};

use super::animator::{AnimParam, Animator, UPPER_BODY_LAYER};
use super::damage::{Damageable, WeaponHit};
use super::weapon::{AnimationEvent, AttackCommand, Weapon, WeaponCore};
use crate::game::characters::Locomotion;

/// Designer-tunable sword values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwordConfig {
    /// How much the weapon hurts
    pub damage: i32,
    /// Force along the holder's facing added to every hit
    pub knockback: f32,
    /// Scales the relative velocity into hit force
    pub mass: f32,
}

impl Default for SwordConfig {
    fn default() -> Self {
        Self {
            damage: 17,
            knockback: 50.0,
            mass: 5.0,
        }
    }
}

/// Motion of the blade and its target when the trigger volume touches something
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BladeContact {
    /// Closest point on the struck collider
    pub point: Vec2,
    pub blade_velocity: Vec2,
    /// None when the struck object has no rigid body
    pub target_velocity: Option<Vec2>,
    /// Holder's local x axis in world space
    pub holder_right: Vec2,
    pub facing_right: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Sword {
    core: WeaponCore,
    config: SwordConfig,
    /// Already hit something this swing
    hit_something: bool,
}

impl Sword {
    pub fn new(config: SwordConfig) -> Self {
        Self {
            core: WeaponCore::new(),
            config,
            hit_something: false,
        }
    }

    pub fn config(&self) -> &SwordConfig {
        &self.config
    }

    /// Hit force: momentum of the blade relative to the target plus knockback
    pub fn hit_force(&self, contact: &BladeContact) -> Vec2 {
        let relative = contact.blade_velocity - contact.target_velocity.unwrap_or(Vec2::ZERO);
        let facing = if contact.facing_right { 1.0 } else { -1.0 };
        self.config.mass * relative + contact.holder_right * self.config.knockback * facing
    }

    /// The blade's trigger volume touched something damageable.
    /// Returns true when the hit landed.
    pub fn on_trigger(&mut self, target: &mut dyn Damageable, contact: &BladeContact) -> bool {
        if !self.core.is_swinging() || self.hit_something {
            return false;
        }
        self.hit_something = true;

        let hit = WeaponHit {
            point: contact.point,
            force: self.hit_force(contact),
            damage: self.config.damage,
        };
        debug!("Sword hit: {:?}", hit);
        target.damage_me(&hit);
        true
    }

    fn reset_attack_triggers(animator: &mut dyn Animator) {
        animator.reset_trigger(AnimParam::JabArmRight);
        animator.reset_trigger(AnimParam::SwingArmRight);
    }
}

impl Weapon for Sword {
    fn core(&self) -> &WeaponCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WeaponCore {
        &mut self.core
    }

    fn attack_tap(&mut self, _command: &AttackCommand, animator: &mut dyn Animator) {
        Self::reset_attack_triggers(animator);
        animator.set_trigger(AnimParam::JabArmRight);
    }

    fn attack_hold(&mut self, _command: &AttackCommand, animator: &mut dyn Animator) {
        Self::reset_attack_triggers(animator);
        if !animator.is_in_transition(UPPER_BODY_LAYER) {
            animator.set_trigger(AnimParam::SwingArmRight);
        }
    }

    fn receive_animation_event(&mut self, event: AnimationEvent, animator: &mut dyn Animator, mvmt: &mut Locomotion) {
        if event == AnimationEvent::SwingEnd {
            self.hit_something = false;
        }
        self.core.handle_event(event, animator, mvmt);
    }

    fn on_unequip(&mut self) {
        self.hit_something = false;
        self.core.unequip();
    }
}
