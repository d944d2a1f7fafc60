// Weapon hits and the things that can receive them

use glam::Vec2;
use log::info;

/// One landed weapon hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponHit {
    /// World point on the struck object
    pub point: Vec2,
    pub force: Vec2,
    pub damage: i32,
}

/// Anything a weapon can hurt
pub trait Damageable {
    fn damage_me(&mut self, hit: &WeaponHit);
}

/// Records every hit it receives
#[derive(Debug, Clone, Default)]
pub struct HitLog {
    hits: Vec<WeaponHit>,
}

impl HitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> &[WeaponHit] {
        &self.hits
    }

    pub fn total_damage(&self) -> i32 {
        self.hits.iter().map(|hit| hit.damage).sum()
    }
}

impl Damageable for HitLog {
    fn damage_me(&mut self, hit: &WeaponHit) {
        info!(
            "Hit for {} at ({:.2}, {:.2}), force ({:.1}, {:.1})",
            hit.damage, hit.point.x, hit.point.y, hit.force.x, hit.force.y
        );
        self.hits.push(*hit);
    }
}
