// Character facing and movement intent

use glam::Vec2;
use log::warn;

/// Movement state shared by the rig, weapons and the movement controller
#[derive(Debug, Clone, PartialEq)]
pub struct Locomotion {
    facing_right: bool,
    /// Standing on walkable ground
    pub grounded: bool,
    /// Direction the character wants to move
    pub move_vec: Vec2,
    /// Steepest walkable slope, degrees
    pub max_walk_slope: f32,
    /// Outstanding flip locks; facing only follows movement input at zero
    cant_flip: u32,
}

impl Locomotion {
    pub fn new(facing_right: bool) -> Self {
        Self {
            facing_right,
            grounded: false,
            move_vec: Vec2::ZERO,
            max_walk_slope: 45.0,
            cant_flip: 0,
        }
    }

    pub fn facing_right(&self) -> bool {
        self.facing_right
    }

    /// 1 when facing right, -1 when facing left
    pub fn flip_int(&self) -> i8 {
        if self.facing_right {
            1
        } else {
            -1
        }
    }

    /// Turn around unconditionally
    pub fn flip(&mut self) {
        self.facing_right = !self.facing_right;
    }

    pub fn can_flip(&self) -> bool {
        self.cant_flip == 0
    }

    pub fn flip_locks(&self) -> u32 {
        self.cant_flip
    }

    pub fn lock_flip(&mut self) {
        self.cant_flip += 1;
    }

    pub fn unlock_flip(&mut self) {
        if self.cant_flip == 0 {
            warn!("Flip lock released more often than taken");
        }
        self.cant_flip = self.cant_flip.saturating_sub(1);
    }

    /// Face the direction of horizontal movement input unless flipping is locked.
    /// Returns true when the character turned.
    pub fn steer(&mut self, move_vec: Vec2) -> bool {
        self.move_vec = move_vec;
        if !self.can_flip() || move_vec.x == 0.0 {
            return false;
        }
        let want_right = move_vec.x > 0.0;
        if want_right != self.facing_right {
            self.facing_right = want_right;
            return true;
        }
        false
    }

    /// Whether a ground normal is shallow enough to stand on
    pub fn is_walkable(&self, ground_normal: Vec2) -> bool {
        ground_normal.angle_between(Vec2::Y).abs().to_degrees() <= self.max_walk_slope
    }
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_int_follows_facing() {
        let mut mvmt = Locomotion::new(true);
        assert_eq!(mvmt.flip_int(), 1);
        mvmt.flip();
        assert_eq!(mvmt.flip_int(), -1);
        assert!(!mvmt.facing_right());
    }

    #[test]
    fn test_locks_block_steering() {
        let mut mvmt = Locomotion::new(true);
        mvmt.lock_flip();
        mvmt.lock_flip();
        assert!(!mvmt.steer(Vec2::new(-1.0, 0.0)));
        assert!(mvmt.facing_right());

        mvmt.unlock_flip();
        assert!(!mvmt.can_flip());
        mvmt.unlock_flip();
        assert!(mvmt.steer(Vec2::new(-1.0, 0.0)));
        assert!(!mvmt.facing_right());
    }

    #[test]
    fn test_unlock_saturates() {
        let mut mvmt = Locomotion::default();
        mvmt.unlock_flip();
        assert_eq!(mvmt.flip_locks(), 0);
        assert!(mvmt.can_flip());
    }

    #[test]
    fn test_walkable_slope() {
        let mvmt = Locomotion::default();
        assert!(mvmt.is_walkable(Vec2::Y));
        assert!(mvmt.is_walkable(Vec2::from_angle(60f32.to_radians())));
        assert!(!mvmt.is_walkable(Vec2::X));
    }
}
