// Transform hierarchy of the controlled body parts
//
// Positions and rotations live in character space: unmirrored, x forward when
// facing right, y up. World queries mirror across the character root when the
// character faces left.

use std::f32::consts::PI;

use glam::Vec2;

use super::body_part::PartId;
use crate::core::math::{mirror_x, rotate};

/// One controlled transform
#[derive(Debug, Clone)]
pub struct Bone {
    parent: Option<PartId>,
    /// Local position the pose reset restores every tick
    rest_offset: Vec2,
    /// Character-space rotation used when animation provides none (radians)
    rest_rotation: f32,
    local_position: Vec2,
    /// Rotation relative to the parent bone (radians)
    local_rotation: f32,
}

impl Bone {
    pub fn new(parent: Option<PartId>, rest_offset: Vec2, rest_rotation: f32) -> Self {
        Self {
            parent,
            rest_offset,
            rest_rotation,
            local_position: rest_offset,
            local_rotation: rest_rotation,
        }
    }
}

/// Arena of bones plus the character root placement
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<Bone>,
    /// Parent-before-child traversal order
    order: Vec<PartId>,
    root: Vec2,
    facing: f32,
}

impl Skeleton {
    /// Create a skeleton. `order` must list every bone after its parent.
    pub fn new(bones: Vec<Bone>, order: Vec<PartId>) -> Self {
        let mut skeleton = Self {
            bones,
            order,
            root: Vec2::ZERO,
            facing: 1.0,
        };
        // Rest rotations are character-space; convert them to local ones
        for index in 0..skeleton.order.len() {
            let id = skeleton.order[index];
            let rest = skeleton.bones[id.0].rest_rotation;
            skeleton.set_rotation(id, rest);
        }
        skeleton
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Parent-before-child traversal order
    pub fn order(&self) -> &[PartId] {
        &self.order
    }

    pub fn parent(&self, id: PartId) -> Option<PartId> {
        self.bones[id.0].parent
    }

    /// World position of the character root
    pub fn root(&self) -> Vec2 {
        self.root
    }

    pub fn set_root(&mut self, root: Vec2) {
        self.root = root;
    }

    /// 1.0 facing right, -1.0 facing left
    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn set_facing_right(&mut self, facing_right: bool) {
        self.facing = if facing_right { 1.0 } else { -1.0 };
    }

    /// Character-space position and rotation of a bone
    pub fn char_transform(&self, id: PartId) -> (Vec2, f32) {
        let bone = &self.bones[id.0];
        match bone.parent {
            Some(parent) => {
                let (position, angle) = self.char_transform(parent);
                (
                    position + rotate(bone.local_position, angle),
                    angle + bone.local_rotation,
                )
            }
            None => (bone.local_position, bone.local_rotation),
        }
    }

    /// Character-space rotation of a bone (radians)
    pub fn rotation(&self, id: PartId) -> f32 {
        let bone = &self.bones[id.0];
        let parent = bone.parent.map_or(0.0, |p| self.rotation(p));
        parent + bone.local_rotation
    }

    /// Character-space rest rotation (radians)
    pub fn rest_rotation(&self, id: PartId) -> f32 {
        self.bones[id.0].rest_rotation
    }

    pub fn local_rotation(&self, id: PartId) -> f32 {
        self.bones[id.0].local_rotation
    }

    pub fn local_position(&self, id: PartId) -> Vec2 {
        self.bones[id.0].local_position
    }

    /// Unit vector along the bone's local x axis, in character space
    pub fn right(&self, id: PartId) -> Vec2 {
        Vec2::from_angle(self.rotation(id))
    }

    /// World-space angle of the bone's x axis (radians), mirrored when facing left
    pub fn world_rotation(&self, id: PartId) -> f32 {
        let angle = self.rotation(id);
        if self.facing >= 0.0 {
            angle
        } else {
            PI - angle
        }
    }

    /// World position of the bone origin
    pub fn world_position(&self, id: PartId) -> Vec2 {
        self.world_point(id, Vec2::ZERO)
    }

    /// Transform a point from bone-local space to world space
    pub fn world_point(&self, id: PartId, local: Vec2) -> Vec2 {
        let (position, angle) = self.char_transform(id);
        self.root + mirror_x(position + rotate(local, angle), self.facing)
    }

    /// Restore the configured local position
    pub fn reset_local_position(&mut self, id: PartId) {
        let bone = &mut self.bones[id.0];
        bone.local_position = bone.rest_offset;
    }

    /// Move a bone off its rest position (engine-side drift)
    pub fn set_local_position(&mut self, id: PartId, position: Vec2) {
        self.bones[id.0].local_position = position;
    }

    /// Set the character-space rotation, keeping the parent untouched
    pub fn set_rotation(&mut self, id: PartId, angle: f32) {
        let parent = self.bones[id.0].parent.map_or(0.0, |p| self.rotation(p));
        self.bones[id.0].local_rotation = angle - parent;
    }

    /// Rotate a bone about its own origin; children follow
    pub fn rotate_local(&mut self, id: PartId, radians: f32) {
        self.bones[id.0].local_rotation += radians;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    /// upper arm hanging down from (0, 1), forearm continuing along it
    fn arm() -> Skeleton {
        let bones = vec![
            Bone::new(None, Vec2::new(0.0, 1.0), -FRAC_PI_2),
            Bone::new(Some(PartId(0)), Vec2::new(0.3, 0.0), -FRAC_PI_2),
        ];
        Skeleton::new(bones, vec![PartId(0), PartId(1)])
    }

    #[test]
    fn test_rest_pose_positions() {
        let skeleton = arm();
        let elbow = skeleton.world_position(PartId(1));
        assert_abs_diff_eq!(elbow.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(elbow.y, 0.7, epsilon = 1e-6);
        assert_abs_diff_eq!(skeleton.local_rotation(PartId(1)), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_children_follow_parent_rotation() {
        let mut skeleton = arm();
        skeleton.rotate_local(PartId(0), FRAC_PI_2);
        let elbow = skeleton.world_position(PartId(1));
        assert_abs_diff_eq!(elbow.x, 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(elbow.y, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(skeleton.rotation(PartId(1)), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_set_rotation_is_character_space() {
        let mut skeleton = arm();
        skeleton.set_rotation(PartId(1), 0.25);
        assert_abs_diff_eq!(skeleton.rotation(PartId(1)), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(skeleton.rotation(PartId(0)), -FRAC_PI_2, epsilon = 1e-6);
    }

    #[test]
    fn test_facing_left_mirrors_world_points() {
        let mut skeleton = arm();
        skeleton.set_root(Vec2::new(5.0, 0.0));
        let right = skeleton.world_point(PartId(1), Vec2::new(0.0, 0.2));
        skeleton.set_facing_right(false);
        let left = skeleton.world_point(PartId(1), Vec2::new(0.0, 0.2));
        assert_abs_diff_eq!(right.x - 5.0, -(left.x - 5.0), epsilon = 1e-6);
        assert_abs_diff_eq!(right.y, left.y, epsilon = 1e-6);
    }

    #[test]
    fn test_world_rotation_mirrors_axis() {
        let mut skeleton = arm();
        skeleton.set_rotation(PartId(1), 0.3);
        skeleton.set_facing_right(false);
        let axis = Vec2::from_angle(skeleton.world_rotation(PartId(1)));
        let along = skeleton.world_point(PartId(1), Vec2::X) - skeleton.world_position(PartId(1));
        assert_abs_diff_eq!(axis.x, along.x, epsilon = 1e-6);
        assert_abs_diff_eq!(axis.y, along.y, epsilon = 1e-6);
    }

    #[test]
    fn test_reset_local_position() {
        let mut skeleton = arm();
        skeleton.set_local_position(PartId(1), Vec2::new(0.5, 0.1));
        skeleton.reset_local_position(PartId(1));
        assert_eq!(skeleton.local_position(PartId(1)), Vec2::new(0.3, 0.0));
    }
}
