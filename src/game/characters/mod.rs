// Character system
//
// - Character entity tying the hit-reaction rig to its physics bodies
// - Locomotion state shared with the weapon (facing, flip locks, grounding)

pub mod character;
pub mod locomotion;

pub use character::{Character, CharacterId};
pub use locomotion::Locomotion;
