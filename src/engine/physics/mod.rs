// Physics bridge using rapier2d: kinematic rig bodies, props, level geometry
// and contact reports for the hit-reaction rig

pub mod body;
mod collision;
mod world;

pub use body::ColliderHandle;
pub use collision::CollisionGroups;
pub use world::{PhysicsWorld, RigBodies};
