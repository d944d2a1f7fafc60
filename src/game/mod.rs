pub mod characters;
pub mod combat;
pub mod rig;
