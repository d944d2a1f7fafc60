// Engine modules: fixed-step timing and the physics bridge

pub mod game_loop;
pub mod physics;
