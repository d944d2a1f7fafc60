// Animator interface used by weapons, plus a parameter store host engines can
// read back each frame

use std::collections::{HashMap, HashSet};

/// Animator layer that carries upper-body attack animations
pub const UPPER_BODY_LAYER: usize = 1;

/// Animator parameters driven by weapon code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimParam {
    JabArmRight,
    SwingArmRight,
    MeleeBlocking,
    TapBlockForward,
    HoldBlockForward,
}

/// The slice of a state-machine animator weapons need
pub trait Animator {
    fn set_trigger(&mut self, param: AnimParam);
    fn reset_trigger(&mut self, param: AnimParam);
    fn set_bool(&mut self, param: AnimParam, value: bool);
    fn layer_weight(&self, layer: usize) -> f32;
    fn set_layer_weight(&mut self, layer: usize, weight: f32);
    /// Whether the layer is blending between two states
    fn is_in_transition(&self, layer: usize) -> bool;
}

/// Plain parameter store implementing [`Animator`]
#[derive(Debug, Clone, Default)]
pub struct AnimatorParams {
    triggers: HashSet<AnimParam>,
    bools: HashMap<AnimParam, bool>,
    layer_weights: HashMap<usize, f32>,
    transitioning: HashSet<usize>,
}

impl AnimatorParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trigger_set(&self, param: AnimParam) -> bool {
        self.triggers.contains(&param)
    }

    /// Read and clear a trigger, as a state machine does when it fires
    pub fn consume_trigger(&mut self, param: AnimParam) -> bool {
        self.triggers.remove(&param)
    }

    pub fn bool_value(&self, param: AnimParam) -> bool {
        self.bools.get(&param).copied().unwrap_or(false)
    }

    /// Host-side: mark a layer as transitioning
    pub fn set_in_transition(&mut self, layer: usize, transitioning: bool) {
        if transitioning {
            self.transitioning.insert(layer);
        } else {
            self.transitioning.remove(&layer);
        }
    }
}

impl Animator for AnimatorParams {
    fn set_trigger(&mut self, param: AnimParam) {
        self.triggers.insert(param);
    }

    fn reset_trigger(&mut self, param: AnimParam) {
        self.triggers.remove(&param);
    }

    fn set_bool(&mut self, param: AnimParam, value: bool) {
        self.bools.insert(param, value);
    }

    fn layer_weight(&self, layer: usize) -> f32 {
        self.layer_weights.get(&layer).copied().unwrap_or(0.0)
    }

    fn set_layer_weight(&mut self, layer: usize, weight: f32) {
        self.layer_weights.insert(layer, weight.clamp(0.0, 1.0));
    }

    fn is_in_transition(&self, layer: usize) -> bool {
        self.transitioning.contains(&layer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

/// Linear layer weight fade, advanced explicitly each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFade {
    layer: usize,
    direction: FadeDirection,
    start_weight: f32,
    duration: f32,
    elapsed: f32,
}

impl LayerFade {
    pub fn new(layer: usize, direction: FadeDirection, start_weight: f32, duration: f32) -> Self {
        Self {
            layer,
            direction,
            start_weight,
            duration,
            elapsed: 0.0,
        }
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    fn target(&self) -> f32 {
        match self.direction {
            FadeDirection::In => 1.0,
            FadeDirection::Out => 0.0,
        }
    }

    /// Advance the fade, returning the layer weight to apply
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.elapsed += dt;
        if self.is_finished() {
            return self.target();
        }
        let t = self.elapsed / self.duration;
        self.start_weight + (self.target() - self.start_weight) * t
    }

    pub fn is_finished(&self) -> bool {
        self.duration <= 0.0 || self.elapsed >= self.duration
    }

    /// Push the current weight to an animator
    pub fn apply(&mut self, animator: &mut dyn Animator, dt: f32) {
        let weight = self.tick(dt);
        animator.set_layer_weight(self.layer, weight);
    }
}
