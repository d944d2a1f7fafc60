// Body part records and their per-tick physical state

use glam::Vec2;

/// Handle into the rig's body part arena (also indexes the skeleton)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub usize);

/// Handle of a collider owned by a body part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub usize);

/// Whether the hit rotation of a part still needs processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitState {
    /// At its animated pose, nothing to apply
    #[default]
    Quiescent,
    /// Carrying collision energy that is being applied and decayed
    Decaying,
}

/// A part bent by the crouch pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendTarget {
    pub part: PartId,
    pub fraction: f32,
}

/// Crouch drive carried by leg parts
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrouchState {
    /// Smoothed bend amount actually applied (degrees per unit fraction)
    pub amount: f32,
    /// Accumulated vertical impact the amount is chasing
    pub impulse: f32,
}

/// Geometry of the most recent contact on a part
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactState {
    /// From the part origin to the contact point, character space
    pub position_vector: Vec2,
    /// Contact normal, character space, pointing into the part
    pub normal: Vec2,
    /// Where along the part the contact landed, -1 base to 1 tip
    pub up_down: f32,
    /// Sigmoid influence of the colliding mass (1 when mass damping is off)
    pub mass_influence: f32,
}

/// One rigid, independently rotatable segment of the skeleton
#[derive(Debug, Clone)]
pub struct BodyPart {
    pub(super) name: String,
    pub(super) parent: Option<PartId>,
    /// Local-space tip point along the part's x axis
    pub(super) tip: Vec2,
    pub(super) weakness: f32,
    pub(super) is_leg: bool,
    pub(super) bend_left: Vec<BendTarget>,
    pub(super) bend_right: Vec<BendTarget>,
    /// Every other leg part of the character (empty for non-legs)
    pub(super) linked_legs: Vec<PartId>,

    pub(super) torque: f32,
    /// Accumulated extra rotation, degrees
    pub(super) rotation: f32,
    pub(super) hit_state: HitState,
    pub(super) touching: bool,
    pub(super) contact: ContactState,
    pub(super) crouch: Option<CrouchState>,

    /// Animation-only right vector captured in the frame pass
    pub(super) right: Vec2,
    /// Right vector after the previous tick's overlay
    pub(super) post_right: Vec2,
}

impl BodyPart {
    pub(super) fn new(name: &str, parent: Option<PartId>, tip: Vec2, weakness: f32, is_leg: bool) -> Self {
        Self {
            name: name.to_string(),
            parent,
            tip,
            weakness,
            is_leg,
            bend_left: Vec::new(),
            bend_right: Vec::new(),
            linked_legs: Vec::new(),
            torque: 0.0,
            rotation: 0.0,
            hit_state: HitState::Quiescent,
            touching: false,
            contact: ContactState {
                mass_influence: 1.0,
                ..ContactState::default()
            },
            crouch: is_leg.then(CrouchState::default),
            right: Vec2::X,
            post_right: Vec2::X,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    pub fn tip(&self) -> Vec2 {
        self.tip
    }

    pub fn weakness(&self) -> f32 {
        self.weakness
    }

    pub fn is_leg(&self) -> bool {
        self.is_leg
    }

    pub fn linked_legs(&self) -> &[PartId] {
        &self.linked_legs
    }

    pub fn bend_left(&self) -> &[BendTarget] {
        &self.bend_left
    }

    pub fn bend_right(&self) -> &[BendTarget] {
        &self.bend_right
    }

    pub fn torque(&self) -> f32 {
        self.torque
    }

    /// Accumulated extra rotation, degrees
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn hit_state(&self) -> HitState {
        self.hit_state
    }

    pub fn is_decaying(&self) -> bool {
        self.hit_state == HitState::Decaying
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    pub fn contact(&self) -> &ContactState {
        &self.contact
    }

    /// Crouch drive, None for non-leg parts
    pub fn crouch(&self) -> Option<&CrouchState> {
        self.crouch.as_ref()
    }

    /// Any collision contribution puts the part into the decaying state
    pub(super) fn wake(&mut self) {
        self.hit_state = HitState::Decaying;
    }

    /// Back to the animated pose with no stored energy
    pub(super) fn settle(&mut self) {
        self.hit_state = HitState::Quiescent;
        self.rotation = 0.0;
        self.torque = 0.0;
    }

    pub(super) fn add_crouch_impulse(&mut self, amount: f32) {
        if let Some(crouch) = self.crouch.as_mut() {
            crouch.impulse += amount;
        }
    }
}
