use rapier2d::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Collision groups for filtering what objects can collide with each other
///
/// Body parts of one character overlap constantly, so characters never
/// collide with characters; weapons are sensors that only look for bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroups {
    /// Rig body parts
    Character = 0b0000_0001,

    /// Weapon trigger volumes
    Weapon = 0b0000_0010,

    /// Static level geometry (ground, walls)
    Environment = 0b0000_0100,

    /// Loose dynamic objects that can strike a character
    Prop = 0b0000_1000,
}

impl CollisionGroups {
    /// Convert to rapier2d's InteractionGroups
    pub fn to_interaction_groups(self) -> InteractionGroups {
        let memberships = Group::from_bits_truncate(self as u32);

        let filter = match self {
            CollisionGroups::Character => Group::from_bits_truncate(
                CollisionGroups::Weapon as u32
                    | CollisionGroups::Environment as u32
                    | CollisionGroups::Prop as u32,
            ),

            CollisionGroups::Weapon => Group::from_bits_truncate(
                CollisionGroups::Character as u32 | CollisionGroups::Prop as u32,
            ),

            CollisionGroups::Environment => Group::from_bits_truncate(
                CollisionGroups::Character as u32 | CollisionGroups::Prop as u32,
            ),

            CollisionGroups::Prop => Group::ALL,
        };

        InteractionGroups::new(memberships, filter)
    }
}

/// Contact lifecycle event reported by the physics step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEvent {
    /// Two colliders started touching
    Started {
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    },

    /// Two colliders stopped touching
    Stopped {
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    },
}

impl CollisionEvent {
    /// The pair of colliders, smaller handle first
    pub fn pair(&self) -> (ColliderHandle, ColliderHandle) {
        let (a, b) = match *self {
            CollisionEvent::Started {
                collider1,
                collider2,
            }
            | CollisionEvent::Stopped {
                collider1,
                collider2,
            } => (collider1, collider2),
        };
        ordered_pair(a, b)
    }
}

/// Order a collider pair so lookups do not depend on which side rapier put first
pub fn ordered_pair(a: ColliderHandle, b: ColliderHandle) -> (ColliderHandle, ColliderHandle) {
    if a.into_raw_parts() <= b.into_raw_parts() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Queue for storing collision events during physics step
pub struct CollisionEventQueue {
    events: Arc<Mutex<Vec<CollisionEvent>>>,
}

impl CollisionEventQueue {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::with_capacity(32))),
        }
    }

    /// Clear all events (call at start of physics step)
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Get all collision events from the last step
    pub fn events(&self) -> Vec<CollisionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Pairs that started touching during the last step
    pub fn started_pairs(&self) -> HashSet<(ColliderHandle, ColliderHandle)> {
        self.events()
            .iter()
            .filter(|event| matches!(event, CollisionEvent::Started { .. }))
            .map(CollisionEvent::pair)
            .collect()
    }

    fn push(&self, event: CollisionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Default for CollisionEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CollisionEventQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: rapier2d::prelude::CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        match event {
            rapier2d::prelude::CollisionEvent::Started(h1, h2, _flags) => {
                self.push(CollisionEvent::Started {
                    collider1: h1,
                    collider2: h2,
                });
            }
            rapier2d::prelude::CollisionEvent::Stopped(h1, h2, _flags) => {
                self.push(CollisionEvent::Stopped {
                    collider1: h1,
                    collider2: h2,
                });
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
        // Impulses are read straight from the contact manifolds after the step
    }
}
