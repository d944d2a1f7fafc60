// Designer-facing rig configuration
//
// One `PartConfig` per controlled body part, mirroring what a designer would set
// up per limb: parent, colliders, weakness, leg flag and crouch bend lists.
// Loaded from TOML or built in code with `RigConfig::humanoid()`.

use std::fs;
use std::path::Path;

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Complete rig description for one character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    /// Mass of the character body, used to gate crouch impulses
    #[serde(default = "default_body_mass")]
    pub body_mass: f32,
    /// Response constants
    #[serde(default)]
    pub tuning: Tuning,
    /// Body part definitions (any order; parents are resolved by name)
    pub parts: Vec<PartConfig>,
}

/// One body part definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartConfig {
    pub name: String,
    /// Name of the parent part. None attaches the part to the character root.
    #[serde(default)]
    pub parent: Option<String>,
    /// Local position relative to the parent joint (or the character root)
    #[serde(default)]
    pub rest_offset: Vec2,
    /// Rotation used when no animated target is available, degrees
    #[serde(default)]
    pub rest_rotation_deg: f32,
    /// How easily this part rotates. 1 is standard, 2 is twice as weak.
    #[serde(default = "default_weakness")]
    pub weakness: f32,
    /// Legs split vertical impact into a shared crouch instead of rotating
    #[serde(default)]
    pub is_leg: bool,
    #[serde(default)]
    pub colliders: Vec<ColliderConfig>,
    /// Parts bent counter-clockwise while crouching
    #[serde(default)]
    pub bend_left: Vec<BendConfig>,
    /// Parts bent clockwise while crouching
    #[serde(default)]
    pub bend_right: Vec<BendConfig>,
}

/// A collider owned by a body part, placed in the part's local space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderConfig {
    /// Unique across the whole rig
    pub name: String,
    pub shape: ColliderShape,
    #[serde(default)]
    pub offset: Vec2,
    #[serde(default)]
    pub rotation_deg: f32,
}

/// Supported collider shapes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColliderShape {
    Cuboid { half_extents: Vec2 },
    Ball { radius: f32 },
    /// Capsule lying along the local x axis
    Capsule { half_length: f32, radius: f32 },
}

/// A crouch bend target with the fraction of the crouch amount it receives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BendConfig {
    pub target: String,
    pub fraction: f32,
}

/// Constants of the hit response, crouch and touch heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Share of the impulse transferred to the parent is `transfer_base - up_down`
    pub transfer_base: f32,
    /// Applied rotation per unit of accumulated rotation (times weakness)
    pub rotation_scale: f32,
    /// Torque lost per second, as a fraction of itself
    pub torque_decay: f32,
    /// Accumulated rotation is damped toward this fraction of itself
    pub rotation_return_ratio: f32,
    /// Seconds for the rotation damping to close 99% of its gap
    pub rotation_return_time: f32,
    /// |rotation| * weakness below which a part goes quiescent
    pub quiescence_threshold: f32,
    /// Vertical force over body mass needed to register a crouch
    pub crouch_threshold: f32,
    /// Seconds for the crouch amount to catch up with the crouch impulse
    pub crouch_smooth_time: f32,
    /// Linear decay of the crouch impulse, units per second
    pub crouch_decay_rate: f32,
    /// Crouch amount and impulse below this skip the crouch pass
    pub crouch_idle: f32,
    /// Minimum push into the touched surface before touch torque kicks in
    pub touch_threshold: f32,
    /// Gain of the torque opposing rotation into a touched surface
    pub touch_torque_gain: f32,
    /// Scale applied to normal impulse / dt when building contact impulses
    pub impulse_scale: f32,
    /// Mass assumed for colliders without a rigid body
    pub static_mass: f32,
    /// Scale torque by a sigmoid of the colliding mass
    pub mass_damping: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            transfer_base: 1.5,
            rotation_scale: 0.5,
            torque_decay: 3.0,
            rotation_return_ratio: 7.0 / 8.0,
            rotation_return_time: 0.2,
            quiescence_threshold: 0.01,
            crouch_threshold: 0.2,
            crouch_smooth_time: 1.0,
            crouch_decay_rate: 1.0,
            crouch_idle: 0.1,
            touch_threshold: 0.1,
            touch_torque_gain: 10.0,
            impulse_scale: 0.001,
            static_mass: 1000.0,
            mass_damping: false,
        }
    }
}

fn default_body_mass() -> f32 {
    10.0
}

fn default_weakness() -> f32 {
    1.0
}

impl RigConfig {
    /// Parse a rig from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a rig from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded rig with {} parts from {:?}", config.parts.len(), path);
        Ok(config)
    }

    /// Serialize the rig back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Standard fifteen-part humanoid, facing right, limbs along their local x axis
    pub fn humanoid() -> Self {
        let mut parts = vec![
            PartConfig::new("hips", None, Vec2::new(0.0, 1.0), 90.0)
                .with_collider("hips", ColliderShape::cuboid(0.15, 0.18), Vec2::new(0.1, 0.0))
                .with_weakness(0.5),
            PartConfig::new("torso", Some("hips"), Vec2::new(0.2, 0.0), 90.0)
                .with_collider("torso", ColliderShape::cuboid(0.25, 0.18), Vec2::new(0.25, 0.0))
                .with_weakness(0.7),
            PartConfig::new("head", Some("torso"), Vec2::new(0.55, 0.0), 90.0)
                .with_collider("head", ColliderShape::Ball { radius: 0.15 }, Vec2::new(0.15, 0.0)),
        ];

        for side in ["r", "l"] {
            let upper = format!("upper_arm_{side}");
            let lower = format!("lower_arm_{side}");
            let hand = format!("hand_{side}");
            parts.push(
                PartConfig::new(&upper, Some("torso"), Vec2::new(0.45, 0.0), -90.0)
                    .with_collider(&upper, ColliderShape::capsule(0.14, 0.05), Vec2::new(0.14, 0.0)),
            );
            parts.push(
                PartConfig::new(&lower, Some(&upper), Vec2::new(0.28, 0.0), -90.0)
                    .with_collider(&lower, ColliderShape::capsule(0.13, 0.045), Vec2::new(0.13, 0.0))
                    .with_weakness(1.2),
            );
            parts.push(
                PartConfig::new(&hand, Some(&lower), Vec2::new(0.26, 0.0), -90.0)
                    .with_collider(&hand, ColliderShape::Ball { radius: 0.05 }, Vec2::new(0.05, 0.0))
                    .with_weakness(1.5),
            );
        }

        for side in ["r", "l"] {
            let thigh = format!("thigh_{side}");
            let shin = format!("shin_{side}");
            let foot = format!("foot_{side}");
            let mut thigh_part = PartConfig::new(&thigh, Some("hips"), Vec2::ZERO, -90.0)
                .with_collider(&thigh, ColliderShape::capsule(0.2, 0.07), Vec2::new(0.2, 0.0))
                .leg();
            thigh_part.bend_left = vec![
                BendConfig::new(&thigh, 0.5),
                BendConfig::new(&foot, 0.5),
            ];
            thigh_part.bend_right = vec![BendConfig::new(&shin, 1.0)];
            parts.push(thigh_part);
            parts.push(
                PartConfig::new(&shin, Some(&thigh), Vec2::new(0.4, 0.0), -90.0)
                    .with_collider(&shin, ColliderShape::capsule(0.2, 0.06), Vec2::new(0.2, 0.0))
                    .leg(),
            );
            parts.push(
                PartConfig::new(&foot, Some(&shin), Vec2::new(0.4, 0.0), 0.0)
                    .with_collider(&foot, ColliderShape::cuboid(0.1, 0.04), Vec2::new(0.08, 0.0))
                    .leg(),
            );
        }

        Self {
            body_mass: default_body_mass(),
            tuning: Tuning::default(),
            parts,
        }
    }
}

impl PartConfig {
    pub fn new(name: &str, parent: Option<&str>, rest_offset: Vec2, rest_rotation_deg: f32) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            rest_offset,
            rest_rotation_deg,
            weakness: default_weakness(),
            is_leg: false,
            colliders: Vec::new(),
            bend_left: Vec::new(),
            bend_right: Vec::new(),
        }
    }

    /// Attach a collider at `offset` in the part's local space
    pub fn with_collider(mut self, name: &str, shape: ColliderShape, offset: Vec2) -> Self {
        self.colliders.push(ColliderConfig {
            name: name.to_string(),
            shape,
            offset,
            rotation_deg: 0.0,
        });
        self
    }

    pub fn with_weakness(mut self, weakness: f32) -> Self {
        self.weakness = weakness;
        self
    }

    /// Flag the part as a leg
    pub fn leg(mut self) -> Self {
        self.is_leg = true;
        self
    }
}

impl BendConfig {
    pub fn new(target: &str, fraction: f32) -> Self {
        Self {
            target: target.to_string(),
            fraction,
        }
    }
}

impl ColliderShape {
    pub fn cuboid(half_width: f32, half_height: f32) -> Self {
        Self::Cuboid {
            half_extents: Vec2::new(half_width, half_height),
        }
    }

    pub fn capsule(half_length: f32, radius: f32) -> Self {
        Self::Capsule {
            half_length,
            radius,
        }
    }
}
