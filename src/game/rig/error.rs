// Rig setup errors

/// Configuration errors detected while building the rig.
/// These are fatal to character setup; each names the offending part.
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    #[error("Body part '{0}' is defined more than once")]
    DuplicatePart(String),

    #[error("Body part '{part}' names unknown parent '{parent}'")]
    UnknownParent { part: String, parent: String },

    #[error("Collider '{collider}' is attached to both '{first}' and '{second}'")]
    DuplicateCollider {
        collider: String,
        first: String,
        second: String,
    },

    #[error("Body part '{part}' bends unknown part '{target}' when crouching")]
    UnknownBendTarget { part: String, target: String },

    #[error("Body part '{0}' is its own ancestor")]
    ParentCycle(String),

    #[error("Body mass must be positive, got {0}")]
    NonPositiveMass(f32),

    #[error("Body part '{part}' has invalid weakness {weakness}; it must be finite and positive")]
    InvalidWeakness { part: String, weakness: f32 },
}

/// Errors loading a rig description from disk
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rig description: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize rig description: {0}")]
    Serialize(#[from] toml::ser::Error),
}
