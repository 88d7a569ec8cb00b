//! Simulation Errors
//!
//! Construction-time and API-misuse failures. Gameplay preconditions
//! (an attack requested mid-swing, a skill on cooldown) are not errors;
//! those requests are silently ignored by the owning state machine.

/// Failure to resolve an actor's named rig parts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    /// No part matched any of the accepted weapon names.
    #[error("rig has no weapon part (accepted names: {accepted:?})")]
    MissingWeapon {
        /// Names that would have been accepted
        accepted: Vec<&'static str>,
    },

    /// Two parts share a name, so lookup would be ambiguous.
    #[error("duplicate rig part name: {0}")]
    DuplicatePart(String),

    /// A part has a non-positive or non-finite length.
    #[error("rig part {name} has invalid length {length}")]
    InvalidLength {
        /// Offending part
        name: String,
        /// Length as configured
        length: f32,
    },
}

/// Configuration load or validation failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config JSON is malformed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but is semantically invalid.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Upgrade selection misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// `choose_upgrade` called with nothing on offer.
    #[error("no upgrade selection is pending")]
    NoPendingOffer,

    /// Index past the end of the current offer.
    #[error("upgrade index {index} out of range (offer has {len} options)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of options on offer
        len: usize,
    },
}

/// Any error raised while building or driving a [`World`](crate::game::world::World).
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Rig binding failed.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Upgrade selection failed.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SelectionError::IndexOutOfRange { index: 5, len: 3 };
        assert_eq!(err.to_string(), "upgrade index 5 out of range (offer has 3 options)");

        let err = ConfigError::invalid("wave.base_quota", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid config value for wave.base_quota: must be at least 1"
        );
    }

    #[test]
    fn test_sim_error_from() {
        let err: SimError = SelectionError::NoPendingOffer.into();
        assert!(matches!(err, SimError::Selection(SelectionError::NoPendingOffer)));
        assert_eq!(err.to_string(), "no upgrade selection is pending");
    }
}
