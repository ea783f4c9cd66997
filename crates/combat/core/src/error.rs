//! Common error infrastructure for combat-core.
//!
//! Domain-specific errors (e.g. `AttackError`, `CatalogError`) are defined in
//! the modules that raise them. This module provides the severity taxonomy
//! and the trait every error implements so the runtime can decide between
//! skipping a single step and aborting a whole duel.
//!
//! # Severity Mapping
//!
//! - **Recoverable**: contention on a shared row; the step is skipped
//! - **Validation**: stale or invalid input; the step is skipped with a message
//! - **Internal**: inconsistent data (e.g. a catalog key with no template)
//! - **Fatal**: the exchange cannot continue and must be ended

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the same step may succeed later.
    ///
    /// Examples: row lock wait timed out
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: selected item no longer owned, ranged weapon without ammo
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: inventory references an unknown template
    Internal,

    /// Fatal error - the exchange cannot continue.
    ///
    /// Examples: store unavailable, poisoned lock
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if the failing step can be skipped and the exchange continued.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable | Self::Validation)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
/// - Return stable, upper-case error codes for logs and tests
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_recoverable_and_validation_allow_continuing() {
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(ErrorSeverity::Validation.is_recoverable());
        assert!(!ErrorSeverity::Internal.is_recoverable());
        assert!(ErrorSeverity::Fatal.is_internal());
    }
}
