use combat_core::{AttackError, CatalogError, CombatError, ErrorSeverity};
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;

/// Why a single resolution step did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// Stale or invalid input. The step is skipped with this message.
    #[error("{0}")]
    Validation(String),

    /// A row stayed locked past the store's lock timeout.
    #[error("could not act (resources busy)")]
    Contention,

    /// Inconsistent data or a broken store. The whole duel ends.
    #[error("{code}: {message}")]
    Fatal { code: &'static str, message: String },
}

impl StepError {
    /// Map any combat error onto step handling by its severity.
    pub fn classify<E: CombatError>(err: &E) -> Self {
        match err.severity() {
            ErrorSeverity::Recoverable => StepError::Contention,
            ErrorSeverity::Validation => StepError::Validation(err.to_string()),
            ErrorSeverity::Internal | ErrorSeverity::Fatal => StepError::Fatal {
                code: err.error_code(),
                message: err.to_string(),
            },
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StepError::Fatal { .. })
    }
}

impl CombatError for StepError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            StepError::Validation(_) => ErrorSeverity::Validation,
            StepError::Contention => ErrorSeverity::Recoverable,
            StepError::Fatal { .. } => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            StepError::Validation(_) => "STEP_VALIDATION",
            StepError::Contention => "STEP_CONTENTION",
            StepError::Fatal { code, .. } => *code,
        }
    }
}

impl From<StoreError> for StepError {
    fn from(err: StoreError) -> Self {
        Self::classify(&err)
    }
}

impl From<AttackError> for StepError {
    fn from(err: AttackError) -> Self {
        Self::classify(&err)
    }
}

impl From<CatalogError> for StepError {
    fn from(err: CatalogError) -> Self {
        Self::classify(&err)
    }
}

/// How a settled step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    /// Committed.
    Applied(T),
    /// Rolled back; the actor's turn is a no-op with this message.
    Skipped(String),
    /// Rolled back; the duel must end.
    Fatal(StepError),
}

impl<T> StepOutcome<T> {
    pub(crate) fn from_error(err: StepError) -> Self {
        match err {
            StepError::Validation(_) | StepError::Contention => {
                warn!(target: "runtime::guard", code = err.error_code(), reason = %err, "step skipped");
                StepOutcome::Skipped(err.to_string())
            }
            StepError::Fatal { .. } => {
                error!(target: "runtime::guard", code = err.error_code(), error = %err, "step failed");
                StepOutcome::Fatal(err)
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StepOutcome<U> {
        match self {
            StepOutcome::Applied(value) => StepOutcome::Applied(f(value)),
            StepOutcome::Skipped(reason) => StepOutcome::Skipped(reason),
            StepOutcome::Fatal(err) => StepOutcome::Fatal(err),
        }
    }

    pub fn applied(self) -> Option<T> {
        match self {
            StepOutcome::Applied(value) => Some(value),
            StepOutcome::Skipped(_) | StepOutcome::Fatal(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use combat_core::{ItemId, ItemKey, PlayerId};

    use super::*;
    use crate::store::LockKey;

    #[test]
    fn severities_map_to_step_handling() {
        assert_eq!(
            StepError::from(StoreError::LockTimeout(LockKey::Combatant(PlayerId(1)))),
            StepError::Contention
        );
        assert!(matches!(
            StepError::from(StoreError::ItemNotFound(ItemId(3))),
            StepError::Validation(_)
        ));
        assert!(StepError::from(StoreError::LockPoisoned).is_fatal());
        assert!(StepError::from(CatalogError::ItemNotFound(ItemKey::from("x"))).is_fatal());
        assert!(matches!(
            StepError::from(AttackError::MissingAmmo {
                weapon: "luger".into()
            }),
            StepError::Validation(msg) if msg.contains("needs ammunition")
        ));
    }

    #[test]
    fn fatal_keeps_the_source_code() {
        let err = StepError::from(StoreError::LockPoisoned);
        assert_eq!(err.error_code(), "STORE_LOCK_POISONED");
    }
}
