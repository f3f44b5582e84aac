//! Command-cycle error taxonomy.
//!
//! Every variant is recoverable: the dispatcher rings the bell, clears the
//! partial command state, and the next key starts a fresh cycle. Only the
//! register and external-service failures carry message text; the rest stay
//! silent beyond the bell.

use patina_state::RegisterError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalError {
    #[error("unknown command")]
    UnknownCommand,
    /// A recognized command in a context where it cannot apply (operator
    /// pending, missing service, wrong mode).
    #[error("command not applicable here")]
    InapplicableContext,
    #[error("invalid register name '{0}'")]
    InvalidRegister(char),
    #[error("register '{0}' is read-only")]
    ReadOnlyRegister(char),
    /// A zero-width operator region under strict rejection.
    #[error("empty region")]
    EmptyRegion,
    /// The motion after an operator could not move; the operator is
    /// cancelled without touching the buffer.
    #[error("motion failed")]
    MotionFailed,
    #[error("nothing in register to put")]
    NothingToPut,
    #[error("external service failed: {0}")]
    ExternalService(String),
}

impl NormalError {
    /// Whether the failure carries a user-visible message beyond the bell.
    pub fn has_message(&self) -> bool {
        matches!(
            self,
            NormalError::InvalidRegister(_)
                | NormalError::ReadOnlyRegister(_)
                | NormalError::ExternalService(_)
        )
    }
}

impl From<RegisterError> for NormalError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Invalid(c) => NormalError::InvalidRegister(c),
            RegisterError::ReadOnly(c) => NormalError::ReadOnlyRegister(c),
        }
    }
}

impl From<anyhow::Error> for NormalError {
    fn from(err: anyhow::Error) -> Self {
        NormalError::ExternalService(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_register_and_service_errors_carry_messages() {
        assert!(NormalError::InvalidRegister('!').has_message());
        assert!(NormalError::ExternalService("fmt".into()).has_message());
        assert!(!NormalError::UnknownCommand.has_message());
        assert!(!NormalError::MotionFailed.has_message());
    }

    #[test]
    fn register_errors_convert() {
        assert_eq!(
            NormalError::from(RegisterError::ReadOnly('%')),
            NormalError::ReadOnlyRegister('%')
        );
    }
}
