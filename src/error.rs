use std::fmt;

use thiserror::Error;

use crate::change::Action;
use crate::conformance::ConformanceError;

/// Which side of a change a rejected value was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side { Old, New }

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Old => write!(f, "old"),
            Side::New => write!(f, "new"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    /// A supplied value does not conform to the declared type. `errors` is
    /// never empty.
    #[error("{side} value does not conform to type: {}", first(.errors))]
    Conformance { side: Side, errors: Vec<ConformanceError> },

    /// Forced-replace paths were requested from a change that is not a replace.
    #[error("forced-replace paths are only recorded for replace changes, this is a {action} change")]
    ForcedReplaceUnavailable { action: Action },
}

impl ChangeError {
    pub fn conformance_errors(&self) -> &[ConformanceError] {
        match self {
            ChangeError::Conformance { errors, .. } => errors,
            ChangeError::ForcedReplaceUnavailable { .. } => &[],
        }
    }
}

fn first(errors: &[ConformanceError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [head, rest @ ..] => format!("{head} (and {} more)", rest.len()),
    }
}
