use crate::error::{CheckoutError, Result};
use std::fmt;
use tracing::debug;

/// Stages of a single checkout submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutState {
    Idle,
    Validating,
    CreatingIntent,
    Confirming,
    WritingFailureRecord,
    WritingSuccessRecord,
    Failed,
    Succeeded,
    Inconsistent,
}

impl CheckoutState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CheckoutState::Failed | CheckoutState::Succeeded | CheckoutState::Inconsistent
        )
    }

    pub fn can_transition_to(self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Idle)
                | (Validating, CreatingIntent)
                | (CreatingIntent, Failed)
                | (CreatingIntent, Confirming)
                | (Confirming, WritingFailureRecord)
                | (Confirming, WritingSuccessRecord)
                | (Confirming, Inconsistent)
                | (WritingFailureRecord, Failed)
                | (WritingSuccessRecord, Succeeded)
                | (WritingSuccessRecord, Inconsistent)
        )
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutState::Idle => "idle",
            CheckoutState::Validating => "validating",
            CheckoutState::CreatingIntent => "creating-intent",
            CheckoutState::Confirming => "confirming",
            CheckoutState::WritingFailureRecord => "writing-failure-record",
            CheckoutState::WritingSuccessRecord => "writing-success-record",
            CheckoutState::Failed => "failed",
            CheckoutState::Succeeded => "succeeded",
            CheckoutState::Inconsistent => "inconsistent",
        };
        f.write_str(name)
    }
}

/// Ordered record of the states one submission passed through.
///
/// `Idle` is only re-entered after a validation rejection; every other state
/// is visited at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTrace {
    states: Vec<CheckoutState>,
}

impl Default for SubmissionTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionTrace {
    pub fn new() -> Self {
        Self {
            states: vec![CheckoutState::Idle],
        }
    }

    pub fn current(&self) -> CheckoutState {
        *self.states.last().unwrap_or(&CheckoutState::Idle)
    }

    pub fn states(&self) -> &[CheckoutState] {
        &self.states
    }

    pub fn advance(&mut self, next: CheckoutState) -> Result<()> {
        let current = self.current();
        let revisits = next != CheckoutState::Idle && self.states.contains(&next);
        if !current.can_transition_to(next) || revisits {
            return Err(CheckoutError::InternalError(format!(
                "illegal checkout transition {current} -> {next}"
            )));
        }
        debug!(from = %current, to = %next, "checkout transition");
        self.states.push(next);
        Ok(())
    }
}
