use super::checkout::{Inconsistency, SubmissionOutcome};
use crate::domain::route::Redirect;

impl SubmissionOutcome {
    /// Where the applicant goes once the submission settles.
    ///
    /// `None` keeps the applicant on the checkout form (local rejection or an
    /// intent that could not be created).
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            SubmissionOutcome::Rejected(_) | SubmissionOutcome::IntentFailed { .. } => None,
            SubmissionOutcome::Succeeded { application_id, .. } => {
                Some(Redirect::PaymentSuccess {
                    application_id: application_id.clone(),
                })
            }
            SubmissionOutcome::PaymentFailed {
                application_id,
                error,
                ..
            } => Some(Redirect::PaymentFailure {
                application_id: application_id.clone(),
                error: error.clone(),
            }),
            SubmissionOutcome::Inconsistent(inconsistency) => Some(Redirect::PaymentFailure {
                application_id: None,
                error: reconciliation_notice(inconsistency),
            }),
        }
    }

    /// Message to show while the applicant stays on the checkout form.
    pub fn inline_error(&self) -> Option<String> {
        match self {
            SubmissionOutcome::Rejected(rejection) => Some(rejection.to_string()),
            SubmissionOutcome::IntentFailed { error } => Some(error.clone()),
            _ => None,
        }
    }
}

fn reconciliation_notice(inconsistency: &Inconsistency) -> String {
    format!(
        "Your payment {} may have been taken but your application was not saved. \
         Please contact support with this reference.",
        inconsistency.transaction_id
    )
}
