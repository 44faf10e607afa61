use super::state::{CheckoutState, SubmissionTrace};
use crate::domain::application::{ApplicationId, ApplicationRecord, PaymentMethod};
use crate::domain::money::Money;
use crate::domain::payment::{
    BillingDetails, CardToken, ConfirmOutcome, IntentRequest, PaymentAttempt, PaymentIntent,
    SubmissionKey,
};
use crate::domain::ports::{
    ApplicationWriterBox, IdentityProviderBox, PaymentGatewayBox, ScholarshipCatalogBox,
};
use crate::domain::route::Redirect;
use crate::domain::scholarship::{ScholarshipId, ScholarshipOffer};
use crate::domain::session::{BearerToken, Identity};
use crate::error::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{error, info, warn};

/// Local rejections. None of these reach the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please agree to the terms and conditions")]
    TermsNotAccepted,
    #[error("Please enter the cardholder name")]
    MissingCardholderName,
    #[error("Payment form is not ready yet, please wait a moment")]
    PaymentNotReady,
    #[error("There is nothing to charge for this scholarship")]
    NothingToCharge,
    #[error("A payment for this checkout is already being processed")]
    SubmissionInProgress,
}

/// What the applicant filled in on the checkout form.
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    pub cardholder_name: String,
    pub terms_accepted: bool,
    pub card: CardToken,
    pub payment_method: PaymentMethod,
}

/// Money was (or may have been) captured but no application record exists for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inconsistency {
    pub submission_key: String,
    pub scholarship_id: String,
    pub user_email: String,
    pub amount: Money,
    pub transaction_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Rejected before any network call; the form stays open.
    Rejected(ValidationError),
    /// Intent creation failed; nothing was charged and no record was written.
    IntentFailed { error: String },
    /// The charge failed. `application_id` is set when the unpaid record was saved.
    PaymentFailed {
        application_id: Option<ApplicationId>,
        error: String,
        record_error: Option<String>,
    },
    Succeeded {
        application_id: ApplicationId,
        transaction_id: String,
    },
    Inconsistent(Inconsistency),
}

/// Result of one `submit` call.
#[derive(Debug)]
pub struct Submission {
    pub key: SubmissionKey,
    pub outcome: SubmissionOutcome,
    pub trace: SubmissionTrace,
}

impl Submission {
    pub fn state(&self) -> CheckoutState {
        self.trace.current()
    }
}

/// Outcome of entering the checkout view.
pub enum CheckoutEntry<'a> {
    Ready(CheckoutPage<'a>),
    Redirect(Redirect),
}

/// Checkout orchestrator. Collaborators are injected, nothing is ambient.
pub struct Checkout {
    session: IdentityProviderBox,
    catalog: ScholarshipCatalogBox,
    gateway: PaymentGatewayBox,
    writer: ApplicationWriterBox,
}

impl Checkout {
    pub fn new(
        session: IdentityProviderBox,
        catalog: ScholarshipCatalogBox,
        gateway: PaymentGatewayBox,
        writer: ApplicationWriterBox,
    ) -> Self {
        Self {
            session,
            catalog,
            gateway,
            writer,
        }
    }

    /// Enters the checkout view for one scholarship.
    ///
    /// Anonymous callers are sent to the login page before anything is loaded,
    /// and an offer that cannot be fetched sends the caller back to the listing.
    pub async fn open(&self, scholarship_id: &ScholarshipId) -> CheckoutEntry<'_> {
        let Some(identity) = self.session.current_identity() else {
            warn!(scholarship = %scholarship_id, "checkout requires a signed-in user");
            return CheckoutEntry::Redirect(Redirect::Login);
        };

        match self.catalog.get(scholarship_id).await {
            Ok(offer) => CheckoutEntry::Ready(CheckoutPage {
                checkout: self,
                identity,
                offer,
                in_flight: AtomicBool::new(false),
            }),
            Err(e) => {
                warn!(scholarship = %scholarship_id, error = %e, "failed to load scholarship");
                CheckoutEntry::Redirect(Redirect::Scholarships)
            }
        }
    }
}

/// A loaded checkout view: the signed-in applicant and the offer as fetched
/// for this page load.
pub struct CheckoutPage<'a> {
    checkout: &'a Checkout,
    identity: Identity,
    offer: ScholarshipOffer,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CheckoutPage<'_> {
    pub fn offer(&self) -> &ScholarshipOffer {
        &self.offer
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn total_due(&self) -> Money {
        self.offer.total_due()
    }

    /// Runs one payment attempt and persists exactly one application record
    /// for it, unless the attempt never reached the charge stage.
    pub async fn submit(&self, form: CheckoutForm) -> Submission {
        let key = SubmissionKey::generate();
        let mut trace = SubmissionTrace::new();
        step(&mut trace, CheckoutState::Validating);

        let _in_flight = match self.begin() {
            Some(guard) => guard,
            None => return reject(key, trace, ValidationError::SubmissionInProgress),
        };
        if let Err(rejection) = self.validate(&form) {
            return reject(key, trace, rejection);
        }

        let amount = self.offer.total_due();
        let mut attempt = PaymentAttempt::new(
            BillingDetails {
                name: form.cardholder_name.trim().to_string(),
                email: self.identity.email.clone(),
            },
            amount,
        );

        step(&mut trace, CheckoutState::CreatingIntent);
        let (token, intent) = match self.create_intent(amount, key).await {
            Ok(created) => created,
            Err(e) => {
                warn!(scholarship = %self.offer.id, error = %e, "payment intent creation failed");
                step(&mut trace, CheckoutState::Failed);
                return Submission {
                    key,
                    outcome: SubmissionOutcome::IntentFailed {
                        error: e.user_message(),
                    },
                    trace,
                };
            }
        };

        step(&mut trace, CheckoutState::Confirming);
        let confirmed = self
            .checkout
            .gateway
            .confirm(&intent.client_secret, &form.card, &attempt.payer)
            .await
            .unwrap_or_else(|e| {
                warn!(scholarship = %self.offer.id, error = %e, "charge confirmation did not complete");
                ConfirmOutcome::Failed {
                    error_message: e.user_message(),
                }
            });
        attempt.client_secret = Some(intent.client_secret);
        attempt.resolve(&confirmed);

        let outcome = match confirmed {
            ConfirmOutcome::Failed { error_message } => {
                step(&mut trace, CheckoutState::WritingFailureRecord);
                let outcome = self
                    .record_failure(&attempt, form.payment_method, &token, &key, error_message)
                    .await;
                step(&mut trace, CheckoutState::Failed);
                outcome
            }
            ConfirmOutcome::Succeeded { transaction_id } => {
                step(&mut trace, CheckoutState::WritingSuccessRecord);
                let outcome = self
                    .record_success(&attempt, form.payment_method, &token, &key, transaction_id)
                    .await;
                match outcome {
                    SubmissionOutcome::Succeeded { .. } => {
                        step(&mut trace, CheckoutState::Succeeded)
                    }
                    _ => step(&mut trace, CheckoutState::Inconsistent),
                }
                outcome
            }
            ConfirmOutcome::Unverified {
                transaction_id,
                error_message,
            } => {
                error!(
                    scholarship = %self.offer.id,
                    submission = %key,
                    transaction = %transaction_id,
                    amount = %attempt.amount,
                    error = %error_message,
                    "charge outcome unknown, no application written, needs reconciliation"
                );
                step(&mut trace, CheckoutState::Inconsistent);
                SubmissionOutcome::Inconsistent(self.inconsistency(
                    &attempt,
                    &key,
                    transaction_id,
                    error_message,
                ))
            }
        };

        info!(
            scholarship = %self.offer.id,
            submission = %key,
            state = %trace.current(),
            "checkout submission finished"
        );
        Submission {
            key,
            outcome,
            trace,
        }
    }

    async fn create_intent(
        &self,
        amount: Money,
        key: SubmissionKey,
    ) -> Result<(BearerToken, PaymentIntent)> {
        let token = self.checkout.session.bearer_token().await?;
        let request = IntentRequest {
            amount,
            scholarship_name: self.offer.scholarship_name.clone(),
            submission_key: key,
        };
        let intent = self.checkout.gateway.create_intent(&request, &token).await?;
        Ok((token, intent))
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    fn validate(&self, form: &CheckoutForm) -> std::result::Result<(), ValidationError> {
        if !form.terms_accepted {
            return Err(ValidationError::TermsNotAccepted);
        }
        if form.cardholder_name.trim().is_empty() {
            return Err(ValidationError::MissingCardholderName);
        }
        if !self.checkout.gateway.is_ready() {
            return Err(ValidationError::PaymentNotReady);
        }
        if self.offer.total_due().is_zero() {
            return Err(ValidationError::NothingToCharge);
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        attempt: &PaymentAttempt,
        payment_method: PaymentMethod,
        token: &BearerToken,
        key: &SubmissionKey,
        error_message: String,
    ) -> SubmissionOutcome {
        let record = ApplicationRecord::unpaid(
            &self.offer,
            &self.identity,
            payment_method,
            attempt.amount,
            error_message.clone(),
        );
        match self.checkout.writer.create(&record, token, key).await {
            Ok(application_id) => SubmissionOutcome::PaymentFailed {
                application_id: Some(application_id),
                error: error_message,
                record_error: None,
            },
            Err(e) => {
                warn!(
                    scholarship = %self.offer.id,
                    submission = %key,
                    error = %e,
                    "could not save unpaid application after failed charge"
                );
                SubmissionOutcome::PaymentFailed {
                    application_id: None,
                    error: error_message,
                    record_error: Some(e.user_message()),
                }
            }
        }
    }

    async fn record_success(
        &self,
        attempt: &PaymentAttempt,
        payment_method: PaymentMethod,
        token: &BearerToken,
        key: &SubmissionKey,
        transaction_id: String,
    ) -> SubmissionOutcome {
        let record = ApplicationRecord::paid(
            &self.offer,
            &self.identity,
            payment_method,
            attempt.amount,
            transaction_id.clone(),
        );
        match self.checkout.writer.create(&record, token, key).await {
            Ok(application_id) => SubmissionOutcome::Succeeded {
                application_id,
                transaction_id,
            },
            Err(e) => {
                error!(
                    scholarship = %self.offer.id,
                    submission = %key,
                    transaction = %transaction_id,
                    amount = %attempt.amount,
                    error = %e,
                    "charge captured but application was not saved, needs reconciliation"
                );
                SubmissionOutcome::Inconsistent(self.inconsistency(
                    attempt,
                    key,
                    transaction_id,
                    e.user_message(),
                ))
            }
        }
    }

    fn inconsistency(
        &self,
        attempt: &PaymentAttempt,
        key: &SubmissionKey,
        transaction_id: String,
        error: String,
    ) -> Inconsistency {
        Inconsistency {
            submission_key: key.to_string(),
            scholarship_id: self.offer.id.to_string(),
            user_email: self.identity.email.clone(),
            amount: attempt.amount,
            transaction_id,
            error,
        }
    }
}

fn step(trace: &mut SubmissionTrace, next: CheckoutState) {
    let advanced = trace.advance(next);
    if let Err(e) = &advanced {
        error!(error = %e, "checkout state machine violated");
    }
    debug_assert!(advanced.is_ok());
}

fn reject(key: SubmissionKey, mut trace: SubmissionTrace, rejection: ValidationError) -> Submission {
    step(&mut trace, CheckoutState::Idle);
    Submission {
        key,
        outcome: SubmissionOutcome::Rejected(rejection),
        trace,
    }
}
