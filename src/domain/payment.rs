use super::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque card reference produced by the processor's tokenization library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardToken(pub String);

impl CardToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingDetails {
    pub name: String,
    pub email: String,
}

/// Secret handed back by intent creation; only used to confirm that intent.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Processor intent id embedded in the secret (`pi_123_secret_abc` -> `pi_123`).
    pub fn intent_id(&self) -> &str {
        self.0
            .split_once("_secret_")
            .map(|(id, _)| id)
            .unwrap_or(&self.0)
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientSecret({}_secret_***)", self.intent_id())
    }
}

/// Per-submission key sent as `Idempotency-Key` on every outbound write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionKey(Uuid);

impl SubmissionKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub amount: Money,
    pub scholarship_name: String,
    #[serde(skip)]
    pub submission_key: SubmissionKey,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: ClientSecret,
}

/// Terminal result of confirming a charge. Anything short of `succeeded`
/// (including `requires_action`) is reported as `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Succeeded { transaction_id: String },
    Failed { error_message: String },
    /// The processor accepted the confirmation but its answer could not be
    /// read. The charge may have been captured.
    Unverified {
        transaction_id: String,
        error_message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptTag {
    Succeeded,
    Failed,
    Unverified,
}

/// One run of the charge protocol. Lives only for the duration of a submit.
#[derive(Debug)]
pub struct PaymentAttempt {
    pub payer: BillingDetails,
    pub amount: Money,
    pub client_secret: Option<ClientSecret>,
    pub outcome: Option<AttemptTag>,
}

impl PaymentAttempt {
    pub fn new(payer: BillingDetails, amount: Money) -> Self {
        Self {
            payer,
            amount,
            client_secret: None,
            outcome: None,
        }
    }

    pub fn resolve(&mut self, outcome: &ConfirmOutcome) {
        self.outcome = Some(match outcome {
            ConfirmOutcome::Succeeded { .. } => AttemptTag::Succeeded,
            ConfirmOutcome::Failed { .. } => AttemptTag::Failed,
            ConfirmOutcome::Unverified { .. } => AttemptTag::Unverified,
        });
    }
}
