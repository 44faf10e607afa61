use crate::domain::payment::{
    BillingDetails, CardToken, ClientSecret, ConfirmOutcome, IntentRequest, PaymentIntent,
};
use crate::domain::ports::PaymentGateway;
use crate::domain::session::BearerToken;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// What the scripted gateway answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayBehavior {
    Succeed { transaction_id: Option<String> },
    Decline { error_message: String },
    IntentError { message: String },
    ConfirmError { message: String },
    Unverified { message: String },
    NotReady,
}

impl FromStr for GatewayBehavior {
    type Err = String;

    /// `succeed[:tx]`, `decline[:message]`, `intent-error[:message]`,
    /// `confirm-error[:message]`, `unverified[:message]` or `not-ready`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg.to_string())),
            None => (s, None),
        };
        match kind {
            "succeed" => Ok(Self::Succeed {
                transaction_id: arg,
            }),
            "decline" => Ok(Self::Decline {
                error_message: arg.unwrap_or_else(|| "card_declined".to_string()),
            }),
            "intent-error" => Ok(Self::IntentError {
                message: arg.unwrap_or_else(|| "network error".to_string()),
            }),
            "confirm-error" => Ok(Self::ConfirmError {
                message: arg.unwrap_or_else(|| "processor unreachable".to_string()),
            }),
            "unverified" => Ok(Self::Unverified {
                message: arg.unwrap_or_else(|| "unreadable processor reply".to_string()),
            }),
            "not-ready" => Ok(Self::NotReady),
            other => Err(format!("unknown gateway behavior: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmCall {
    pub client_secret: String,
    pub card: CardToken,
    pub billing: BillingDetails,
}

#[derive(Default)]
struct Calls {
    intents: Vec<IntentRequest>,
    confirms: Vec<ConfirmCall>,
}

/// Deterministic stand-in for the payment processor.
///
/// Every call is recorded so tests can assert on what reached the gateway.
/// Clones share the recorded calls.
#[derive(Clone)]
pub struct ScriptedGateway {
    behavior: GatewayBehavior,
    latency: Option<Duration>,
    sequence: Arc<AtomicU64>,
    calls: Arc<Mutex<Calls>>,
}

impl ScriptedGateway {
    pub fn new(behavior: GatewayBehavior) -> Self {
        Self {
            behavior,
            latency: None,
            sequence: Arc::new(AtomicU64::new(0)),
            calls: Arc::new(Mutex::new(Calls::default())),
        }
    }

    pub fn succeeding(transaction_id: &str) -> Self {
        Self::new(GatewayBehavior::Succeed {
            transaction_id: Some(transaction_id.to_string()),
        })
    }

    pub fn declining(error_message: &str) -> Self {
        Self::new(GatewayBehavior::Decline {
            error_message: error_message.to_string(),
        })
    }

    /// Delays intent creation, leaving a window for overlapping submits.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn intent_requests(&self) -> Vec<IntentRequest> {
        self.lock().intents.clone()
    }

    pub fn confirm_calls(&self) -> Vec<ConfirmCall> {
        self.lock().confirms.clone()
    }

    pub fn call_count(&self) -> usize {
        let calls = self.lock();
        calls.intents.len() + calls.confirms.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    fn is_ready(&self) -> bool {
        self.behavior != GatewayBehavior::NotReady
    }

    async fn create_intent(
        &self,
        request: &IntentRequest,
        _credential: &BearerToken,
    ) -> Result<PaymentIntent> {
        self.lock().intents.push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let GatewayBehavior::IntentError { message } = &self.behavior {
            return Err(CheckoutError::ApiError {
                status: 502,
                message: message.clone(),
            });
        }
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PaymentIntent {
            client_secret: ClientSecret::new(format!("pi_scripted{n}_secret_{n}")),
        })
    }

    async fn confirm(
        &self,
        client_secret: &ClientSecret,
        card: &CardToken,
        billing: &BillingDetails,
    ) -> Result<ConfirmOutcome> {
        self.lock().confirms.push(ConfirmCall {
            client_secret: client_secret.as_str().to_string(),
            card: card.clone(),
            billing: billing.clone(),
        });
        match &self.behavior {
            GatewayBehavior::Succeed { transaction_id } => Ok(ConfirmOutcome::Succeeded {
                transaction_id: transaction_id
                    .clone()
                    .unwrap_or_else(|| client_secret.intent_id().to_string()),
            }),
            GatewayBehavior::Decline { error_message } => Ok(ConfirmOutcome::Failed {
                error_message: error_message.clone(),
            }),
            GatewayBehavior::ConfirmError { message } => {
                Err(CheckoutError::InternalError(message.clone()))
            }
            GatewayBehavior::Unverified { message } => Ok(ConfirmOutcome::Unverified {
                transaction_id: client_secret.intent_id().to_string(),
                error_message: message.clone(),
            }),
            GatewayBehavior::IntentError { .. } | GatewayBehavior::NotReady => {
                Err(CheckoutError::InternalError(
                    "confirm called without an intent".to_string(),
                ))
            }
        }
    }
}
