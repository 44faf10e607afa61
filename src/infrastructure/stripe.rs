use super::rest_api::{RestApi, error_message};
use crate::domain::payment::{
    BillingDetails, CardToken, ClientSecret, ConfirmOutcome, IntentRequest, PaymentIntent,
};
use crate::domain::ports::PaymentGateway;
use crate::domain::session::BearerToken;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

const SUCCEEDED: &str = "succeeded";

/// Card payments through Stripe.
///
/// The intent is created by the marketplace backend, which holds the secret
/// key. Confirmation goes straight to the processor with the publishable key
/// and the intent's client secret, the way the browser SDK does it.
pub struct StripeGateway {
    api: RestApi,
    processor_base_url: Url,
    publishable_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct IntentBody {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct ProcessorErrorBody {
    error: ProcessorError,
}

#[derive(Deserialize)]
struct ProcessorError {
    message: Option<String>,
    code: Option<String>,
}

impl StripeGateway {
    pub fn new(
        api: RestApi,
        processor_base_url: &str,
        publishable_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Result<Self> {
        let processor_base_url = Url::parse(processor_base_url).map_err(|e| {
            CheckoutError::ConfigError(format!("invalid processor URL {processor_base_url}: {e}"))
        })?;
        if processor_base_url.cannot_be_a_base() {
            return Err(CheckoutError::ConfigError(format!(
                "processor URL {processor_base_url} cannot be used as a base"
            )));
        }
        Ok(Self {
            api,
            processor_base_url,
            publishable_key: publishable_key.into(),
            client,
        })
    }

    fn confirm_url(&self, client_secret: &ClientSecret) -> Url {
        let mut url = self.processor_base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend([
                "v1",
                "payment_intents",
                client_secret.intent_id(),
                "confirm",
            ]);
        }
        url
    }
}

fn confirm_form<'a>(
    client_secret: &'a ClientSecret,
    card: &'a CardToken,
    billing: &'a BillingDetails,
) -> Vec<(&'static str, &'a str)> {
    vec![
        ("client_secret", client_secret.as_str()),
        ("payment_method_data[type]", "card"),
        ("payment_method_data[card][token]", card.as_str()),
        ("payment_method_data[billing_details][name]", billing.name.as_str()),
        ("payment_method_data[billing_details][email]", billing.email.as_str()),
    ]
}

/// Collapses a processor reply into a terminal outcome. Statuses such as
/// `requires_action` or `processing` count as failed.
///
/// A 2xx reply that cannot be read may still mean the charge went through, so
/// it is reported as `Unverified` against the intent being confirmed.
fn interpret(status: StatusCode, body: &str, intent_id: &str) -> ConfirmOutcome {
    if status.is_success() {
        let intent: IntentBody = match serde_json::from_str(body) {
            Ok(intent) => intent,
            Err(e) => {
                return ConfirmOutcome::Unverified {
                    transaction_id: intent_id.to_string(),
                    error_message: format!("Unreadable reply from payment processor: {e}"),
                };
            }
        };
        if intent.status == SUCCEEDED {
            return ConfirmOutcome::Succeeded {
                transaction_id: intent.id,
            };
        }
        return ConfirmOutcome::Failed {
            error_message: format!("Payment was not completed (status: {})", intent.status),
        };
    }
    let message = match serde_json::from_str::<ProcessorErrorBody>(body) {
        Ok(ProcessorErrorBody { error }) => error
            .message
            .or(error.code)
            .unwrap_or_else(|| error_message(status, "")),
        Err(_) => error_message(status, body),
    };
    ConfirmOutcome::Failed {
        error_message: message,
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn is_ready(&self) -> bool {
        !self.publishable_key.trim().is_empty()
    }

    async fn create_intent(
        &self,
        request: &IntentRequest,
        credential: &BearerToken,
    ) -> Result<PaymentIntent> {
        self.api.create_payment_intent(request, credential).await
    }

    async fn confirm(
        &self,
        client_secret: &ClientSecret,
        card: &CardToken,
        billing: &BillingDetails,
    ) -> Result<ConfirmOutcome> {
        let url = self.confirm_url(client_secret);
        debug!(intent = client_secret.intent_id(), "confirming card payment");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.publishable_key)
            .form(&confirm_form(client_secret, card, billing))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(interpret(status, &body, client_secret.intent_id()))
    }
}
