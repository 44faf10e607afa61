use crate::error::Result;
use crate::infrastructure::rest_api::RestApi;
use crate::infrastructure::stripe::StripeGateway;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_PROCESSOR_URL: &str = "https://api.stripe.com";

/// Where the checkout talks to and with which keys.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub api_base_url: String,
    pub processor_base_url: String,
    pub publishable_key: String,
    /// `None` leaves the HTTP client's default in place.
    pub request_timeout: Option<Duration>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            processor_base_url: DEFAULT_PROCESSOR_URL.to_string(),
            publishable_key: String::new(),
            request_timeout: None,
        }
    }
}

impl CheckoutConfig {
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }

    pub fn rest_api(&self, client: reqwest::Client) -> Result<RestApi> {
        RestApi::new(&self.api_base_url, client)
    }

    pub fn stripe_gateway(&self, client: reqwest::Client) -> Result<StripeGateway> {
        let api = self.rest_api(client.clone())?;
        StripeGateway::new(
            api,
            &self.processor_base_url,
            self.publishable_key.clone(),
            client,
        )
    }
}
