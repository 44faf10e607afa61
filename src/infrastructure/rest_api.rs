use crate::domain::application::{ApplicationId, ApplicationRecord};
use crate::domain::payment::{IntentRequest, PaymentIntent, SubmissionKey};
use crate::domain::ports::{ApplicationReader, ApplicationWriter, ScholarshipCatalog};
use crate::domain::scholarship::{ScholarshipId, ScholarshipOffer};
use crate::domain::session::BearerToken;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Client for the marketplace REST backend.
#[derive(Clone)]
pub struct RestApi {
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct Created {
    #[serde(alias = "_id", alias = "insertedId")]
    id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl RestApi {
    pub fn new(base_url: &str, client: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CheckoutError::ConfigError(format!("invalid API URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CheckoutError::ConfigError(format!(
                "API URL {base_url} cannot be used as a base"
            )));
        }
        Ok(Self { base_url, client })
    }

    /// Builds `<base>/<segments...>`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `POST /api/create-payment-intent`
    pub async fn create_payment_intent(
        &self,
        request: &IntentRequest,
        credential: &BearerToken,
    ) -> Result<PaymentIntent> {
        let url = self.endpoint(&["api", "create-payment-intent"]);
        debug!(%url, amount = %request.amount, "creating payment intent");
        let response = self
            .client
            .post(url)
            .bearer_auth(credential.as_str())
            .header(IDEMPOTENCY_HEADER, request.submission_key.to_string())
            .json(request)
            .send()
            .await?;
        let intent = check_status(response).await?.json::<PaymentIntent>().await?;
        Ok(intent)
    }
}

/// Turns a non-2xx response into `CheckoutError::ApiError`, preferring the
/// server's `message` field over the raw body.
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CheckoutError::ApiError {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = parsed.message.or(parsed.error)
    {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[async_trait]
impl ScholarshipCatalog for RestApi {
    async fn get(&self, id: &ScholarshipId) -> Result<ScholarshipOffer> {
        let url = self.endpoint(&["api", "scholarships", id.as_str()]);
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CheckoutError::NotFoundError(format!("scholarship {id}")));
        }
        let offer = check_status(response).await?.json::<ScholarshipOffer>().await?;
        Ok(offer)
    }
}

#[async_trait]
impl ApplicationWriter for RestApi {
    async fn create(
        &self,
        application: &ApplicationRecord,
        credential: &BearerToken,
        key: &SubmissionKey,
    ) -> Result<ApplicationId> {
        let url = self.endpoint(&["api", "applications"]);
        let response = self
            .client
            .post(url)
            .bearer_auth(credential.as_str())
            .header(IDEMPOTENCY_HEADER, key.to_string())
            .json(application)
            .send()
            .await?;
        let created = check_status(response).await?.json::<Created>().await?;
        Ok(ApplicationId::new(created.id))
    }
}

#[async_trait]
impl ApplicationReader for RestApi {
    async fn get(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>> {
        let url = self.endpoint(&["api", "applications", id.as_str()]);
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record = check_status(response)
            .await?
            .json::<ApplicationRecord>()
            .await?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> RestApi {
        RestApi::new(base, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        assert_eq!(
            api("http://localhost:5000").endpoint(&["api", "scholarships", "abc"]).as_str(),
            "http://localhost:5000/api/scholarships/abc"
        );
        assert_eq!(
            api("http://localhost:5000/base/").endpoint(&["api", "applications"]).as_str(),
            "http://localhost:5000/base/api/applications"
        );
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        assert_eq!(
            api("http://localhost:5000").endpoint(&["api", "scholarships", "a/b c"]).as_str(),
            "http://localhost:5000/api/scholarships/a%2Fb%20c"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            RestApi::new("not a url", reqwest::Client::new()),
            Err(CheckoutError::ConfigError(_))
        ));
        assert!(RestApi::new("mailto:x@y.z", reqwest::Client::new()).is_err());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"message": "Unauthorized access"}"#),
            "Unauthorized access"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error": "bad amount"}"#),
            "bad amount"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down\n"), "upstream down");
    }

    #[test]
    fn test_created_id_aliases() {
        for body in [r#"{"id": "a"}"#, r#"{"_id": "a"}"#, r#"{"acknowledged": true, "insertedId": "a"}"#] {
            let created: Created = serde_json::from_str(body).unwrap();
            assert_eq!(created.id, "a");
        }
    }
}
