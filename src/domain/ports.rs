use super::application::{ApplicationId, ApplicationRecord};
use super::payment::{
    BillingDetails, CardToken, ClientSecret, ConfirmOutcome, IntentRequest, PaymentIntent,
    SubmissionKey,
};
use super::scholarship::{ScholarshipId, ScholarshipOffer};
use super::session::{BearerToken, Identity};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in applicant, or `None` for an anonymous caller.
    fn current_identity(&self) -> Option<Identity>;
    async fn bearer_token(&self) -> Result<BearerToken>;
}

#[async_trait]
pub trait ScholarshipCatalog: Send + Sync {
    async fn get(&self, id: &ScholarshipId) -> Result<ScholarshipOffer>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Whether the tokenization side is loaded and able to confirm charges.
    fn is_ready(&self) -> bool;
    async fn create_intent(
        &self,
        request: &IntentRequest,
        credential: &BearerToken,
    ) -> Result<PaymentIntent>;
    async fn confirm(
        &self,
        client_secret: &ClientSecret,
        card: &CardToken,
        billing: &BillingDetails,
    ) -> Result<ConfirmOutcome>;
}

/// Creates application records. Every call creates a new record.
#[async_trait]
pub trait ApplicationWriter: Send + Sync {
    async fn create(
        &self,
        application: &ApplicationRecord,
        credential: &BearerToken,
        key: &SubmissionKey,
    ) -> Result<ApplicationId>;
}

#[async_trait]
pub trait ApplicationReader: Send + Sync {
    async fn get(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>>;
}

pub type IdentityProviderBox = Box<dyn IdentityProvider>;
pub type ScholarshipCatalogBox = Box<dyn ScholarshipCatalog>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type ApplicationWriterBox = Box<dyn ApplicationWriter>;
pub type ApplicationReaderBox = Box<dyn ApplicationReader>;
