use super::money::Money;
use super::null_as_default;
use super::scholarship::{ScholarshipId, ScholarshipOffer};
use super::session::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    PaymentPending,
    Processing,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    Stripe,
    Paypal,
    CreditCard,
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(Self::Stripe),
            "paypal" => Ok(Self::Paypal),
            "credit-card" => Ok(Self::CreditCard),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Profile fields the applicant completes later from the dashboard.
///
/// Always blank when the record is created at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicantDetails {
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub study_gap: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ssc_result: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hsc_result: String,
}

/// The persisted outcome of one checkout submission, paid or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    /// Assigned by the store; absent on records that have not been written yet.
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ApplicationId>,
    pub scholarship_id: ScholarshipId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scholarship_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub university_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub university_image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub university_country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub degree: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject_category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub application_fees: Money,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_charge: Money,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_photo: String,
    #[serde(flatten)]
    pub details: ApplicantDetails,
    #[serde(default, deserialize_with = "null_as_default")]
    pub application_status: ApplicationStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_method: PaymentMethod,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_status: PaymentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_paid: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_payment_intent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_error: Option<String>,
    /// Set by the backend when the record is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_date: Option<String>,
}

impl ApplicationRecord {
    /// Record for a charge the processor reported as succeeded.
    pub fn paid(
        offer: &ScholarshipOffer,
        applicant: &Identity,
        payment_method: PaymentMethod,
        total_paid: Money,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            application_status: ApplicationStatus::Pending,
            payment_status: PaymentStatus::Paid,
            stripe_payment_intent_id: Some(transaction_id.into()),
            payment_error: None,
            ..Self::base(offer, applicant, payment_method, total_paid)
        }
    }

    /// Record kept for traceability after the charge failed.
    pub fn unpaid(
        offer: &ScholarshipOffer,
        applicant: &Identity,
        payment_method: PaymentMethod,
        total_paid: Money,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            application_status: ApplicationStatus::PaymentPending,
            payment_status: PaymentStatus::Unpaid,
            stripe_payment_intent_id: None,
            payment_error: Some(error_message.into()),
            ..Self::base(offer, applicant, payment_method, total_paid)
        }
    }

    fn base(
        offer: &ScholarshipOffer,
        applicant: &Identity,
        payment_method: PaymentMethod,
        total_paid: Money,
    ) -> Self {
        Self {
            id: None,
            scholarship_id: offer.id.clone(),
            scholarship_name: offer.scholarship_name.clone(),
            university_name: offer.university_name.clone(),
            university_image: offer.university_image.clone(),
            university_country: offer.university_country.clone(),
            degree: offer.degree.clone(),
            subject_category: offer.subject_category.clone(),
            application_fees: offer.application_fees,
            service_charge: offer.service_charge,
            user_email: applicant.email.clone(),
            user_name: applicant.name_or_anonymous().to_string(),
            user_photo: applicant.photo_url.clone().unwrap_or_default(),
            details: ApplicantDetails::default(),
            application_status: ApplicationStatus::Pending,
            payment_method,
            payment_status: PaymentStatus::Unpaid,
            total_paid,
            stripe_payment_intent_id: None,
            payment_error: None,
            application_date: None,
        }
    }
}
