use super::money::Money;
use super::null_as_default;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScholarshipId(pub String);

impl ScholarshipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScholarshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A priced scholarship as served by `GET /api/scholarships/:id`.
///
/// Read once per checkout page load and never mutated by the checkout workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipOffer {
    #[serde(rename = "_id", alias = "id")]
    pub id: ScholarshipId,
    pub scholarship_name: String,
    pub university_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub university_image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub university_country: String,
    pub degree: String,
    pub subject_category: String,
    pub application_fees: Money,
    #[serde(default)]
    pub service_charge: Money,
}

impl ScholarshipOffer {
    /// Application fee plus service charge, derived from the offer as loaded.
    pub fn total_due(&self) -> Money {
        self.application_fees + self.service_charge
    }
}
