use super::application::ApplicationId;
use super::scholarship::ScholarshipId;
use serde::Serialize;
use std::fmt;

/// Where the applicant is sent next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Scholarships,
    Checkout(ScholarshipId),
    MyApplications,
    PaymentSuccess {
        application_id: ApplicationId,
    },
    PaymentFailure {
        application_id: Option<ApplicationId>,
        error: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    application_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Redirect {
    pub fn path(&self) -> String {
        match self {
            Redirect::Login => "/login".to_string(),
            Redirect::Scholarships => "/scholarships".to_string(),
            Redirect::Checkout(id) => format!("/checkout/{id}"),
            Redirect::MyApplications => "/dashboard/my-applications".to_string(),
            Redirect::PaymentSuccess { application_id } => with_query(
                "/payment-success",
                ResultQuery {
                    application_id: Some(application_id.as_str()),
                    error: None,
                },
            ),
            Redirect::PaymentFailure {
                application_id,
                error,
            } => with_query(
                "/payment-failure",
                ResultQuery {
                    application_id: application_id.as_ref().map(ApplicationId::as_str),
                    error: Some(error),
                },
            ),
        }
    }
}

fn with_query(base: &str, query: ResultQuery<'_>) -> String {
    match serde_urlencoded::to_string(&query) {
        Ok(encoded) if !encoded.is_empty() => format!("{base}?{encoded}"),
        _ => base.to_string(),
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
