use crate::domain::application::{ApplicationId, ApplicationRecord};
use crate::domain::ports::ApplicationReader;
use crate::domain::route::Redirect;
use tracing::warn;

const DEFAULT_FAILURE_MESSAGE: &str = "Payment could not be processed";

/// Data behind the success and failure screens.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Success {
        application: Option<ApplicationRecord>,
    },
    Failure {
        error: String,
        application: Option<ApplicationRecord>,
    },
}

impl ResultView {
    /// Builds the view a result redirect points at. Returns `None` for
    /// redirects that are not payment results.
    ///
    /// A record that cannot be fetched only degrades the view; it never blocks it.
    pub async fn load(reader: &dyn ApplicationReader, redirect: &Redirect) -> Option<Self> {
        match redirect {
            Redirect::PaymentSuccess { application_id } => Some(ResultView::Success {
                application: fetch(reader, Some(application_id)).await,
            }),
            Redirect::PaymentFailure {
                application_id,
                error,
            } => Some(ResultView::Failure {
                error: if error.trim().is_empty() {
                    DEFAULT_FAILURE_MESSAGE.to_string()
                } else {
                    error.clone()
                },
                application: fetch(reader, application_id.as_ref()).await,
            }),
            _ => None,
        }
    }

    pub fn application(&self) -> Option<&ApplicationRecord> {
        match self {
            ResultView::Success { application } | ResultView::Failure { application, .. } => {
                application.as_ref()
            }
        }
    }

    /// Primary action: the dashboard after a success, another checkout for the
    /// same scholarship after a failure (or the listing if it is unknown).
    pub fn next(&self) -> Redirect {
        match self {
            ResultView::Success { .. } => Redirect::MyApplications,
            ResultView::Failure {
                application: Some(record),
                ..
            } => Redirect::Checkout(record.scholarship_id.clone()),
            ResultView::Failure { application: None, .. } => Redirect::Scholarships,
        }
    }
}

async fn fetch(
    reader: &dyn ApplicationReader,
    application_id: Option<&ApplicationId>,
) -> Option<ApplicationRecord> {
    let id = application_id?;
    match reader.get(id).await {
        Ok(record) => record,
        Err(e) => {
            warn!(application = %id, error = %e, "failed to load application for result view");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CheckoutError, Result};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl ApplicationReader for Unreachable {
        async fn get(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>> {
            Err(CheckoutError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_failure_view_degrades_without_record() {
        let redirect = Redirect::PaymentFailure {
            application_id: Some(ApplicationId::new("app-1")),
            error: String::new(),
        };
        let view = ResultView::load(&Unreachable, &redirect).await.unwrap();

        assert_eq!(
            view,
            ResultView::Failure {
                error: DEFAULT_FAILURE_MESSAGE.to_string(),
                application: None,
            }
        );
        assert_eq!(view.next(), Redirect::Scholarships);
    }

    #[tokio::test]
    async fn test_non_result_redirect_has_no_view() {
        assert!(ResultView::load(&Unreachable, &Redirect::Login).await.is_none());
    }

    #[tokio::test]
    async fn test_success_view_points_to_dashboard() {
        let redirect = Redirect::PaymentSuccess {
            application_id: ApplicationId::new("app-1"),
        };
        let view = ResultView::load(&Unreachable, &redirect).await.unwrap();
        assert!(view.application().is_none());
        assert_eq!(view.next(), Redirect::MyApplications);
    }
}
