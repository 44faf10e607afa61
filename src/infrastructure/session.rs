use crate::domain::ports::IdentityProvider;
use crate::domain::session::{BearerToken, Identity};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;

/// An identity provider with a fixed user and token.
///
/// Used when the caller already holds a token issued by the identity provider
/// (CLI, tests). `anonymous()` models a visitor who never signed in.
#[derive(Debug, Clone)]
pub struct StaticSession {
    identity: Option<Identity>,
    token: Option<BearerToken>,
}

impl StaticSession {
    pub fn signed_in(identity: Identity, token: BearerToken) -> Self {
        Self {
            identity: Some(identity),
            token: Some(token),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            identity: None,
            token: None,
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticSession {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    async fn bearer_token(&self) -> Result<BearerToken> {
        self.token.clone().ok_or_else(|| CheckoutError::ApiError {
            status: 401,
            message: "Please login to continue".to_string(),
        })
    }
}
