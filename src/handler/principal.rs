use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::{
    handler::error::{account_error_response, error_response},
    service::principal::{AuthenticatedAccount, Principal},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "sid";

/// Principal behind the request's session cookie.
///
/// `None` when the request carries no cookie at all. An unknown or expired
/// session, or an account that can no longer log in, resolves to
/// `Principal::Anonymous`.
pub struct CurrentPrincipal(pub Option<Principal>);

impl CurrentPrincipal {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentPrincipal {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };

        let session = state.sessions().get(cookie.value()).await.map_err(|err| {
            tracing::error!(error = %err, "session lookup failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_error",
                err.to_string(),
            )
        })?;
        let Some(session) = session else {
            return Ok(Self(Some(Principal::Anonymous)));
        };

        let account = state
            .accounts()
            .refresh_account(&session.principal)
            .await
            .map_err(|err| account_error_response(&err))?;

        let principal = match account {
            Some(account) if account.enabled && !account.locked => {
                Principal::Account(AuthenticatedAccount::new(account))
            }
            _ => Principal::Anonymous,
        };
        Ok(Self(Some(principal)))
    }
}
