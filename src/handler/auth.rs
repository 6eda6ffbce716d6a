use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    handler::{
        error::{account_error_response, error_response, ErrorResponse},
        me::AccountResponse,
        principal::SESSION_COOKIE,
    },
    service::{accounts::ProfileFields, principal::SessionPrincipal},
    state::AppState,
};

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/password-reset", post(password_reset))
        .with_state(state)
}

fn session_cookie(state: &AppState, value: String, max_age: Duration) -> Cookie<'static> {
    let values = state.config().values();
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(max_age);
    if values.cookie_secure {
        cookie.set_secure(true);
    }
    if let Some(domain) = &values.cookie_domain {
        cookie.set_domain(domain.to_string());
    }
    cookie
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Created", body = AccountResponse),
        (status = 200, description = "Already registered", body = AccountResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    let email = payload.email.trim();
    if !looks_like_email(email) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_payload",
            "email must be an address",
        );
    }
    if payload.password.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_payload",
            "password must not be empty",
        );
    }

    match state
        .accounts()
        .register_account(email, &payload.password, payload.profile)
        .await
    {
        Ok(output) => {
            let status = if output.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(AccountResponse::from(&output.account))).into_response()
        }
        Err(err) => account_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AccountResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account disabled or locked", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Response {
    let account = match state
        .accounts()
        .authenticate(payload.email.trim(), &payload.password)
        .await
    {
        Ok(account) => account,
        Err(err) => return account_error_response(&err),
    };

    let session_id = match state
        .sessions()
        .create(SessionPrincipal::from(&account))
        .await
    {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(error = %err, "session create failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_error",
                err.to_string(),
            );
        }
    };

    let ttl = state.config().values().session_ttl_seconds;
    let max_age = Duration::seconds(i64::try_from(ttl).unwrap_or(i64::MAX));
    let jar = CookieJar::new().add(session_cookie(&state, session_id, max_age));
    tracing::info!(account_id = account.id, "account logged in");
    (StatusCode::OK, jar, Json(AccountResponse::from(&account))).into_response()
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 500, description = "Session delete failed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    if let Err(err) = state.sessions().delete(cookie.value()).await {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session_error",
            err.to_string(),
        );
    }

    let jar = jar.add(session_cookie(&state, String::new(), Duration::seconds(0)));
    (StatusCode::NO_CONTENT, jar).into_response()
}

/// Mails a fresh password to the account, if there is one. The response never
/// reveals whether the address is registered.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "Accepted")
    ),
    tag = "auth"
)]
pub async fn password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetRequest>,
) -> StatusCode {
    let accounts = state.accounts();
    let result = match accounts.load_by_email(payload.email.trim()).await {
        Ok(account) => accounts.reset_credential(account.as_ref()).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(Some(account)) => tracing::info!(account_id = account.id, "password reset"),
        Ok(None) => tracing::debug!("password reset for unknown email ignored"),
        Err(err) => tracing::error!(error = %err, "password reset failed"),
    }
    StatusCode::ACCEPTED
}
