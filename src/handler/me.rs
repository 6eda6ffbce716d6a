use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    entities::accounts,
    handler::{
        error::{account_error_response, error_response, ErrorResponse},
        principal::CurrentPrincipal,
    },
    service::accounts::ProfileFields,
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: i64,
    pub account_uid: String,
    pub account_type: String,
    pub email: String,
    pub roles: Vec<String>,
    pub enabled: bool,
    pub locked: bool,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub about: Option<String>,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl From<&accounts::Model> for AccountResponse {
    fn from(account: &accounts::Model) -> Self {
        Self {
            id: account.id,
            account_uid: account.uid.to_string(),
            account_type: account.account_type.clone(),
            email: account.email.clone(),
            roles: account.role_set(),
            enabled: account.enabled,
            locked: account.locked,
            phone: account.phone.clone(),
            website: account.website.clone(),
            facebook: account.facebook.clone(),
            twitter: account.twitter.clone(),
            about: account.about.clone(),
            last_login: account.last_login.map(|at| at.to_rfc3339()),
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/me", get(me).patch(update_me))
        .with_state(state)
}

async fn current_account(
    state: &AppState,
    principal: &CurrentPrincipal,
) -> Result<accounts::Model, Response> {
    match state
        .accounts()
        .resolve_current_account(principal.principal(), None)
        .await
    {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "login required",
        )),
        Err(err) => Err(account_error_response(&err)),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn me(State(state): State<Arc<AppState>>, principal: CurrentPrincipal) -> Response {
    match current_account(&state, &principal).await {
        Ok(account) => (StatusCode::OK, Json(AccountResponse::from(&account))).into_response(),
        Err(response) => response,
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/me",
    request_body = ProfileFields,
    responses(
        (status = 200, description = "Updated", body = AccountResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    principal: CurrentPrincipal,
    Json(fields): Json<ProfileFields>,
) -> Response {
    let account = match current_account(&state, &principal).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    match state.accounts().update_profile(&account, fields).await {
        Ok(updated) => (StatusCode::OK, Json(AccountResponse::from(&updated))).into_response(),
        Err(err) => account_error_response(&err),
    }
}
