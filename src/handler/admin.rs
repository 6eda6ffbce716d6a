use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    entities::{accounts::ROLE_ADMIN, catalog_entries},
    handler::{
        error::{catalog_error_response, error_response, ErrorResponse},
        principal::CurrentPrincipal,
    },
    service::{
        catalog::{label, CatalogEntryInput},
        principal::Principal,
    },
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct CatalogListItem {
    pub id: i64,
    pub name: String,
    pub price: Option<Decimal>,
}

#[derive(Serialize, ToSchema)]
pub struct CatalogEntryResponse {
    pub id: i64,
    pub label: String,
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub price_special: Option<Decimal>,
    pub price_special_from: Option<String>,
    pub price_special_to: Option<String>,
    pub is_new: bool,
    pub new_from: Option<String>,
    pub new_to: Option<String>,
    pub description_short: Option<String>,
    pub description: String,
    pub status: bool,
    pub comment_status: bool,
    pub hidden: bool,
    pub meta_url: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&catalog_entries::Model> for CatalogEntryResponse {
    fn from(entry: &catalog_entries::Model) -> Self {
        Self {
            id: entry.id,
            label: label(entry),
            name: entry.name.clone(),
            sku: entry.sku.clone(),
            price: entry.price,
            price_special: entry.price_special,
            price_special_from: entry.price_special_from.map(|at| at.to_rfc3339()),
            price_special_to: entry.price_special_to.map(|at| at.to_rfc3339()),
            is_new: entry.is_new,
            new_from: entry.new_from.map(|at| at.to_rfc3339()),
            new_to: entry.new_to.map(|at| at.to_rfc3339()),
            description_short: entry.description_short.clone(),
            description: entry.description.clone(),
            status: entry.status,
            comment_status: entry.comment_status,
            hidden: entry.hidden,
            meta_url: entry.meta_url.clone(),
            meta_title: entry.meta_title.clone(),
            meta_description: entry.meta_description.clone(),
            meta_keywords: entry.meta_keywords.clone(),
            created_at: entry.created_at.to_rfc3339(),
            updated_at: entry.updated_at.to_rfc3339(),
        }
    }
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/v1/admin/catalog",
            get(list_entries).post(create_entry),
        )
        .route(
            "/api/v1/admin/catalog/:id",
            get(get_entry).patch(update_entry).delete(delete_entry),
        )
        .with_state(state)
}

/// 401 without an account, 403 for accounts lacking `ROLE_ADMIN`.
fn require_admin(principal: &CurrentPrincipal) -> Result<(), Response> {
    match principal.principal() {
        None | Some(Principal::Anonymous) => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "login required",
        )),
        Some(principal) if principal.has_role(ROLE_ADMIN) => Ok(()),
        Some(_) => Err(error_response(
            StatusCode::FORBIDDEN,
            "forbidden",
            "admin role required",
        )),
    }
}

fn not_found(id: i64) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("catalog entry {id} not found"),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/catalog",
    responses(
        (status = 200, description = "Catalog entries", body = [CatalogListItem]),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    principal: CurrentPrincipal,
) -> Response {
    if let Err(response) = require_admin(&principal) {
        return response;
    }
    match state.catalog().list().await {
        Ok(entries) => {
            let items: Vec<CatalogListItem> = entries
                .into_iter()
                .map(|entry| CatalogListItem {
                    id: entry.id,
                    name: entry.name,
                    price: entry.price,
                })
                .collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(err) => catalog_error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/catalog/{id}",
    params(("id" = i64, Path, description = "Catalog entry id")),
    responses(
        (status = 200, description = "Catalog entry", body = CatalogEntryResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    principal: CurrentPrincipal,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = require_admin(&principal) {
        return response;
    }
    match state.catalog().get(id).await {
        Ok(Some(entry)) => (StatusCode::OK, Json(CatalogEntryResponse::from(&entry))).into_response(),
        Ok(None) => not_found(id),
        Err(err) => catalog_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/catalog",
    request_body = CatalogEntryInput,
    responses(
        (status = 201, description = "Created", body = CatalogEntryResponse),
        (status = 409, description = "Slug claimed concurrently", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    principal: CurrentPrincipal,
    Json(input): Json<CatalogEntryInput>,
) -> Response {
    if let Err(response) = require_admin(&principal) {
        return response;
    }
    match state.catalog().create(input).await {
        Ok(entry) => (
            StatusCode::CREATED,
            Json(CatalogEntryResponse::from(&entry)),
        )
            .into_response(),
        Err(err) => catalog_error_response(&err),
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/catalog/{id}",
    params(("id" = i64, Path, description = "Catalog entry id")),
    request_body = CatalogEntryInput,
    responses(
        (status = 200, description = "Updated", body = CatalogEntryResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Slug claimed concurrently", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    principal: CurrentPrincipal,
    Path(id): Path<i64>,
    Json(input): Json<CatalogEntryInput>,
) -> Response {
    if let Err(response) = require_admin(&principal) {
        return response;
    }
    match state.catalog().update(id, input).await {
        Ok(Some(entry)) => (StatusCode::OK, Json(CatalogEntryResponse::from(&entry))).into_response(),
        Ok(None) => not_found(id),
        Err(err) => catalog_error_response(&err),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/catalog/{id}",
    params(("id" = i64, Path, description = "Catalog entry id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    principal: CurrentPrincipal,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = require_admin(&principal) {
        return response;
    }
    match state.catalog().delete(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(id),
        Err(err) => catalog_error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::accounts::{roles_json, ROLE_USER},
        service::principal::AuthenticatedAccount,
        testing::account_model,
    };

    fn account_principal(roles: &[&str]) -> CurrentPrincipal {
        let account = account_model(1, "a@x.com", roles_json(roles.iter().copied()));
        CurrentPrincipal(Some(Principal::Account(AuthenticatedAccount::new(account))))
    }

    #[test]
    fn anonymous_requests_are_unauthorized() {
        for principal in [CurrentPrincipal(None), CurrentPrincipal(Some(Principal::Anonymous))] {
            let response = require_admin(&principal).unwrap_err();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn non_admin_accounts_are_forbidden() {
        let response = require_admin(&account_principal(&[ROLE_USER])).unwrap_err();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn admins_pass() {
        assert!(require_admin(&account_principal(&[ROLE_USER, ROLE_ADMIN])).is_ok());
    }

    #[test]
    fn unsaved_entry_is_labelled_add_new() {
        let entry = crate::testing::catalog_entry(0, "draft");
        assert_eq!(CatalogEntryResponse::from(&entry).label, "Add new");
    }
}
