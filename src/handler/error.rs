use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::service::{accounts::AccountError, catalog::CatalogError};

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

pub fn account_error_response(err: &AccountError) -> Response {
    let status = match err {
        AccountError::InvalidCredentials | AccountError::UnsupportedPrincipal { .. } => {
            StatusCode::UNAUTHORIZED
        }
        AccountError::Disabled | AccountError::Locked => StatusCode::FORBIDDEN,
        AccountError::IncompleteFixture { .. } => StatusCode::BAD_REQUEST,
        AccountError::Db(_) | AccountError::Credential(_) | AccountError::Mail(_) => {
            tracing::error!(error = %err, "account operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, err.code(), err.to_string())
}

pub fn catalog_error_response(err: &CatalogError) -> Response {
    let status = match err {
        CatalogError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogError::SlugConflict { .. } => StatusCode::CONFLICT,
        CatalogError::Db(_) => {
            tracing::error!(error = %err, "catalog operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, err.code(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_errors_map_to_statuses() {
        assert_eq!(
            account_error_response(&AccountError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            account_error_response(&AccountError::Locked).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            account_error_response(&AccountError::UnsupportedPrincipal {
                type_name: "robot".to_string()
            })
            .status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn validation_errors_are_unprocessable() {
        let err = CatalogError::Validation {
            field: "name",
            message: "must not be blank",
        };
        assert_eq!(
            catalog_error_response(&err).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn slug_conflicts_are_conflicts() {
        let err = CatalogError::SlugConflict {
            meta_url: "shoes".to_string(),
        };
        assert_eq!(catalog_error_response(&err).status(), StatusCode::CONFLICT);
    }
}
