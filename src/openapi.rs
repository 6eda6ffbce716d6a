use utoipa::OpenApi;

use crate::{
    handler,
    handler::{
        admin::{CatalogEntryResponse, CatalogListItem},
        auth::{LoginRequest, PasswordResetRequest, RegisterRequest},
        error::ErrorResponse,
        health::Health,
        me::AccountResponse,
    },
    service::{accounts::ProfileFields, catalog::CatalogEntryInput},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handler::health::health,
        handler::auth::register,
        handler::auth::login,
        handler::auth::logout,
        handler::auth::password_reset,
        handler::me::me,
        handler::me::update_me,
        handler::admin::list_entries,
        handler::admin::get_entry,
        handler::admin::create_entry,
        handler::admin::update_entry,
        handler::admin::delete_entry
    ),
    components(schemas(
        Health,
        ErrorResponse,
        RegisterRequest,
        LoginRequest,
        PasswordResetRequest,
        ProfileFields,
        AccountResponse,
        CatalogEntryInput,
        CatalogListItem,
        CatalogEntryResponse
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "auth", description = "Registration, login and password reset"),
        (name = "accounts", description = "Current account"),
        (name = "catalog", description = "Catalog entry administration")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn prices_are_documented_and_sent_as_numbers() {
        let doc = serde_json::to_value(ApiDoc::openapi()).expect("openapi json");
        let price = &doc["components"]["schemas"]["CatalogListItem"]["properties"]["price"];
        assert!(price.to_string().contains("number"), "price schema: {price}");

        let item = serde_json::to_value(CatalogListItem {
            id: 1,
            name: "Shoes".to_string(),
            price: Some(Decimal::new(1999, 2)),
        })
        .expect("item json");
        assert!(item["price"].is_number(), "price on the wire: {}", item["price"]);
    }
}
