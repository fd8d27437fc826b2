use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{auth, common, companies, materials, purchases};

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";
pub const DOCS_PATH: &str = "/docs";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CoApp 2.0 API",
        version = "2.0.0",
        description = r#"
# CoApp inventory and purchasing API

Users own companies; companies own materials and purchases.

- **Materials** keep a running stock level. Every change is recorded as a
  movement and the level never goes below zero.
- **Purchases** keep a total equal to the sum of their line items.

## Authentication

Obtain a token from `/auth/login` or `/auth/register` and send it as

```
Authorization: Bearer <access_token>
```

## Errors

Failures return `{"detail": "...", "request_id": "...", "timestamp": "..."}`.
"#
    ),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "companies", description = "Companies owned by the caller"),
        (name = "materials", description = "Materials, stock adjustments and movements"),
        (name = "purchases", description = "Purchases and their line items"),
    ),
    paths(
        auth::register,
        auth::login,
        auth::get_profile,
        auth::update_profile,
        auth::change_password,
        auth::logout,

        companies::list_companies,
        companies::get_company,
        companies::create_company,
        companies::update_company,
        companies::delete_company,

        materials::list_materials,
        materials::list_low_stock,
        materials::get_material,
        materials::create_material,
        materials::update_material,
        materials::adjust_stock,
        materials::list_movements,
        materials::delete_material,

        purchases::list_purchases,
        purchases::get_purchase,
        purchases::create_purchase,
        purchases::update_purchase,
        purchases::delete_purchase,
        purchases::list_items,
        purchases::add_item,
        purchases::update_item,
        purchases::delete_item,
    ),
    components(
        schemas(
            crate::entities::company::Model,
            crate::entities::material::Model,
            crate::entities::material_movement::Model,
            crate::entities::purchase::Model,
            crate::entities::purchase::PurchaseStatus,
            crate::entities::purchase_item::Model,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UpdateProfileRequest,
            auth::ChangePasswordRequest,
            auth::UserResponse,
            auth::TokenResponse,
            companies::CreateCompanyRequest,
            companies::UpdateCompanyRequest,
            materials::CreateMaterialRequest,
            materials::UpdateMaterialRequest,
            materials::StockAdjustmentRequest,
            purchases::CreatePurchaseRequest,
            purchases::UpdatePurchaseRequest,
            purchases::CreatePurchaseItemRequest,
            purchases::UpdatePurchaseItemRequest,
            common::MessageResponse,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the secured paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new(DOCS_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("CoApp 2.0 API"));
        assert!(json.contains("/materials/{id}/stock/adjust"));
        assert!(json.contains("/purchases/{id}/items/{item_id}"));
        assert!(json.contains("bearer_auth"));
    }
}
