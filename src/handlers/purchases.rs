use super::common::{
    created_response, message_response, nullable, validate_input, CompanyScopedParams,
    MessageResponse,
};
use crate::{
    auth::AuthUser,
    entities::{
        purchase::{self, PurchaseStatus},
        purchase_item,
    },
    errors::ApiError,
    services::{
        directory::PurchaseFilter,
        purchase_aggregator::{NewPurchaseItem, PurchaseItemChanges},
        purchases::{NewPurchase, PurchaseChanges},
    },
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::Response,
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// `total_amount` is not accepted: it is derived from the items.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreatePurchaseRequest {
    pub company_id: i32,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "INV-2025-001")]
    pub invoice_number: String,
    #[validate(length(min = 1, max = 255))]
    pub supplier_name: String,
    #[validate(length(max = 255))]
    pub supplier_contact: Option<String>,
    pub purchase_date: DateTime<Utc>,
    #[serde(default)]
    pub status: PurchaseStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePurchaseRequest {
    #[validate(length(min = 1, max = 100))]
    pub invoice_number: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub supplier_name: Option<String>,
    #[validate(length(max = 255))]
    pub supplier_contact: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub status: Option<PurchaseStatus>,
    pub notes: Option<String>,
}

/// The stored `total_price` is `quantity * unit_price` rounded to two decimal places.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseItemRequest {
    pub material_id: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub item_name: String,
    #[schema(value_type = String, example = "50")]
    pub quantity: Decimal,
    #[schema(value_type = String, example = "23.50")]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseItemRequest {
    /// `null` unlinks the item from its material
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>, nullable = true)]
    pub material_id: Option<Option<i32>>,
    #[validate(length(min = 1, max = 255))]
    pub item_name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub quantity: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
}

pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_purchases).post(create_purchase))
        .route(
            "/:id",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
        .route("/:id/items", get(list_items).post(add_item))
        .route("/:id/items/:item_id", put(update_item).delete(delete_item))
}

/// List purchases across the caller's companies, latest purchase date first
#[utoipa::path(
    get,
    path = "/purchases",
    params(CompanyScopedParams),
    responses(
        (status = 200, description = "Purchases", body = [purchase::Model]),
        (status = 404, description = "Company not found or access denied", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    auth: AuthUser,
    params: Result<Query<CompanyScopedParams>, QueryRejection>,
) -> Result<Json<Vec<purchase::Model>>, ApiError> {
    let Query(params) = params?;
    let purchases = state
        .services
        .directory
        .list_purchases(
            auth.id(),
            PurchaseFilter {
                company_id: params.company_id,
                search: params.search,
            },
        )
        .await?;
    Ok(Json(purchases))
}

#[utoipa::path(
    get,
    path = "/purchases/{id}",
    params(("id" = i32, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase", body = purchase::Model),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn get_purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<purchase::Model>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.services.purchases.get(id, auth.id()).await?))
}

/// Create a purchase header; the total starts at zero
#[utoipa::path(
    post,
    path = "/purchases",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Purchase created", body = purchase::Model),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Company not found or access denied", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn create_purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreatePurchaseRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let created = state
        .services
        .purchases
        .create(
            NewPurchase {
                company_id: payload.company_id,
                invoice_number: payload.invoice_number,
                supplier_name: payload.supplier_name,
                supplier_contact: payload.supplier_contact,
                purchase_date: payload.purchase_date,
                status: payload.status,
                notes: payload.notes,
            },
            auth.id(),
        )
        .await?;
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/purchases/{id}",
    params(("id" = i32, Path, description = "Purchase id")),
    request_body = UpdatePurchaseRequest,
    responses(
        (status = 200, description = "Purchase updated", body = purchase::Model),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn update_purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdatePurchaseRequest>, JsonRejection>,
) -> Result<Json<purchase::Model>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let updated = state
        .services
        .purchases
        .update(
            id,
            auth.id(),
            PurchaseChanges {
                invoice_number: payload.invoice_number,
                supplier_name: payload.supplier_name,
                supplier_contact: payload.supplier_contact,
                purchase_date: payload.purchase_date,
                status: payload.status,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/purchases/{id}",
    params(("id" = i32, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase and its items deleted", body = MessageResponse),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn delete_purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    state.services.purchases.delete(id, auth.id()).await?;
    Ok(message_response("Purchase deleted successfully"))
}

/// Items of a purchase, oldest first
#[utoipa::path(
    get,
    path = "/purchases/{id}/items",
    params(("id" = i32, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase items", body = [purchase_item::Model]),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<purchase_item::Model>>, ApiError> {
    let Path(id) = id?;
    Ok(Json(
        state
            .services
            .purchase_items
            .list_items(id, auth.id())
            .await?,
    ))
}

/// Add an item and raise the purchase total by its line total
#[utoipa::path(
    post,
    path = "/purchases/{id}/items",
    params(("id" = i32, Path, description = "Purchase id")),
    request_body = CreatePurchaseItemRequest,
    responses(
        (status = 201, description = "Item added", body = purchase_item::Model),
        (status = 400, description = "Invalid input or material from another company", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn add_item(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<CreatePurchaseItemRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let item = state
        .services
        .purchase_items
        .add_item(
            id,
            auth.id(),
            NewPurchaseItem {
                item_name: payload.item_name,
                quantity: payload.quantity,
                unit_price: payload.unit_price,
                material_id: payload.material_id,
            },
        )
        .await?;
    Ok(created_response(item))
}

#[utoipa::path(
    put,
    path = "/purchases/{id}/items/{item_id}",
    params(
        ("id" = i32, Path, description = "Purchase id"),
        ("item_id" = i32, Path, description = "Item id")
    ),
    request_body = UpdatePurchaseItemRequest,
    responses(
        (status = 200, description = "Item updated", body = purchase_item::Model),
        (status = 400, description = "Invalid input or material from another company", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase or item not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    ids: Result<Path<(i32, i32)>, PathRejection>,
    payload: Result<Json<UpdatePurchaseItemRequest>, JsonRejection>,
) -> Result<Json<purchase_item::Model>, ApiError> {
    let Path((id, item_id)) = ids?;
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let item = state
        .services
        .purchase_items
        .update_item(
            id,
            item_id,
            auth.id(),
            PurchaseItemChanges {
                item_name: payload.item_name,
                quantity: payload.quantity,
                unit_price: payload.unit_price,
                material_id: payload.material_id,
            },
        )
        .await?;
    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/purchases/{id}/items/{item_id}",
    params(
        ("id" = i32, Path, description = "Purchase id"),
        ("item_id" = i32, Path, description = "Item id")
    ),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 404, description = "Purchase or item not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    ids: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path((id, item_id)) = ids?;
    state
        .services
        .purchase_items
        .delete_item(id, item_id, auth.id())
        .await?;
    Ok(message_response("Purchase item deleted successfully"))
}
