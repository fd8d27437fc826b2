use super::common::{
    created_response, message_response, validate_input, CompanyScopedParams, MessageResponse,
};
use crate::{
    auth::AuthUser,
    entities::{material, material_movement},
    errors::ApiError,
    services::{
        directory::MaterialFilter,
        materials::{MaterialChanges, NewMaterial},
        stock_ledger::StockAdjustment,
    },
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::Response,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMaterialRequest {
    pub company_id: i32,
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Arduino Uno R3")]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "ARD-UNO-R3")]
    pub sku: String,
    #[validate(length(max = 100))]
    pub barcode: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "pcs")]
    pub unit: Option<String>,
    #[serde(default)]
    #[schema(value_type = String, example = "150")]
    pub current_stock: Decimal,
    #[serde(default)]
    #[schema(value_type = String, example = "50")]
    pub min_stock: Decimal,
    #[schema(value_type = Option<String>, example = "25.99")]
    pub unit_price: Option<Decimal>,
}

/// `current_stock` is not accepted here; use a stock adjustment.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateMaterialRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    #[validate(length(max = 100))]
    pub barcode: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub unit: Option<String>,
    #[schema(value_type = Option<String>)]
    pub min_stock: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StockAdjustmentRequest {
    /// Signed change: positive adds stock, negative removes it
    #[schema(value_type = String, example = "-25")]
    pub quantity: Decimal,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "sale")]
    pub reason: String,
    pub notes: Option<String>,
}

pub fn material_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_materials).post(create_material))
        .route("/company/:company_id/low-stock", get(list_low_stock))
        .route(
            "/:id",
            get(get_material).put(update_material).delete(delete_material),
        )
        .route("/:id/stock/adjust", post(adjust_stock))
        .route("/:id/movements", get(list_movements))
}

/// List materials across the caller's companies
#[utoipa::path(
    get,
    path = "/materials",
    params(CompanyScopedParams),
    responses(
        (status = 200, description = "Materials, newest first", body = [material::Model]),
        (status = 404, description = "Company not found or access denied", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn list_materials(
    State(state): State<AppState>,
    auth: AuthUser,
    params: Result<Query<CompanyScopedParams>, QueryRejection>,
) -> Result<Json<Vec<material::Model>>, ApiError> {
    let Query(params) = params?;
    let materials = state
        .services
        .directory
        .list_materials(
            auth.id(),
            MaterialFilter {
                company_id: params.company_id,
                search: params.search,
            },
        )
        .await?;
    Ok(Json(materials))
}

/// Materials at or below their minimum stock
#[utoipa::path(
    get,
    path = "/materials/company/{company_id}/low-stock",
    params(("company_id" = i32, Path, description = "Company id")),
    responses(
        (status = 200, description = "Low-stock materials, lowest stock first", body = [material::Model]),
        (status = 404, description = "Company not found or access denied", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    auth: AuthUser,
    company_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<material::Model>>, ApiError> {
    let Path(company_id) = company_id?;
    Ok(Json(
        state
            .services
            .stock_ledger
            .list_low_stock(company_id, auth.id())
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/materials/{id}",
    params(("id" = i32, Path, description = "Material id")),
    responses(
        (status = 200, description = "Material", body = material::Model),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn get_material(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<material::Model>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.services.materials.get(id, auth.id()).await?))
}

/// Create a material; a non-zero opening stock is recorded as an `initial_stock` movement
#[utoipa::path(
    post,
    path = "/materials",
    request_body = CreateMaterialRequest,
    responses(
        (status = 201, description = "Material created", body = material::Model),
        (status = 400, description = "Invalid input or duplicate SKU", body = crate::errors::ErrorResponse),
        (status = 404, description = "Company not found or access denied", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn create_material(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateMaterialRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let created = state
        .services
        .materials
        .create(
            NewMaterial {
                company_id: payload.company_id,
                name: payload.name,
                sku: payload.sku,
                barcode: payload.barcode,
                description: payload.description,
                unit: payload.unit,
                current_stock: payload.current_stock,
                min_stock: payload.min_stock,
                unit_price: payload.unit_price,
            },
            auth.id(),
        )
        .await?;
    Ok(created_response(created))
}

/// Update descriptive fields; stock only changes through adjustments
#[utoipa::path(
    put,
    path = "/materials/{id}",
    params(("id" = i32, Path, description = "Material id")),
    request_body = UpdateMaterialRequest,
    responses(
        (status = 200, description = "Material updated", body = material::Model),
        (status = 400, description = "Invalid input or duplicate SKU", body = crate::errors::ErrorResponse),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn update_material(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateMaterialRequest>, JsonRejection>,
) -> Result<Json<material::Model>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let updated = state
        .services
        .materials
        .update(
            id,
            auth.id(),
            MaterialChanges {
                name: payload.name,
                sku: payload.sku,
                barcode: payload.barcode,
                description: payload.description,
                unit: payload.unit,
                min_stock: payload.min_stock,
                unit_price: payload.unit_price,
            },
        )
        .await?;
    Ok(Json(updated))
}

/// Apply a signed stock change and record it as a movement
#[utoipa::path(
    post,
    path = "/materials/{id}/stock/adjust",
    params(("id" = i32, Path, description = "Material id")),
    request_body = StockAdjustmentRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = material::Model),
        (status = 400, description = "Invalid input or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<StockAdjustmentRequest>, JsonRejection>,
) -> Result<Json<material::Model>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let mut adjustment = StockAdjustment::new(payload.quantity, payload.reason);
    if let Some(notes) = payload.notes {
        adjustment = adjustment.with_notes(notes);
    }

    let updated = state
        .services
        .stock_ledger
        .adjust_stock(id, auth.id(), adjustment)
        .await?;
    Ok(Json(updated))
}

/// Stock movements, newest first
#[utoipa::path(
    get,
    path = "/materials/{id}/movements",
    params(("id" = i32, Path, description = "Material id")),
    responses(
        (status = 200, description = "Movements", body = [material_movement::Model]),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<material_movement::Model>>, ApiError> {
    let Path(id) = id?;
    Ok(Json(
        state
            .services
            .stock_ledger
            .list_movements(id, auth.id())
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/materials/{id}",
    params(("id" = i32, Path, description = "Material id")),
    responses(
        (status = 200, description = "Material deleted", body = MessageResponse),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn delete_material(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    state.services.materials.delete(id, auth.id()).await?;
    Ok(message_response("Material deleted successfully"))
}
