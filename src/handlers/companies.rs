use super::common::{
    created_response, message_response, validate_input, MessageResponse, SearchParams,
};
use crate::{
    auth::AuthUser,
    entities::company,
    errors::ApiError,
    services::companies::{CompanyChanges, NewCompany},
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Acme Electronics Ltd.")]
    pub name: String,
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub tax_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub tax_id: Option<String>,
}

pub fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route(
            "/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
}

/// List the caller's companies, newest first
#[utoipa::path(
    get,
    path = "/companies",
    params(SearchParams),
    responses(
        (status = 200, description = "Companies owned by the caller", body = [company::Model]),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn list_companies(
    State(state): State<AppState>,
    auth: AuthUser,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<company::Model>>, ApiError> {
    let Query(params) = params?;
    let companies = state
        .services
        .directory
        .list_companies(auth.id(), params.search.as_deref())
        .await?;
    Ok(Json(companies))
}

#[utoipa::path(
    get,
    path = "/companies/{id}",
    params(("id" = i32, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company", body = company::Model),
        (status = 404, description = "Company not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn get_company(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<company::Model>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.services.companies.get(id, auth.id()).await?))
}

#[utoipa::path(
    post,
    path = "/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = company::Model),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn create_company(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateCompanyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let created = state
        .services
        .companies
        .create(
            NewCompany {
                name: payload.name,
                address: payload.address,
                phone: payload.phone,
                email: payload.email,
                tax_id: payload.tax_id,
            },
            auth.id(),
        )
        .await?;
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/companies/{id}",
    params(("id" = i32, Path, description = "Company id")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = company::Model),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Company not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn update_company(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateCompanyRequest>, JsonRejection>,
) -> Result<Json<company::Model>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let updated = state
        .services
        .companies
        .update(
            id,
            auth.id(),
            CompanyChanges {
                name: payload.name,
                address: payload.address,
                phone: payload.phone,
                email: payload.email,
                tax_id: payload.tax_id,
            },
        )
        .await?;
    Ok(Json(updated))
}

/// Delete a company with its materials and purchases
#[utoipa::path(
    delete,
    path = "/companies/{id}",
    params(("id" = i32, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company deleted", body = MessageResponse),
        (status = 404, description = "Company not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn delete_company(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    state.services.companies.delete(id, auth.id()).await?;
    Ok(message_response("Company deleted successfully"))
}
