use crate::errors::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// `{"message": ...}` with 200
pub fn message_response(message: &str) -> Response {
    success_response(MessageResponse {
        message: message.to_string(),
    })
}

/// For `#[serde(default, deserialize_with = "nullable")]` on `Option<Option<T>>`:
/// an absent field stays `None`, an explicit `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Material deleted successfully")]
    pub message: String,
}

/// `?search=` filter shared by the list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring filter
    pub search: Option<String>,
}

/// `?company_id=&search=`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompanyScopedParams {
    /// Restrict to one of the caller's companies
    pub company_id: Option<i32>,
    /// Case-insensitive substring filter
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn validate_input_prefixes_message() {
        let err = validate_input(&Named {
            name: String::new(),
        })
        .unwrap_err();
        match err {
            ApiError::ValidationError(msg) => assert!(msg.starts_with("Validation failed: ")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(validate_input(&Named { name: "x".into() }).is_ok());
    }
}
