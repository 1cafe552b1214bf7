use axum::{
    body::Body,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{Response, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

/// Failures the HTTP boundary knows how to render.
///
/// Anything coming out of a service as a `color_eyre::Report` is an
/// internal error: it is logged with its full chain and the caller gets a
/// generic 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(color_eyre::Report),
}

impl ApiError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound(detail.into())
    }
}

impl From<color_eyre::Report> for ApiError {
    fn from(report: color_eyre::Report) -> Self {
        Self::Internal(report)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

// Tell axum how to convert `ApiError` into a response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response<Body> {
        let (status, detail) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            ApiError::BadRequest(detail) => {
                log::debug!("Rejected request: {detail}");
                (StatusCode::BAD_REQUEST, detail)
            }
            ApiError::Internal(err) => {
                log::error!("{err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
        };

        (status, axum::Json(json!({ "detail": detail }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
