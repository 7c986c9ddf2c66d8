use axum::extract::rejection::QueryRejection;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use monitor_agent::store::UpdateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

/// Body of every response of the API.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct ApiResponse {
    pub code: i32,
    pub message: String,
}

impl ApiResponse {
    pub(crate) fn success() -> Json<Self> {
        Json(ApiResponse {
            code: 0,
            message: "Success".to_string(),
        })
    }
}

/// Query string of the delete endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct UniqueName {
    pub unique_name: String,
}

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("invalid param: {0}")]
    InvalidParam(String),

    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// Request bodies are decoded as JSON whatever their content type.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidParam(err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidParam(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidParam(details) => {
                info!(%details, "Cannot parse request");
                (StatusCode::BAD_REQUEST, -998, "Invalid param")
            }
            ApiError::Update(err) => {
                error!(%err, "Unable to apply configuration change");
                (StatusCode::INTERNAL_SERVER_ERROR, -999, "System error")
            }
        };

        let body = ApiResponse {
            code,
            message: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
