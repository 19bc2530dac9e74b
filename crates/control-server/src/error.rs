//! Turning [`shield_api::ApiError`] into an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shield_api::{ApiError, ErrorBody};

pub struct HttpApiError(pub ApiError);

impl From<ApiError> for HttpApiError {
    fn from(err: ApiError) -> Self {
        HttpApiError(err)
    }
}

impl From<shield_policy::PolicyError> for HttpApiError {
    fn from(err: shield_policy::PolicyError) -> Self {
        use shield_policy::PolicyError as P;
        let api_err = match err {
            P::Validation { message } => ApiError::Validation { message },
            P::LockoutRefusal { domain, locked_until } => ApiError::LockoutRefusal { domain, locked_until },
            P::Load { message } | P::Save { message } => ApiError::SurfaceApply { message },
        };
        HttpApiError(api_err)
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody::from(&self.0);
        (status, Json(body)).into_response()
    }
}
