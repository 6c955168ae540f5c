//! Maps `AppError` onto HTTP responses.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use rb_core::error::AppError;
use rb_ui::{ErrorTemplate, Nav};

/// Handler error wrapper; `AppError` lives in another crate, so it cannot
/// implement `IntoResponse` itself.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError(e)
    }
}

impl From<askama::Error> for ApiError {
    fn from(e: askama::Error) -> Self {
        ApiError(AppError::Internal(format!("template rendering failed: {e}")))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Renders a template into an HTML response.
pub fn render<T: Template>(template: T) -> ApiResult<Html<String>> {
    Ok(Html(template.render()?))
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let page = ErrorTemplate {
        nav: Nav::default(),
        status: status.as_u16(),
        message,
    }
    .render()
    .unwrap_or_else(|_| message.to_string());
    (status, Html(page)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::Unauthorized(msg) => {
                tracing::info!("redirecting to login: {}", msg);
                return Redirect::to("/login").into_response();
            }
            AppError::NotFound(..) => {
                tracing::info!("{}", self.0);
                StatusCode::NOT_FOUND
            }
            AppError::AlreadyLinked { .. } => StatusCode::CONFLICT,
            AppError::DuplicateIdentity(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(msg) => {
                tracing::warn!("forbidden: {}", msg);
                StatusCode::FORBIDDEN
            }
            AppError::ExternalLookupFailure(msg) => {
                tracing::warn!("external lookup failed: {}", msg);
                StatusCode::BAD_GATEWAY
            }
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                return error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.");
            }
        };
        error_page(status, &self.0.to_string())
    }
}
