use hyper::StatusCode;
use serde_json::json;
use utils::http::RouteError;
use utils::make_response;

use super::auth::AuthError;
use crate::access::AccessError;
use crate::drive::DriveError;
use crate::forms::{FieldErrors, FormError};
use crate::store::StoreError;

pub type Result<T, E = RouteError<ApiError>> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
	#[error("auth: {0}")]
	Auth(#[from] AuthError),
	#[error("access: {0}")]
	Access(#[from] AccessError),
	#[error("store: {0}")]
	Store(#[from] StoreError),
	#[error("drive: {0}")]
	Drive(#[from] DriveError),
	#[error("failed to parse form: {0}")]
	Form(#[from] FormError),
	#[error("{0}")]
	Validation(#[from] FieldErrors),
	#[error("failed to read http body: {0}")]
	Body(#[from] hyper::Error),
}

impl From<AccessError> for RouteError<ApiError> {
	#[track_caller]
	fn from(value: AccessError) -> Self {
		RouteError::from(match &value {
			AccessError::NotFound => (StatusCode::NOT_FOUND, "not found"),
			AccessError::Forbidden => (StatusCode::FORBIDDEN, "you do not have permission to change this"),
			AccessError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "failed to query the store"),
		})
		.with_source(Some(ApiError::Access(value)))
	}
}

impl From<StoreError> for RouteError<ApiError> {
	#[track_caller]
	fn from(value: StoreError) -> Self {
		RouteError::from((StatusCode::INTERNAL_SERVER_ERROR, "failed to query the store")).with_source(Some(ApiError::Store(value)))
	}
}

/// A rejected submission, answered with every field error at once.
impl From<FieldErrors> for RouteError<ApiError> {
	#[track_caller]
	fn from(errors: FieldErrors) -> Self {
		RouteError::from(make_response!(
			StatusCode::BAD_REQUEST,
			json!({
				"success": false,
				"message": "the submitted form is invalid",
				"errors": &errors,
			})
		))
		.with_source(Some(ApiError::Validation(errors)))
	}
}

impl From<FormError> for RouteError<ApiError> {
	#[track_caller]
	fn from(value: FormError) -> Self {
		RouteError::from(match &value {
			FormError::UnsupportedContentType(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported content type"),
			FormError::Multipart(multer::Error::FieldSizeExceeded { .. }) => {
				(StatusCode::PAYLOAD_TOO_LARGE, "uploaded file is too large")
			}
			FormError::Multipart(_) => (StatusCode::BAD_REQUEST, "malformed multipart body"),
		})
		.with_source(Some(ApiError::Form(value)))
	}
}
