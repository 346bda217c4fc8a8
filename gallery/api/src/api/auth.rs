use std::sync::Arc;

use hyper::StatusCode;
use ulid::Ulid;
use utils::http::RouteError;

use super::error::ApiError;
use super::jwt::{AuthJwtPayload, JwtState};
use crate::access::Viewer;
use crate::config::JwtConfig;
use crate::database::{Session, User};
use crate::global::GalleryGlobal;
use crate::store::Store;

#[derive(thiserror::Error, Debug, Clone)]
pub enum AuthError {
	#[error("invalid token")]
	InvalidToken,
	#[error("session expired")]
	SessionExpired,
	#[error("failed to fetch user")]
	FetchUser,
	#[error("failed to fetch session")]
	FetchSession,
	#[error("user not found")]
	UserNotFound,
}

impl From<AuthError> for RouteError<ApiError> {
	#[track_caller]
	fn from(value: AuthError) -> Self {
		RouteError::from(match &value {
			AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
			AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "session expired"),
			AuthError::FetchUser => (StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch user"),
			AuthError::FetchSession => (StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch session"),
			AuthError::UserNotFound => (StatusCode::INTERNAL_SERVER_ERROR, "user not found"),
		})
		.with_source(Some(ApiError::Auth(value)))
	}
}

/// The logged in user behind a request.
#[derive(Debug, Clone)]
pub struct AuthData {
	pub session: Session,
	pub user: User,
}

impl AuthData {
	pub fn viewer(&self) -> Viewer {
		Viewer::from(&self.user)
	}

	pub async fn from_session<G: GalleryGlobal>(global: &Arc<G>, session: Session) -> Result<Self, AuthError> {
		let user = global
			.store()
			.user_by_id(session.user_id)
			.await
			.map_err(|err| {
				tracing::error!(error = %err, "failed to fetch user");
				AuthError::FetchUser
			})?
			.ok_or(AuthError::UserNotFound)?;

		Ok(Self { session, user })
	}

	pub async fn from_session_id<G: GalleryGlobal>(global: &Arc<G>, session_id: Ulid) -> Result<Self, AuthError> {
		let session = global
			.store()
			.session_by_id(session_id)
			.await
			.map_err(|err| {
				tracing::error!(error = %err, "failed to fetch session");
				AuthError::FetchSession
			})?
			.and_then(|s| s.is_valid().then_some(s))
			.ok_or(AuthError::SessionExpired)?;

		Self::from_session(global, session).await
	}

	/// Resolves a bearer or cookie token to its session and user.
	pub async fn from_token<G: GalleryGlobal>(global: &Arc<G>, token: &str) -> Result<Self, AuthError> {
		let jwt = AuthJwtPayload::verify(global.config::<JwtConfig>(), token).ok_or(AuthError::InvalidToken)?;

		let data = Self::from_session_id(global, jwt.session_id).await?;
		if data.user.id != jwt.user_id {
			return Err(AuthError::InvalidToken);
		}

		Ok(data)
	}
}
