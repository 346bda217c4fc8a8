use std::ops::Deref;
use std::sync::Arc;

use hyper::Uri;
use tokio::sync::RwLock;
use utils::http::RouteError;

use super::auth::{AuthData, AuthError};
use super::error::{ApiError, Result};
use super::response;
use crate::access::Viewer;
use crate::config::GalleryConfig;
use crate::global::GalleryGlobal;

#[derive(Default, Clone)]
pub struct ContextData {
	pub auth: Option<AuthData>,
}

/// Per request state shared between the middleware and the handler.
#[derive(Default, Clone)]
pub struct RequestContext(Arc<RwLock<ContextData>>);

impl RequestContext {
	pub async fn set_auth(&self, data: AuthData) {
		let mut guard = self.0.write().await;
		guard.auth = Some(data);
	}

	pub async fn reset_auth(&self) {
		let mut guard = self.0.write().await;
		guard.auth = None;
	}

	pub async fn auth(&self) -> std::result::Result<Option<AuthData>, AuthError> {
		let inner = self.0.read().await.deref().clone();
		match inner.auth {
			Some(auth) if !auth.session.is_valid() => Err(AuthError::SessionExpired),
			auth => Ok(auth),
		}
	}

	pub async fn viewer(&self) -> std::result::Result<Viewer, AuthError> {
		Ok(self.auth().await?.map(|auth| auth.viewer()).unwrap_or_default())
	}

	/// The logged in user, or a redirect to the login page that comes back
	/// to `uri` afterwards.
	pub async fn require_auth<G: GalleryGlobal>(&self, global: &Arc<G>, uri: &Uri) -> Result<AuthData> {
		match self.auth().await? {
			Some(auth) => Ok(auth),
			None => Err(RouteError::<ApiError>::from(response::login_redirect(
				&global.config::<GalleryConfig>().login_url,
				uri,
			))),
		}
	}
}
