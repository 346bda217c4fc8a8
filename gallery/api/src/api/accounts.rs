use std::sync::Arc;

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use utils::http::ext::OptionExt;
use utils::http::router::builder::RouterBuilder;
use utils::http::RouteError;

use super::error::{ApiError, Result};
use super::ext::{read_form, RequestExt as _};
use super::jwt::{AuthJwtPayload, JwtState};
use super::models::OwnerView;
use super::{response, Body};
use crate::config::{JwtConfig, MediaConfig};
use crate::database::Session;
use crate::forms::{FieldErrors, REQUIRED};
use crate::global::GalleryGlobal;
use crate::store::Store;

pub const INVALID_LOGIN: &str = "Please enter a correct username and password.";

pub fn routes<G: GalleryGlobal>(_: &Arc<G>) -> RouterBuilder<Incoming, RouteError<ApiError>> {
	RouterBuilder::new()
		.get("/login/", login_form)
		.post("/login/", login::<G>)
		.post("/logout/", logout::<G>)
}

/// A session lifetime of `ttl` seconds, if one starting now stays within
/// the representable date range.
pub fn session_lifetime(ttl: u64) -> Option<chrono::Duration> {
	let ttl = chrono::Duration::try_seconds(i64::try_from(ttl).ok()?)?;
	chrono::Utc::now().checked_add_signed(ttl).map(|_| ttl)
}

fn next_param(query: Option<&str>) -> Option<String> {
	url::form_urlencoded::parse(query?.as_bytes())
		.find(|(key, _)| key == "next")
		.map(|(_, value)| value.into_owned())
		.filter(|next| response::is_local_path(next))
}

async fn login_form(req: Request<Incoming>) -> Result<Response<Body>> {
	let auth = req.context()?.auth().await?;

	Ok(response::ok(&json!({
		"form": {
			"fields": ["username", "password"],
		},
		"next": next_param(req.uri().query()),
		"user": auth.as_ref().map(|auth| OwnerView::from(&auth.user)),
	})))
}

async fn login<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let query_next = next_param(req.uri().query());

	let data = read_form(req, global.config::<MediaConfig>().max_upload_size).await?;

	let username = data.get("username").map(str::trim).unwrap_or_default();
	let password = data.get("password").unwrap_or_default();

	let mut errors = FieldErrors::default();
	if username.is_empty() {
		errors.add("username", REQUIRED);
	}
	if password.is_empty() {
		errors.add("password", REQUIRED);
	}
	if !errors.is_empty() {
		return Err(errors.into());
	}

	let user = global
		.store()
		.user_by_username(username)
		.await?
		.filter(|user| user.verify_password(password));

	let Some(user) = user else {
		let mut errors = FieldErrors::default();
		errors.add("__all__", INVALID_LOGIN);
		return Err(errors.into());
	};

	let config = global.config::<JwtConfig>();
	let ttl = session_lifetime(config.session_ttl)
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "invalid session lifetime"))?;
	let session = Session::new(user.id, ttl);
	global.store().create_session(&session).await?;

	let token = AuthJwtPayload::from(&session)
		.serialize(config)
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to serialize token"))?;

	tracing::debug!(user_id = %user.id, session_id = %session.id, "logged in");

	let next = data
		.get("next")
		.filter(|next| response::is_local_path(next))
		.map(str::to_owned)
		.or(query_next)
		.unwrap_or_else(|| "/".to_string());

	let mut res = response::redirect(&next, "Logged in successfully!");
	response::set_session_cookie(&mut res, &token);

	Ok(res)
}

async fn logout<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.context()?;

	// an expired session has nothing left to invalidate
	if let Ok(Some(auth)) = context.auth().await {
		global.store().invalidate_session(auth.session.id).await?;
		context.reset_auth().await;

		tracing::debug!(user_id = %auth.user.id, session_id = %auth.session.id, "logged out");
	}

	let mut res = response::redirect("/", "Logged out successfully!");
	response::clear_session_cookie(&mut res);

	Ok(res)
}
