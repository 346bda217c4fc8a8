use std::sync::Arc;

use hyper::body::Incoming;
use hyper::{Request, Response};
use serde_json::json;
use utils::http::router::builder::RouterBuilder;
use utils::http::RouteError;

use super::error::{ApiError, Result};
use super::ext::RequestExt as _;
use super::models::Owners;
use super::{response, Body};
use crate::access;
use crate::global::GalleryGlobal;
use crate::store::Store;

pub fn routes<G: GalleryGlobal>(_: &Arc<G>) -> RouterBuilder<Incoming, RouteError<ApiError>> {
	RouterBuilder::new().get("/dashboard/", dashboard::<G>)
}

/// Everything the caller owns, private or not.
async fn dashboard<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;

	let albums = access::owned_albums(global.store(), auth.user.id).await?;
	let photos = access::owned_photos(global.store(), auth.user.id).await?;

	let counts = global
		.store()
		.album_photo_counts(&albums.iter().map(|album| album.id).collect::<Vec<_>>())
		.await?;

	let owners = Owners::load(global.store(), [auth.user.id]).await?;

	let album_views = albums
		.iter()
		.map(|album| {
			let mut view = owners.album(album);
			view.photo_count = Some(counts.get(&album.id).copied().unwrap_or_default());
			view
		})
		.collect::<Vec<_>>();

	Ok(response::ok(&json!({
		"albums": album_views,
		"photos": owners.photos(&photos),
		"album_count": albums.len(),
		"photo_count": photos.len(),
	})))
}
