use std::sync::Arc;

use hyper::body::Incoming;
use hyper::{Request, Response};
use serde_json::json;
use utils::http::ext::OptionExt;
use utils::http::router::builder::RouterBuilder;
use utils::http::RouteError;

use super::error::{ApiError, Result};
use super::ext::{read_form, RequestExt as _};
use super::models::{album_url, Owners, OwnerView};
use super::pagination::{Page, PageRequest};
use super::{response, Body};
use crate::access::{self, can_mutate};
use crate::config::{GalleryConfig, MediaConfig};
use crate::forms::AlbumForm;
use crate::global::GalleryGlobal;
use crate::store::Store;

pub fn routes<G: GalleryGlobal>(_: &Arc<G>) -> RouterBuilder<Incoming, RouteError<ApiError>> {
	RouterBuilder::new()
		.get("/", index::<G>)
		.get("/album/new/", new_form::<G>)
		.post("/album/new/", create::<G>)
		.get("/album/:id/", detail::<G>)
		.get("/album/:id/edit/", edit_form::<G>)
		.post("/album/:id/edit/", update::<G>)
		.get("/album/:id/delete/", delete_confirm::<G>)
		.post("/album/:id/delete/", delete::<G>)
}

async fn index<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.auth().await?;
	let viewer = auth.as_ref().map(|auth| auth.viewer()).unwrap_or_default();

	let request = PageRequest::from_query(req.uri().query()).map_err_route((hyper::StatusCode::NOT_FOUND, "invalid page"))?;

	let count = access::count_visible_albums(global.store(), &viewer).await?;
	let page = Page::resolve(request, count, global.config::<GalleryConfig>().album_page_size as u64)
		.map_err_route((hyper::StatusCode::NOT_FOUND, "invalid page"))?;

	let albums = access::visible_albums(global.store(), &viewer, page.bounds()).await?;
	let owners = Owners::load(global.store(), albums.iter().map(|album| album.owner_id)).await?;

	Ok(response::ok(&json!({
		"albums": owners.albums(&albums),
		"page": page,
		"user": auth.as_ref().map(|auth| OwnerView::from(&auth.user)),
	})))
}

async fn new_form<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	req.context()?.require_auth(&global, req.uri()).await?;

	Ok(response::ok(&json!({
		"form": {
			"fields": AlbumForm::FIELDS,
			"values": null,
		},
	})))
}

async fn create<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;

	let data = read_form(req, global.config::<MediaConfig>().max_upload_size).await?;
	let album = AlbumForm::parse(&data)?.create(auth.user.id);

	global.store().insert_album(&album).await?;

	tracing::debug!(album_id = %album.id, owner_id = %album.owner_id, "album created");

	Ok(response::redirect("/", "Album created successfully!"))
}

async fn detail<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let viewer = req.context()?.viewer().await?;
	let id = req.id_param("id")?;

	let album = access::get_visible_album(global.store(), &viewer, id).await?;
	let photos = access::album_photos(global.store(), &viewer, album.id).await?;

	let owners = Owners::load(
		global.store(),
		std::iter::once(album.owner_id).chain(photos.iter().map(|photo| photo.owner_id)),
	)
	.await?;

	Ok(response::ok(&json!({
		"album": owners.album(&album),
		"photos": owners.photos(&photos),
		"can_edit": can_mutate(&viewer, &album),
	})))
}

async fn edit_form<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;
	let id = req.id_param("id")?;

	let album = access::get_mutable_album(global.store(), &auth.viewer(), id).await?;

	Ok(response::ok(&json!({
		"form": {
			"fields": AlbumForm::FIELDS,
			"values": {
				"title": album.title,
				"description": album.description,
				"is_public": album.is_public,
			},
		},
		"album_id": album.id,
	})))
}

async fn update<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;
	let id = req.id_param("id")?;

	let mut album = access::get_mutable_album(global.store(), &auth.viewer(), id).await?;

	let data = read_form(req, global.config::<MediaConfig>().max_upload_size).await?;
	AlbumForm::parse(&data)?.apply(&mut album);

	global.store().update_album(&album).await?;

	tracing::debug!(album_id = %album.id, actor_id = %auth.user.id, "album updated");

	Ok(response::redirect(&album_url(album.id), "Album updated successfully!"))
}

async fn delete_confirm<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;
	let id = req.id_param("id")?;

	let album = access::get_mutable_album(global.store(), &auth.viewer(), id).await?;
	let owners = Owners::load(global.store(), [album.owner_id]).await?;

	Ok(response::ok(&json!({
		"album": owners.album(&album),
	})))
}

async fn delete<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;
	let id = req.id_param("id")?;

	let album = access::get_mutable_album(global.store(), &auth.viewer(), id).await?;

	let images = global
		.store()
		.delete_album(album.id)
		.await?
		.map_err_route((hyper::StatusCode::NOT_FOUND, "not found"))?;

	for image in &images {
		super::photos::discard_image(global.drive(), image).await;
	}

	tracing::debug!(album_id = %album.id, actor_id = %auth.user.id, photos = images.len(), "album deleted");

	Ok(response::redirect("/", "Album deleted successfully!"))
}
