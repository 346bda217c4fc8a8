use std::sync::Arc;

use chrono::Utc;
use file_format::FileFormat;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{header, Request, Response, StatusCode};
use serde_json::json;
use ulid::Ulid;
use utils::http::ext::{OptionExt, ResultExt};
use utils::http::router::builder::RouterBuilder;
use utils::http::RouteError;

use super::error::{ApiError, Result};
use super::ext::{read_form, RequestExt as _};
use super::models::{photo_url, OwnerView, Owners};
use super::pagination::{Page, PageRequest};
use super::{response, Body};
use crate::access::{self, can_mutate};
use crate::config::{GalleryConfig, MediaConfig};
use crate::database::Album;
use crate::drive::{upload_path, AnyDrive, Drive, DriveError};
use crate::forms::{FieldErrors, PhotoForm, ValidImage, INVALID_CHOICE};
use crate::global::GalleryGlobal;
use crate::store::{Store, StoreError};

pub fn routes<G: GalleryGlobal>(_: &Arc<G>) -> RouterBuilder<Incoming, RouteError<ApiError>> {
	RouterBuilder::new()
		.get("/photos/", index::<G>)
		.get("/photo/new/", new_form::<G>)
		.post("/photo/new/", create::<G>)
		.get("/photo/:id/", detail::<G>)
		.get("/photo/:id/image/", image::<G>)
		.get("/photo/:id/edit/", edit_form::<G>)
		.post("/photo/:id/edit/", update::<G>)
		.get("/photo/:id/delete/", delete_confirm::<G>)
		.post("/photo/:id/delete/", delete::<G>)
}

async fn index<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.auth().await?;
	let viewer = auth.as_ref().map(|auth| auth.viewer()).unwrap_or_default();

	let request = PageRequest::from_query(req.uri().query()).map_err_route((StatusCode::NOT_FOUND, "invalid page"))?;

	let count = access::count_visible_photos(global.store(), &viewer).await?;
	let page = Page::resolve(request, count, global.config::<GalleryConfig>().photo_page_size as u64)
		.map_err_route((StatusCode::NOT_FOUND, "invalid page"))?;

	let photos = access::visible_photos(global.store(), &viewer, page.bounds()).await?;
	let owners = Owners::load(global.store(), photos.iter().map(|photo| photo.owner_id)).await?;
	let albums =
		access::visible_album_ids(global.store(), &viewer, photos.iter().filter_map(|photo| photo.album_id)).await?;

	let photos = owners
		.photos(&photos)
		.into_iter()
		.map(|view| view.retain_album(|id| albums.contains(&id)))
		.collect::<Vec<_>>();

	Ok(response::ok(&json!({
		"photos": photos,
		"page": page,
		"user": auth.as_ref().map(|auth| OwnerView::from(&auth.user)),
	})))
}

fn album_choices(albums: &[Album]) -> serde_json::Value {
	albums
		.iter()
		.map(|album| json!({ "id": album.id, "title": album.title }))
		.collect()
}

async fn new_form<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;

	let choices = access::owned_albums(global.store(), auth.user.id).await?;

	Ok(response::ok(&json!({
		"form": {
			"fields": PhotoForm::FIELDS,
			"values": null,
			"album_choices": album_choices(&choices),
		},
	})))
}

/// Stores a validated upload under a fresh path.
async fn store_image(drive: &AnyDrive, image: &ValidImage) -> Result<String> {
	let path = upload_path(Utc::now(), Ulid::new(), &image.extension);

	drive
		.write(&path, image.data.clone())
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to store image"))?;

	Ok(path)
}

/// Removes an image that is no longer referenced. Failures only leave an
/// orphaned file behind.
pub(super) async fn discard_image(drive: &AnyDrive, path: &str) {
	match drive.delete(path).await {
		Ok(()) | Err(DriveError::NotFound) => {}
		Err(err) => tracing::warn!(path, error = %err, "failed to delete image"),
	}
}

/// The store rejected the album, which can only happen when it changed
/// owner since the form was validated.
fn album_mismatch() -> RouteError<ApiError> {
	let mut errors = FieldErrors::default();
	errors.add("album", INVALID_CHOICE);
	errors.into()
}

async fn create<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;

	let data = read_form(req, global.config::<MediaConfig>().max_upload_size).await?;

	let choices = access::owned_albums(global.store(), auth.user.id).await?;
	let mut form = PhotoForm::parse(&data, &choices, true)?;
	let image = form
		.image
		.take()
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "validated form without an image"))?;

	let image_path = store_image(global.drive(), &image).await?;
	let photo = form.create(Ulid::new(), auth.user.id, image_path, Utc::now());

	match global.store().insert_photo(&photo).await {
		Ok(()) => {}
		Err(err) => {
			discard_image(global.drive(), &photo.image).await;
			return Err(match err {
				StoreError::AlbumOwnerMismatch => album_mismatch(),
				err => err.into(),
			});
		}
	}

	tracing::debug!(photo_id = %photo.id, owner_id = %photo.owner_id, "photo uploaded");

	Ok(response::redirect("/photos/", "Photo uploaded successfully!"))
}

async fn detail<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let viewer = req.context()?.viewer().await?;
	let id = req.id_param("id")?;

	let photo = access::get_visible_photo(global.store(), &viewer, id).await?;

	// the album is only shown when the viewer could open it
	let album = match photo.album_id {
		Some(album_id) => match access::get_visible_album(global.store(), &viewer, album_id).await {
			Ok(album) => Some(album),
			Err(access::AccessError::NotFound) => None,
			Err(err) => return Err(err.into()),
		},
		None => None,
	};

	let owners = Owners::load(
		global.store(),
		std::iter::once(photo.owner_id).chain(album.iter().map(|album| album.owner_id)),
	)
	.await?;

	Ok(response::ok(&json!({
		"photo": owners.photo(&photo).retain_album(|id| album.as_ref().is_some_and(|album| album.id == id)),
		"album": album.as_ref().map(|album| owners.album(album)),
		"can_edit": can_mutate(&viewer, &photo),
	})))
}

async fn image<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let viewer = req.context()?.viewer().await?;
	let id = req.id_param("id")?;

	let photo = access::get_visible_photo(global.store(), &viewer, id).await?;

	let data = match global.drive().read(&photo.image).await {
		Ok(data) => data,
		Err(DriveError::NotFound) => {
			tracing::warn!(photo_id = %photo.id, path = %photo.image, "image missing from drive");
			return Err((StatusCode::NOT_FOUND, "not found").into());
		}
		Err(err) => {
			return Err(RouteError::from((
				StatusCode::INTERNAL_SERVER_ERROR,
				"failed to read image",
				ApiError::Drive(err),
			)));
		}
	};

	let format = FileFormat::from_bytes(&data);

	Response::builder()
		.status(StatusCode::OK)
		.header(header::CONTENT_TYPE, format.media_type())
		.body(Full::new(data))
		.map_ignore_err_route("failed to build response")
}

async fn edit_form<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;
	let id = req.id_param("id")?;

	let photo = access::get_mutable_photo(global.store(), &auth.viewer(), id).await?;
	// a photo can only be filed under an album of its own owner
	let choices = access::owned_albums(global.store(), photo.owner_id).await?;

	Ok(response::ok(&json!({
		"form": {
			"fields": PhotoForm::FIELDS,
			"values": {
				"title": photo.title,
				"description": photo.description,
				"album": photo.album_id,
				"is_public": photo.is_public,
			},
			"album_choices": album_choices(&choices),
		},
		"photo_id": photo.id,
	})))
}

async fn update<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;
	let id = req.id_param("id")?;

	let mut photo = access::get_mutable_photo(global.store(), &auth.viewer(), id).await?;

	let data = read_form(req, global.config::<MediaConfig>().max_upload_size).await?;

	let choices = access::owned_albums(global.store(), photo.owner_id).await?;
	let mut form = PhotoForm::parse(&data, &choices, false)?;

	let new_image = match form.image.take() {
		Some(image) => Some(store_image(global.drive(), &image).await?),
		None => None,
	};

	let old_image = photo.image.clone();
	form.apply(&mut photo, new_image.clone());

	if let Err(err) = global.store().update_photo(&photo).await {
		if let Some(path) = &new_image {
			discard_image(global.drive(), path).await;
		}

		return Err(match err {
			StoreError::AlbumOwnerMismatch => album_mismatch(),
			StoreError::NotFound => (StatusCode::NOT_FOUND, "not found").into(),
			err => err.into(),
		});
	}

	if new_image.is_some() {
		discard_image(global.drive(), &old_image).await;
	}

	tracing::debug!(photo_id = %photo.id, actor_id = %auth.user.id, "photo updated");

	Ok(response::redirect(&photo_url(photo.id), "Photo updated successfully!"))
}

async fn delete_confirm<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;
	let id = req.id_param("id")?;

	let viewer = auth.viewer();
	let photo = access::get_mutable_photo(global.store(), &viewer, id).await?;
	let owners = Owners::load(global.store(), [photo.owner_id]).await?;
	let albums = access::visible_album_ids(global.store(), &viewer, photo.album_id).await?;

	Ok(response::ok(&json!({
		"photo": owners.photo(&photo).retain_album(|id| albums.contains(&id)),
	})))
}

async fn delete<G: GalleryGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_auth(&global, req.uri()).await?;
	let id = req.id_param("id")?;

	access::get_mutable_photo(global.store(), &auth.viewer(), id).await?;

	let photo = global
		.store()
		.delete_photo(id)
		.await?
		.map_err_route((StatusCode::NOT_FOUND, "not found"))?;

	discard_image(global.drive(), &photo.image).await;

	tracing::debug!(photo_id = %photo.id, actor_id = %auth.user.id, "photo deleted");

	Ok(response::redirect("/photos/", "Photo deleted successfully!"))
}
