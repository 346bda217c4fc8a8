//! JSON views of the stored records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::database::{Album, Photo, User};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, serde::Serialize)]
pub struct OwnerView {
	pub id: Ulid,
	pub username: String,
}

impl From<&User> for OwnerView {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			username: user.username.clone(),
		}
	}
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AlbumView {
	pub id: Ulid,
	pub title: String,
	pub description: String,
	pub owner: OwnerView,
	pub is_public: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub photo_count: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PhotoView {
	pub id: Ulid,
	pub title: String,
	pub description: String,
	pub owner: OwnerView,
	pub album_id: Option<Ulid>,
	pub is_public: bool,
	pub uploaded_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub url: String,
	pub image_url: String,
}

impl PhotoView {
	/// Keeps the album link only when the viewer may open that album.
	pub fn retain_album(mut self, visible: impl Fn(Ulid) -> bool) -> Self {
		self.album_id = self.album_id.filter(|id| visible(*id));
		self
	}
}

pub fn album_url(id: Ulid) -> String {
	format!("/album/{id}/")
}

pub fn photo_url(id: Ulid) -> String {
	format!("/photo/{id}/")
}

/// Usernames of the owners of a page of records, fetched in one go.
pub struct Owners(HashMap<Ulid, User>);

impl Owners {
	pub async fn load(store: &impl Store, ids: impl IntoIterator<Item = Ulid>) -> Result<Self, StoreError> {
		let mut ids = ids.into_iter().collect::<Vec<_>>();
		ids.sort_unstable();
		ids.dedup();

		Ok(Self(store.users_by_ids(&ids).await?))
	}

	fn get(&self, id: Ulid) -> OwnerView {
		match self.0.get(&id) {
			Some(user) => user.into(),
			None => OwnerView {
				id,
				username: String::new(),
			},
		}
	}

	pub fn album(&self, album: &Album) -> AlbumView {
		AlbumView {
			id: album.id,
			title: album.title.clone(),
			description: album.description.clone(),
			owner: self.get(album.owner_id),
			is_public: album.is_public,
			created_at: album.created_at,
			updated_at: album.updated_at,
			url: album_url(album.id),
			photo_count: None,
		}
	}

	pub fn albums(&self, albums: &[Album]) -> Vec<AlbumView> {
		albums.iter().map(|album| self.album(album)).collect()
	}

	pub fn photo(&self, photo: &Photo) -> PhotoView {
		PhotoView {
			id: photo.id,
			title: photo.title.clone(),
			description: photo.description.clone(),
			owner: self.get(photo.owner_id),
			album_id: photo.album_id,
			is_public: photo.is_public,
			uploaded_at: photo.uploaded_at,
			updated_at: photo.updated_at,
			url: photo_url(photo.id),
			image_url: format!("/photo/{}/image/", photo.id),
		}
	}

	pub fn photos(&self, photos: &[Photo]) -> Vec<PhotoView> {
		photos.iter().map(|photo| self.photo(photo)).collect()
	}
}
