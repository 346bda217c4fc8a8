use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;
use ulid::Ulid;

use super::{Bounds, Store, StoreError};
use crate::access::{AlbumFilter, PhotoFilter};
use crate::database::{Album, Photo, Session, User};

#[derive(Debug, Default)]
struct Tables {
	users: BTreeMap<Ulid, User>,
	sessions: BTreeMap<Ulid, Session>,
	albums: BTreeMap<Ulid, Album>,
	photos: BTreeMap<Ulid, Photo>,
}

impl Tables {
	/// A photo may only reference an album of its own owner.
	fn check_album_owner(&self, photo: &Photo) -> Result<(), StoreError> {
		match photo.album_id {
			None => Ok(()),
			Some(album_id) => match self.albums.get(&album_id) {
				Some(album) if album.owner_id == photo.owner_id => Ok(()),
				_ => Err(StoreError::AlbumOwnerMismatch),
			},
		}
	}
}

/// Keeps every record in process memory. Used for development and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Store for MemoryStore {
	async fn create_user(&self, user: &User) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if tables.users.values().any(|u| u.username == user.username) {
			return Err(StoreError::UsernameTaken);
		}

		tables.users.insert(user.id, user.clone());
		Ok(())
	}

	async fn user_by_id(&self, id: Ulid) -> Result<Option<User>, StoreError> {
		Ok(self.tables.read().await.users.get(&id).cloned())
	}

	async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
		Ok(self
			.tables
			.read()
			.await
			.users
			.values()
			.find(|u| u.username == username)
			.cloned())
	}

	async fn users_by_ids(&self, ids: &[Ulid]) -> Result<HashMap<Ulid, User>, StoreError> {
		let tables = self.tables.read().await;

		Ok(ids
			.iter()
			.filter_map(|id| tables.users.get(id))
			.map(|u| (u.id, u.clone()))
			.collect())
	}

	async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if !tables.users.contains_key(&session.user_id) {
			return Err(StoreError::NotFound);
		}

		tables.sessions.insert(session.id, session.clone());
		Ok(())
	}

	async fn session_by_id(&self, id: Ulid) -> Result<Option<Session>, StoreError> {
		Ok(self.tables.read().await.sessions.get(&id).cloned())
	}

	async fn invalidate_session(&self, id: Ulid) -> Result<(), StoreError> {
		if let Some(session) = self.tables.write().await.sessions.get_mut(&id) {
			session.expires_at = Utc::now();
		}

		Ok(())
	}

	async fn count_albums(&self, filter: &AlbumFilter) -> Result<u64, StoreError> {
		Ok(self.tables.read().await.albums.values().filter(|a| filter.matches(a)).count() as u64)
	}

	async fn list_albums(&self, filter: &AlbumFilter, bounds: Bounds) -> Result<Vec<Album>, StoreError> {
		let tables = self.tables.read().await;

		let mut albums = tables.albums.values().filter(|a| filter.matches(a)).collect::<Vec<_>>();
		albums.sort_by_key(|a| Reverse((a.created_at, a.id)));

		Ok(bounds.apply(albums.into_iter().cloned()))
	}

	async fn album_by_id(&self, id: Ulid) -> Result<Option<Album>, StoreError> {
		Ok(self.tables.read().await.albums.get(&id).cloned())
	}

	async fn insert_album(&self, album: &Album) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if !tables.users.contains_key(&album.owner_id) {
			return Err(StoreError::NotFound);
		}

		tables.albums.insert(album.id, album.clone());
		Ok(())
	}

	async fn update_album(&self, album: &Album) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;
		let existing = tables.albums.get_mut(&album.id).ok_or(StoreError::NotFound)?;

		existing.title = album.title.clone();
		existing.description = album.description.clone();
		existing.is_public = album.is_public;
		existing.updated_at = album.updated_at;

		Ok(())
	}

	async fn delete_album(&self, id: Ulid) -> Result<Option<Vec<String>>, StoreError> {
		let mut tables = self.tables.write().await;

		if tables.albums.remove(&id).is_none() {
			return Ok(None);
		}

		let mut images = Vec::new();
		tables.photos.retain(|_, photo| {
			if photo.album_id == Some(id) {
				images.push(photo.image.clone());
				false
			} else {
				true
			}
		});

		Ok(Some(images))
	}

	async fn album_photo_counts(&self, ids: &[Ulid]) -> Result<HashMap<Ulid, u64>, StoreError> {
		let tables = self.tables.read().await;

		let mut counts = ids.iter().map(|id| (*id, 0)).collect::<HashMap<_, _>>();
		for album_id in tables.photos.values().filter_map(|p| p.album_id) {
			if let Some(count) = counts.get_mut(&album_id) {
				*count += 1;
			}
		}

		Ok(counts)
	}

	async fn count_photos(&self, filter: &PhotoFilter) -> Result<u64, StoreError> {
		Ok(self.tables.read().await.photos.values().filter(|p| filter.matches(p)).count() as u64)
	}

	async fn list_photos(&self, filter: &PhotoFilter, bounds: Bounds) -> Result<Vec<Photo>, StoreError> {
		let tables = self.tables.read().await;

		let mut photos = tables.photos.values().filter(|p| filter.matches(p)).collect::<Vec<_>>();
		photos.sort_by_key(|p| Reverse((p.uploaded_at, p.id)));

		Ok(bounds.apply(photos.into_iter().cloned()))
	}

	async fn photo_by_id(&self, id: Ulid) -> Result<Option<Photo>, StoreError> {
		Ok(self.tables.read().await.photos.get(&id).cloned())
	}

	async fn insert_photo(&self, photo: &Photo) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if !tables.users.contains_key(&photo.owner_id) {
			return Err(StoreError::NotFound);
		}

		tables.check_album_owner(photo)?;
		tables.photos.insert(photo.id, photo.clone());
		Ok(())
	}

	async fn update_photo(&self, photo: &Photo) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		let owner_id = tables.photos.get(&photo.id).ok_or(StoreError::NotFound)?.owner_id;
		// the stored owner wins, an update never moves a photo to another user
		tables.check_album_owner(&Photo {
			owner_id,
			..photo.clone()
		})?;

		let existing = tables.photos.get_mut(&photo.id).ok_or(StoreError::NotFound)?;
		existing.title = photo.title.clone();
		existing.description = photo.description.clone();
		existing.image = photo.image.clone();
		existing.album_id = photo.album_id;
		existing.is_public = photo.is_public;
		existing.updated_at = photo.updated_at;

		Ok(())
	}

	async fn delete_photo(&self, id: Ulid) -> Result<Option<Photo>, StoreError> {
		Ok(self.tables.write().await.photos.remove(&id))
	}
}
