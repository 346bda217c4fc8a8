use std::collections::HashMap;
use std::future::Future;

use ulid::Ulid;

pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;
use crate::access::{AlbumFilter, PhotoFilter};
use crate::database::{Album, Photo, Session, User};

pub mod memory;
pub mod postgres;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("pool: {0}")]
	Pool(#[from] utils::database::deadpool_postgres::PoolError),
	#[error("postgres: {0}")]
	Postgres(#[from] utils::database::tokio_postgres::Error),
	#[error("username already taken")]
	UsernameTaken,
	#[error("album belongs to another owner")]
	AlbumOwnerMismatch,
	#[error("record not found")]
	NotFound,
}

/// An offset and an optional limit over a newest first listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
	pub offset: u64,
	pub limit: Option<u64>,
}

impl Bounds {
	pub fn new(offset: u64, limit: u64) -> Self {
		Self {
			offset,
			limit: Some(limit),
		}
	}

	pub fn all() -> Self {
		Self { offset: 0, limit: None }
	}

	pub fn first() -> Self {
		Self::new(0, 1)
	}

	pub fn apply<T>(&self, items: impl Iterator<Item = T>) -> Vec<T> {
		let items = items.skip(self.offset as usize);
		match self.limit {
			Some(limit) => items.take(limit as usize).collect(),
			None => items.collect(),
		}
	}
}

/// Persistence for users, sessions, albums and photos.
///
/// Listings are ordered newest first with ties broken by id, both
/// descending. Owners are never changed by an update.
pub trait Store: Send + Sync {
	fn create_user(&self, user: &User) -> impl Future<Output = Result<(), StoreError>> + Send;

	fn user_by_id(&self, id: Ulid) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

	fn user_by_username(&self, username: &str) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

	fn users_by_ids(&self, ids: &[Ulid]) -> impl Future<Output = Result<HashMap<Ulid, User>, StoreError>> + Send;

	fn create_session(&self, session: &Session) -> impl Future<Output = Result<(), StoreError>> + Send;

	fn session_by_id(&self, id: Ulid) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

	/// Expires the session immediately.
	fn invalidate_session(&self, id: Ulid) -> impl Future<Output = Result<(), StoreError>> + Send;

	fn count_albums(&self, filter: &AlbumFilter) -> impl Future<Output = Result<u64, StoreError>> + Send;

	fn list_albums(
		&self,
		filter: &AlbumFilter,
		bounds: Bounds,
	) -> impl Future<Output = Result<Vec<Album>, StoreError>> + Send;

	/// Unfiltered lookup, callers apply the access rules.
	fn album_by_id(&self, id: Ulid) -> impl Future<Output = Result<Option<Album>, StoreError>> + Send;

	fn insert_album(&self, album: &Album) -> impl Future<Output = Result<(), StoreError>> + Send;

	fn update_album(&self, album: &Album) -> impl Future<Output = Result<(), StoreError>> + Send;

	/// Deletes the album and its photos, returning the image paths of the
	/// removed photos. `None` when the album did not exist.
	fn delete_album(&self, id: Ulid) -> impl Future<Output = Result<Option<Vec<String>>, StoreError>> + Send;

	fn album_photo_counts(&self, ids: &[Ulid]) -> impl Future<Output = Result<HashMap<Ulid, u64>, StoreError>> + Send;

	fn count_photos(&self, filter: &PhotoFilter) -> impl Future<Output = Result<u64, StoreError>> + Send;

	fn list_photos(
		&self,
		filter: &PhotoFilter,
		bounds: Bounds,
	) -> impl Future<Output = Result<Vec<Photo>, StoreError>> + Send;

	/// Unfiltered lookup, callers apply the access rules.
	fn photo_by_id(&self, id: Ulid) -> impl Future<Output = Result<Option<Photo>, StoreError>> + Send;

	fn insert_photo(&self, photo: &Photo) -> impl Future<Output = Result<(), StoreError>> + Send;

	fn update_photo(&self, photo: &Photo) -> impl Future<Output = Result<(), StoreError>> + Send;

	fn delete_photo(&self, id: Ulid) -> impl Future<Output = Result<Option<Photo>, StoreError>> + Send;
}

#[derive(Debug)]
pub enum AnyStore {
	Postgres(PgStore),
	Memory(MemoryStore),
}

macro_rules! dispatch {
	($self:ident, $store:ident => $call:expr) => {
		match $self {
			AnyStore::Postgres($store) => $call.await,
			AnyStore::Memory($store) => $call.await,
		}
	};
}

impl Store for AnyStore {
	async fn create_user(&self, user: &User) -> Result<(), StoreError> {
		dispatch!(self, store => store.create_user(user))
	}

	async fn user_by_id(&self, id: Ulid) -> Result<Option<User>, StoreError> {
		dispatch!(self, store => store.user_by_id(id))
	}

	async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
		dispatch!(self, store => store.user_by_username(username))
	}

	async fn users_by_ids(&self, ids: &[Ulid]) -> Result<HashMap<Ulid, User>, StoreError> {
		dispatch!(self, store => store.users_by_ids(ids))
	}

	async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
		dispatch!(self, store => store.create_session(session))
	}

	async fn session_by_id(&self, id: Ulid) -> Result<Option<Session>, StoreError> {
		dispatch!(self, store => store.session_by_id(id))
	}

	async fn invalidate_session(&self, id: Ulid) -> Result<(), StoreError> {
		dispatch!(self, store => store.invalidate_session(id))
	}

	async fn count_albums(&self, filter: &AlbumFilter) -> Result<u64, StoreError> {
		dispatch!(self, store => store.count_albums(filter))
	}

	async fn list_albums(&self, filter: &AlbumFilter, bounds: Bounds) -> Result<Vec<Album>, StoreError> {
		dispatch!(self, store => store.list_albums(filter, bounds))
	}

	async fn album_by_id(&self, id: Ulid) -> Result<Option<Album>, StoreError> {
		dispatch!(self, store => store.album_by_id(id))
	}

	async fn insert_album(&self, album: &Album) -> Result<(), StoreError> {
		dispatch!(self, store => store.insert_album(album))
	}

	async fn update_album(&self, album: &Album) -> Result<(), StoreError> {
		dispatch!(self, store => store.update_album(album))
	}

	async fn delete_album(&self, id: Ulid) -> Result<Option<Vec<String>>, StoreError> {
		dispatch!(self, store => store.delete_album(id))
	}

	async fn album_photo_counts(&self, ids: &[Ulid]) -> Result<HashMap<Ulid, u64>, StoreError> {
		dispatch!(self, store => store.album_photo_counts(ids))
	}

	async fn count_photos(&self, filter: &PhotoFilter) -> Result<u64, StoreError> {
		dispatch!(self, store => store.count_photos(filter))
	}

	async fn list_photos(&self, filter: &PhotoFilter, bounds: Bounds) -> Result<Vec<Photo>, StoreError> {
		dispatch!(self, store => store.list_photos(filter, bounds))
	}

	async fn photo_by_id(&self, id: Ulid) -> Result<Option<Photo>, StoreError> {
		dispatch!(self, store => store.photo_by_id(id))
	}

	async fn insert_photo(&self, photo: &Photo) -> Result<(), StoreError> {
		dispatch!(self, store => store.insert_photo(photo))
	}

	async fn update_photo(&self, photo: &Photo) -> Result<(), StoreError> {
		dispatch!(self, store => store.update_photo(photo))
	}

	async fn delete_photo(&self, id: Ulid) -> Result<Option<Photo>, StoreError> {
		dispatch!(self, store => store.delete_photo(id))
	}
}
