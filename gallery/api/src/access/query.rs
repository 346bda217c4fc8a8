use std::collections::HashSet;

use ulid::Ulid;
use utils::database::QueryBuilder;

use super::policy::{can_mutate, can_view, Owned, Viewer};
use crate::database::{Album, Photo};
use crate::store::{Bounds, Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
	/// Missing, or hidden from the viewer. The two are never told apart.
	#[error("not found")]
	NotFound,
	/// Visible to the actor but owned by someone else.
	#[error("forbidden")]
	Forbidden,
	#[error("store: {0}")]
	Store(#[from] StoreError),
}

/// The row filter a listing applies for a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
	Public,
	PublicOrOwnedBy(Ulid),
	OwnedBy(Ulid),
}

impl Visibility {
	pub fn for_viewer(viewer: &Viewer) -> Self {
		match viewer.id() {
			Some(id) => Visibility::PublicOrOwnedBy(id),
			None => Visibility::Public,
		}
	}

	pub fn matches(&self, entity: &impl Owned) -> bool {
		match self {
			Visibility::Public => entity.is_public(),
			Visibility::PublicOrOwnedBy(id) => entity.is_public() || entity.owner_id() == *id,
			Visibility::OwnedBy(id) => entity.owner_id() == *id,
		}
	}

	pub fn push_sql(&self, qb: &mut QueryBuilder<'_>) {
		match self {
			Visibility::Public => {
				qb.push("is_public = TRUE");
			}
			Visibility::PublicOrOwnedBy(id) => {
				qb.push("(is_public = TRUE OR owner_id = ").push_bind(*id).push(")");
			}
			Visibility::OwnedBy(id) => {
				qb.push("owner_id = ").push_bind(*id);
			}
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlbumFilter {
	pub visibility: Visibility,
	pub id: Option<Ulid>,
}

impl AlbumFilter {
	pub fn new(visibility: Visibility) -> Self {
		Self { visibility, id: None }
	}

	pub fn with_id(mut self, id: Ulid) -> Self {
		self.id = Some(id);
		self
	}

	pub fn matches(&self, album: &Album) -> bool {
		self.visibility.matches(album) && self.id.map_or(true, |id| album.id == id)
	}

	/// Renders the filter as a `WHERE` clause.
	pub fn push_sql(&self, qb: &mut QueryBuilder<'_>) {
		qb.push(" WHERE ");
		self.visibility.push_sql(qb);

		if let Some(id) = self.id {
			qb.push(" AND id = ").push_bind(id);
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoFilter {
	pub visibility: Visibility,
	pub id: Option<Ulid>,
	pub album_id: Option<Ulid>,
}

impl PhotoFilter {
	pub fn new(visibility: Visibility) -> Self {
		Self {
			visibility,
			id: None,
			album_id: None,
		}
	}

	pub fn with_id(mut self, id: Ulid) -> Self {
		self.id = Some(id);
		self
	}

	pub fn in_album(mut self, album_id: Ulid) -> Self {
		self.album_id = Some(album_id);
		self
	}

	pub fn matches(&self, photo: &Photo) -> bool {
		self.visibility.matches(photo)
			&& self.id.map_or(true, |id| photo.id == id)
			&& self.album_id.map_or(true, |id| photo.album_id == Some(id))
	}

	/// Renders the filter as a `WHERE` clause.
	pub fn push_sql(&self, qb: &mut QueryBuilder<'_>) {
		qb.push(" WHERE ");
		self.visibility.push_sql(qb);

		if let Some(id) = self.id {
			qb.push(" AND id = ").push_bind(id);
		}

		if let Some(album_id) = self.album_id {
			qb.push(" AND album_id = ").push_bind(album_id);
		}
	}
}

pub async fn visible_albums(store: &impl Store, viewer: &Viewer, bounds: Bounds) -> Result<Vec<Album>, AccessError> {
	Ok(store
		.list_albums(&AlbumFilter::new(Visibility::for_viewer(viewer)), bounds)
		.await?)
}

pub async fn count_visible_albums(store: &impl Store, viewer: &Viewer) -> Result<u64, AccessError> {
	Ok(store
		.count_albums(&AlbumFilter::new(Visibility::for_viewer(viewer)))
		.await?)
}

pub async fn visible_photos(store: &impl Store, viewer: &Viewer, bounds: Bounds) -> Result<Vec<Photo>, AccessError> {
	Ok(store
		.list_photos(&PhotoFilter::new(Visibility::for_viewer(viewer)), bounds)
		.await?)
}

pub async fn count_visible_photos(store: &impl Store, viewer: &Viewer) -> Result<u64, AccessError> {
	Ok(store
		.count_photos(&PhotoFilter::new(Visibility::for_viewer(viewer)))
		.await?)
}

/// The listing filter narrowed to `id`.
pub async fn get_visible_album(store: &impl Store, viewer: &Viewer, id: Ulid) -> Result<Album, AccessError> {
	let filter = AlbumFilter::new(Visibility::for_viewer(viewer)).with_id(id);

	store
		.list_albums(&filter, Bounds::first())
		.await?
		.into_iter()
		.next()
		.ok_or(AccessError::NotFound)
}

/// The listing filter narrowed to `id`.
pub async fn get_visible_photo(store: &impl Store, viewer: &Viewer, id: Ulid) -> Result<Photo, AccessError> {
	let filter = PhotoFilter::new(Visibility::for_viewer(viewer)).with_id(id);

	store
		.list_photos(&filter, Bounds::first())
		.await?
		.into_iter()
		.next()
		.ok_or(AccessError::NotFound)
}

/// The subset of `ids` naming albums the viewer may open.
pub async fn visible_album_ids(
	store: &impl Store,
	viewer: &Viewer,
	ids: impl IntoIterator<Item = Ulid>,
) -> Result<HashSet<Ulid>, AccessError> {
	let mut visible = HashSet::new();

	for id in ids.into_iter().collect::<HashSet<_>>() {
		match get_visible_album(store, viewer, id).await {
			Ok(_) => {
				visible.insert(id);
			}
			Err(AccessError::NotFound) => {}
			Err(err) => return Err(err),
		}
	}

	Ok(visible)
}

/// Photos of an album that the viewer may see. Private photos in a public
/// album stay hidden from everyone but their owner.
pub async fn album_photos(store: &impl Store, viewer: &Viewer, album_id: Ulid) -> Result<Vec<Photo>, AccessError> {
	let filter = PhotoFilter::new(Visibility::for_viewer(viewer)).in_album(album_id);

	Ok(store.list_photos(&filter, Bounds::all()).await?)
}

pub async fn owned_albums(store: &impl Store, owner_id: Ulid) -> Result<Vec<Album>, AccessError> {
	Ok(store
		.list_albums(&AlbumFilter::new(Visibility::OwnedBy(owner_id)), Bounds::all())
		.await?)
}

pub async fn owned_photos(store: &impl Store, owner_id: Ulid) -> Result<Vec<Photo>, AccessError> {
	Ok(store
		.list_photos(&PhotoFilter::new(Visibility::OwnedBy(owner_id)), Bounds::all())
		.await?)
}

fn guard<T: Owned>(actor: &Viewer, entity: Option<T>) -> Result<T, AccessError> {
	match entity {
		Some(entity) if can_mutate(actor, &entity) => Ok(entity),
		Some(entity) if can_view(actor, &entity) => Err(AccessError::Forbidden),
		_ => Err(AccessError::NotFound),
	}
}

/// Loads an album the actor may update or delete.
pub async fn get_mutable_album(store: &impl Store, actor: &Viewer, id: Ulid) -> Result<Album, AccessError> {
	guard(actor, store.album_by_id(id).await?)
}

/// Loads a photo the actor may update or delete.
pub async fn get_mutable_photo(store: &impl Store, actor: &Viewer, id: Ulid) -> Result<Photo, AccessError> {
	guard(actor, store.photo_by_id(id).await?)
}
