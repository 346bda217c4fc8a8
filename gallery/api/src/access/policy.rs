use ulid::Ulid;

use crate::database::{Album, Photo, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
	pub id: Ulid,
	pub is_superuser: bool,
}

/// The party a request acts for, used both for reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Viewer {
	#[default]
	Anonymous,
	Authenticated(Principal),
}

impl Viewer {
	pub fn principal(&self) -> Option<&Principal> {
		match self {
			Viewer::Anonymous => None,
			Viewer::Authenticated(principal) => Some(principal),
		}
	}

	pub fn id(&self) -> Option<Ulid> {
		self.principal().map(|p| p.id)
	}

	pub fn is_authenticated(&self) -> bool {
		matches!(self, Viewer::Authenticated(_))
	}
}

impl From<&User> for Viewer {
	fn from(user: &User) -> Self {
		Viewer::Authenticated(Principal {
			id: user.id,
			is_superuser: user.is_superuser,
		})
	}
}

pub trait Owned {
	fn owner_id(&self) -> Ulid;

	fn is_public(&self) -> bool;
}

impl Owned for Album {
	fn owner_id(&self) -> Ulid {
		self.owner_id
	}

	fn is_public(&self) -> bool {
		self.is_public
	}
}

impl Owned for Photo {
	fn owner_id(&self) -> Ulid {
		self.owner_id
	}

	fn is_public(&self) -> bool {
		self.is_public
	}
}

/// Public entities are visible to everyone, private ones only to their owner.
pub fn can_view(viewer: &Viewer, entity: &impl Owned) -> bool {
	entity.is_public() || viewer.id() == Some(entity.owner_id())
}

/// Only the owner or a superuser may update or delete an entity.
pub fn can_mutate(actor: &Viewer, entity: &impl Owned) -> bool {
	match actor {
		Viewer::Anonymous => false,
		Viewer::Authenticated(principal) => principal.is_superuser || principal.id == entity.owner_id(),
	}
}
