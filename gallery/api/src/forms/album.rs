use chrono::Utc;
use ulid::Ulid;

use super::{checkbox, optional_text, required_text, FieldErrors, FormData, TITLE_MAX_LENGTH};
use crate::database::Album;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumForm {
	pub title: String,
	pub description: String,
	pub is_public: bool,
}

impl AlbumForm {
	pub const FIELDS: [&'static str; 3] = ["title", "description", "is_public"];

	pub fn parse(data: &FormData) -> Result<Self, FieldErrors> {
		let mut errors = FieldErrors::default();

		let title = required_text(data, "title", TITLE_MAX_LENGTH, &mut errors);
		let description = optional_text(data, "description");
		let is_public = checkbox(data, "is_public");

		errors.into_result(|| Self {
			title,
			description,
			is_public,
		})
	}

	/// A new album owned by `owner_id`, whatever the submission said.
	pub fn create(self, owner_id: Ulid) -> Album {
		Album::new(owner_id, self.title, self.description, self.is_public)
	}

	/// Applies the submitted attributes, the owner is left untouched.
	pub fn apply(self, album: &mut Album) {
		album.title = self.title;
		album.description = self.description;
		album.is_public = self.is_public;
		album.updated_at = Utc::now();
	}
}
