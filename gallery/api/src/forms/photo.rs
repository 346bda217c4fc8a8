use bytes::Bytes;
use chrono::{DateTime, Utc};
use file_format::{FileFormat, Kind};
use ulid::Ulid;

use super::{
	checkbox, optional_text, required_text, FieldErrors, FormData, EMPTY_FILE, INVALID_CHOICE, INVALID_IMAGE, REQUIRED,
	TITLE_MAX_LENGTH,
};
use crate::database::{Album, Photo};

/// Uploaded bytes that sniffed as a raster image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidImage {
	pub data: Bytes,
	pub extension: String,
}

impl ValidImage {
	pub fn sniff(data: Bytes) -> Option<Self> {
		let format = FileFormat::from_bytes(&data);

		if format.kind() != Kind::Image || format == FileFormat::ScalableVectorGraphics {
			return None;
		}

		Some(Self {
			extension: format.extension().to_string(),
			data,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoForm {
	pub title: String,
	pub description: String,
	pub is_public: bool,
	pub album_id: Option<Ulid>,
	/// `None` on an update keeps the current image.
	pub image: Option<ValidImage>,
}

impl PhotoForm {
	pub const FIELDS: [&'static str; 5] = ["title", "description", "image", "album", "is_public"];

	/// `choices` are the albums of the photo's owner, the only albums a
	/// photo may be filed under.
	pub fn parse(data: &FormData, choices: &[Album], image_required: bool) -> Result<Self, FieldErrors> {
		let mut errors = FieldErrors::default();

		let title = required_text(data, "title", TITLE_MAX_LENGTH, &mut errors);
		let description = optional_text(data, "description");
		let is_public = checkbox(data, "is_public");

		let album_id = match data.get("album").map(str::trim).unwrap_or_default() {
			"" => None,
			value => {
				let choice = value
					.parse::<Ulid>()
					.ok()
					.filter(|id| choices.iter().any(|album| album.id == *id));

				if choice.is_none() {
					errors.add("album", INVALID_CHOICE);
				}

				choice
			}
		};

		let image = match data.file("image") {
			Some(file) if file.is_empty() => {
				errors.add("image", EMPTY_FILE);
				None
			}
			Some(file) => {
				let image = ValidImage::sniff(file.clone());
				if image.is_none() {
					errors.add("image", INVALID_IMAGE);
				}

				image
			}
			None => {
				if image_required {
					errors.add("image", REQUIRED);
				}

				None
			}
		};

		errors.into_result(|| Self {
			title,
			description,
			is_public,
			album_id,
			image,
		})
	}

	/// A new photo owned by `owner_id`, stored at `image_path`.
	pub fn create(self, id: Ulid, owner_id: Ulid, image_path: String, now: DateTime<Utc>) -> Photo {
		Photo {
			id,
			title: self.title,
			description: self.description,
			image: image_path,
			album_id: self.album_id,
			owner_id,
			is_public: self.is_public,
			uploaded_at: now,
			updated_at: now,
		}
	}

	/// Applies the submitted attributes, the owner is left untouched. The
	/// image path is replaced only when a new one is given.
	pub fn apply(self, photo: &mut Photo, image_path: Option<String>) {
		photo.title = self.title;
		photo.description = self.description;
		photo.is_public = self.is_public;
		photo.album_id = self.album_id;
		if let Some(image_path) = image_path {
			photo.image = image_path;
		}
		photo.updated_at = Utc::now();
	}
}
