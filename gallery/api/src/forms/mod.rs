//! Validation of submitted album and photo attributes.
//!
//! Every field is checked before anything is returned so a failed
//! submission reports all of its problems at once.

use std::collections::BTreeMap;

mod album;
mod data;
mod photo;

pub use album::AlbumForm;
pub use data::{FormData, FormError};
pub use photo::{PhotoForm, ValidImage};

pub const TITLE_MAX_LENGTH: usize = 200;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
	"Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";

/// Messages per field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
	pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
		self.0.entry(field).or_default().push(message.into());
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, field: &str) -> Option<&[String]> {
		self.0.get(field).map(Vec::as_slice)
	}

	pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
		if self.is_empty() {
			Ok(value())
		} else {
			Err(self)
		}
	}
}

impl std::fmt::Display for FieldErrors {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let fields = self.0.keys().copied().collect::<Vec<_>>();
		write!(f, "invalid fields: {}", fields.join(", "))
	}
}

impl std::error::Error for FieldErrors {}

/// Trimmed text of a required field of bounded length.
fn required_text(data: &FormData, field: &'static str, max_length: usize, errors: &mut FieldErrors) -> String {
	let value = data.get(field).map(str::trim).unwrap_or_default();

	if value.is_empty() {
		errors.add(field, REQUIRED);
	} else {
		let length = value.chars().count();
		if length > max_length {
			errors.add(
				field,
				format!("Ensure this value has at most {max_length} characters (it has {length})."),
			);
		}
	}

	value.to_string()
}

fn optional_text(data: &FormData, field: &str) -> String {
	data.get(field).map(str::trim).unwrap_or_default().to_string()
}

/// A checkbox is ticked when it is present with any value but an explicit
/// false.
fn checkbox(data: &FormData, field: &str) -> bool {
	data.get(field)
		.map(|value| !matches!(value.trim().to_ascii_lowercase().as_str(), "false" | "0" | "off"))
		.unwrap_or(false)
}
