use std::collections::HashMap;
use std::convert::Infallible;

use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
	#[error("unsupported content type: {0}")]
	UnsupportedContentType(String),
	#[error("multipart: {0}")]
	Multipart(#[from] multer::Error),
}

/// Text fields and files of a submitted form. The first value of a
/// repeated field wins.
#[derive(Debug, Clone, Default)]
pub struct FormData {
	fields: HashMap<String, String>,
	files: HashMap<String, Bytes>,
}

impl FormData {
	pub fn from_urlencoded(body: &[u8]) -> Self {
		let mut data = Self::default();

		for (key, value) in url::form_urlencoded::parse(body) {
			data.fields.entry(key.into_owned()).or_insert_with(|| value.into_owned());
		}

		data
	}

	/// Parses a `multipart/form-data` body. `max_field_size` bounds every
	/// part, files included.
	pub async fn from_multipart(body: Bytes, boundary: &str, max_field_size: u64) -> Result<Self, FormError> {
		let constraints =
			multer::Constraints::new().size_limit(multer::SizeLimit::new().per_field(max_field_size));
		let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(body) });
		let mut multipart = multer::Multipart::with_constraints(stream, boundary, constraints);

		let mut data = Self::default();

		while let Some(field) = multipart.next_field().await? {
			let Some(name) = field.name().map(str::to_owned) else {
				continue;
			};

			match field.file_name().map(str::is_empty) {
				Some(unnamed) => {
					let bytes = field.bytes().await?;

					// browsers send an unnamed empty part for an untouched file input
					if unnamed && bytes.is_empty() {
						continue;
					}

					data.files.entry(name).or_insert(bytes);
				}
				None => {
					let text = field.text().await?;
					data.fields.entry(name).or_insert(text);
				}
			}
		}

		Ok(data)
	}

	/// Picks the parser from a `Content-Type` header value.
	pub async fn parse(content_type: &str, body: Bytes, max_field_size: u64) -> Result<Self, FormError> {
		let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

		match mime.as_str() {
			"application/x-www-form-urlencoded" => Ok(Self::from_urlencoded(&body)),
			"multipart/form-data" => {
				let boundary = multer::parse_boundary(content_type)?;
				Self::from_multipart(body, &boundary, max_field_size).await
			}
			_ => Err(FormError::UnsupportedContentType(content_type.to_string())),
		}
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.fields.get(name).map(String::as_str)
	}

	pub fn file(&self, name: &str) -> Option<&Bytes> {
		self.files.get(name)
	}

	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.fields.insert(name.into(), value.into());
		self
	}

	pub fn with_file(mut self, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
		self.files.insert(name.into(), data.into());
		self
	}
}
