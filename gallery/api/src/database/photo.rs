use chrono::{DateTime, Utc};
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, postgres_from_row::FromRow)]
pub struct Photo {
	pub id: Ulid,
	pub title: String,
	pub description: String,
	/// Drive path of the image, eg. `photos/2024/03/01/<ulid>.jpg`.
	pub image: String,
	/// Always an album of the same owner.
	pub album_id: Option<Ulid>,
	pub owner_id: Ulid,
	pub is_public: bool,
	pub uploaded_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}
