use chrono::{DateTime, Utc};
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, postgres_from_row::FromRow)]
pub struct Album {
	pub id: Ulid,
	pub title: String,
	pub description: String,
	/// Set on creation, never changes.
	pub owner_id: Ulid,
	pub is_public: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Album {
	pub fn new(owner_id: Ulid, title: String, description: String, is_public: bool) -> Self {
		let now = Utc::now();
		Self {
			id: Ulid::new(),
			title,
			description,
			owner_id,
			is_public,
			created_at: now,
			updated_at: now,
		}
	}
}
