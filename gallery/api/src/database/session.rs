use chrono::{DateTime, Duration, Utc};
use ulid::Ulid;

#[derive(Debug, Clone, postgres_from_row::FromRow)]
pub struct Session {
	/// The unique identifier for the session.
	pub id: Ulid,
	/// Foreign key to the user table.
	pub user_id: Ulid,
	/// The time the session expires, or was invalidated.
	pub expires_at: DateTime<Utc>,
	/// The time the session was created.
	pub created_at: DateTime<Utc>,
}

impl Session {
	pub fn new(user_id: Ulid, ttl: Duration) -> Self {
		let now = Utc::now();
		Self {
			id: Ulid::new(),
			user_id,
			expires_at: now + ttl,
			created_at: now,
		}
	}

	pub fn is_valid(&self) -> bool {
		self.expires_at > Utc::now()
	}
}
