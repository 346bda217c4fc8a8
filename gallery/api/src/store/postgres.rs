use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use anyhow::Context as _;
use rustls::RootCertStore;
use ulid::Ulid;
use utils::database::deadpool_postgres::{Manager, ManagerConfig, PoolConfig, RecyclingMethod, Runtime};
use utils::database::tokio_postgres::error::SqlState;
use utils::database::tokio_postgres::NoTls;
use utils::database::{query, Pool, QueryBuilder};

use super::{Bounds, Store, StoreError};
use crate::access::{AlbumFilter, PhotoFilter};
use crate::config::DatabaseConfig;
use crate::database::{Album, Photo, Session, User};

const MIGRATIONS: &[(&str, &str)] = &[("0001_init", include_str!("../../../../migrations/0001_init.sql"))];

pub struct PgStore {
	pool: Arc<Pool>,
}

impl std::fmt::Debug for PgStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PgStore").field("status", &self.pool.status()).finish()
	}
}

fn map_db_error(err: utils::database::tokio_postgres::Error) -> StoreError {
	match err.as_db_error() {
		Some(db) if *db.code() == SqlState::UNIQUE_VIOLATION && db.constraint() == Some("users_username_key") => {
			StoreError::UsernameTaken
		}
		Some(db)
			if *db.code() == SqlState::FOREIGN_KEY_VIOLATION && db.constraint() == Some("photos_album_owner_fkey") =>
		{
			StoreError::AlbumOwnerMismatch
		}
		Some(db) if *db.code() == SqlState::FOREIGN_KEY_VIOLATION => StoreError::NotFound,
		_ => StoreError::Postgres(err),
	}
}

fn push_bounds(qb: &mut QueryBuilder<'_>, bounds: Bounds) {
	if let Some(limit) = bounds.limit {
		qb.push(" LIMIT ").push_bind(limit as i64);
	}

	if bounds.offset > 0 {
		qb.push(" OFFSET ").push_bind(bounds.offset as i64);
	}
}

impl PgStore {
	pub fn new(pool: Arc<Pool>) -> Self {
		Self { pool }
	}

	pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
		let mut pg_config = config
			.uri
			.parse::<utils::database::tokio_postgres::Config>()
			.context("invalid database uri")?;

		pg_config.ssl_mode(if config.tls.is_some() {
			utils::database::tokio_postgres::config::SslMode::Require
		} else {
			utils::database::tokio_postgres::config::SslMode::Disable
		});

		let manager_config = ManagerConfig {
			recycling_method: RecyclingMethod::Fast,
		};

		let manager = if let Some(tls) = &config.tls {
			let cert = tokio::fs::read(&tls.cert).await.context("failed to read database client cert")?;
			let key = tokio::fs::read(&tls.key)
				.await
				.context("failed to read database client private key")?;

			let key = rustls_pemfile::pkcs8_private_keys(&mut io::BufReader::new(io::Cursor::new(key)))
				.next()
				.ok_or_else(|| anyhow::anyhow!("failed to find private key in database client private key file"))??
				.into();

			let certs = rustls_pemfile::certs(&mut io::BufReader::new(io::Cursor::new(cert))).collect::<Result<Vec<_>, _>>()?;

			let mut cert_store = RootCertStore::empty();
			if let Some(ca_cert) = &tls.ca_cert {
				let ca_cert = tokio::fs::read(ca_cert).await.context("failed to read database ca cert")?;
				let ca_certs =
					rustls_pemfile::certs(&mut io::BufReader::new(io::Cursor::new(ca_cert))).collect::<Result<Vec<_>, _>>()?;
				for cert in ca_certs {
					cert_store.add(cert).context("failed to add database ca cert")?;
				}
			}

			let tls = rustls::ClientConfig::builder()
				.with_root_certificates(cert_store)
				.with_client_auth_cert(certs, key)
				.context("failed to create database tls config")?;

			Manager::from_config(pg_config, tokio_postgres_rustls::MakeRustlsConnect::new(tls), manager_config)
		} else {
			Manager::from_config(pg_config, NoTls, manager_config)
		};

		let pool = Pool::builder(manager)
			.config(PoolConfig::default())
			.runtime(Runtime::Tokio1)
			.build()
			.context("failed to create database pool")?;

		Ok(Self::new(Arc::new(pool)))
	}

	/// Applies every bundled migration that has not been applied yet.
	pub async fn migrate(&self) -> anyhow::Result<()> {
		let mut client = self.pool.get().await.context("failed to get database connection")?;

		client
			.batch_execute(
				"CREATE TABLE IF NOT EXISTS gallery_migrations (name TEXT PRIMARY KEY, applied_at TIMESTAMPTZ NOT NULL \
				 DEFAULT NOW())",
			)
			.await
			.context("failed to create migrations table")?;

		for (name, sql) in MIGRATIONS {
			let tx = client.transaction().await.context("failed to start transaction")?;

			let applied = tx
				.query_opt("SELECT name FROM gallery_migrations WHERE name = $1", &[name])
				.await
				.context("failed to read migrations table")?
				.is_some();

			if applied {
				tracing::debug!(name, "migration already applied");
				continue;
			}

			tracing::info!(name, "applying migration");

			tx.batch_execute(sql)
				.await
				.with_context(|| format!("failed to apply migration {name}"))?;
			tx.execute("INSERT INTO gallery_migrations (name) VALUES ($1)", &[name])
				.await
				.context("failed to record migration")?;
			tx.commit().await.context("failed to commit migration")?;
		}

		Ok(())
	}
}

impl Store for PgStore {
	#[tracing::instrument(skip_all, fields(username = %user.username), err)]
	async fn create_user(&self, user: &User) -> Result<(), StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("INSERT INTO users (id, username, password_hash, is_superuser, created_at) VALUES ($1, $2, $3, $4, $5)");
		qb.bind(user.id)
			.bind(user.username.clone())
			.bind(user.password_hash.clone())
			.bind(user.is_superuser)
			.bind(user.created_at);

		qb.execute(&client).await.map_err(map_db_error)?;
		Ok(())
	}

	async fn user_by_id(&self, id: Ulid) -> Result<Option<User>, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("SELECT * FROM users WHERE id = $1");
		qb.bind(id);

		Ok(qb.fetch_optional(&client).await?)
	}

	async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("SELECT * FROM users WHERE username = $1");
		qb.bind(username.to_string());

		Ok(qb.fetch_optional(&client).await?)
	}

	async fn users_by_ids(&self, ids: &[Ulid]) -> Result<HashMap<Ulid, User>, StoreError> {
		if ids.is_empty() {
			return Ok(HashMap::new());
		}

		let client = self.pool.get().await?;

		let mut qb = query("SELECT * FROM users WHERE id = ANY($1)");
		qb.bind(ids.to_vec());

		Ok(qb
			.fetch_all::<User>(&client)
			.await?
			.into_iter()
			.map(|u| (u.id, u))
			.collect())
	}

	#[tracing::instrument(skip_all, fields(user_id = %session.user_id), err)]
	async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4)");
		qb.bind(session.id)
			.bind(session.user_id)
			.bind(session.expires_at)
			.bind(session.created_at);

		qb.execute(&client).await.map_err(map_db_error)?;
		Ok(())
	}

	async fn session_by_id(&self, id: Ulid) -> Result<Option<Session>, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("SELECT * FROM sessions WHERE id = $1");
		qb.bind(id);

		Ok(qb.fetch_optional(&client).await?)
	}

	#[tracing::instrument(skip(self), err)]
	async fn invalidate_session(&self, id: Ulid) -> Result<(), StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("UPDATE sessions SET expires_at = NOW() WHERE id = $1");
		qb.bind(id);

		qb.execute(&client).await?;
		Ok(())
	}

	async fn count_albums(&self, filter: &AlbumFilter) -> Result<u64, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("SELECT COUNT(*) FROM albums");
		filter.push_sql(&mut qb);

		Ok(qb.fetch_scalar::<i64>(&client).await? as u64)
	}

	async fn list_albums(&self, filter: &AlbumFilter, bounds: Bounds) -> Result<Vec<Album>, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("SELECT * FROM albums");
		filter.push_sql(&mut qb);
		qb.push(" ORDER BY created_at DESC, id DESC");
		push_bounds(&mut qb, bounds);

		Ok(qb.fetch_all(&client).await?)
	}

	async fn album_by_id(&self, id: Ulid) -> Result<Option<Album>, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("SELECT * FROM albums WHERE id = $1");
		qb.bind(id);

		Ok(qb.fetch_optional(&client).await?)
	}

	#[tracing::instrument(skip_all, fields(id = %album.id), err)]
	async fn insert_album(&self, album: &Album) -> Result<(), StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query(
			"INSERT INTO albums (id, title, description, owner_id, is_public, created_at, updated_at) VALUES ($1, $2, \
			 $3, $4, $5, $6, $7)",
		);
		qb.bind(album.id)
			.bind(album.title.clone())
			.bind(album.description.clone())
			.bind(album.owner_id)
			.bind(album.is_public)
			.bind(album.created_at)
			.bind(album.updated_at);

		qb.execute(&client).await.map_err(map_db_error)?;
		Ok(())
	}

	#[tracing::instrument(skip_all, fields(id = %album.id), err)]
	async fn update_album(&self, album: &Album) -> Result<(), StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("UPDATE albums SET title = $2, description = $3, is_public = $4, updated_at = $5 WHERE id = $1");
		qb.bind(album.id)
			.bind(album.title.clone())
			.bind(album.description.clone())
			.bind(album.is_public)
			.bind(album.updated_at);

		match qb.execute(&client).await.map_err(map_db_error)? {
			0 => Err(StoreError::NotFound),
			_ => Ok(()),
		}
	}

	#[tracing::instrument(skip(self), err)]
	async fn delete_album(&self, id: Ulid) -> Result<Option<Vec<String>>, StoreError> {
		let client = self.pool.get().await?;

		// photos go with the album through the foreign key cascade, their
		// images are read from the same snapshot
		let mut qb = query(
			"WITH removed AS (SELECT image FROM photos WHERE album_id = $1), deleted AS (DELETE FROM albums WHERE id = \
			 $1 RETURNING id) SELECT (SELECT COUNT(*) FROM deleted) AS deleted, ARRAY(SELECT image FROM removed) AS \
			 images",
		);
		qb.bind(id);

		let rows = qb.fetch_rows(&client).await?;
		let Some(row) = rows.first() else {
			return Ok(None);
		};

		if row.try_get::<_, i64>("deleted")? == 0 {
			return Ok(None);
		}

		Ok(Some(row.try_get("images")?))
	}

	async fn album_photo_counts(&self, ids: &[Ulid]) -> Result<HashMap<Ulid, u64>, StoreError> {
		let mut counts = ids.iter().map(|id| (*id, 0)).collect::<HashMap<_, _>>();
		if ids.is_empty() {
			return Ok(counts);
		}

		let client = self.pool.get().await?;

		let mut qb = query("SELECT album_id, COUNT(*) AS count FROM photos WHERE album_id = ANY($1) GROUP BY album_id");
		qb.bind(ids.to_vec());

		for row in qb.fetch_rows(&client).await? {
			counts.insert(row.try_get("album_id")?, row.try_get::<_, i64>("count")? as u64);
		}

		Ok(counts)
	}

	async fn count_photos(&self, filter: &PhotoFilter) -> Result<u64, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("SELECT COUNT(*) FROM photos");
		filter.push_sql(&mut qb);

		Ok(qb.fetch_scalar::<i64>(&client).await? as u64)
	}

	async fn list_photos(&self, filter: &PhotoFilter, bounds: Bounds) -> Result<Vec<Photo>, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("SELECT * FROM photos");
		filter.push_sql(&mut qb);
		qb.push(" ORDER BY uploaded_at DESC, id DESC");
		push_bounds(&mut qb, bounds);

		Ok(qb.fetch_all(&client).await?)
	}

	async fn photo_by_id(&self, id: Ulid) -> Result<Option<Photo>, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("SELECT * FROM photos WHERE id = $1");
		qb.bind(id);

		Ok(qb.fetch_optional(&client).await?)
	}

	#[tracing::instrument(skip_all, fields(id = %photo.id), err)]
	async fn insert_photo(&self, photo: &Photo) -> Result<(), StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query(
			"INSERT INTO photos (id, title, description, image, album_id, owner_id, is_public, uploaded_at, \
			 updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
		);
		qb.bind(photo.id)
			.bind(photo.title.clone())
			.bind(photo.description.clone())
			.bind(photo.image.clone())
			.bind(photo.album_id)
			.bind(photo.owner_id)
			.bind(photo.is_public)
			.bind(photo.uploaded_at)
			.bind(photo.updated_at);

		qb.execute(&client).await.map_err(map_db_error)?;
		Ok(())
	}

	#[tracing::instrument(skip_all, fields(id = %photo.id), err)]
	async fn update_photo(&self, photo: &Photo) -> Result<(), StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query(
			"UPDATE photos SET title = $2, description = $3, image = $4, album_id = $5, is_public = $6, updated_at = \
			 $7 WHERE id = $1",
		);
		qb.bind(photo.id)
			.bind(photo.title.clone())
			.bind(photo.description.clone())
			.bind(photo.image.clone())
			.bind(photo.album_id)
			.bind(photo.is_public)
			.bind(photo.updated_at);

		match qb.execute(&client).await.map_err(map_db_error)? {
			0 => Err(StoreError::NotFound),
			_ => Ok(()),
		}
	}

	#[tracing::instrument(skip(self), err)]
	async fn delete_photo(&self, id: Ulid) -> Result<Option<Photo>, StoreError> {
		let client = self.pool.get().await?;

		let mut qb = query("DELETE FROM photos WHERE id = $1 RETURNING *");
		qb.bind(id);

		Ok(qb.fetch_optional(&client).await?)
	}
}
