use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context as _;
use utils::config::{ConfigBuilder, LoggingConfig, TlsConfig};

/// Environment variables with this prefix override the config file.
pub const ENV_PREFIX: &str = "GALLERY";

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
/// The gallery service: albums and photos, shared or kept private
pub struct AppConfig {
	/// The path to the config file
	pub config_file: Option<String>,

	/// Name of this instance
	pub name: String,

	/// The logging config
	pub logging: LoggingConfig,

	/// API Config
	pub api: ApiConfig,

	/// Database Config
	pub database: DatabaseConfig,

	/// JWT Config
	pub jwt: JwtConfig,

	/// Media storage config
	pub media: MediaConfig,

	/// Listing and navigation config
	pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ApiConfig {
	/// Bind address for the API
	pub bind_address: SocketAddr,

	/// If we should use TLS for the API server
	pub tls: Option<TlsConfig>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			bind_address: SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 0], 4000)),
			tls: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
	/// The database URL to use, `memory://` keeps everything in process
	pub uri: String,

	/// The TLS configuration for the database connection
	pub tls: Option<TlsConfig>,

	/// Apply the bundled migrations on start up
	pub auto_migrate: bool,
}

impl DatabaseConfig {
	pub const MEMORY_URI: &'static str = "memory://";

	pub fn is_memory(&self) -> bool {
		self.uri == Self::MEMORY_URI
	}
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			uri: "postgres://root@localhost:5432/gallery".to_string(),
			tls: None,
			auto_migrate: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct JwtConfig {
	/// JWT secret
	pub secret: String,

	/// JWT issuer
	pub issuer: String,

	/// How long a login session lasts, in seconds
	pub session_ttl: u64,
}

impl Default for JwtConfig {
	fn default() -> Self {
		Self {
			secret: "gallery".to_string(),
			issuer: "gallery".to_string(),
			session_ttl: 7 * 24 * 60 * 60,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct MediaConfig {
	/// Where uploaded images are stored
	pub drive: DriveConfig,

	/// The largest accepted image upload, in bytes
	pub max_upload_size: usize,
}

impl Default for MediaConfig {
	fn default() -> Self {
		Self {
			drive: DriveConfig::Local(LocalDriveConfig::default()),
			max_upload_size: 10 * 1024 * 1024,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DriveConfig {
	/// A directory on the local filesystem
	Local(LocalDriveConfig),
	/// Process memory, lost on restart
	Memory(MemoryDriveConfig),
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LocalDriveConfig {
	/// The root directory of the drive
	pub path: PathBuf,
}

impl Default for LocalDriveConfig {
	fn default() -> Self {
		Self {
			path: PathBuf::from("media"),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct MemoryDriveConfig {
	/// The maximum number of bytes held by the drive
	pub capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct GalleryConfig {
	/// Albums per page on the index
	pub album_page_size: usize,

	/// Photos per page on the photo listing
	pub photo_page_size: usize,

	/// Where anonymous users are sent when a page needs a login
	pub login_url: String,
}

impl Default for GalleryConfig {
	fn default() -> Self {
		Self {
			album_page_size: 12,
			photo_page_size: 20,
			login_url: "/accounts/login/".to_string(),
		}
	}
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			config_file: Some("config".to_string()),
			name: "gallery-api".to_string(),
			logging: LoggingConfig::default(),
			api: ApiConfig::default(),
			database: DatabaseConfig::default(),
			jwt: JwtConfig::default(),
			media: MediaConfig::default(),
			gallery: GalleryConfig::default(),
		}
	}
}

impl AppConfig {
	/// Loads defaults, then the config file, then `GALLERY_` environment
	/// variables. An explicitly requested config file must exist.
	pub fn parse(config_file: Option<&str>) -> anyhow::Result<Self> {
		let default_file = Self::default().config_file;
		let (file, required) = match config_file {
			Some(file) => (Some(file.to_string()), true),
			None => (default_file, false),
		};

		let mut builder = ConfigBuilder::new::<Self>().context("failed to serialize default config")?;
		if let Some(file) = &file {
			builder = builder
				.with_file(file, required)
				.with_context(|| format!("failed to load config file {file}"))?;
		}

		let (mut config, config_file) = builder
			.with_env(ENV_PREFIX)
			.build::<Self>()
			.context("failed to parse config")?;

		config.config_file = config_file;

		Ok(config)
	}
}
