//! Layered configuration loading.
//!
//! Values are merged from the compiled defaults, an optional configuration
//! file (TOML, YAML or JSON), prefixed environment variables and explicit
//! overrides, in that order of increasing priority. The merged tree is then
//! deserialized into the target type, reporting the path of any key that
//! fails to parse.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::logging;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {path}: {source}")]
	Io { path: String, source: std::io::Error },
	#[error("config file not found: {0}")]
	NotFound(String),
	#[error("unsupported config file format: {0}")]
	UnsupportedFormat(String),
	#[error("failed to parse toml: {0}")]
	Toml(#[from] toml::de::Error),
	#[error("failed to parse yaml: {0}")]
	Yaml(#[from] serde_yaml::Error),
	#[error("failed to parse json: {0}")]
	Json(#[from] serde_json::Error),
	#[error("invalid value for `{path}`: {message}")]
	Invalid { path: String, message: String },
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// The log level to use, this is a tracing env filter
	pub level: String,

	/// What logging mode we should use
	pub mode: logging::Mode,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			mode: logging::Mode::Default,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct TlsConfig {
	/// The path to the TLS certificate
	pub cert: String,

	/// The path to the TLS private key
	pub key: String,

	/// The path to the TLS CA certificate
	pub ca_cert: Option<String>,
}

const FILE_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

pub struct ConfigBuilder {
	value: Value,
	file: Option<String>,
}

impl ConfigBuilder {
	/// Starts from the serialized form of `C::default()`.
	pub fn new<C: Serialize + Default>() -> Result<Self> {
		Ok(Self {
			value: serde_json::to_value(C::default())?,
			file: None,
		})
	}

	/// Merges a configuration file.
	///
	/// When the path has no extension every supported extension is probed.
	/// A missing file is only an error when `required` is set.
	pub fn with_file(mut self, path: &str, required: bool) -> Result<Self> {
		let Some(location) = locate_file(path) else {
			if required {
				return Err(ConfigError::NotFound(path.to_string()));
			}

			tracing::debug!(path, "config file not found, skipping");
			return Ok(self);
		};

		let content = std::fs::read_to_string(&location).map_err(|source| ConfigError::Io {
			path: location.clone(),
			source,
		})?;

		let value: Value = match Path::new(&location).extension().and_then(|e| e.to_str()) {
			Some("toml") => toml::from_str(&content)?,
			Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
			Some("json") => serde_json::from_str(&content)?,
			_ => return Err(ConfigError::UnsupportedFormat(location)),
		};

		merge(&mut self.value, value);
		self.file = Some(location);

		Ok(self)
	}

	/// Merges every environment variable starting with `{prefix}_`.
	pub fn with_env(self, prefix: &str) -> Self {
		self.with_env_vars(prefix, std::env::vars())
	}

	/// Nested keys are joined with a double underscore, so
	/// `GALLERY_API__BIND_ADDRESS` sets `api.bind_address`.
	pub fn with_env_vars(mut self, prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Self {
		let prefix = format!("{prefix}_");

		for (key, value) in vars {
			let Some(key) = key.strip_prefix(&prefix) else {
				continue;
			};

			if key.is_empty() {
				continue;
			}

			let path = key.split("__").map(|s| s.to_lowercase()).collect::<Vec<_>>();
			merge(&mut self.value, nest(&path, parse_scalar(&value)));
		}

		self
	}

	/// Sets a single dotted key, eg. `api.bind_address`.
	pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
		let path = key.split('.').map(str::to_owned).collect::<Vec<_>>();
		merge(&mut self.value, nest(&path, value.into()));
		self
	}

	/// Peeks at a merged value before the full build.
	pub fn get(&self, key: &str) -> Option<&Value> {
		key.split('.').try_fold(&self.value, |value, segment| value.get(segment))
	}

	/// Deserializes the merged tree, returning the config and the location of
	/// the file that was merged, if any.
	pub fn build<C: DeserializeOwned>(self) -> Result<(C, Option<String>)> {
		let config = serde_path_to_error::deserialize(self.value).map_err(|err| ConfigError::Invalid {
			path: err.path().to_string(),
			message: err.inner().to_string(),
		})?;

		Ok((config, self.file))
	}
}

fn locate_file(path: &str) -> Option<String> {
	let candidate = Path::new(path);

	if candidate.extension().is_some() {
		return candidate.is_file().then(|| path.to_string());
	}

	FILE_EXTENSIONS
		.iter()
		.map(|ext| format!("{path}.{ext}"))
		.find(|p| Path::new(p).is_file())
}

fn parse_scalar(value: &str) -> Value {
	match serde_json::from_str::<Value>(value) {
		Ok(value) => value,
		Err(_) => Value::String(value.to_string()),
	}
}

fn nest(path: &[String], value: Value) -> Value {
	path.iter().rev().fold(value, |value, key| {
		let mut map = Map::new();
		map.insert(key.clone(), value);
		Value::Object(map)
	})
}

fn merge(base: &mut Value, overlay: Value) {
	match (base, overlay) {
		(Value::Object(base), Value::Object(overlay)) => {
			for (key, value) in overlay {
				match base.get_mut(&key) {
					Some(existing) => merge(existing, value),
					None => {
						base.insert(key, value);
					}
				}
			}
		}
		(base, overlay) => *base = overlay,
	}
}
