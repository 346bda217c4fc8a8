use bytes::Bytes;
use chrono::{DateTime, Datelike, Utc};
use ulid::Ulid;

use self::local::{LocalDrive, LocalDriveError};
use self::memory::{MemoryDrive, MemoryDriveError};
use crate::config::DriveConfig;

pub mod local;
pub mod memory;

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
	#[error("local: {0}")]
	Local(#[from] LocalDriveError),
	#[error("memory: {0}")]
	Memory(#[from] MemoryDriveError),
	#[error("not found")]
	NotFound,
	#[error("invalid path: {0}")]
	InvalidPath(String),
}

/// Storage for uploaded images, addressed by relative paths.
pub trait Drive {
	/// Read data from a drive
	fn read(&self, path: &str) -> impl std::future::Future<Output = Result<Bytes, DriveError>> + Send;

	/// Write data to a drive
	fn write(&self, path: &str, data: Bytes) -> impl std::future::Future<Output = Result<(), DriveError>> + Send;

	/// Delete data from a drive
	fn delete(&self, path: &str) -> impl std::future::Future<Output = Result<(), DriveError>> + Send;
}

#[derive(Debug)]
pub enum AnyDrive {
	Local(LocalDrive),
	Memory(MemoryDrive),
}

impl Drive for AnyDrive {
	async fn read(&self, path: &str) -> Result<Bytes, DriveError> {
		match self {
			AnyDrive::Local(drive) => drive.read(path).await,
			AnyDrive::Memory(drive) => drive.read(path).await,
		}
	}

	async fn write(&self, path: &str, data: Bytes) -> Result<(), DriveError> {
		match self {
			AnyDrive::Local(drive) => drive.write(path, data).await,
			AnyDrive::Memory(drive) => drive.write(path, data).await,
		}
	}

	async fn delete(&self, path: &str) -> Result<(), DriveError> {
		match self {
			AnyDrive::Local(drive) => drive.delete(path).await,
			AnyDrive::Memory(drive) => drive.delete(path).await,
		}
	}
}

pub async fn build_drive(config: &DriveConfig) -> Result<AnyDrive, DriveError> {
	match config {
		DriveConfig::Local(local) => Ok(AnyDrive::Local(LocalDrive::new(local).await?)),
		DriveConfig::Memory(memory) => Ok(AnyDrive::Memory(MemoryDrive::new(memory))),
	}
}

/// Where a new upload is stored: `photos/YYYY/MM/DD/<ulid>.<ext>`.
pub fn upload_path(uploaded_at: DateTime<Utc>, id: Ulid, extension: &str) -> String {
	format!(
		"photos/{:04}/{:02}/{:02}/{}.{}",
		uploaded_at.year(),
		uploaded_at.month(),
		uploaded_at.day(),
		id.to_string().to_lowercase(),
		extension
	)
}

/// Rejects absolute paths and any `..` component.
pub(crate) fn validate_path(path: &str) -> Result<(), DriveError> {
	if path.is_empty() || path.starts_with('/') || path.split('/').any(|c| c == ".." || c.is_empty()) {
		return Err(DriveError::InvalidPath(path.to_string()));
	}

	Ok(())
}
