use std::path::PathBuf;

use bytes::Bytes;

use super::{validate_path, Drive, DriveError};
use crate::config::LocalDriveConfig;

#[derive(Debug)]
pub struct LocalDrive {
	path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LocalDriveError {
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
}

impl LocalDrive {
	#[tracing::instrument(skip(config), name = "LocalDrive::new", fields(path = %config.path.display()), err)]
	pub async fn new(config: &LocalDriveConfig) -> Result<Self, DriveError> {
		tracing::debug!("setting up local drive");

		if !config.path.exists() {
			tokio::fs::create_dir_all(&config.path).await.map_err(LocalDriveError::Io)?;
		}

		Ok(Self {
			path: config.path.clone(),
		})
	}
}

impl Drive for LocalDrive {
	#[tracing::instrument(skip(self), name = "LocalDrive::read", err)]
	async fn read(&self, path: &str) -> Result<Bytes, DriveError> {
		tracing::debug!("reading file");
		validate_path(path)?;

		match tokio::fs::read(self.path.join(path)).await {
			Ok(data) => Ok(data.into()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(DriveError::NotFound),
			Err(err) => Err(LocalDriveError::Io(err).into()),
		}
	}

	#[tracing::instrument(skip(self, data), name = "LocalDrive::write", err, fields(size = data.len()))]
	async fn write(&self, path: &str, data: Bytes) -> Result<(), DriveError> {
		tracing::debug!("writing file");
		validate_path(path)?;

		let path = self.path.join(path);
		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await.map_err(LocalDriveError::Io)?;
		}

		Ok(tokio::fs::write(path, data).await.map_err(LocalDriveError::Io)?)
	}

	#[tracing::instrument(skip(self), name = "LocalDrive::delete", err)]
	async fn delete(&self, path: &str) -> Result<(), DriveError> {
		tracing::debug!("deleting file");
		validate_path(path)?;

		match tokio::fs::remove_file(self.path.join(path)).await {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(DriveError::NotFound),
			Err(err) => Err(LocalDriveError::Io(err).into()),
		}
	}
}
