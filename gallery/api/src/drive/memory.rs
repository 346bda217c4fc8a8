use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::RwLock;

use super::{validate_path, Drive, DriveError};
use crate::config::MemoryDriveConfig;

#[derive(Debug)]
struct FileHolder {
	remaining_capacity: usize,
	files: HashMap<String, Bytes>,
}

impl FileHolder {
	fn insert(&mut self, path: String, data: Bytes) -> Result<(), DriveError> {
		let freed = self.files.get(&path).map_or(0, |old| old.len());
		let available = self.remaining_capacity.saturating_add(freed);
		if data.len() > available {
			return Err(MemoryDriveError::NoSpaceLeft.into());
		}

		self.remaining_capacity = available - data.len();
		self.files.insert(path, data);
		Ok(())
	}

	fn remove(&mut self, path: &str) -> Option<Bytes> {
		let data = self.files.remove(path)?;
		self.remaining_capacity = self.remaining_capacity.saturating_add(data.len());
		Some(data)
	}
}

#[derive(Debug)]
pub struct MemoryDrive {
	files: RwLock<FileHolder>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MemoryDriveError {
	#[error("no space left on drive")]
	NoSpaceLeft,
}

impl MemoryDrive {
	pub fn new(config: &MemoryDriveConfig) -> Self {
		tracing::debug!("setting up memory drive");
		Self {
			files: RwLock::new(FileHolder {
				remaining_capacity: config.capacity.unwrap_or(usize::MAX),
				files: HashMap::new(),
			}),
		}
	}

	pub async fn file_count(&self) -> usize {
		self.files.read().await.files.len()
	}
}

impl Drive for MemoryDrive {
	#[tracing::instrument(skip(self), name = "MemoryDrive::read", err)]
	async fn read(&self, path: &str) -> Result<Bytes, DriveError> {
		validate_path(path)?;

		self.files.read().await.files.get(path).cloned().ok_or(DriveError::NotFound)
	}

	#[tracing::instrument(skip(self, data), name = "MemoryDrive::write", err, fields(size = data.len()))]
	async fn write(&self, path: &str, data: Bytes) -> Result<(), DriveError> {
		validate_path(path)?;

		self.files.write().await.insert(path.to_owned(), data)
	}

	#[tracing::instrument(skip(self), name = "MemoryDrive::delete", err)]
	async fn delete(&self, path: &str) -> Result<(), DriveError> {
		validate_path(path)?;

		self.files.write().await.remove(path).ok_or(DriveError::NotFound)?;
		Ok(())
	}
}
