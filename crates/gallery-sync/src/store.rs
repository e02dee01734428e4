//! Contracts for the remote collaborators the engine drives but does not implement.

use async_trait::async_trait;

use super::{
	error::{PersistError, UploadError},
	source::FileSource,
};

/// Remote media host that accepts file content and hands back a durable public URL.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
	/// Upload a single file under the given destination prefix.
	async fn upload(
		&self,
		file: &FileSource,
		destination_prefix: &str,
	) -> Result<String, UploadError>;

	/// Whether [`ObjectStore::upload_batch`] performs a true multi-file upload.
	///
	/// Stores without one are driven through [`ObjectStore::upload`], once per file.
	fn supports_batch(&self) -> bool {
		false
	}

	/// Upload several files in one call, returning one URL per file, in input order.
	async fn upload_batch(
		&self,
		files: &[FileSource],
		destination_prefix: &str,
	) -> Result<Vec<String>, UploadError> {
		let mut urls = Vec::with_capacity(files.len());

		for file in files {
			urls.push(self.upload(file, destination_prefix).await?);
		}

		Ok(urls)
	}
}

/// Remote document store holding the authoritative ordered gallery record.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
	/// Overwrite the persisted gallery record with the given ordered URLs.
	async fn persist(&self, items: &[String]) -> Result<(), PersistError>;
}

/// Capability gate consulted before any operation that changes remote state.
pub trait AuthGate: Send + Sync + 'static {
	fn is_authorized(&self) -> bool;
}
