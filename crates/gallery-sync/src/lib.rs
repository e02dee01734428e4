//!
//! # Pulse Gallery Sync
//!
//! Upload pipeline and ordered-gallery synchronizer behind the Pulse admin console's
//! photo gallery editor.
//!
//! Admit a batch of files and the engine validates them against a policy, uploads the
//! admissible ones concurrently against your object store while tracking per-file
//! progress and failure state, and merges every successful result into the gallery
//! record as a single atomic extension, in submission order, no matter which upload
//! finished first. Reordering and deletion run through the same persist-then-commit
//! gateway: the authoritative order only advances after the document store confirms
//! the write, and rolls back when it does not.
//!
//! Bring your own collaborators ([`ObjectStore`], [`DocumentStore`], [`AuthGate`]) and
//! subscribe to the engine's snapshot to render progress and the gallery itself.
//!
//! ## Basic example
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use pulse_gallery_sync::{
//! 	AuthGate, BatchStatus, DocumentStore, FileSource, GallerySystem, ObjectStore,
//! 	PersistError, SystemOptions, UploadError, UploadPolicy,
//! };
//!
//! struct Cdn;
//!
//! #[async_trait]
//! impl ObjectStore for Cdn {
//! 	async fn upload(
//! 		&self,
//! 		file: &FileSource,
//! 		destination_prefix: &str,
//! 	) -> Result<String, UploadError> {
//! 		Ok(format!("https://cdn.example/{destination_prefix}/{}", file.name()))
//! 	}
//! }
//!
//! struct Documents;
//!
//! #[async_trait]
//! impl DocumentStore for Documents {
//! 	async fn persist(&self, _items: &[String]) -> Result<(), PersistError> {
//! 		Ok(())
//! 	}
//! }
//!
//! struct Admin;
//!
//! impl AuthGate for Admin {
//! 	fn is_authorized(&self) -> bool {
//! 		true
//! 	}
//! }
//!
//! #[tokio::main]
//! async fn main() {
//! 	let system = GallerySystem::new(
//! 		Arc::new(Cdn),
//! 		Arc::new(Documents),
//! 		Arc::new(Admin),
//! 		Vec::new(),
//! 		SystemOptions::default(),
//! 	);
//!
//! 	let handle = system
//! 		.admit_batch(
//! 			vec![FileSource::new("front-desk.png", "image/png", vec![0u8; 64])],
//! 			&UploadPolicy::default(),
//! 		)
//! 		.await
//! 		.unwrap();
//!
//! 	assert!(matches!(handle.await, BatchStatus::Committed { .. }));
//! 	assert_eq!(system.snapshot().items.len(), 1);
//!
//! 	system.shutdown().await;
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod config;
mod error;
mod gallery;
mod message;
mod policy;
mod scheduler;
mod source;
mod store;
mod system;
mod task;

pub use config::SystemOptions;
pub use error::{Error, GalleryError, PersistError, RejectionReason, UploadError};
pub use gallery::reordered;
pub use policy::{screen_batch, Rejection, UploadPolicy};
pub use scheduler::BatchStatus;
pub use source::{FileSource, Preview};
pub use store::{AuthGate, DocumentStore, ObjectStore};
pub use system::{BatchHandle, Snapshot, System as GallerySystem};
pub use task::{TaskId, UploadState, UploadTask};
