use thiserror::Error;

use super::task::TaskId;

/// Returned by the remote object store when an upload attempt fails.
#[derive(Debug, Clone, Error)]
#[error("upload failed: {0}")]
pub struct UploadError(pub String);

/// Returned by the remote document store when the gallery record could not be written.
#[derive(Debug, Clone, Error)]
#[error("persist failed: {0}")]
pub struct PersistError(pub String);

/// Why a candidate file was refused before any byte left the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectionReason {
	#[error("unsupported media type")]
	UnsupportedType,
	#[error("file exceeds the maximum allowed size")]
	TooLarge,
	#[error("gallery is at capacity")]
	CapacityExceeded,
}

/// Failure of a single gallery mutation, reported per mutation kind so callers can tell
/// the user exactly what did not survive.
#[derive(Debug, Error)]
pub enum GalleryError {
	#[error("new items could not be saved to the gallery: {0}")]
	AppendFailed(#[source] PersistError),
	#[error("the new gallery order could not be saved: {0}")]
	ReorderFailed(#[source] PersistError),
	#[error("the gallery item could not be deleted: {0}")]
	RemoveFailed(#[source] PersistError),
	#[error("index {index} out of bounds for a gallery of {len} items")]
	IndexOutOfBounds { index: usize, len: usize },
	#[error("gallery synchronizer is shutting down")]
	Shutdown,
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("not authorized to modify the media gallery")]
	Unauthorized,
	#[error("upload task not found <id='{0}'>")]
	TaskNotFound(TaskId),
	#[error("upload task <id='{0}'> is not in a retryable state")]
	TaskNotRetryable(TaskId),
	#[error(transparent)]
	Gallery(#[from] GalleryError),
}
