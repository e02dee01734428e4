use tokio::sync::oneshot;

use super::error::GalleryError;

/// Mutations accepted by the gallery synchronizer. One command maps to one persist
/// round trip against the document store.
#[derive(Debug)]
pub(crate) enum GalleryCommand {
	Append {
		urls: Vec<String>,
		ack: oneshot::Sender<Result<(), GalleryError>>,
	},
	Reorder {
		source_index: usize,
		dest_index: usize,
		ack: oneshot::Sender<Result<(), GalleryError>>,
	},
	Remove {
		index: usize,
		ack: oneshot::Sender<Result<(), GalleryError>>,
	},
}
