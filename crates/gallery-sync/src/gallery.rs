use std::{collections::HashSet, pin::pin, sync::Arc};

use async_channel as chan;
use futures::StreamExt;
use tokio::sync::oneshot;
use tracing::{instrument, trace, warn};

use super::{
	error::{GalleryError, PersistError},
	message::GalleryCommand,
	store::DocumentStore,
	system::SharedState,
};

/// Rebuilds the display order after a drag: the item at `source_index` is lifted out
/// and reinserted at `dest_index`, every other relative position is preserved.
///
/// Both indices must address the current collection.
#[must_use]
pub fn reordered(items: &[String], source_index: usize, dest_index: usize) -> Vec<String> {
	let mut next = items.to_vec();
	let moved = next.remove(source_index);
	next.insert(dest_index, moved);

	next
}

/// Cheap-to-clone handle funnelling mutations into the synchronizer loop.
#[derive(Debug, Clone)]
pub(crate) struct GalleryClient {
	commands_tx: chan::Sender<GalleryCommand>,
}

impl GalleryClient {
	pub fn new(commands_tx: chan::Sender<GalleryCommand>) -> Self {
		Self { commands_tx }
	}

	pub async fn append(&self, urls: Vec<String>) -> Result<(), GalleryError> {
		self.request(|ack| GalleryCommand::Append { urls, ack })
			.await
	}

	pub async fn reorder(
		&self,
		source_index: usize,
		dest_index: usize,
	) -> Result<(), GalleryError> {
		self.request(|ack| GalleryCommand::Reorder {
			source_index,
			dest_index,
			ack,
		})
		.await
	}

	pub async fn remove(&self, index: usize) -> Result<(), GalleryError> {
		self.request(|ack| GalleryCommand::Remove { index, ack })
			.await
	}

	pub fn close(&self) {
		self.commands_tx.close();
	}

	async fn request(
		&self,
		command: impl FnOnce(oneshot::Sender<Result<(), GalleryError>>) -> GalleryCommand,
	) -> Result<(), GalleryError> {
		let (ack_tx, ack_rx) = oneshot::channel();

		self.commands_tx
			.send(command(ack_tx))
			.await
			.map_err(|_| GalleryError::Shutdown)?;

		ack_rx.await.map_err(|_| GalleryError::Shutdown)?
	}
}

/// Single owner of the authoritative gallery order.
///
/// Every mutation runs through this loop one at a time: compute the candidate from the
/// last committed value, persist it, and only then commit. A queued mutation therefore
/// never computes against a value still awaiting confirmation, no matter how many
/// callers are poking the gallery concurrently.
pub(crate) struct GalleryActor {
	store: Arc<dyn DocumentStore>,
	shared: Arc<SharedState>,
	commands_rx: chan::Receiver<GalleryCommand>,
	committed: Vec<String>,
	deleting: HashSet<String>,
}

impl GalleryActor {
	pub fn new(
		store: Arc<dyn DocumentStore>,
		shared: Arc<SharedState>,
		initial_items: Vec<String>,
		commands_rx: chan::Receiver<GalleryCommand>,
	) -> Self {
		Self {
			store,
			shared,
			commands_rx,
			committed: initial_items,
			deleting: HashSet::new(),
		}
	}

	pub async fn run(mut self) {
		let mut commands = pin!(self.commands_rx.clone());

		while let Some(command) = commands.next().await {
			self.handle_command(command).await;
		}

		trace!("Gallery synchronizer loop ended");
	}

	async fn handle_command(&mut self, command: GalleryCommand) {
		match command {
			GalleryCommand::Append { urls, ack } => {
				let result = self.append(urls).await;
				respond(ack, result);
			}

			GalleryCommand::Reorder {
				source_index,
				dest_index,
				ack,
			} => {
				let result = self.reorder(source_index, dest_index).await;
				respond(ack, result);
			}

			GalleryCommand::Remove { index, ack } => {
				let result = self.remove(index).await;
				respond(ack, result);
			}
		}
	}

	#[instrument(skip(self, urls), fields(new_items = urls.len()))]
	async fn append(&mut self, urls: Vec<String>) -> Result<(), GalleryError> {
		if urls.is_empty() {
			return Ok(());
		}

		let mut candidate = self.committed.clone();
		candidate.extend(urls);

		self.persist_then_commit(candidate, true, GalleryError::AppendFailed)
			.await
	}

	#[instrument(skip(self))]
	async fn reorder(
		&mut self,
		source_index: usize,
		dest_index: usize,
	) -> Result<(), GalleryError> {
		let len = self.committed.len();

		if source_index >= len || dest_index >= len {
			return Err(GalleryError::IndexOutOfBounds {
				index: source_index.max(dest_index),
				len,
			});
		}

		let candidate = reordered(&self.committed, source_index, dest_index);

		self.persist_then_commit(candidate, true, GalleryError::ReorderFailed)
			.await
	}

	#[instrument(skip(self))]
	async fn remove(&mut self, index: usize) -> Result<(), GalleryError> {
		let len = self.committed.len();

		if index >= len {
			return Err(GalleryError::IndexOutOfBounds { index, len });
		}

		// The item stays visible, marked as deleting, until the store confirms the
		// removal; everything else remains interactive meanwhile.
		let url = self.committed[index].clone();
		self.deleting.insert(url.clone());
		self.publish(self.committed.clone());

		let mut candidate = self.committed.clone();
		candidate.remove(index);

		let result = self
			.persist_then_commit(candidate, false, GalleryError::RemoveFailed)
			.await;

		self.deleting.remove(&url);
		self.publish(self.committed.clone());

		result
	}

	/// The one protocol every mutation follows: persist the candidate, and only on
	/// success let it become the committed value. `optimistic` controls whether the
	/// candidate is displayed while the round trip is outstanding.
	async fn persist_then_commit(
		&mut self,
		candidate: Vec<String>,
		optimistic: bool,
		wrap: fn(PersistError) -> GalleryError,
	) -> Result<(), GalleryError> {
		if optimistic {
			self.publish(candidate.clone());
		}

		match self.store.persist(&candidate).await {
			Ok(()) => {
				self.committed = candidate;
				self.publish(self.committed.clone());

				Ok(())
			}

			Err(e) => {
				warn!(%e, "Gallery mutation did not survive persistence, reverting");
				self.publish(self.committed.clone());

				Err(wrap(e))
			}
		}
	}

	fn publish(&self, items: Vec<String>) {
		self.shared.publish_gallery(items, self.deleting.clone());
	}
}

fn respond(ack: oneshot::Sender<Result<(), GalleryError>>, result: Result<(), GalleryError>) {
	if ack.send(result).is_err() {
		warn!("Gallery mutation caller went away before receiving the outcome");
	}
}
