use std::{
	cell::RefCell,
	collections::HashSet,
	future::Future,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

use async_channel as chan;
use tokio::{
	spawn,
	sync::{oneshot, watch, RwLock},
	task::JoinHandle,
};
use tracing::{error, instrument, Instrument};

use super::{
	config::SystemOptions,
	error::Error,
	gallery::{GalleryActor, GalleryClient},
	policy::{screen_batch, Rejection, UploadPolicy},
	scheduler::{BatchStatus, Scheduler},
	source::FileSource,
	store::{AuthGate, DocumentStore, ObjectStore},
	task::{TaskId, TaskRegistry, UploadState, UploadTask},
};

/// Point-in-time view of the engine, cheap to clone and safe to render from.
#[derive(Debug, Clone)]
pub struct Snapshot {
	/// Upload tasks in admission order.
	pub tasks: Vec<UploadTask>,
	/// Gallery URLs in display order. During an in-flight append or reorder this is
	/// the optimistic candidate; it falls back to the committed order if persistence
	/// fails, and matches it at every other moment.
	pub items: Vec<String>,
	/// URLs with a deletion round trip outstanding. Everything else stays interactive.
	pub deleting: HashSet<String>,
}

/// State reachable from every corner of the engine. The registry is only ever written
/// by the scheduler, the gallery fields only by the synchronizer loop; everyone else
/// reads through the watch channel.
pub(crate) struct SharedState {
	pub registry: RwLock<TaskRegistry>,
	snapshot_tx: watch::Sender<Snapshot>,
}

impl SharedState {
	pub async fn publish_tasks(&self) {
		let tasks = self.registry.read().await.snapshot();

		self.snapshot_tx
			.send_modify(|snapshot| snapshot.tasks = tasks);
	}

	pub fn publish_gallery(&self, items: Vec<String>, deleting: HashSet<String>) {
		self.snapshot_tx.send_modify(|snapshot| {
			snapshot.items = items;
			snapshot.deleting = deleting;
		});
	}
}

/// Returned by batch admission: which files were refused, which tasks were created,
/// and a future resolving once the batch reaches its terminal outcome.
#[derive(Debug)]
pub struct BatchHandle {
	pub task_ids: Vec<TaskId>,
	pub rejections: Vec<Rejection>,
	pub(crate) done_rx: oneshot::Receiver<BatchStatus>,
}

impl Future for BatchHandle {
	type Output = BatchStatus;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.done_rx)
			.poll(cx)
			.map(|res| res.expect("batch driver dropped its result channel"))
	}
}

/// The engine's public face: admission, retry and dismissal of upload tasks, gallery
/// mutations, and a subscribable snapshot of the whole state.
///
/// Construction spawns the gallery synchronizer loop; [`System::shutdown`] winds it
/// down. The caller loads the initial gallery record and passes it in, the engine
/// itself only ever writes the record back.
pub struct System {
	auth_gate: Arc<dyn AuthGate>,
	gallery: GalleryClient,
	scheduler: Arc<Scheduler>,
	shared: Arc<SharedState>,
	handle: RefCell<Option<JoinHandle<()>>>,
}

impl System {
	#[must_use]
	pub fn new(
		object_store: Arc<dyn ObjectStore>,
		document_store: Arc<dyn DocumentStore>,
		auth_gate: Arc<dyn AuthGate>,
		initial_items: Vec<String>,
		options: SystemOptions,
	) -> Self {
		let (snapshot_tx, _) = watch::channel(Snapshot {
			tasks: Vec::new(),
			items: initial_items.clone(),
			deleting: HashSet::new(),
		});

		let shared = Arc::new(SharedState {
			registry: RwLock::new(TaskRegistry::default()),
			snapshot_tx,
		});

		let (commands_tx, commands_rx) = chan::bounded(16);
		let gallery = GalleryClient::new(commands_tx);

		let handle = spawn(
			GalleryActor::new(
				document_store,
				Arc::clone(&shared),
				initial_items,
				commands_rx,
			)
			.run(),
		);

		let scheduler = Arc::new(Scheduler::new(
			object_store,
			gallery.clone(),
			Arc::clone(&shared),
			options,
		));

		Self {
			auth_gate,
			gallery,
			scheduler,
			shared,
			handle: RefCell::new(Some(handle)),
		}
	}

	/// Screens a candidate batch and hands every admissible file to the scheduler.
	///
	/// Returns as soon as the tasks exist; the uploads run in the background and the
	/// returned handle resolves with the batch's terminal outcome. Offending files are
	/// reported per file in the handle without holding up their siblings.
	#[instrument(skip_all, fields(candidates = files.len()))]
	pub async fn admit_batch(
		&self,
		files: Vec<FileSource>,
		policy: &UploadPolicy,
	) -> Result<BatchHandle, Error> {
		self.authorized()?;

		let current_len = self.snapshot().items.len();
		let (admitted, rejections) = screen_batch(files, current_len, policy);

		let task_ids = if admitted.is_empty() {
			Vec::new()
		} else {
			let ids = self.shared.registry.write().await.admit(admitted);
			self.shared.publish_tasks().await;

			ids
		};

		let (done_tx, done_rx) = oneshot::channel();

		if task_ids.is_empty() {
			done_tx.send(BatchStatus::NothingToCommit).ok();
		} else {
			let scheduler = Arc::clone(&self.scheduler);
			let ids = task_ids.clone();

			spawn(
				async move {
					let status = scheduler.run_batch(ids).await;

					// Nobody awaiting the handle is fine; the snapshot tells the
					// same story.
					done_tx.send(status).ok();
				}
				.in_current_span(),
			);
		}

		Ok(BatchHandle {
			task_ids,
			rejections,
			done_rx,
		})
	}

	/// Puts a failed task back at the start of the pipeline. Always a fresh attempt:
	/// progress starts over from zero, never from where the failed attempt left off.
	pub async fn retry(&self, task_id: TaskId) -> Result<BatchHandle, Error> {
		{
			let mut registry = self.shared.registry.write().await;

			let retryable = match registry.get(task_id) {
				None => return Err(Error::TaskNotFound(task_id)),
				Some(task) => matches!(task.state, UploadState::Failed { .. }),
			};

			if !retryable {
				return Err(Error::TaskNotRetryable(task_id));
			}

			registry.update(task_id, UploadState::Pending);
		}
		self.shared.publish_tasks().await;

		let (done_tx, done_rx) = oneshot::channel();
		let scheduler = Arc::clone(&self.scheduler);

		spawn(
			async move {
				let status = scheduler.run_retry(task_id).await;
				done_tx.send(status).ok();
			}
			.in_current_span(),
		);

		Ok(BatchHandle {
			task_ids: vec![task_id],
			rejections: Vec::new(),
			done_rx,
		})
	}

	/// Drops a task from the registry, whatever its state. An upload already in flight
	/// is not aborted; its late result is simply discarded when it lands.
	pub async fn dismiss(&self, task_id: TaskId) -> Result<(), Error> {
		self.shared
			.registry
			.write()
			.await
			.remove(task_id)
			.ok_or(Error::TaskNotFound(task_id))?;
		self.shared.publish_tasks().await;

		Ok(())
	}

	/// Drops every successfully completed task, returning how many went away.
	pub async fn clear_completed(&self) -> usize {
		let removed = self
			.shared
			.registry
			.write()
			.await
			.remove_where(|task| matches!(task.state, UploadState::Succeeded { .. }));

		if removed > 0 {
			self.shared.publish_tasks().await;
		}

		removed
	}

	/// Appends the given URLs to the gallery in one extension.
	pub async fn append(&self, urls: Vec<String>) -> Result<(), Error> {
		self.authorized()?;

		Ok(self.gallery.append(urls).await?)
	}

	/// Moves the item at `source_index` to `dest_index`, preserving every other
	/// relative position. The rendered order reverts if the new order does not stick.
	pub async fn reorder(&self, source_index: usize, dest_index: usize) -> Result<(), Error> {
		self.authorized()?;

		Ok(self.gallery.reorder(source_index, dest_index).await?)
	}

	/// Deletes the item at `index` once the document store confirms the removal. On
	/// failure the item is still there, marker cleared, fully interactive.
	pub async fn remove(&self, index: usize) -> Result<(), Error> {
		self.authorized()?;

		Ok(self.gallery.remove(index).await?)
	}

	/// A live subscription to the engine's state; the current value is available
	/// immediately and every later change is observable.
	#[must_use]
	pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
		self.shared.snapshot_tx.subscribe()
	}

	#[must_use]
	pub fn snapshot(&self) -> Snapshot {
		self.shared.snapshot_tx.borrow().clone()
	}

	/// Closes the mutation queue and waits for the synchronizer to wind down. A batch
	/// still uploading will finish its uploads but report `CommitFailed` when it finds
	/// the gallery gone.
	pub async fn shutdown(&self) {
		self.gallery.close();

		let handle = self.handle.borrow_mut().take();

		if let Some(handle) = handle {
			if let Err(e) = handle.await {
				error!("Gallery synchronizer panicked: {e:#?}");
			}
		}
	}

	fn authorized(&self) -> Result<(), Error> {
		if self.auth_gate.is_authorized() {
			Ok(())
		} else {
			Err(Error::Unauthorized)
		}
	}
}
