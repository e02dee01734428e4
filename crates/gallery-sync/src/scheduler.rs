use std::sync::Arc;

use futures_concurrency::future::Join;
use tokio::{
	spawn,
	time::{interval, sleep, MissedTickBehavior},
};
use tracing::{instrument, trace, warn, Instrument};

use super::{
	config::SystemOptions,
	error::{GalleryError, UploadError},
	gallery::GalleryClient,
	source::FileSource,
	store::ObjectStore,
	system::SharedState,
	task::{TaskId, UploadState},
};

/// Terminal outcome of one admitted batch.
#[derive(Debug)]
pub enum BatchStatus {
	/// Every successful upload was merged into the gallery in a single extension.
	Committed { urls: Vec<String> },
	/// No upload in the batch succeeded, so the gallery was left untouched.
	NothingToCommit,
	/// Uploads finished, but the merged record could not be persisted. The gallery
	/// kept its previous order and the affected tasks were marked as failed.
	CommitFailed(GalleryError),
}

/// Drives admitted batches to their terminal states and merges the results.
///
/// Uploads within a batch run concurrently and fail independently; the gallery only
/// ever sees the batch as a whole, once every task is terminal.
pub(crate) struct Scheduler {
	object_store: Arc<dyn ObjectStore>,
	gallery: GalleryClient,
	shared: Arc<SharedState>,
	options: SystemOptions,
}

impl Scheduler {
	pub fn new(
		object_store: Arc<dyn ObjectStore>,
		gallery: GalleryClient,
		shared: Arc<SharedState>,
		options: SystemOptions,
	) -> Self {
		Self {
			object_store,
			gallery,
			shared,
			options,
		}
	}

	/// Runs every task of a batch, then commits the successful URLs, in submission
	/// order, as one atomic gallery extension.
	#[instrument(skip_all, fields(batch_size = task_ids.len()))]
	pub async fn run_batch(&self, task_ids: Vec<TaskId>) -> BatchStatus {
		if self.object_store.supports_batch() && task_ids.len() > 1 {
			self.run_remote_batch(&task_ids).await;
		} else {
			task_ids
				.iter()
				.map(|task_id| self.run_single(*task_id))
				.collect::<Vec<_>>()
				.join()
				.await;
		}

		self.commit_batch(&task_ids).await
	}

	/// Re-runs a failed task from scratch; a lone retry commits like a batch of one.
	#[instrument(skip(self))]
	pub async fn run_retry(&self, task_id: TaskId) -> BatchStatus {
		self.run_single(task_id).await;

		self.commit_batch(&[task_id]).await
	}

	async fn run_single(&self, task_id: TaskId) {
		let Some((_, file)) = self.begin(&[task_id]).await.pop() else {
			return;
		};

		let upload = self
			.object_store
			.upload(&file, &self.options.destination_prefix);
		tokio::pin!(upload);

		let mut ramp = interval(self.options.ramp_interval);
		ramp.set_missed_tick_behavior(MissedTickBehavior::Skip);

		let result = loop {
			tokio::select! {
				result = &mut upload => break result,
				_ = ramp.tick() => self.advance_ramp(&[task_id]).await,
			}
		};

		self.finish(task_id, result).await;
	}

	/// One round trip for the whole batch, for stores that can take it. The URL list
	/// is order preserving, so a short response means no URL can be trusted to belong
	/// to any particular file and the whole call counts as failed.
	async fn run_remote_batch(&self, task_ids: &[TaskId]) {
		let begun = self.begin(task_ids).await;

		if begun.is_empty() {
			return;
		}

		let ids = begun.iter().map(|(task_id, _)| *task_id).collect::<Vec<_>>();
		let files = begun.into_iter().map(|(_, file)| file).collect::<Vec<_>>();

		let upload = self
			.object_store
			.upload_batch(&files, &self.options.destination_prefix);
		tokio::pin!(upload);

		let mut ramp = interval(self.options.ramp_interval);
		ramp.set_missed_tick_behavior(MissedTickBehavior::Skip);

		let result = loop {
			tokio::select! {
				result = &mut upload => break result,
				_ = ramp.tick() => self.advance_ramp(&ids).await,
			}
		};

		let outcomes: Vec<(TaskId, Result<String, UploadError>)> = match result {
			Ok(urls) if urls.len() == ids.len() => {
				ids.into_iter().zip(urls.into_iter().map(Ok)).collect()
			}

			Ok(urls) => {
				let error = UploadError(format!(
					"object store returned {} urls for {} files",
					urls.len(),
					ids.len()
				));

				ids.into_iter()
					.map(|task_id| (task_id, Err(error.clone())))
					.collect()
			}

			Err(error) => ids
				.into_iter()
				.map(|task_id| (task_id, Err(error.clone())))
				.collect(),
		};

		for (task_id, result) in outcomes {
			self.finish(task_id, result).await;
		}
	}

	/// Flips the given tasks to `Uploading` with the seed progress, returning the ones
	/// still present in the registry (a task dismissed before pickup is skipped).
	async fn begin(&self, task_ids: &[TaskId]) -> Vec<(TaskId, FileSource)> {
		let mut registry = self.shared.registry.write().await;

		let begun = task_ids
			.iter()
			.filter_map(|&task_id| {
				registry
					.get(task_id)
					.map(|task| (task_id, task.file.clone()))
			})
			.collect::<Vec<_>>();

		for (task_id, _) in &begun {
			registry.update(
				*task_id,
				UploadState::Uploading {
					progress: self.options.ramp_seed,
				},
			);
		}

		drop(registry);
		self.shared.publish_tasks().await;

		begun
	}

	async fn advance_ramp(&self, task_ids: &[TaskId]) {
		let mut registry = self.shared.registry.write().await;

		for &task_id in task_ids {
			registry.nudge_progress(task_id, self.options.ramp_step, self.options.ramp_ceiling);
		}

		drop(registry);
		self.shared.publish_tasks().await;
	}

	async fn finish(&self, task_id: TaskId, result: Result<String, UploadError>) {
		let state = match result {
			Ok(url) => UploadState::Succeeded { url },
			Err(e) => {
				warn!(%task_id, %e, "Upload attempt failed");

				UploadState::Failed {
					detail: e.to_string(),
				}
			}
		};

		let mut registry = self.shared.registry.write().await;

		if !registry.update(task_id, state) {
			trace!(%task_id, "Task dismissed while uploading, discarding the late result");
		}

		drop(registry);
		self.shared.publish_tasks().await;
	}

	/// Once the whole batch is terminal, merges the successful URLs, in submission
	/// order, into the gallery as one extension. Partial results are never appended.
	async fn commit_batch(&self, task_ids: &[TaskId]) -> BatchStatus {
		let urls = {
			let registry = self.shared.registry.read().await;

			task_ids
				.iter()
				.filter_map(|&task_id| {
					registry
						.get(task_id)
						.and_then(|task| task.result_url().map(String::from))
				})
				.collect::<Vec<_>>()
		};

		if urls.is_empty() {
			return BatchStatus::NothingToCommit;
		}

		match self.gallery.append(urls.clone()).await {
			Ok(()) => {
				self.schedule_auto_dismiss(task_ids.to_vec());

				BatchStatus::Committed { urls }
			}

			Err(e) => {
				// The binaries did reach the object store; only the gallery record is
				// missing. That difference gets its own detail so the UI can say so.
				let mut registry = self.shared.registry.write().await;

				for &task_id in task_ids {
					if registry
						.get(task_id)
						.is_some_and(|task| task.result_url().is_some())
					{
						registry.update(
							task_id,
							UploadState::Failed {
								detail: format!("uploaded, but {e}"),
							},
						);
					}
				}

				drop(registry);
				self.shared.publish_tasks().await;

				BatchStatus::CommitFailed(e)
			}
		}
	}

	/// Successful tasks linger for a little while so the user sees them land, then
	/// vanish on their own. Failed tasks stay until retried or dismissed.
	fn schedule_auto_dismiss(&self, task_ids: Vec<TaskId>) {
		let shared = Arc::clone(&self.shared);
		let delay = self.options.auto_dismiss_delay;

		spawn(
			async move {
				sleep(delay).await;

				let removed = shared.registry.write().await.remove_where(|task| {
					task_ids.contains(&task.id)
						&& matches!(task.state, UploadState::Succeeded { .. })
				});

				if removed > 0 {
					shared.publish_tasks().await;
				}
			}
			.in_current_span(),
		);
	}
}
