use uuid::Uuid;

use super::source::{FileSource, Preview};

/// A unique identifier for an upload task using the [`uuid`](https://docs.rs/uuid) crate.
pub type TaskId = Uuid;

/// Lifecycle of a single upload attempt.
///
/// The state only moves forward, except for an explicit retry which puts a failed
/// attempt back at the start of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
	/// Admitted, waiting for the scheduler to pick it up.
	Pending,
	/// In flight against the object store.
	Uploading { progress: u8 },
	/// The object store confirmed the upload and returned a durable URL.
	Succeeded { url: String },
	/// The attempt failed; the task stays visible until retried or dismissed.
	Failed { detail: String },
}

impl UploadState {
	/// Progress to render for this state. Only a confirmed result reads as 100.
	#[must_use]
	pub fn progress(&self) -> u8 {
		match self {
			Self::Pending | Self::Failed { .. } => 0,
			Self::Uploading { progress } => *progress,
			Self::Succeeded { .. } => 100,
		}
	}

	#[must_use]
	pub const fn is_terminal(&self) -> bool {
		matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
	}
}

/// Tracked record of one file's journey through the upload pipeline.
#[derive(Debug, Clone)]
pub struct UploadTask {
	pub id: TaskId,
	pub file: FileSource,
	pub preview: Preview,
	pub state: UploadState,
}

impl UploadTask {
	fn new(file: FileSource) -> Self {
		let preview = Preview::from_source(&file);

		Self {
			id: TaskId::new_v4(),
			file,
			preview,
			state: UploadState::Pending,
		}
	}

	#[must_use]
	pub fn result_url(&self) -> Option<&str> {
		match &self.state {
			UploadState::Succeeded { url } => Some(url),
			_ => None,
		}
	}

	#[must_use]
	pub fn error_detail(&self) -> Option<&str> {
		match &self.state {
			UploadState::Failed { detail } => Some(detail),
			_ => None,
		}
	}
}

/// Ordered, in-memory collection of upload tasks.
///
/// Appended to a batch at a time, mutated per task by id. The registry performs no I/O
/// of its own; the scheduler drives every state change and readers only ever see cloned
/// snapshots.
#[derive(Debug, Default)]
pub(crate) struct TaskRegistry {
	tasks: Vec<UploadTask>,
}

impl TaskRegistry {
	/// Creates one pending task per admitted file, preview included, and returns the
	/// new task ids in submission order.
	pub fn admit(&mut self, files: Vec<FileSource>) -> Vec<TaskId> {
		files
			.into_iter()
			.map(|file| {
				let task = UploadTask::new(file);
				let id = task.id;
				self.tasks.push(task);
				id
			})
			.collect()
	}

	pub fn get(&self, id: TaskId) -> Option<&UploadTask> {
		self.tasks.iter().find(|task| task.id == id)
	}

	/// Replaces the state of the given task. Returns false when the task is gone,
	/// which is how a stale result from a dismissed task gets dropped on the floor.
	pub fn update(&mut self, id: TaskId, state: UploadState) -> bool {
		if let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) {
			task.state = state;
			true
		} else {
			false
		}
	}

	/// Advances the simulated progress of an in-flight task, capped at `ceiling`.
	///
	/// A task in any other state is left alone, so a ramp tick can never resurrect or
	/// regress a task that already reached a terminal state.
	pub fn nudge_progress(&mut self, id: TaskId, step: u8, ceiling: u8) {
		if let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) {
			if let UploadState::Uploading { progress } = &mut task.state {
				*progress = progress.saturating_add(step).min(ceiling);
			}
		}
	}

	pub fn remove(&mut self, id: TaskId) -> Option<UploadTask> {
		self.tasks
			.iter()
			.position(|task| task.id == id)
			.map(|index| self.tasks.remove(index))
	}

	/// Removes every task matching the predicate, returning how many were dropped.
	pub fn remove_where(&mut self, mut predicate: impl FnMut(&UploadTask) -> bool) -> usize {
		let before = self.tasks.len();
		self.tasks.retain(|task| !predicate(task));
		before - self.tasks.len()
	}

	pub fn snapshot(&self) -> Vec<UploadTask> {
		self.tasks.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn registry_with(names: &[&str]) -> (TaskRegistry, Vec<TaskId>) {
		let mut registry = TaskRegistry::default();
		let ids = registry.admit(
			names
				.iter()
				.map(|name| FileSource::new(*name, "image/png", vec![1u8, 2, 3]))
				.collect(),
		);

		(registry, ids)
	}

	#[test]
	fn admission_creates_pending_tasks_with_previews() {
		let (registry, ids) = registry_with(&["a.png", "b.png"]);

		let snapshot = registry.snapshot();
		assert_eq!(snapshot.len(), 2);
		assert_eq!(
			snapshot.iter().map(|task| task.id).collect::<Vec<_>>(),
			ids
		);

		for task in snapshot {
			assert_eq!(task.state, UploadState::Pending);
			assert_eq!(task.preview.bytes(), task.file.bytes());
		}
	}

	#[test]
	fn nudge_never_passes_the_ceiling_or_touches_terminal_tasks() {
		let (mut registry, ids) = registry_with(&["a.png"]);

		registry.update(ids[0], UploadState::Uploading { progress: 85 });
		registry.nudge_progress(ids[0], 10, 90);
		assert_eq!(registry.get(ids[0]).unwrap().state.progress(), 90);

		registry.update(
			ids[0],
			UploadState::Succeeded {
				url: "https://cdn.test/a.png".to_string(),
			},
		);
		registry.nudge_progress(ids[0], 10, 90);
		assert_eq!(registry.get(ids[0]).unwrap().state.progress(), 100);
	}

	#[test]
	fn update_reports_dismissed_tasks() {
		let (mut registry, ids) = registry_with(&["a.png"]);

		assert!(registry.remove(ids[0]).is_some());
		assert!(!registry.update(
			ids[0],
			UploadState::Succeeded {
				url: "https://cdn.test/a.png".to_string(),
			}
		));
	}
}
