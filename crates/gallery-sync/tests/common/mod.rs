use std::{
	collections::HashSet,
	ops::Range,
	sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		Mutex,
	},
	time::Duration,
};

use async_trait::async_trait;
use pulse_gallery_sync::{
	AuthGate, DocumentStore, FileSource, ObjectStore, PersistError, SystemOptions, UploadError,
};
use rand::Rng;
use tokio::time::sleep;

/// Object store fake: configurable latency, per-file failure injection, optional true
/// multi-file upload support, and call counters.
pub struct FakeObjectStore {
	delay_ms: Option<Range<u64>>,
	failing: Mutex<HashSet<String>>,
	batch_capable: bool,
	pub single_calls: AtomicUsize,
	pub batch_calls: AtomicUsize,
}

impl FakeObjectStore {
	pub fn new() -> Self {
		Self {
			delay_ms: None,
			failing: Mutex::new(HashSet::new()),
			batch_capable: false,
			single_calls: AtomicUsize::new(0),
			batch_calls: AtomicUsize::new(0),
		}
	}

	pub fn with_delays(mut self, delay_ms: Range<u64>) -> Self {
		self.delay_ms = Some(delay_ms);
		self
	}

	pub fn with_batch_support(mut self) -> Self {
		self.batch_capable = true;
		self
	}

	pub fn failing_on(self, names: &[&str]) -> Self {
		self.set_failing(names);
		self
	}

	pub fn set_failing(&self, names: &[&str]) {
		*self.failing.lock().unwrap() = names.iter().map(ToString::to_string).collect();
	}

	async fn simulate_latency(&self) {
		if let Some(range) = &self.delay_ms {
			let delay = rand::thread_rng().gen_range(range.clone());
			sleep(Duration::from_millis(delay)).await;
		}
	}

	pub fn url_for(destination_prefix: &str, name: &str) -> String {
		format!("https://media.pulsefitness.io/{destination_prefix}/{name}")
	}
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
	async fn upload(
		&self,
		file: &FileSource,
		destination_prefix: &str,
	) -> Result<String, UploadError> {
		self.single_calls.fetch_add(1, Ordering::SeqCst);
		self.simulate_latency().await;

		if self.failing.lock().unwrap().contains(file.name()) {
			return Err(UploadError(format!("simulated outage for {}", file.name())));
		}

		Ok(Self::url_for(destination_prefix, file.name()))
	}

	fn supports_batch(&self) -> bool {
		self.batch_capable
	}

	async fn upload_batch(
		&self,
		files: &[FileSource],
		destination_prefix: &str,
	) -> Result<Vec<String>, UploadError> {
		self.batch_calls.fetch_add(1, Ordering::SeqCst);
		self.simulate_latency().await;

		let failing = self.failing.lock().unwrap().clone();

		if let Some(file) = files.iter().find(|file| failing.contains(file.name())) {
			return Err(UploadError(format!("simulated outage for {}", file.name())));
		}

		Ok(files
			.iter()
			.map(|file| Self::url_for(destination_prefix, file.name()))
			.collect())
	}
}

/// Document store fake recording every record it accepted; failures and latency are
/// switchable mid-test.
pub struct FakeDocumentStore {
	persisted: Mutex<Vec<Vec<String>>>,
	failing: AtomicBool,
	delay: Option<Duration>,
}

impl FakeDocumentStore {
	pub fn new() -> Self {
		Self {
			persisted: Mutex::new(Vec::new()),
			failing: AtomicBool::new(false),
			delay: None,
		}
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	pub fn fail_writes(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub fn persist_count(&self) -> usize {
		self.persisted.lock().unwrap().len()
	}

	pub fn persisted(&self) -> Vec<Vec<String>> {
		self.persisted.lock().unwrap().clone()
	}

	pub fn last_persisted(&self) -> Option<Vec<String>> {
		self.persisted.lock().unwrap().last().cloned()
	}
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
	async fn persist(&self, items: &[String]) -> Result<(), PersistError> {
		if let Some(delay) = self.delay {
			sleep(delay).await;
		}

		if self.failing.load(Ordering::SeqCst) {
			return Err(PersistError(
				"document store rejected the write".to_string(),
			));
		}

		self.persisted.lock().unwrap().push(items.to_vec());

		Ok(())
	}
}

pub struct StaticAuthGate(pub bool);

impl AuthGate for StaticAuthGate {
	fn is_authorized(&self) -> bool {
		self.0
	}
}

pub fn png(name: &str) -> FileSource {
	FileSource::new(name, "image/png", vec![0u8; 256])
}

pub fn movie(name: &str) -> FileSource {
	FileSource::new(name, "video/mp4", vec![0u8; 256])
}

pub fn png_of_size(name: &str, size: usize) -> FileSource {
	FileSource::new(name, "image/png", vec![0u8; size])
}

pub fn gallery_of(names: &[&str]) -> Vec<String> {
	names.iter().map(ToString::to_string).collect()
}

/// Production defaults with the waiting shrunk down to test scale.
pub fn fast_options() -> SystemOptions {
	SystemOptions {
		ramp_interval: Duration::from_millis(10),
		auto_dismiss_delay: Duration::from_millis(40),
		..SystemOptions::default()
	}
}
