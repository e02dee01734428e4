use std::{fmt, sync::Arc};

/// Handle to a candidate file's binary content.
///
/// The bytes are reference counted, so admitting a file into the upload pipeline never
/// copies its content: the preview and every upload attempt point at the same buffer.
#[derive(Clone)]
pub struct FileSource {
	name: String,
	content_type: String,
	bytes: Arc<[u8]>,
}

impl FileSource {
	pub fn new(
		name: impl Into<String>,
		content_type: impl Into<String>,
		bytes: impl Into<Arc<[u8]>>,
	) -> Self {
		Self {
			name: name.into(),
			content_type: content_type.into(),
			bytes: bytes.into(),
		}
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn content_type(&self) -> &str {
		&self.content_type
	}

	#[must_use]
	pub fn size_in_bytes(&self) -> u64 {
		self.bytes.len() as u64
	}

	#[must_use]
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}
}

impl fmt::Debug for FileSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FileSource")
			.field("name", &self.name)
			.field("content_type", &self.content_type)
			.field("size_in_bytes", &self.bytes.len())
			.finish()
	}
}

/// A locally derived preview, available to renderers from the moment a file is admitted
/// and untouched by whatever happens to the upload itself.
#[derive(Debug, Clone)]
pub struct Preview {
	content_type: String,
	bytes: Arc<[u8]>,
}

impl Preview {
	pub(crate) fn from_source(source: &FileSource) -> Self {
		Self {
			content_type: source.content_type.clone(),
			bytes: Arc::clone(&source.bytes),
		}
	}

	#[must_use]
	pub fn content_type(&self) -> &str {
		&self.content_type
	}

	#[must_use]
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}
}
