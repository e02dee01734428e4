use crate::{error::RejectionReason, source::FileSource};

/// Admission rules applied to a candidate batch before any upload begins.
///
/// Supplied by the caller on every admission, never mutated by the engine.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UploadPolicy {
	/// Accepted content types, e.g. `image/jpeg`.
	pub allowed_types: Vec<String>,
	/// Maximum size of a single file, in bytes.
	pub max_file_size: u64,
	/// Maximum number of items the gallery may hold in total.
	pub max_items: usize,
}

impl UploadPolicy {
	fn allows_type(&self, content_type: &str) -> bool {
		self.allowed_types
			.iter()
			.any(|allowed| allowed.eq_ignore_ascii_case(content_type))
	}
}

impl Default for UploadPolicy {
	fn default() -> Self {
		Self {
			allowed_types: ["image/jpeg", "image/png", "image/webp", "image/gif"]
				.map(String::from)
				.to_vec(),
			max_file_size: 10 * 1024 * 1024,
			max_items: 60,
		}
	}
}

/// A file refused admission, keyed by name so the caller can point at the offender.
#[derive(Debug, Clone)]
pub struct Rejection {
	pub file_name: String,
	pub reason: RejectionReason,
}

/// Splits a candidate batch into admissible files and per-file rejections.
///
/// Each file is judged on its own; one offending file never blocks its siblings.
/// Remaining gallery capacity is consumed by admitted files in submission order, so a
/// file rejected for its type or size does not use up a slot.
#[must_use]
pub fn screen_batch(
	files: Vec<FileSource>,
	current_len: usize,
	policy: &UploadPolicy,
) -> (Vec<FileSource>, Vec<Rejection>) {
	let mut admitted = Vec::with_capacity(files.len());
	let mut rejected = Vec::new();

	let mut remaining_capacity = policy.max_items.saturating_sub(current_len);

	for file in files {
		let reason = if !policy.allows_type(file.content_type()) {
			Some(RejectionReason::UnsupportedType)
		} else if file.size_in_bytes() > policy.max_file_size {
			Some(RejectionReason::TooLarge)
		} else if remaining_capacity == 0 {
			Some(RejectionReason::CapacityExceeded)
		} else {
			None
		};

		if let Some(reason) = reason {
			rejected.push(Rejection {
				file_name: file.name().to_string(),
				reason,
			});
		} else {
			remaining_capacity -= 1;
			admitted.push(file);
		}
	}

	(admitted, rejected)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn file(name: &str, content_type: &str, size: usize) -> FileSource {
		FileSource::new(name, content_type, vec![0u8; size])
	}

	fn policy(max_items: usize) -> UploadPolicy {
		UploadPolicy {
			max_items,
			max_file_size: 1024,
			..UploadPolicy::default()
		}
	}

	#[test]
	fn one_offender_does_not_block_siblings() {
		let files = vec![
			file("a.png", "image/png", 10),
			file("b.png", "image/png", 10),
			file("c.png", "image/png", 4096),
			file("d.png", "image/png", 10),
			file("e.png", "image/png", 10),
		];

		let (admitted, rejected) = screen_batch(files, 0, &policy(10));

		assert_eq!(admitted.len(), 4);
		assert_eq!(rejected.len(), 1);
		assert_eq!(rejected[0].file_name, "c.png");
		assert_eq!(rejected[0].reason, RejectionReason::TooLarge);
	}

	#[test]
	fn capacity_is_consumed_in_submission_order() {
		let files = (0..5)
			.map(|i| file(&format!("{i}.png"), "image/png", 10))
			.collect();

		let (admitted, rejected) = screen_batch(files, 8, &policy(10));

		assert_eq!(admitted.len(), 2);
		assert_eq!(
			admitted.iter().map(FileSource::name).collect::<Vec<_>>(),
			["0.png", "1.png"]
		);
		assert_eq!(rejected.len(), 3);
		assert!(rejected
			.iter()
			.all(|r| r.reason == RejectionReason::CapacityExceeded));
	}

	#[test]
	fn unsupported_types_do_not_use_up_slots() {
		let files = vec![
			file("clip.mp4", "video/mp4", 10),
			file("a.png", "image/png", 10),
		];

		let (admitted, rejected) = screen_batch(files, 9, &policy(10));

		assert_eq!(admitted.len(), 1);
		assert_eq!(admitted[0].name(), "a.png");
		assert_eq!(rejected[0].reason, RejectionReason::UnsupportedType);
	}

	#[test]
	fn full_gallery_rejects_everything() {
		let files = vec![file("a.png", "image/png", 10)];

		let (admitted, rejected) = screen_batch(files, 12, &policy(10));

		assert!(admitted.is_empty());
		assert_eq!(rejected[0].reason, RejectionReason::CapacityExceeded);
	}
}
