use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the upload pipeline and the gallery display behaviour.
///
/// The progress ramp is purely cosmetic: it signals "in flight" to the UI while the
/// remote call is outstanding and carries no correctness weight. Only a real result
/// from the object store can take a task to 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemOptions {
	/// Object-store key prefix under which every upload of this gallery lands.
	pub destination_prefix: String,
	/// Progress shown the moment an upload goes in flight.
	pub ramp_seed: u8,
	/// Increment applied on every ramp tick while the remote call is outstanding.
	pub ramp_step: u8,
	/// Ceiling the simulated ramp may reach, always below 100.
	pub ramp_ceiling: u8,
	/// How often the ramp ticks.
	pub ramp_interval: Duration,
	/// How long successful tasks stay visible after their batch completes.
	pub auto_dismiss_delay: Duration,
}

impl Default for SystemOptions {
	fn default() -> Self {
		Self {
			destination_prefix: "gallery".to_string(),
			ramp_seed: 5,
			ramp_step: 7,
			ramp_ceiling: 90,
			ramp_interval: Duration::from_millis(200),
			auto_dismiss_delay: Duration::from_secs(4),
		}
	}
}
