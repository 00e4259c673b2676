//! Animation timing derived from the current phase.
//!
//! Nothing here owns state: the view feeds in the phase, its duration and the
//! seconds spent in it, and gets back bar fill and circle scale.

use crate::types::{CONTRACTED_SCALE, Phase};

/// Timing of the animations for one phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseAnimation {
	pub phase: Phase,
	/// Length of the progress bar fill. One second shorter than the phase.
	pub bar_secs: u32,
	pub scale_from: f32,
	pub scale_to: f32,
	/// Length of the circle transition: the whole phase
	pub scale_secs: u32,
}

impl PhaseAnimation {
	/// `previous` is the phase that ran before this one, if any.
	pub fn derive(phase: Phase, previous: Option<Phase>, duration_secs: u32) -> Self {
		Self {
			phase,
			bar_secs: duration_secs.saturating_sub(1),
			scale_from: previous.map_or(CONTRACTED_SCALE, |p| p.target_scale()),
			scale_to: phase.target_scale(),
			scale_secs: duration_secs,
		}
	}

	/// Fraction of the progress bar filled after `elapsed` seconds
	pub fn bar_fill(&self, elapsed: f32) -> f32 {
		if self.bar_secs == 0 {
			return 1.0;
		}
		(elapsed / self.bar_secs as f32).clamp(0.0, 1.0)
	}

	/// Circle scale after `elapsed` seconds, eased
	pub fn circle_scale(&self, elapsed: f32) -> f32 {
		let t = if self.scale_secs == 0 {
			1.0
		} else {
			(elapsed / self.scale_secs as f32).clamp(0.0, 1.0)
		};
		let eased = t * t * (3.0 - 2.0 * t);
		self.scale_from + (self.scale_to - self.scale_from) * eased
	}
}

/// What the breathing window draws while no session is running
pub fn idle_scale() -> f32 {
	CONTRACTED_SCALE
}

/// Whole seconds as `MM:SS`
pub fn format_elapsed(secs: u64) -> String {
	format!("{:02}:{:02}", secs / 60, secs % 60)
}
