use crate::types::{Exercise, Phase};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fallback used whenever a phase has no configured duration
pub const DEFAULT_PHASE_SECS: u32 = 4;

/// Partial mapping from phase to whole seconds
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMap(IndexMap<Phase, u32>);

impl DurationMap {
	pub fn new() -> Self {
		Self(IndexMap::new())
	}

	pub fn from_pairs(pairs: &[(Phase, u32)]) -> Self {
		Self(pairs.iter().copied().collect())
	}

	/// Default map for the custom exercise: every phase at 4 seconds
	pub fn custom_default() -> Self {
		Self(
			Phase::ALL
				.iter()
				.map(|phase| (*phase, DEFAULT_PHASE_SECS))
				.collect(),
		)
	}

	pub fn get(&self, phase: Phase) -> Option<u32> {
		self.0.get(&phase).copied()
	}

	/// Configured seconds, falling back to the default when absent
	pub fn seconds_for(&self, phase: Phase) -> u32 {
		self.get(phase).unwrap_or(DEFAULT_PHASE_SECS)
	}

	pub fn set(&mut self, phase: Phase, secs: u32) {
		self.0.insert(phase, secs);
	}

	/// Whether the phase takes part in the sequence
	pub fn is_active(&self, phase: Phase) -> bool {
		self.get(phase).is_some_and(|secs| secs > 0)
	}
}

/// Fixed duration map of a built-in exercise. `None` for the custom one.
pub fn builtin_durations(exercise: Exercise) -> Option<DurationMap> {
	use Phase::*;

	let pairs: &[(Phase, u32)] = match exercise {
		Exercise::BoxBreathing => &[(Inhale, 4), (HoldInhale, 4), (Exhale, 4), (HoldExhale, 4)],
		Exercise::FourSevenEight => &[(Inhale, 4), (HoldInhale, 7), (Exhale, 8)],
		Exercise::Diaphragmatic => &[(Inhale, 4), (Exhale, 6)],
		Exercise::PursedLip => &[(Inhale, 2), (Exhale, 4)],
		Exercise::Resonant => &[(Inhale, 5), (Exhale, 5)],
		Exercise::Triangle => &[(Inhale, 4), (HoldInhale, 4), (Exhale, 4)],
		Exercise::Custom => return None,
	};
	Some(DurationMap::from_pairs(pairs))
}

/// Effective duration map: built-in table, or the user's custom map
pub fn durations_for(exercise: Exercise, custom: &DurationMap) -> DurationMap {
	builtin_durations(exercise).unwrap_or_else(|| custom.clone())
}

/// Phases in declared order, minus any phase with a zero or missing duration
pub fn phase_sequence(durations: &DurationMap) -> Vec<Phase> {
	Phase::ALL
		.iter()
		.copied()
		.filter(|phase| durations.is_active(*phase))
		.collect()
}
