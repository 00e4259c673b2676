use serde::{Deserialize, Serialize};

/// Breathing timer phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
	Inhale,
	HoldInhale,
	Exhale,
	HoldExhale,
}

impl Phase {
	/// Declared order of every exercise, before filtering
	pub const ALL: [Phase; 4] = [
		Phase::Inhale,
		Phase::HoldInhale,
		Phase::Exhale,
		Phase::HoldExhale,
	];

	pub fn label(&self) -> &'static str {
		match self {
			Phase::Inhale => "Breathe In",
			Phase::HoldInhale | Phase::HoldExhale => "Hold",
			Phase::Exhale => "Breathe Out",
		}
	}

	/// Name shown next to the custom duration editor
	pub fn editor_label(&self) -> &'static str {
		match self {
			Phase::Inhale => "Inhale",
			Phase::HoldInhale => "Hold (in)",
			Phase::Exhale => "Exhale",
			Phase::HoldExhale => "Hold (out)",
		}
	}

	/// Lungs full: circle drawn at the expanded scale
	pub fn is_expanded(&self) -> bool {
		matches!(self, Phase::Inhale | Phase::HoldInhale)
	}

	pub fn target_scale(&self) -> f32 {
		if self.is_expanded() {
			EXPANDED_SCALE
		} else {
			CONTRACTED_SCALE
		}
	}
}

pub const EXPANDED_SCALE: f32 = 1.5;
pub const CONTRACTED_SCALE: f32 = 1.0;

/// Selectable breathing exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Exercise {
	#[default]
	BoxBreathing,
	FourSevenEight,
	Diaphragmatic,
	PursedLip,
	Resonant,
	Triangle,
	Custom,
}

impl Exercise {
	pub const ALL: [Exercise; 7] = [
		Exercise::BoxBreathing,
		Exercise::FourSevenEight,
		Exercise::Diaphragmatic,
		Exercise::PursedLip,
		Exercise::Resonant,
		Exercise::Triangle,
		Exercise::Custom,
	];

	pub fn label(&self) -> &'static str {
		match self {
			Exercise::BoxBreathing => "Box Breathing",
			Exercise::FourSevenEight => "4-7-8 Breathing",
			Exercise::Diaphragmatic => "Diaphragmatic Breathing",
			Exercise::PursedLip => "Pursed Lip Breathing",
			Exercise::Resonant => "Resonant Breathing",
			Exercise::Triangle => "Triangle Breathing",
			Exercise::Custom => "Custom",
		}
	}

	pub fn is_custom(&self) -> bool {
		matches!(self, Exercise::Custom)
	}
}

/// Apps that can be hosted in a desktop window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppId {
	Breathing,
}

impl AppId {
	pub const ALL: [AppId; 1] = [AppId::Breathing];

	pub fn title(&self) -> &'static str {
		match self {
			AppId::Breathing => "Breathing Exercise",
		}
	}

	pub fn icon(&self) -> &'static str {
		match self {
			AppId::Breathing => "🌬",
		}
	}
}
