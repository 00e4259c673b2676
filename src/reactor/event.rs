use crate::types::{AppId, Exercise, Phase};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
	Breathing(BreathingEvent),
	Window(WindowEvent),
}

impl Event {
	pub fn priority(&self) -> Priority {
		match self {
			Event::Window(WindowEvent::Closed { .. }) => Priority::Critical,
			Event::Window(_) => Priority::High,
			Event::Breathing(BreathingEvent::PhaseElapsed { .. }) => Priority::Normal,
			Event::Breathing(BreathingEvent::Tick { .. }) => Priority::Low,
			Event::Breathing(_) => Priority::Normal,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
	Critical = 0,
	High = 1,
	Normal = 2,
	Low = 3,
}

impl Priority {
	/// Highest first, the order the queue drains in
	pub const ALL: [Priority; 4] = [
		Priority::Critical,
		Priority::High,
		Priority::Normal,
		Priority::Low,
	];

	pub fn as_index(&self) -> usize {
		*self as usize
	}
}

/// Handle of a scheduled task. Owned by exactly one component slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

impl TaskId {
	pub fn fresh() -> Self {
		Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum BreathingEvent {
	/// Begin looping through the phase sequence
	Start,
	/// Stop and go back to the first phase
	Reset,
	SelectExercise { exercise: Exercise },
	ToggleMute,
	SetMuted { muted: bool },
	/// Custom exercise editor changed a phase length
	SetCustomDuration { phase: Phase, secs: u32 },
	/// Phase-advance task fired
	PhaseElapsed { task: TaskId },
	/// One-second elapsed-counter task fired
	Tick { task: TaskId },
}

#[derive(Clone, Debug, PartialEq)]
pub enum WindowEvent {
	Open { app: AppId },
	/// User asked the host to close the window
	Close { app: AppId },
	/// Host has closed the window; the hosted app must release its tasks
	Closed { app: AppId },
}

/// Task the reactor should hand to the scheduler. `emit_at` is absolute so
/// chained tasks can be anchored to the previous deadline.
#[derive(Debug)]
pub struct ScheduledTask {
	pub id: TaskId,
	pub event: Event,
	pub emit_at: Instant,
}

/// Response from component.handle()
#[derive(Default, Debug)]
pub struct ComponentResponse {
	/// Events to dispatch immediately
	pub events: Vec<Event>,
	/// Events to schedule
	pub scheduled: Vec<ScheduledTask>,
	/// Tasks to drop before they fire
	pub cancelled: Vec<TaskId>,
}

impl ComponentResponse {
	pub fn none() -> Self {
		Self::default()
	}

	pub fn emit(event: Event) -> Self {
		Self {
			events: vec![event],
			..Default::default()
		}
	}

	pub fn schedule(id: TaskId, event: Event, emit_at: Instant) -> Self {
		Self {
			scheduled: vec![ScheduledTask { id, event, emit_at }],
			..Default::default()
		}
	}

	pub fn push_schedule(&mut self, id: TaskId, event: Event, emit_at: Instant) {
		self.scheduled.push(ScheduledTask { id, event, emit_at });
	}

	pub fn cancel(&mut self, id: TaskId) {
		self.cancelled.push(id);
	}

	pub fn merge(&mut self, other: ComponentResponse) {
		self.events.extend(other.events);
		self.scheduled.extend(other.scheduled);
		self.cancelled.extend(other.cancelled);
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.events.is_empty() && self.scheduled.is_empty() && self.cancelled.is_empty()
	}
}
