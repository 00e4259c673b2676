use super::event::{Event, TaskId};
use super::queue::EventQueue;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Instant;

struct ScheduledEvent {
	emit_at: Instant,
	id: TaskId,
	event: Event,
}

impl PartialEq for ScheduledEvent {
	fn eq(&self, other: &Self) -> bool {
		self.emit_at == other.emit_at && self.id == other.id
	}
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for ScheduledEvent {
	fn cmp(&self, other: &Self) -> Ordering {
		// Min-heap on deadline, oldest task first on ties
		other
			.emit_at
			.cmp(&self.emit_at)
			.then_with(|| other.id.cmp(&self.id))
	}
}

/// Delayed one-shot tasks. A cancelled task never reaches the queue.
pub struct Scheduler {
	pending: BinaryHeap<ScheduledEvent>,
	live: HashSet<TaskId>,
}

impl Scheduler {
	pub fn new() -> Self {
		Self {
			pending: BinaryHeap::new(),
			live: HashSet::new(),
		}
	}

	/// Schedule an event to fire once `emit_at` has passed. A deadline already
	/// in the past fires on the next poll.
	pub fn schedule(&mut self, id: TaskId, event: Event, emit_at: Instant) {
		log::trace!("Scheduling {:?} at {:?}", id, emit_at);
		self.live.insert(id);
		self.pending.push(ScheduledEvent { emit_at, id, event });
	}

	/// Drop a task before it fires. Returns false if it already fired or never existed.
	pub fn cancel(&mut self, id: TaskId) -> bool {
		let removed = self.live.remove(&id);
		if removed {
			log::trace!("Cancelled {:?}", id);
		}
		if self.live.is_empty() {
			self.pending.clear();
		}
		removed
	}

	/// Poll and drain events due at `now` into the queue
	pub fn tick_at(&mut self, now: Instant, queue: &mut EventQueue) {
		while let Some(scheduled) = self.pending.peek() {
			if scheduled.emit_at > now {
				break;
			}
			let Some(scheduled) = self.pending.pop() else {
				break;
			};
			if self.live.remove(&scheduled.id) {
				queue.push(scheduled.event);
			}
		}
	}

	/// Earliest deadline among live tasks
	pub fn next_deadline(&self) -> Option<Instant> {
		self.pending
			.iter()
			.filter(|s| self.live.contains(&s.id))
			.map(|s| s.emit_at)
			.min()
	}

	#[cfg(test)]
	pub fn pending_count(&self) -> usize {
		self.live.len()
	}
}

impl Default for Scheduler {
	fn default() -> Self {
		Self::new()
	}
}
