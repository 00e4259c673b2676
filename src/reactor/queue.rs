use super::event::{Event, Priority};
use std::collections::VecDeque;

/// FIFO per priority level. `pop` always drains the most urgent level first,
/// so a window close overtakes ticks already waiting.
pub struct EventQueue {
	levels: [VecDeque<Event>; Priority::ALL.len()],
}

impl EventQueue {
	pub fn new() -> Self {
		Self {
			levels: std::array::from_fn(|_| VecDeque::new()),
		}
	}

	pub fn push(&mut self, event: Event) {
		let priority = event.priority();
		self.levels[priority.as_index()].push_back(event);
	}

	pub fn pop(&mut self) -> Option<Event> {
		Priority::ALL
			.iter()
			.find_map(|priority| self.levels[priority.as_index()].pop_front())
	}

	pub fn len(&self) -> usize {
		self.levels.iter().map(VecDeque::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.levels.iter().all(VecDeque::is_empty)
	}
}

impl Default for EventQueue {
	fn default() -> Self {
		Self::new()
	}
}
