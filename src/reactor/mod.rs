pub mod event;
pub mod queue;
pub mod scheduler;

pub use event::{
	BreathingEvent, ComponentResponse, Event, ScheduledTask, TaskId, WindowEvent,
};
pub use queue::EventQueue;
pub use scheduler::Scheduler;

use crate::audio::AudioCue;
use crate::breathing::BreathingSession;
use crate::desktop::{Desktop, DesktopLayout, LAYOUT_KEY};
use crate::settings::{AppConfig, SettingsStore};
use crate::types::AppId;
use crate::view::ViewManager;
use eframe::egui;
use std::time::Instant;

/// Upper bound on events handled per frame
const MAX_ITERATIONS: usize = 1000;

pub struct Reactor {
	queue: EventQueue,
	scheduler: Scheduler,

	pub breathing: BreathingSession,
	pub desktop: Desktop,
	pub view: ViewManager,
}

impl Reactor {
	pub fn new(
		config: &AppConfig,
		layout: DesktopLayout,
		store: Box<dyn SettingsStore>,
		cue: Box<dyn AudioCue>,
	) -> Self {
		log::info!("Initializing all components");
		let reactor = Self {
			queue: EventQueue::new(),
			scheduler: Scheduler::new(),
			breathing: BreathingSession::new(
				config.default_exercise,
				config.start_muted,
				store,
				cue,
			),
			desktop: Desktop::new(layout),
			view: ViewManager::new(),
		};
		log::info!("Initialization complete");
		reactor
	}

	fn process_response(&mut self, response: ComponentResponse) {
		for id in response.cancelled {
			self.scheduler.cancel(id);
		}
		for e in response.events {
			self.queue.push(e);
		}
		for task in response.scheduled {
			self.scheduler.schedule(task.id, task.event, task.emit_at);
		}
	}

	/// Queue an event for the next pump
	pub fn dispatch(&mut self, event: Event) {
		self.queue.push(event);
	}

	/// Handle everything queued and every task due by `now`. Tasks scheduled
	/// while handling that are already due (a late frame) fire in the same pump.
	pub fn pump(&mut self, now: Instant) {
		let mut iterations = 0;
		loop {
			if self.queue.is_empty() {
				self.scheduler.tick_at(now, &mut self.queue);
			}
			let Some(event) = self.queue.pop() else {
				break;
			};
			log::trace!("Processing event: {:?}", event);
			let response = self.route(&event);
			self.process_response(response);

			iterations += 1;
			if iterations > MAX_ITERATIONS {
				log::warn!(
					"Event loop exceeded {} iterations, breaking with {} events queued",
					MAX_ITERATIONS,
					self.queue.len()
				);
				break;
			}
		}
	}

	pub fn tick(&mut self, ctx: &egui::Context) {
		self.pump(Instant::now());

		let events = self.view.render(ctx, &self.desktop, &self.breathing);

		// Process any events from rendering immediately
		for event in events {
			log::trace!("Processing render event: {:?}", event);
			self.dispatch(event);
		}
		self.pump(Instant::now());

		// Wake up for the next task even without input
		if let Some(deadline) = self.scheduler.next_deadline() {
			ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
		}
	}

	fn route(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Window(WindowEvent::Closed { app }) => self.route_closed(*app, event),
			Event::Window(_) => self.desktop.handle(event),
			Event::Breathing(_) => self.breathing.handle(event),
		}
	}

	/// Hand a host close to the app that lived in the window
	fn route_closed(&mut self, app: AppId, event: &Event) -> ComponentResponse {
		match app {
			AppId::Breathing => self.breathing.handle(event),
		}
	}

	#[cfg(test)]
	pub fn pending_tasks(&self) -> usize {
		self.scheduler.pending_count()
	}
}

impl eframe::App for Reactor {
	fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
		self.tick(ctx);
	}

	fn save(&mut self, storage: &mut dyn eframe::Storage) {
		eframe::set_value(storage, LAYOUT_KEY, &self.desktop.layout());
	}
}
