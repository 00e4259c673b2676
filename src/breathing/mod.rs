pub mod exercise;
pub mod presentation;

use crate::audio::AudioCue;
use crate::reactor::{BreathingEvent, ComponentResponse, Event, TaskId, WindowEvent};
use crate::settings::{self, CUSTOM_DURATIONS_KEY, SettingsStore};
use crate::types::{AppId, Exercise, Phase};
use exercise::DurationMap;
use presentation::PhaseAnimation;
use std::time::{Duration, Instant};

/// Interval of the elapsed-time counter
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Breathing exercise session: loops through the phases of the selected
/// exercise while running, with an elapsed counter and a cue per phase change.
///
/// Owns at most one phase-advance task and one tick task. Every exit from
/// running cancels both, and a fired task whose id no longer matches its slot
/// is ignored.
pub struct BreathingSession {
	exercise: Exercise,
	custom: DurationMap,
	durations: DurationMap,
	sequence: Vec<Phase>,
	phase_index: usize,
	previous_phase: Option<Phase>,
	phase_started: Instant,
	run_started: Instant,
	running: bool,
	elapsed_secs: u64,
	muted: bool,

	phase_task: Option<TaskId>,
	tick_task: Option<TaskId>,

	store: Box<dyn SettingsStore>,
	cue: Box<dyn AudioCue>,
}

impl BreathingSession {
	pub fn new(
		exercise: Exercise,
		muted: bool,
		store: Box<dyn SettingsStore>,
		cue: Box<dyn AudioCue>,
	) -> Self {
		let custom = settings::get_or(
			store.as_ref(),
			CUSTOM_DURATIONS_KEY,
			DurationMap::custom_default(),
		);
		log::info!("Breathing session ready: {:?}, custom {:?}", exercise, custom);

		let mut session = Self {
			exercise,
			custom,
			durations: DurationMap::new(),
			sequence: Vec::new(),
			phase_index: 0,
			previous_phase: None,
			phase_started: Instant::now(),
			run_started: Instant::now(),
			running: false,
			elapsed_secs: 0,
			muted,
			phase_task: None,
			tick_task: None,
			store,
			cue,
		};
		session.rederive();
		session
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Breathing(BreathingEvent::Start) => self.start(),
			Event::Breathing(BreathingEvent::Reset) => self.reset(),
			Event::Breathing(BreathingEvent::SelectExercise { exercise }) => {
				self.select_exercise(*exercise)
			}
			Event::Breathing(BreathingEvent::ToggleMute) => {
				self.muted = !self.muted;
				log::debug!("Muted: {}", self.muted);
				ComponentResponse::none()
			}
			Event::Breathing(BreathingEvent::SetMuted { muted }) => {
				self.muted = *muted;
				ComponentResponse::none()
			}
			Event::Breathing(BreathingEvent::SetCustomDuration { phase, secs }) => {
				self.edit_custom(*phase, *secs)
			}
			Event::Breathing(BreathingEvent::PhaseElapsed { task }) => {
				if self.phase_task != Some(*task) {
					log::trace!("Dropping stale phase task {:?}", task);
					return ComponentResponse::none();
				}
				self.phase_task = None;
				self.advance()
			}
			Event::Breathing(BreathingEvent::Tick { task }) => {
				if self.tick_task != Some(*task) {
					log::trace!("Dropping stale tick task {:?}", task);
					return ComponentResponse::none();
				}
				self.tick_task = None;
				self.tick()
			}
			Event::Window(WindowEvent::Closed {
				app: AppId::Breathing,
			}) => {
				log::info!("Breathing window closed");
				self.reset()
			}
			_ => ComponentResponse::none(),
		}
	}

	fn start(&mut self) -> ComponentResponse {
		if self.running {
			return ComponentResponse::none();
		}
		if self.sequence.is_empty() {
			log::warn!("Every phase of {:?} is zero seconds, not starting", self.exercise);
			return ComponentResponse::none();
		}

		log::info!("Starting {:?}", self.exercise);
		self.running = true;
		self.phase_index = 0;
		self.previous_phase = None;
		let now = Instant::now();
		self.run_started = now;
		self.phase_started = now;
		self.elapsed_secs = 0;

		let mut response = self.schedule_tick();
		response.merge(self.resync_timers());
		response
	}

	fn reset(&mut self) -> ComponentResponse {
		if self.running {
			log::info!("Resetting {:?} after {}s", self.exercise, self.elapsed_secs);
		}
		self.running = false;
		self.phase_index = 0;
		self.previous_phase = None;
		self.elapsed_secs = 0;

		let mut response = ComponentResponse::none();
		if let Some(task) = self.tick_task.take() {
			response.cancel(task);
		}
		response.merge(self.resync_timers());
		response
	}

	fn select_exercise(&mut self, exercise: Exercise) -> ComponentResponse {
		let response = self.reset();
		log::debug!("Selected {:?}", exercise);
		self.exercise = exercise;
		self.rederive();
		response
	}

	fn edit_custom(&mut self, phase: Phase, secs: u32) -> ComponentResponse {
		if self.running {
			log::warn!("Ignoring edit of {:?} while running", phase);
			return ComponentResponse::none();
		}
		self.custom.set(phase, secs);
		settings::set(self.store.as_mut(), CUSTOM_DURATIONS_KEY, &self.custom);
		if self.exercise.is_custom() {
			self.rederive();
		}
		self.resync_timers()
	}

	fn advance(&mut self) -> ComponentResponse {
		if !self.running || self.sequence.is_empty() {
			return ComponentResponse::none();
		}
		// Next phase starts when the last one was due, not when it was handled
		let Some(ended_at) = self.phase_deadline() else {
			return ComponentResponse::none();
		};
		self.previous_phase = self.current_phase();
		self.phase_index = (self.phase_index + 1) % self.sequence.len();
		self.phase_started = ended_at;
		log::debug!("Phase -> {:?}", self.current_phase());

		if !self.muted {
			self.cue.play();
		}
		self.resync_timers()
	}

	fn tick(&mut self) -> ComponentResponse {
		if !self.running {
			return ComponentResponse::none();
		}
		self.elapsed_secs += 1;
		self.schedule_tick()
	}

	/// Tick n is due n seconds after start, however late earlier ticks ran
	fn schedule_tick(&mut self) -> ComponentResponse {
		let task = TaskId::fresh();
		self.tick_task = Some(task);
		let due = self.run_started + TICK_INTERVAL * (self.elapsed_secs as u32 + 1);
		ComponentResponse::schedule(task, Event::Breathing(BreathingEvent::Tick { task }), due)
	}

	fn phase_deadline(&self) -> Option<Instant> {
		let phase = self.current_phase()?;
		Some(self.phase_started + Duration::from_secs(u64::from(self.durations.seconds_for(phase))))
	}

	/// Cancel the phase task and, if still running, schedule a fresh one for
	/// the current phase. The only place phase tasks are created.
	fn resync_timers(&mut self) -> ComponentResponse {
		let mut response = ComponentResponse::none();
		if let Some(task) = self.phase_task.take() {
			response.cancel(task);
		}
		if !self.running {
			return response;
		}
		let Some(due) = self.phase_deadline() else {
			return response;
		};

		let task = TaskId::fresh();
		self.phase_task = Some(task);
		response.push_schedule(task, Event::Breathing(BreathingEvent::PhaseElapsed { task }), due);
		response
	}

	fn rederive(&mut self) {
		self.durations = exercise::durations_for(self.exercise, &self.custom);
		self.sequence = exercise::phase_sequence(&self.durations);
		if self.sequence.is_empty() {
			self.phase_index = 0;
		} else {
			self.phase_index %= self.sequence.len();
		}
	}

	// Accessors for ViewManager
	pub fn exercise(&self) -> Exercise {
		self.exercise
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn is_muted(&self) -> bool {
		self.muted
	}

	pub fn can_start(&self) -> bool {
		!self.running && !self.sequence.is_empty()
	}

	#[cfg(test)]
	pub fn elapsed_secs(&self) -> u64 {
		self.elapsed_secs
	}

	pub fn elapsed_display(&self) -> String {
		presentation::format_elapsed(self.elapsed_secs)
	}

	pub fn sequence(&self) -> &[Phase] {
		&self.sequence
	}

	pub fn phase_index(&self) -> usize {
		self.phase_index
	}

	pub fn current_phase(&self) -> Option<Phase> {
		if self.sequence.is_empty() {
			return None;
		}
		self.sequence.get(self.phase_index % self.sequence.len()).copied()
	}

	/// Effective durations of the selected exercise
	pub fn durations(&self) -> &DurationMap {
		&self.durations
	}

	pub fn custom_durations(&self) -> &DurationMap {
		&self.custom
	}

	/// Seconds spent in the current phase so far
	pub fn phase_elapsed(&self) -> f32 {
		self.phase_started.elapsed().as_secs_f32()
	}

	/// Animation of the current phase. `None` while idle or with no phases.
	pub fn animation(&self) -> Option<PhaseAnimation> {
		if !self.running {
			return None;
		}
		let phase = self.current_phase()?;
		Some(PhaseAnimation::derive(
			phase,
			self.previous_phase,
			self.durations.seconds_for(phase),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reactor::ScheduledTask;
	use serde_json::Value;
	use std::cell::{Cell, RefCell};
	use std::collections::HashMap;
	use std::rc::Rc;

	#[derive(Clone, Default)]
	struct CountingCue(Rc<Cell<usize>>);

	impl AudioCue for CountingCue {
		fn play(&self) {
			self.0.set(self.0.get() + 1);
		}
	}

	#[derive(Clone, Default)]
	struct SharedStore(Rc<RefCell<HashMap<String, Value>>>);

	impl SettingsStore for SharedStore {
		fn load(&self, key: &str) -> anyhow::Result<Option<Value>> {
			Ok(self.0.borrow().get(key).cloned())
		}

		fn save(&mut self, key: &str, value: Value) -> anyhow::Result<()> {
			self.0.borrow_mut().insert(key.to_owned(), value);
			Ok(())
		}
	}

	fn session(exercise: Exercise) -> (BreathingSession, CountingCue, SharedStore) {
		let cue = CountingCue::default();
		let store = SharedStore::default();
		let session = BreathingSession::new(
			exercise,
			false,
			Box::new(store.clone()),
			Box::new(cue.clone()),
		);
		(session, cue, store)
	}

	fn send(session: &mut BreathingSession, event: BreathingEvent) -> ComponentResponse {
		session.handle(&Event::Breathing(event))
	}

	fn phase_task(response: &ComponentResponse) -> Option<&ScheduledTask> {
		response
			.scheduled
			.iter()
			.find(|t| matches!(t.event, Event::Breathing(BreathingEvent::PhaseElapsed { .. })))
	}

	fn tick_task(response: &ComponentResponse) -> Option<&ScheduledTask> {
		response
			.scheduled
			.iter()
			.find(|t| matches!(t.event, Event::Breathing(BreathingEvent::Tick { .. })))
	}

	/// Deliver the phase task found in `response`, as the scheduler would
	fn fire_phase(session: &mut BreathingSession, response: &ComponentResponse) -> ComponentResponse {
		let task = phase_task(response).expect("phase task scheduled");
		session.handle(&task.event.clone())
	}

	fn fire_tick(session: &mut BreathingSession, response: &ComponentResponse) -> ComponentResponse {
		let task = tick_task(response).expect("tick task scheduled");
		session.handle(&task.event.clone())
	}

	#[test]
	fn start_schedules_first_phase_and_tick() {
		let (mut session, _, _) = session(Exercise::FourSevenEight);
		let response = send(&mut session, BreathingEvent::Start);

		assert!(session.is_running());
		assert_eq!(session.current_phase(), Some(Phase::Inhale));
		let phase_due = phase_task(&response).unwrap().emit_at;
		let tick_due = tick_task(&response).unwrap().emit_at;
		assert_eq!(phase_due - tick_due, Duration::from_secs(3));
		assert_eq!(response.scheduled.len(), 2);
	}

	#[test]
	fn advances_once_per_phase_and_wraps() {
		let (mut session, cue, _) = session(Exercise::FourSevenEight);
		let mut response = send(&mut session, BreathingEvent::Start);
		let mut due = phase_task(&response).unwrap().emit_at;

		let expected = [
			(Phase::HoldInhale, 7),
			(Phase::Exhale, 8),
			(Phase::Inhale, 4),
			(Phase::HoldInhale, 7),
		];
		for (i, (phase, secs)) in expected.iter().enumerate() {
			response = fire_phase(&mut session, &response);
			assert_eq!(session.current_phase(), Some(*phase));
			let next_due = phase_task(&response).unwrap().emit_at;
			assert_eq!(next_due - due, Duration::from_secs(*secs));
			due = next_due;
			assert_eq!(response.scheduled.len(), 1);
			assert_eq!(cue.0.get(), i + 1);
		}
		assert_eq!(session.phase_index(), 1);
	}

	#[test]
	fn fired_task_is_consumed() {
		let (mut session, _, _) = session(Exercise::Diaphragmatic);
		let start = send(&mut session, BreathingEvent::Start);
		fire_phase(&mut session, &start);
		assert_eq!(session.current_phase(), Some(Phase::Exhale));

		// Same task delivered twice must not advance again
		let again = fire_phase(&mut session, &start);
		assert!(again.is_empty());
		assert_eq!(session.current_phase(), Some(Phase::Exhale));
	}

	#[test]
	fn elapsed_counts_whole_seconds_while_running() {
		let (mut session, _, _) = session(Exercise::BoxBreathing);
		let mut response = send(&mut session, BreathingEvent::Start);
		for _ in 0..65 {
			response = fire_tick(&mut session, &response);
		}
		assert_eq!(session.elapsed_secs(), 65);
		assert_eq!(session.elapsed_display(), "01:05");
	}

	#[test]
	fn ticks_chain_from_their_own_deadlines() {
		let (mut session, _, _) = session(Exercise::BoxBreathing);
		let mut response = send(&mut session, BreathingEvent::Start);
		let first = tick_task(&response).unwrap().emit_at;

		for n in 1..=5u32 {
			// Handling time never leaks into the next deadline
			std::thread::sleep(Duration::from_millis(2));
			response = fire_tick(&mut session, &response);
			let due = tick_task(&response).unwrap().emit_at;
			assert_eq!(due - first, TICK_INTERVAL * n);
		}
		assert_eq!(session.elapsed_display(), "00:05");
	}

	#[test]
	fn late_phase_change_keeps_the_cadence() {
		let (mut session, _, _) = session(Exercise::Diaphragmatic);
		let start = send(&mut session, BreathingEvent::Start);
		let inhale_due = phase_task(&start).unwrap().emit_at;

		std::thread::sleep(Duration::from_millis(5));
		let exhale = fire_phase(&mut session, &start);
		let exhale_due = phase_task(&exhale).unwrap().emit_at;
		assert_eq!(exhale_due - inhale_due, Duration::from_secs(6));
	}

	#[test]
	fn reset_cancels_everything_and_returns_to_first_phase() {
		let (mut session, _, _) = session(Exercise::BoxBreathing);
		let start = send(&mut session, BreathingEvent::Start);
		let advanced = fire_phase(&mut session, &start);
		let ticked = fire_tick(&mut session, &start);

		let reset = send(&mut session, BreathingEvent::Reset);
		assert!(!session.is_running());
		assert_eq!(session.phase_index(), 0);
		assert_eq!(session.elapsed_secs(), 0);
		assert!(reset.scheduled.is_empty());
		assert!(reset.cancelled.contains(&phase_task(&advanced).unwrap().id));
		assert!(reset.cancelled.contains(&tick_task(&ticked).unwrap().id));

		// Stale tasks that slipped through are ignored
		assert!(fire_phase(&mut session, &advanced).is_empty());
		assert!(fire_tick(&mut session, &ticked).is_empty());
		assert_eq!(session.phase_index(), 0);
		assert_eq!(session.elapsed_secs(), 0);
	}

	#[test]
	fn restart_counts_from_zero() {
		let (mut session, _, _) = session(Exercise::BoxBreathing);
		let start = send(&mut session, BreathingEvent::Start);
		fire_tick(&mut session, &start);
		send(&mut session, BreathingEvent::Reset);

		let restart = send(&mut session, BreathingEvent::Start);
		assert_eq!(session.elapsed_secs(), 0);
		fire_tick(&mut session, &restart);
		assert_eq!(session.elapsed_display(), "00:01");
	}

	#[test]
	fn start_while_running_is_ignored() {
		let (mut session, _, _) = session(Exercise::BoxBreathing);
		send(&mut session, BreathingEvent::Start);
		assert!(send(&mut session, BreathingEvent::Start).is_empty());
	}

	#[test]
	fn changing_exercise_while_running_resets_idempotently() {
		let (mut session, _, _) = session(Exercise::BoxBreathing);
		let start = send(&mut session, BreathingEvent::Start);
		fire_phase(&mut session, &start);

		let change = BreathingEvent::SelectExercise {
			exercise: Exercise::Diaphragmatic,
		};
		let first = send(&mut session, change.clone());
		assert!(!session.is_running());
		assert_eq!(session.phase_index(), 0);
		assert_eq!(first.cancelled.len(), 2);
		assert_eq!(session.sequence(), &[Phase::Inhale, Phase::Exhale]);

		let second = send(&mut session, change);
		assert!(second.is_empty());
		assert!(!session.is_running());
		assert_eq!(session.phase_index(), 0);
		assert_eq!(session.exercise(), Exercise::Diaphragmatic);
	}

	#[test]
	fn mute_is_read_at_each_advance() {
		let (mut session, cue, _) = session(Exercise::BoxBreathing);
		let start = send(&mut session, BreathingEvent::Start);

		send(&mut session, BreathingEvent::ToggleMute);
		let muted_advance = fire_phase(&mut session, &start);
		assert_eq!(cue.0.get(), 0);

		send(&mut session, BreathingEvent::SetMuted { muted: false });
		fire_phase(&mut session, &muted_advance);
		assert_eq!(cue.0.get(), 1);
		assert!(session.is_running());
	}

	#[test]
	fn all_zero_custom_never_runs() {
		let (mut session, _, _) = session(Exercise::Custom);
		for phase in Phase::ALL {
			send(&mut session, BreathingEvent::SetCustomDuration { phase, secs: 0 });
		}
		assert!(!session.can_start());
		assert_eq!(session.current_phase(), None);

		let response = send(&mut session, BreathingEvent::Start);
		assert!(response.is_empty());
		assert!(!session.is_running());
		assert!(session.animation().is_none());
	}

	#[test]
	fn custom_edit_zero_and_restore() {
		let (mut session, _, _) = session(Exercise::Custom);
		send(
			&mut session,
			BreathingEvent::SetCustomDuration {
				phase: Phase::HoldInhale,
				secs: 0,
			},
		);
		assert_eq!(
			session.sequence(),
			&[Phase::Inhale, Phase::Exhale, Phase::HoldExhale]
		);

		send(
			&mut session,
			BreathingEvent::SetCustomDuration {
				phase: Phase::HoldInhale,
				secs: 3,
			},
		);
		assert_eq!(
			session.sequence(),
			&[Phase::Inhale, Phase::HoldInhale, Phase::Exhale, Phase::HoldExhale]
		);

		let start = send(&mut session, BreathingEvent::Start);
		let hold = fire_phase(&mut session, &start);
		let hold_secs = phase_task(&hold).unwrap().emit_at - phase_task(&start).unwrap().emit_at;
		assert_eq!(hold_secs, Duration::from_secs(3));
	}

	#[test]
	fn custom_edits_persist_and_reload() {
		let (mut session, _, store) = session(Exercise::BoxBreathing);
		send(
			&mut session,
			BreathingEvent::SetCustomDuration {
				phase: Phase::Exhale,
				secs: 9,
			},
		);
		// Built-in exercise is unaffected by the custom map
		assert_eq!(session.sequence().len(), 4);

		let reloaded = BreathingSession::new(
			Exercise::Custom,
			false,
			Box::new(store.clone()),
			Box::new(CountingCue::default()),
		);
		assert_eq!(reloaded.custom_durations().get(Phase::Exhale), Some(9));
		assert_eq!(reloaded.custom_durations().get(Phase::Inhale), Some(4));
	}

	#[test]
	fn custom_edit_rejected_while_running() {
		let (mut session, _, store) = session(Exercise::Custom);
		send(&mut session, BreathingEvent::Start);
		let response = send(
			&mut session,
			BreathingEvent::SetCustomDuration {
				phase: Phase::Inhale,
				secs: 0,
			},
		);
		assert!(response.is_empty());
		assert_eq!(session.custom_durations().get(Phase::Inhale), Some(4));
		assert!(store.0.borrow().is_empty());
	}

	#[test]
	fn window_close_behaves_like_reset() {
		let (mut session, _, _) = session(Exercise::BoxBreathing);
		send(&mut session, BreathingEvent::Start);
		let response = session.handle(&Event::Window(WindowEvent::Closed {
			app: AppId::Breathing,
		}));
		assert!(!session.is_running());
		assert_eq!(response.cancelled.len(), 2);
	}

	#[test]
	fn animation_follows_the_running_phase() {
		let (mut session, _, _) = session(Exercise::Diaphragmatic);
		assert!(session.animation().is_none());

		let start = send(&mut session, BreathingEvent::Start);
		let inhale = session.animation().unwrap();
		assert_eq!(inhale.phase, Phase::Inhale);
		assert_eq!(inhale.bar_secs, 3);

		fire_phase(&mut session, &start);
		let exhale = session.animation().unwrap();
		assert_eq!(exhale.phase, Phase::Exhale);
		assert_eq!(exhale.bar_secs, 5);
		assert_eq!(exhale.scale_from, Phase::Inhale.target_scale());
	}
}
