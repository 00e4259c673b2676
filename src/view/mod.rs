use crate::breathing::BreathingSession;
use crate::breathing::presentation;
use crate::desktop::Desktop;
use crate::reactor::{BreathingEvent, Event, WindowEvent};
use crate::types::{AppId, Exercise, Phase};
use eframe::egui;

/// Largest value offered by the custom duration editor
const MAX_CUSTOM_SECS: u32 = 60;

/// Base radius of the breathing circle at scale 1.0
const CIRCLE_RADIUS: f32 = 56.0;

pub struct ViewManager {
	circle_area: f32,
}

impl ViewManager {
	pub fn new() -> Self {
		Self {
			circle_area: CIRCLE_RADIUS * 2.0 * crate::types::EXPANDED_SCALE + 16.0,
		}
	}

	/// Main render function of the whole thing
	pub fn render(
		&mut self,
		ctx: &egui::Context,
		desktop: &Desktop,
		breathing: &BreathingSession,
	) -> Vec<Event> {
		let mut events = Vec::new();

		let is_typing = ctx.memory(|m| m.focused().is_some());
		if !is_typing && desktop.is_open(AppId::Breathing) {
			self.handle_keyboard_input(ctx, breathing, &mut events);
		}

		self.render_toolbox(ctx, desktop, &mut events);

		egui::CentralPanel::default().show(ctx, |ui| {
			if desktop.open_apps().next().is_none() {
				ui.centered_and_justified(|ui| {
					ui.label("Open a tool from the toolbox.");
				});
			}
		});

		for app in desktop.open_apps() {
			let mut open = true;
			egui::Window::new(app.title())
				.id(egui::Id::new(app))
				.open(&mut open)
				.resizable(false)
				.collapsible(false)
				.show(ctx, |ui| match app {
					AppId::Breathing => self.render_breathing(ui, breathing, &mut events),
				});
			if !open {
				events.push(Event::Window(WindowEvent::Close { app }));
			}
		}

		events
	}

	/// Space starts or resets the session, M toggles the cue
	fn handle_keyboard_input(
		&self,
		ctx: &egui::Context,
		breathing: &BreathingSession,
		events: &mut Vec<Event>,
	) {
		let space_pressed = ctx.input(|i| i.key_pressed(egui::Key::Space));
		let m_pressed = ctx.input(|i| i.key_pressed(egui::Key::M));

		if space_pressed {
			if breathing.is_running() {
				events.push(Event::Breathing(BreathingEvent::Reset));
			} else if breathing.can_start() {
				events.push(Event::Breathing(BreathingEvent::Start));
			}
		}
		if m_pressed {
			events.push(Event::Breathing(BreathingEvent::ToggleMute));
		}
	}

	fn render_toolbox(&self, ctx: &egui::Context, desktop: &Desktop, events: &mut Vec<Event>) {
		egui::SidePanel::left("toolbox")
			.resizable(false)
			.exact_width(64.0)
			.show(ctx, |ui| {
				ui.vertical_centered(|ui| {
					ui.add_space(8.0);
					for app in AppId::ALL {
						let icon = egui::RichText::new(app.icon()).size(28.0);
						let response = ui
							.selectable_label(desktop.is_open(app), icon)
							.on_hover_text(app.title());
						if response.clicked() && !desktop.is_open(app) {
							events.push(Event::Window(WindowEvent::Open { app }));
						}
					}
				});
			});
	}

	fn render_breathing(
		&self,
		ui: &mut egui::Ui,
		breathing: &BreathingSession,
		events: &mut Vec<Event>,
	) {
		ui.set_width(280.0);

		let current = breathing.exercise();
		egui::ComboBox::from_id_salt("breathing_exercise")
			.selected_text(current.label())
			.width(260.0)
			.show_ui(ui, |ui| {
				for exercise in Exercise::ALL {
					if ui
						.selectable_label(exercise == current, exercise.label())
						.clicked()
					{
						events.push(Event::Breathing(BreathingEvent::SelectExercise { exercise }));
					}
				}
			});

		ui.add_space(8.0);
		self.render_circle(ui, breathing);

		ui.vertical_centered(|ui| {
			let label = breathing.current_phase().map_or("No phases", |p| p.label());
			ui.heading(label);

			let fill = match breathing.animation() {
				Some(anim) => anim.bar_fill(breathing.phase_elapsed()),
				None => 0.0,
			};
			ui.add(egui::ProgressBar::new(fill).desired_width(240.0));

			ui.monospace(breathing.elapsed_display());
		});

		self.render_pattern(ui, breathing);

		ui.add_space(8.0);
		ui.horizontal(|ui| {
			if ui
				.add_enabled(breathing.can_start(), egui::Button::new("Start"))
				.clicked()
			{
				events.push(Event::Breathing(BreathingEvent::Start));
			}
			if ui
				.add_enabled(breathing.is_running(), egui::Button::new("Reset"))
				.clicked()
			{
				events.push(Event::Breathing(BreathingEvent::Reset));
			}

			let mut muted = breathing.is_muted();
			if ui.checkbox(&mut muted, "Mute").changed() {
				events.push(Event::Breathing(BreathingEvent::SetMuted { muted }));
			}
		});

		if current.is_custom() {
			ui.separator();
			self.render_custom_editor(ui, breathing, events);
		}

		if breathing.is_running() {
			ui.ctx().request_repaint();
		}
	}

	/// One chip per active phase, current one highlighted while running
	fn render_pattern(&self, ui: &mut egui::Ui, breathing: &BreathingSession) {
		ui.horizontal_wrapped(|ui| {
			for (index, phase) in breathing.sequence().iter().enumerate() {
				let secs = breathing.durations().seconds_for(*phase);
				let text = egui::RichText::new(format!("{} {}s", phase.editor_label(), secs)).small();
				let active = breathing.is_running() && index == breathing.phase_index();
				ui.label(if active { text.strong() } else { text.weak() });
			}
		});
	}

	fn render_circle(&self, ui: &mut egui::Ui, breathing: &BreathingSession) {
		let size = egui::vec2(ui.available_width(), self.circle_area);
		let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());

		let (scale, expanded) = match breathing.animation() {
			Some(anim) => (
				anim.circle_scale(breathing.phase_elapsed()),
				anim.phase.is_expanded(),
			),
			None => (presentation::idle_scale(), false),
		};
		let color = if expanded {
			egui::Color32::from_rgb(110, 180, 230)
		} else {
			egui::Color32::from_rgb(90, 140, 190)
		};

		let painter = ui.painter();
		painter.circle_filled(rect.center(), CIRCLE_RADIUS * scale, color.gamma_multiply(0.6));
		painter.circle_stroke(
			rect.center(),
			CIRCLE_RADIUS * scale,
			egui::Stroke::new(2.0, color),
		);
	}

	fn render_custom_editor(
		&self,
		ui: &mut egui::Ui,
		breathing: &BreathingSession,
		events: &mut Vec<Event>,
	) {
		let editable = !breathing.is_running();
		egui::Grid::new("custom_durations")
			.num_columns(2)
			.spacing([12.0, 4.0])
			.show(ui, |ui| {
				for phase in Phase::ALL {
					ui.label(phase.editor_label());
					let mut secs = breathing.custom_durations().get(phase).unwrap_or(0);
					let response = ui.add_enabled(
						editable,
						egui::DragValue::new(&mut secs)
							.range(0..=MAX_CUSTOM_SECS)
							.suffix(" s"),
					);
					if response.changed() {
						events.push(Event::Breathing(BreathingEvent::SetCustomDuration {
							phase,
							secs,
						}));
					}
					ui.end_row();
				}
			});
	}
}

impl Default for ViewManager {
	fn default() -> Self {
		Self::new()
	}
}
