use crate::reactor::{ComponentResponse, Event, WindowEvent};
use crate::types::AppId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// eframe storage key of the window layout
pub const LAYOUT_KEY: &str = "desktop-layout";

/// Which windows were open, saved between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopLayout {
	pub open: Vec<AppId>,
}

impl Default for DesktopLayout {
	fn default() -> Self {
		Self {
			open: vec![AppId::Breathing],
		}
	}
}

/// Window host: tracks open windows and tells hosted apps when they close
pub struct Desktop {
	/// Open windows, oldest first
	open: IndexSet<AppId>,
}

impl Desktop {
	pub fn new(layout: DesktopLayout) -> Self {
		log::info!("Restoring desktop with {:?}", layout.open);
		Self {
			open: layout.open.into_iter().collect(),
		}
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Window(WindowEvent::Open { app }) => {
				if self.open.insert(*app) {
					log::debug!("Opened {:?}", app);
				}
				ComponentResponse::none()
			}
			Event::Window(WindowEvent::Close { app }) => {
				if self.open.shift_remove(app) {
					log::debug!("Closed {:?}", app);
					ComponentResponse::emit(Event::Window(WindowEvent::Closed { app: *app }))
				} else {
					ComponentResponse::none()
				}
			}
			_ => ComponentResponse::none(),
		}
	}

	pub fn is_open(&self, app: AppId) -> bool {
		self.open.contains(&app)
	}

	pub fn open_apps(&self) -> impl Iterator<Item = AppId> + '_ {
		self.open.iter().copied()
	}

	pub fn layout(&self) -> DesktopLayout {
		DesktopLayout {
			open: self.open.iter().copied().collect(),
		}
	}
}

impl Default for Desktop {
	fn default() -> Self {
		Self::new(DesktopLayout::default())
	}
}
