#![windows_subsystem = "windows"]

mod audio;
mod breathing;
mod desktop;
mod reactor;
mod settings;
mod types;
mod view;

use desktop::{DesktopLayout, LAYOUT_KEY};
use reactor::Reactor;
use settings::AppConfig;

fn main() -> eframe::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = AppConfig::load();

	let native_options = eframe::NativeOptions {
		viewport: eframe::egui::ViewportBuilder::default()
			.with_inner_size([960.0, 640.0])
			.with_title("Breathdesk"),
		..Default::default()
	};

	eframe::run_native(
		"Breathdesk",
		native_options,
		Box::new(move |cc| {
			let layout = cc
				.storage
				.and_then(|storage| eframe::get_value::<DesktopLayout>(storage, LAYOUT_KEY))
				.unwrap_or_default();
			let store = settings::open_store();
			let cue = audio::open_cue(&config.chime);
			Ok(Box::new(Reactor::new(&config, layout, store, cue)))
		}),
	)
}
