use crate::data::Settings;
use crate::ui::app::{run_app, App};
use crate::ui::surface::TerminalSurface;
use anyhow::Result;
use chrono::Local;
use std::path::Path;
use tracing::info;

/// Runs the interactive calendar until the user quits.
pub fn run(config_dir: &Path) -> Result<()> {
    let settings = Settings::load(config_dir);
    info!(config_dir = %config_dir.display(), first_weekday = ?settings.first_weekday, "starting");

    let mut surface = TerminalSurface::new()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        );
        original_hook(info);
    }));

    let today = Local::now().date_naive();
    let mut app = App::new(settings, today, config_dir.to_path_buf());

    let result = run_app(&mut surface, &mut app, || Local::now().date_naive());

    surface.restore()?;
    info!("exiting");
    result
}
