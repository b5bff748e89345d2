use crate::calc::DateModel;
use crate::data::Settings;
use crate::ui::calendar_view;
use crate::ui::input::{self, Action, Prompt, PromptOutcome};
use crate::ui::surface::Surface;
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::Event as CEvent;
use ratatui::Frame;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const INITIAL_STATUS: &str = "Use arrows/PgUp/PgDn, T=Today, W=Week start, V=View";
const GO_TO_TITLE: &str = "Go to date (YYYY-MM-DD)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Month,
    Week,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Month => ViewMode::Week,
            ViewMode::Week => ViewMode::Month,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Month => "month",
            ViewMode::Week => "week",
        }
    }
}

/// Active view, status line and the last known surface size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub status: String,
    pub height: u16,
    pub width: u16,
}

impl ViewState {
    pub fn new(status: impl Into<String>) -> Self {
        ViewState {
            mode: ViewMode::Month,
            status: status.into(),
            height: 0,
            width: 0,
        }
    }

    pub fn resize(&mut self, height: u16, width: u16) {
        self.height = height;
        self.width = width;
    }

    pub fn can_draw_full(&self) -> bool {
        calendar_view::can_draw_full(self.height, self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped,
}

#[derive(Debug, PartialEq)]
enum Mode {
    Normal,
    Prompt(Prompt),
}

pub struct App {
    pub model: DateModel,
    pub view: ViewState,
    settings: Settings,
    config_dir: PathBuf,
    today: NaiveDate,
    mode: Mode,
    state: RunState,
}

impl App {
    pub fn new(settings: Settings, today: NaiveDate, config_dir: PathBuf) -> Self {
        let model = DateModel::new(today, settings.first_weekday);
        App {
            model,
            view: ViewState::new(INITIAL_STATUS),
            settings,
            config_dir,
            today,
            mode: Mode::Normal,
            state: RunState::Running,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    #[cfg(test)]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn is_prompting(&self) -> bool {
        matches!(self.mode, Mode::Prompt(_))
    }

    /// Routes a terminal event to the open prompt or to the action table.
    pub fn handle_event(&mut self, event: &CEvent) -> RunState {
        if input::is_interrupt(event) {
            return self.apply(Action::Quit);
        }
        if let Mode::Prompt(prompt) = &mut self.mode {
            return match event {
                CEvent::Key(key) => {
                    let outcome = prompt.handle_key(key);
                    self.finish_prompt(outcome);
                    self.state
                }
                _ => self.apply(input::action_for(event)),
            };
        }
        self.apply(input::action_for(event))
    }

    /// Applies one action. Only `Quit` stops the loop.
    pub fn apply(&mut self, action: Action) -> RunState {
        if self.state == RunState::Stopped {
            return self.state;
        }
        debug!(?action, "dispatch");
        match action {
            Action::Quit => {
                self.state = RunState::Stopped;
            }
            Action::Today => {
                self.model.jump_to_today(self.today);
                self.view.status = "Today".to_string();
            }
            Action::ToggleWeekStart => {
                let start = self.model.toggle_week_start();
                self.view.status = format!("Week starts on {}", start.label());
                self.persist_week_start();
            }
            Action::ToggleView => {
                self.view.mode = self.view.mode.toggled();
                self.view.status = format!("View: {}", self.view.mode.label());
            }
            Action::MoveDay(n) => self.model.move_by_days(n),
            Action::MoveWeekRow(n) => self.model.move_by_days(n.saturating_mul(7)),
            Action::MoveMonth(n) => {
                self.model.move_by_months(n);
                self.view.status = if n < 0 { "Previous month" } else { "Next month" }.to_string();
            }
            Action::MoveYear(n) => {
                self.model.move_by_years(n);
                self.view.status = if n < 0 { "Previous year" } else { "Next year" }.to_string();
            }
            Action::GoToDate => self.open_prompt(),
            Action::Resized { width, height } => {
                self.view.resize(height, width);
                self.close_prompt_if_hidden();
            }
            Action::Unrecognized => {}
        }
        self.state
    }

    fn open_prompt(&mut self) {
        if !self.view.can_draw_full() {
            self.view.status = "Terminal too small".to_string();
            return;
        }
        self.mode = Mode::Prompt(Prompt::new(GO_TO_TITLE, ""));
    }

    /// The popup needs the full layout; below it the prompt is dropped.
    fn close_prompt_if_hidden(&mut self) {
        if matches!(self.mode, Mode::Prompt(_)) && !self.view.can_draw_full() {
            self.mode = Mode::Normal;
            self.view.status = "Terminal too small".to_string();
        }
    }

    fn finish_prompt(&mut self, outcome: PromptOutcome) {
        match outcome {
            PromptOutcome::Editing => return,
            PromptOutcome::Cancelled => {
                self.view.status = "Cancelled".to_string();
            }
            PromptOutcome::Submitted(text) => match input::parse_date_input(&text) {
                Some(date) => {
                    self.model.jump_to(date);
                    self.view.status = format!("Jumped to {}", date.format("%Y-%m-%d"));
                }
                None => {
                    self.view.status = format!("Invalid date: {text}");
                }
            },
        }
        self.mode = Mode::Normal;
    }

    /// Writes the week-start preference. Failures keep the in-memory value.
    fn persist_week_start(&mut self) {
        self.settings.first_weekday = self.model.first_weekday();
        match self.settings.save(&self.config_dir) {
            Ok(()) => info!(first_weekday = ?self.settings.first_weekday, "saved settings"),
            Err(e) => warn!("could not save settings: {e:#}"),
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let area = f.area();
        self.view.resize(area.height, area.width);
        self.close_prompt_if_hidden();
        calendar_view::draw(f.buffer_mut(), &self.model, &self.view, self.today);
        if let Mode::Prompt(prompt) = &self.mode {
            if let Some(cursor) = calendar_view::draw_prompt(f.buffer_mut(), prompt) {
                f.set_cursor_position(cursor);
            }
        }
    }
}

// ── App event loop ────────────────────────────────────────────────────────────

/// Render, block for the next event, dispatch; until the app stops.
pub fn run_app<S, C>(surface: &mut S, app: &mut App, clock: C) -> Result<()>
where
    S: Surface,
    C: Fn() -> NaiveDate,
{
    info!("event loop started");
    let mut cursor_visible = false;
    while app.state() == RunState::Running {
        app.set_today(clock());
        if let Err(e) = surface.draw(&mut |f| app.render(f)) {
            warn!("frame draw failed: {e}");
        }
        // the text cursor belongs to the prompt
        if app.is_prompting() != cursor_visible {
            cursor_visible = app.is_prompting();
            if let Err(e) = surface.set_cursor_visible(cursor_visible) {
                warn!("cursor toggle failed: {e}");
            }
        }
        let event = surface.next_event()?;
        app.handle_event(&event);
    }
    info!("event loop stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::WeekStart;
    use crate::data::persistence::Persistable;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use ratatui::Terminal;
    use std::collections::VecDeque;
    use std::io;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn key(code: KeyCode) -> CEvent {
        CEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn make_test_app(dir: &TempDir, today: NaiveDate) -> App {
        let mut app = App::new(Settings::default(), today, dir.path().to_path_buf());
        app.view.resize(24, 80);
        app
    }

    fn triple(app: &App) -> (i32, u32, u32) {
        (app.model.year(), app.model.month(), app.model.day())
    }

    /// Surface fed from a script of events, counting frames.
    struct ScriptedSurface {
        terminal: Terminal<TestBackend>,
        events: VecDeque<CEvent>,
        frames: usize,
        cursor_toggles: Vec<bool>,
    }

    impl ScriptedSurface {
        fn new(width: u16, height: u16, events: Vec<CEvent>) -> Self {
            ScriptedSurface {
                terminal: Terminal::new(TestBackend::new(width, height)).unwrap(),
                events: events.into(),
                frames: 0,
                cursor_toggles: Vec::new(),
            }
        }
    }

    impl Surface for ScriptedSurface {
        fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()> {
            self.frames += 1;
            self.terminal
                .draw(|f| render(f))
                .map(|_| ())
                .map_err(|e| io::Error::other(e.to_string()))
        }

        fn next_event(&mut self) -> io::Result<CEvent> {
            self.events
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
        }

        fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
            self.cursor_toggles.push(visible);
            Ok(())
        }
    }

    #[test]
    fn test_new_app_starts_on_today_in_month_view() {
        let tmp = TempDir::new().unwrap();
        let app = make_test_app(&tmp, d(2026, 10, 16));
        assert_eq!(triple(&app), (2026, 10, 16));
        assert_eq!(app.view.mode, ViewMode::Month);
        assert_eq!(app.view.status, INITIAL_STATUS);
        assert_eq!(app.state(), RunState::Running);
    }

    #[test]
    fn test_new_app_uses_saved_week_start() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings {
            first_weekday: WeekStart::Sunday,
            ..Settings::default()
        };
        let app = App::new(settings, d(2026, 10, 16), tmp.path().to_path_buf());
        assert_eq!(app.model.first_weekday(), WeekStart::Sunday);
    }

    #[test]
    fn test_arrow_keys_move_selection() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 2, 10));

        app.handle_event(&key(KeyCode::Right));
        assert_eq!(triple(&app), (2025, 2, 11));
        app.handle_event(&key(KeyCode::Left));
        assert_eq!(triple(&app), (2025, 2, 10));
        app.handle_event(&key(KeyCode::Down));
        assert_eq!(triple(&app), (2025, 2, 17));
        app.handle_event(&key(KeyCode::Up));
        assert_eq!(triple(&app), (2025, 2, 10));
    }

    #[test]
    fn test_page_keys_change_month_and_status() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 1, 31));

        app.handle_event(&key(KeyCode::PageDown));
        assert_eq!(triple(&app), (2025, 2, 28));
        assert_eq!(app.view.status, "Next month");
        app.handle_event(&key(KeyCode::PageUp));
        assert_eq!(triple(&app), (2025, 1, 28));
        assert_eq!(app.view.status, "Previous month");
    }

    #[test]
    fn test_year_keys() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2024, 2, 29));
        app.handle_event(&key(KeyCode::Char(']')));
        assert_eq!(triple(&app), (2025, 2, 28));
        assert_eq!(app.view.status, "Next year");
        app.handle_event(&key(KeyCode::Char('[')));
        assert_eq!(triple(&app), (2024, 2, 28));
        assert_eq!(app.view.status, "Previous year");
    }

    #[test]
    fn test_today_key_returns_to_today() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.handle_event(&key(KeyCode::PageDown));
        app.handle_event(&key(KeyCode::Right));
        app.set_today(d(2025, 6, 16));
        app.handle_event(&key(KeyCode::Char('T')));
        assert_eq!(triple(&app), (2025, 6, 16));
        assert_eq!(app.view.status, "Today");
    }

    #[test]
    fn test_view_toggle() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.handle_event(&key(KeyCode::Char('v')));
        assert_eq!(app.view.mode, ViewMode::Week);
        assert_eq!(app.view.status, "View: week");
        app.handle_event(&key(KeyCode::Char('V')));
        assert_eq!(app.view.mode, ViewMode::Month);
        assert_eq!(app.view.status, "View: month");
    }

    #[test]
    fn test_week_start_toggle_persists_and_is_involution() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));

        app.handle_event(&key(KeyCode::Char('w')));
        assert_eq!(app.model.first_weekday(), WeekStart::Sunday);
        assert_eq!(app.view.status, "Week starts on Sunday");
        assert_eq!(Settings::load(tmp.path()).first_weekday, WeekStart::Sunday);

        app.handle_event(&key(KeyCode::Char('W')));
        assert_eq!(app.model.first_weekday(), WeekStart::Monday);
        assert_eq!(app.view.status, "Week starts on Monday");
        assert_eq!(Settings::load(tmp.path()).first_weekday, WeekStart::Monday);
        assert_eq!(app.settings().first_weekday, app.model.first_weekday());
    }

    #[test]
    fn test_week_start_toggle_survives_unwritable_config() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let mut app = App::new(Settings::default(), d(2025, 6, 15), blocker);

        assert_eq!(app.handle_event(&key(KeyCode::Char('w'))), RunState::Running);
        assert_eq!(app.model.first_weekday(), WeekStart::Sunday);
        assert_eq!(app.settings().first_weekday, WeekStart::Sunday);
    }

    #[test]
    fn test_resize_updates_cached_size_only() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        let before = app.model;
        app.handle_event(&CEvent::Resize(100, 30));
        assert_eq!((app.view.height, app.view.width), (30, 100));
        assert_eq!(app.model, before);
        assert_eq!(app.view.status, INITIAL_STATUS);
    }

    #[test]
    fn test_unrecognized_key_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        let model = app.model;
        let view = app.view.clone();
        assert_eq!(app.handle_event(&key(KeyCode::Char('z'))), RunState::Running);
        assert_eq!(app.model, model);
        assert_eq!(app.view, view);
    }

    #[test]
    fn test_quit_stops() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        assert_eq!(app.handle_event(&key(KeyCode::Char('q'))), RunState::Stopped);
        // stopped is terminal
        assert_eq!(app.apply(Action::MoveDay(1)), RunState::Stopped);
        assert_eq!(triple(&app), (2025, 6, 15));
    }

    #[test]
    fn test_ctrl_c_quits() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        let ctrl_c = CEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.handle_event(&ctrl_c), RunState::Stopped);
    }

    #[test]
    fn test_ctrl_c_quits_while_prompting() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.handle_event(&key(KeyCode::Char('g')));
        assert!(app.is_prompting());
        let ctrl_c = CEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.handle_event(&ctrl_c), RunState::Stopped);
        assert_eq!(triple(&app), (2025, 6, 15));
    }

    #[test]
    fn test_go_to_date_prompt() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.handle_event(&key(KeyCode::Char('g')));
        assert!(app.is_prompting());

        // letters go to the prompt, not the action table
        for c in "2024-02-30".chars() {
            assert_eq!(app.handle_event(&key(KeyCode::Char(c))), RunState::Running);
        }
        app.handle_event(&key(KeyCode::Enter));
        assert!(!app.is_prompting());
        assert_eq!(triple(&app), (2024, 2, 29));
        assert_eq!(app.view.status, "Jumped to 2024-02-29");
    }

    #[test]
    fn test_go_to_date_rejects_bad_input_and_cancel() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));

        app.handle_event(&key(KeyCode::Char('G')));
        for c in "soon".chars() {
            app.handle_event(&key(KeyCode::Char(c)));
        }
        app.handle_event(&key(KeyCode::Enter));
        assert_eq!(app.view.status, "Invalid date: soon");
        assert_eq!(triple(&app), (2025, 6, 15));

        app.handle_event(&key(KeyCode::Char('g')));
        app.handle_event(&key(KeyCode::Char('q')));
        app.handle_event(&key(KeyCode::Esc));
        assert!(!app.is_prompting());
        assert_eq!(app.view.status, "Cancelled");
        assert_eq!(app.state(), RunState::Running);
    }

    #[test]
    fn test_go_to_date_needs_full_surface() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.handle_event(&CEvent::Resize(30, 8));
        app.handle_event(&key(KeyCode::Char('g')));
        assert!(!app.is_prompting());
        assert_eq!(app.view.status, "Terminal too small");
    }

    #[test]
    fn test_resize_while_prompting_keeps_prompt() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.handle_event(&key(KeyCode::Char('g')));
        app.handle_event(&CEvent::Resize(90, 30));
        assert!(app.is_prompting());
        assert_eq!((app.view.height, app.view.width), (30, 90));
    }

    #[test]
    fn test_shrinking_below_minimum_closes_prompt() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.handle_event(&key(KeyCode::Char('g')));
        app.handle_event(&key(KeyCode::Char('2')));
        app.handle_event(&CEvent::Resize(30, 8));

        assert!(!app.is_prompting());
        assert_eq!(app.view.status, "Terminal too small");
        // keys reach the action table again
        assert_eq!(app.handle_event(&key(KeyCode::Char('q'))), RunState::Stopped);
        assert_eq!(triple(&app), (2025, 6, 15));
    }

    #[test]
    fn test_small_frame_closes_prompt_without_resize_event() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.handle_event(&key(KeyCode::Char('g')));

        let mut terminal = Terminal::new(TestBackend::new(30, 8)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        assert!(!app.is_prompting());
        assert_eq!(app.handle_event(&key(KeyCode::Char('q'))), RunState::Stopped);
    }

    #[test]
    fn test_prompt_frame_places_cursor_after_input() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.handle_event(&key(KeyCode::Char('g')));
        app.handle_event(&key(KeyCode::Char('2')));
        app.handle_event(&key(KeyCode::Char('0')));

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let popup = calendar_view::prompt_area(Rect::new(0, 0, 80, 24), GO_TO_TITLE);
        terminal
            .backend_mut()
            .assert_cursor_position((popup.x + 1 + 2, popup.y + 1));
    }

    #[test]
    fn test_run_app_quits_after_shrink_while_prompting() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        let mut surface = ScriptedSurface::new(
            80,
            24,
            vec![
                key(KeyCode::Char('g')),
                CEvent::Resize(30, 8),
                key(KeyCode::Char('q')),
            ],
        );

        run_app(&mut surface, &mut app, || d(2025, 6, 15)).unwrap();

        assert_eq!(app.state(), RunState::Stopped);
        assert_eq!(surface.frames, 3);
    }

    #[test]
    fn test_run_app_shows_cursor_only_while_prompting() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        let mut surface = ScriptedSurface::new(
            80,
            24,
            vec![
                key(KeyCode::Right),
                key(KeyCode::Char('g')),
                key(KeyCode::Char('2')),
                key(KeyCode::Esc),
                key(KeyCode::Char('q')),
            ],
        );

        run_app(&mut surface, &mut app, || d(2025, 6, 15)).unwrap();

        assert_eq!(surface.cursor_toggles, vec![true, false]);
    }

    #[test]
    fn test_run_app_quit_stops_without_another_frame() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        let mut surface = ScriptedSurface::new(
            80,
            24,
            vec![key(KeyCode::Right), key(KeyCode::Char('q')), key(KeyCode::Right)],
        );

        run_app(&mut surface, &mut app, || d(2025, 6, 15)).unwrap();

        assert_eq!(app.state(), RunState::Stopped);
        assert_eq!(surface.frames, 2);
        assert_eq!(surface.events.len(), 1);
        assert_eq!(triple(&app), (2025, 6, 16));
    }

    #[test]
    fn test_run_app_renders_current_state() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 3, 12));
        let mut surface = ScriptedSurface::new(80, 24, vec![key(KeyCode::Char('q'))]);

        run_app(&mut surface, &mut app, || d(2025, 3, 12)).unwrap();

        let buffer = surface.terminal.backend().buffer();
        let title: String = buffer
            .content()
            .iter()
            .take(80)
            .map(|cell| cell.symbol())
            .collect();
        assert_eq!(title.trim(), "March 2025");
        assert_eq!((app.view.height, app.view.width), (24, 80));
    }

    #[test]
    fn test_run_app_propagates_input_failure() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        let mut surface = ScriptedSurface::new(80, 24, vec![key(KeyCode::Right)]);
        assert!(run_app(&mut surface, &mut app, || d(2025, 6, 15)).is_err());
        assert_eq!(surface.frames, 2);
    }

    #[test]
    fn test_saved_settings_file_matches_memory() {
        let tmp = TempDir::new().unwrap();
        let mut app = make_test_app(&tmp, d(2025, 6, 15));
        app.apply(Action::ToggleWeekStart);
        let on_disk = Settings::load_from(tmp.path()).unwrap();
        assert_eq!(&on_disk, app.settings());
    }
}
