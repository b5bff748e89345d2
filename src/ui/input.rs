use crate::calc::calendar::{self, MAX_YEAR, MIN_YEAR};
use chrono::NaiveDate;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Logical actions the calendar understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Today,
    ToggleWeekStart,
    ToggleView,
    MoveDay(i64),
    MoveWeekRow(i64),
    MoveMonth(i64),
    MoveYear(i64),
    GoToDate,
    Resized { width: u16, height: u16 },
    Unrecognized,
}

/// Maps a terminal event to an action. Key releases and repeats are ignored.
pub fn action_for(event: &Event) -> Action {
    match event {
        Event::Resize(width, height) => Action::Resized {
            width: *width,
            height: *height,
        },
        Event::Key(key) if key.kind == KeyEventKind::Press => action_for_key(key),
        _ => Action::Unrecognized,
    }
}

/// Ctrl+C quits from any mode, including an open prompt.
pub fn is_interrupt(event: &Event) -> bool {
    matches!(event, Event::Key(key) if key.kind == KeyEventKind::Press && is_interrupt_key(key))
}

fn is_interrupt_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn action_for_key(key: &KeyEvent) -> Action {
    if is_interrupt_key(key) {
        return Action::Quit;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Char('t') | KeyCode::Char('T') => Action::Today,
        KeyCode::Char('w') | KeyCode::Char('W') => Action::ToggleWeekStart,
        KeyCode::Char('v') | KeyCode::Char('V') => Action::ToggleView,
        KeyCode::Char('g') | KeyCode::Char('G') => Action::GoToDate,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveDay(-1),
        KeyCode::Right | KeyCode::Char('l') => Action::MoveDay(1),
        KeyCode::Up | KeyCode::Char('k') => Action::MoveWeekRow(-1),
        KeyCode::Down | KeyCode::Char('j') => Action::MoveWeekRow(1),
        KeyCode::PageUp => Action::MoveMonth(-1),
        KeyCode::PageDown => Action::MoveMonth(1),
        KeyCode::Char('[') => Action::MoveYear(-1),
        KeyCode::Char(']') => Action::MoveYear(1),
        _ => Action::Unrecognized,
    }
}

/// What a key did to an open prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Editing,
    Cancelled,
    Submitted(String),
}

/// Single-line text input shown as a popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub input: String,
}

impl Prompt {
    pub fn new(title: impl Into<String>, initial: impl Into<String>) -> Self {
        Prompt {
            title: title.into(),
            input: initial.into(),
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> PromptOutcome {
        if key.kind != KeyEventKind::Press {
            return PromptOutcome::Editing;
        }
        match key.code {
            KeyCode::Enter => PromptOutcome::Submitted(self.input.trim().to_string()),
            KeyCode::Esc => PromptOutcome::Cancelled,
            KeyCode::Backspace => {
                self.input.pop();
                PromptOutcome::Editing
            }
            KeyCode::Char(_)
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                PromptOutcome::Editing
            }
            KeyCode::Char(c) if !c.is_control() => {
                self.input.push(c);
                PromptOutcome::Editing
            }
            _ => PromptOutcome::Editing,
        }
    }
}

/// Parses `YYYY-MM-DD` or `YYYY-MM`. A missing or too-large day is clamped to
/// the month; the year must be within 1..=9999.
pub fn parse_date_input(text: &str) -> Option<NaiveDate> {
    let mut parts = text.trim().split('-');
    let year: i32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = match parts.next() {
        Some(raw) => raw.trim().parse().ok()?,
        None => 1,
    };
    if parts.next().is_some()
        || !(MIN_YEAR..=MAX_YEAR).contains(&year)
        || !(1..=12).contains(&month)
        || day == 0
    {
        return None;
    }
    Some(calendar::clamped_date(year, month, day))
}
