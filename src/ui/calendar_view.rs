use crate::calc::calendar::{self, WeekStart};
use crate::calc::DateModel;
use crate::ui::app::{ViewMode, ViewState};
use crate::ui::input::Prompt;
use chrono::{Datelike, Duration, NaiveDate};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use thiserror::Error;

pub const MIN_WIDTH: u16 = 36;
pub const MIN_HEIGHT: u16 = 10;

const RESIZE_NOTICE: &str = "Resize terminal (min 36x10)";
const HELP_HINT: &str =
    "[ Arrows: Day | PgUp/PgDn: Month | [ ]: Year | T: Today | W: Week start | V: View | G: Go to ]";

const GRID_TOP: u16 = 3;
const GRID_LEFT: u16 = 2;
const CELL_PITCH: u16 = 4;

/// Why a bounded write drew nothing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    #[error("write at row {y}, column {x} starts outside the surface")]
    OffSurface { y: u16, x: u16 },
    #[error("nothing left to draw after clipping")]
    Empty,
}

/// Bounds-checked writer over a ratatui buffer.
///
/// Rows and columns are relative to the buffer's area. Every write is clipped
/// to the area; a write that starts outside it, or that has no room left, is
/// reported as a `DrawError` and leaves the buffer untouched.
pub struct Canvas<'a> {
    buf: &'a mut Buffer,
    writes: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(buf: &'a mut Buffer) -> Self {
        Canvas { buf, writes: 0 }
    }

    pub fn height(&self) -> u16 {
        self.buf.area.height
    }

    pub fn width(&self) -> u16 {
        self.buf.area.width
    }

    /// Number of writes that reached the buffer.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Writes at most `max` columns of `text` at `(y, x)`, returning the
    /// number of columns drawn.
    pub fn put(&mut self, y: u16, x: u16, text: &str, max: usize, style: Style) -> Result<usize, DrawError> {
        let (height, width) = (self.height(), self.width());
        if height == 0 || width == 0 || y >= height || x >= width {
            return Err(DrawError::OffSurface { y, x });
        }
        let room = max.min((width - x) as usize);
        if room == 0 {
            return Err(DrawError::Empty);
        }
        let origin = self.buf.area;
        let (end_x, _) = self.buf.set_stringn(origin.x + x, origin.y + y, text, room, style);
        self.writes += 1;
        Ok(end_x.saturating_sub(origin.x + x) as usize)
    }
}

pub fn can_draw_full(height: u16, width: u16) -> bool {
    width >= MIN_WIDTH && height >= MIN_HEIGHT
}

/// Style for a day cell. Selection wins over today, today over
/// other-month dimming, dimming over weekend coloring.
pub(crate) fn calendar_day_style(
    is_selected: bool,
    is_today: bool,
    in_month: bool,
    is_weekend: bool,
) -> Style {
    if is_selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if is_today {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if !in_month {
        Style::default().fg(Color::DarkGray)
    } else if is_weekend {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default().fg(Color::White)
    }
}

fn header_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn help_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn status_style() -> Style {
    Style::default().fg(Color::Black).bg(Color::Cyan)
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// Draws one frame and returns how many writes reached the buffer.
///
/// Layout decisions use the size cached in `view`; the canvas clips against
/// the buffer itself, so a surface that shrank in between only loses cells.
pub fn draw(buf: &mut Buffer, model: &DateModel, view: &ViewState, today: NaiveDate) -> usize {
    let mut canvas = Canvas::new(buf);
    if !can_draw_full(view.height, view.width) {
        let _ = canvas.put(0, 0, RESIZE_NOTICE, RESIZE_NOTICE.len(), Style::default());
        return canvas.writes();
    }
    draw_header(&mut canvas, model, view);
    match view.mode {
        ViewMode::Month => draw_month_view(&mut canvas, model, view, today),
        ViewMode::Week => draw_week_view(&mut canvas, model, view, today),
    }
    draw_status(&mut canvas, view);
    canvas.writes()
}

fn draw_header(canvas: &mut Canvas, model: &DateModel, view: &ViewState) {
    let width = view.width as usize;
    let title = format!("{} {}", calendar::month_name(model.month()), model.year());
    let line = format!("{:^width$}", title);
    let _ = canvas.put(0, 0, &line, line.chars().count(), header_style());
    if view.height > 2 {
        let _ = canvas.put(1, 0, HELP_HINT, HELP_HINT.len().min(width), help_style());
    }
}

fn draw_status(canvas: &mut Canvas, view: &ViewState) {
    if view.height <= 2 {
        return;
    }
    let width = view.width as usize;
    let bar = format!("{:<width$}", format!(" {}", view.status));
    let _ = canvas.put(view.height - 1, 0, &bar, bar.chars().count(), status_style());
}

/// Room left for grid text after the left margin and a matching right margin.
fn grid_text_room(view: &ViewState, len: usize) -> usize {
    len.min(view.width.saturating_sub(2 * GRID_LEFT) as usize)
}

fn weekday_header(start: WeekStart) -> String {
    calendar::weekday_order(start)
        .iter()
        .map(|day| calendar::weekday_abbrev(*day))
        .collect::<Vec<_>>()
        .join("  ")
}

fn draw_month_view(canvas: &mut Canvas, model: &DateModel, view: &ViewState, today: NaiveDate) {
    let start = model.first_weekday();
    let header = weekday_header(start);
    let _ = canvas.put(GRID_TOP, GRID_LEFT, &header, grid_text_room(view, header.len()), bold());

    let selected = model.selected_date();
    let mut row = GRID_TOP + 1;
    for week in calendar::month_weeks(model.year(), model.month(), start) {
        if row >= view.height.saturating_sub(1) {
            break;
        }
        let mut col = GRID_LEFT;
        for (i, date) in week.iter().enumerate() {
            if col >= view.width.saturating_sub(2) {
                break;
            }
            let style = calendar_day_style(
                *date == selected,
                *date == today,
                date.month() == model.month(),
                calendar::is_weekend_column(i),
            );
            let _ = canvas.put(row, col, &format!("{:02}", date.day()), 2, style);
            col += CELL_PITCH;
        }
        row += 1;
    }
}

/// Seven consecutive days starting at the first-weekday on or before the
/// selected date. Recomputed on every frame; no separate anchor is kept.
pub fn week_days(model: &DateModel) -> [NaiveDate; 7] {
    let start = calendar::week_start_on_or_before(model.selected_date(), model.first_weekday());
    let mut days = [start; 7];
    for (i, day) in days.iter_mut().enumerate() {
        *day = start + Duration::days(i as i64);
    }
    days
}

fn draw_week_view(canvas: &mut Canvas, model: &DateModel, view: &ViewState, today: NaiveDate) {
    let title = "Week view";
    let _ = canvas.put(GRID_TOP, GRID_LEFT, title, grid_text_room(view, title.len()), bold());

    let selected = model.selected_date();
    let supported = calendar::first_supported_date()..=calendar::last_supported_date();
    let mut row = GRID_TOP + 1;
    for (i, date) in week_days(model).iter().enumerate() {
        if row >= view.height.saturating_sub(1) {
            break;
        }
        // days outside 0001..=9999 keep their row but stay blank
        if !supported.contains(date) {
            row += 1;
            continue;
        }
        let label = format!(
            "{} {}",
            calendar::weekday_short(date.weekday()),
            date.format("%Y-%m-%d")
        );
        let style = calendar_day_style(
            *date == selected,
            *date == today,
            true,
            calendar::is_weekend_column(i),
        );
        let _ = canvas.put(row, GRID_LEFT, &label, grid_text_room(view, label.len()), style);
        row += 1;
    }
}

/// Popup rectangle for a prompt titled `title`, clipped to `area`.
pub fn prompt_area(area: Rect, title: &str) -> Rect {
    let height = 3u16;
    let width = (title.chars().count() as u16 + 20).clamp(20, 60);
    let y = area.height.saturating_sub(height) / 2;
    let x = area.width.saturating_sub(width) / 2;
    let popup = Rect::new(area.x + x.max(2), area.y + y.max(2), width, height);
    popup.intersection(area)
}

/// Draws the prompt popup and returns where the text cursor belongs.
pub fn draw_prompt(buf: &mut Buffer, prompt: &Prompt) -> Option<Position> {
    let area = prompt_area(buf.area, &prompt.title);
    if area.width < 3 || area.height < 3 {
        return None;
    }
    Clear.render(area, buf);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", prompt.title))
        .style(header_style());
    let inner = block.inner(area);
    block.render(area, buf);
    Paragraph::new(prompt.input.as_str()).render(inner, buf);
    let cursor_x = inner.x + (prompt.input.chars().count() as u16).min(inner.width.saturating_sub(1));
    Some(Position::new(cursor_x, inner.y))
}
