use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// The weekday a displayed week row starts on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekStart {
    #[default]
    #[serde(rename = "mon")]
    Monday,
    #[serde(rename = "sun")]
    Sunday,
}

impl WeekStart {
    pub fn toggled(self) -> Self {
        match self {
            WeekStart::Monday => WeekStart::Sunday,
            WeekStart::Sunday => WeekStart::Monday,
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WeekStart::Monday => "Monday",
            WeekStart::Sunday => "Sunday",
        }
    }
}

/// Gregorian rule: every fourth year, except centuries not divisible by 400.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` of `year`. Returns 0 for a month outside 1..=12.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn clamp_year(year: i64) -> i32 {
    year.clamp(MIN_YEAR as i64, MAX_YEAR as i64) as i32
}

/// Forces `day` into `1..=days_in_month(year, month)`.
pub fn clamp_day(year: i32, month: u32, day: u32) -> u32 {
    day.clamp(1, days_in_month(year, month).max(1))
}

/// Shifts `(year, month)` by `delta` months.
///
/// Overflowing months roll into the year twelve at a time; the resulting
/// year is then clamped to `MIN_YEAR..=MAX_YEAR` while the month keeps its
/// rolled value, so January 0001 minus one month lands on December 0001.
pub fn shift_month(year: i32, month: u32, delta: i64) -> (i32, u32) {
    let zero_based = (month as i64 - 1).saturating_add(delta);
    let year = clamp_year((year as i64).saturating_add(zero_based.div_euclid(12)));
    let month = zero_based.rem_euclid(12) as u32 + 1;
    (year, month)
}

pub fn first_supported_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(MIN_YEAR, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub fn last_supported_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(MAX_YEAR, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Builds a date from components that may be out of range, clamping each one.
pub fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let year = clamp_year(year as i64);
    let month = month.clamp(1, 12);
    let day = clamp_day(year, month, day);
    // Every component is in range here, so construction cannot fail.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(first_supported_date)
}

/// Adds `days` to `date` with exact calendar arithmetic, saturating at the
/// supported range `0001-01-01..=9999-12-31`.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let moved = Duration::try_days(days).and_then(|d| date.checked_add_signed(d));
    match moved {
        Some(d) => d.clamp(first_supported_date(), last_supported_date()),
        None if days < 0 => first_supported_date(),
        None => last_supported_date(),
    }
}

/// The first date at or before `date` that falls on `start`.
pub fn week_start_on_or_before(date: NaiveDate, start: WeekStart) -> NaiveDate {
    let offset = (date.weekday().num_days_from_monday() + 7
        - start.weekday().num_days_from_monday())
        % 7;
    date - Duration::days(offset as i64)
}

/// Seven weekdays in display order for the given week start.
pub fn weekday_order(start: WeekStart) -> [Weekday; 7] {
    let mut days = [start.weekday(); 7];
    for i in 1..7 {
        days[i] = days[i - 1].succ();
    }
    days
}

/// Full weeks covering `month` of `year`, padded with the neighbouring
/// months' days. Between four and six rows.
pub fn month_weeks(year: i32, month: u32, start: WeekStart) -> Vec<[NaiveDate; 7]> {
    let first = clamped_date(year, month, 1);
    let last = clamped_date(year, month, days_in_month(year, month));
    let mut cursor = week_start_on_or_before(first, start);
    let mut weeks = Vec::with_capacity(6);
    while cursor <= last {
        let mut week = [cursor; 7];
        for (i, slot) in week.iter_mut().enumerate() {
            *slot = cursor + Duration::days(i as i64);
        }
        weeks.push(week);
        cursor += Duration::days(7);
    }
    weeks
}

/// Columns 5 and 6 of a week row, counted from the configured first weekday.
pub fn is_weekend_column(column: usize) -> bool {
    column % 7 >= 5
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

pub fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Two-letter column header, e.g. "Mo".
pub fn weekday_abbrev(day: Weekday) -> &'static str {
    &weekday_short(day)[..2]
}
