use crate::calc::calendar::{self, WeekStart};
use chrono::{Datelike, NaiveDate};

/// The selected `(year, month, day)` plus the configured week start.
///
/// Every mutation leaves the triple valid: `1 <= year <= 9999`,
/// `1 <= month <= 12` and `1 <= day <= days_in_month(year, month)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateModel {
    year: i32,
    month: u32,
    day: u32,
    first_weekday: WeekStart,
}

impl DateModel {
    pub fn new(today: NaiveDate, first_weekday: WeekStart) -> Self {
        let mut model = DateModel {
            year: today.year(),
            month: today.month(),
            day: today.day(),
            first_weekday,
        };
        model.jump_to(today);
        model
    }

    /// Builds a model from raw components, clamping whatever is out of range.
    #[cfg(test)]
    pub fn from_ymd(year: i32, month: u32, day: u32, first_weekday: WeekStart) -> Self {
        Self::new(calendar::clamped_date(year, month, day), first_weekday)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    #[cfg(test)]
    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn first_weekday(&self) -> WeekStart {
        self.first_weekday
    }

    pub fn selected_date(&self) -> NaiveDate {
        calendar::clamped_date(self.year, self.month, self.day)
    }

    /// Exact day arithmetic; crossing a month or year boundary needs no clamp.
    pub fn move_by_days(&mut self, days: i64) {
        let target = calendar::add_days(self.selected_date(), days);
        self.set(target);
    }

    pub fn move_by_months(&mut self, months: i64) {
        let (year, month) = calendar::shift_month(self.year, self.month, months);
        self.year = year;
        self.month = month;
        self.clamp_selection();
    }

    pub fn move_by_years(&mut self, years: i64) {
        self.year = calendar::clamp_year((self.year as i64).saturating_add(years));
        self.clamp_selection();
    }

    pub fn jump_to(&mut self, date: NaiveDate) {
        let date = date.clamp(
            calendar::first_supported_date(),
            calendar::last_supported_date(),
        );
        self.set(date);
    }

    pub fn jump_to_today(&mut self, today: NaiveDate) {
        self.jump_to(today);
    }

    /// Flips between Monday and Sunday and returns the new value.
    pub fn toggle_week_start(&mut self) -> WeekStart {
        self.first_weekday = self.first_weekday.toggled();
        self.first_weekday
    }

    fn set(&mut self, date: NaiveDate) {
        self.year = date.year();
        self.month = date.month();
        self.day = date.day();
    }

    fn clamp_selection(&mut self) {
        self.day = calendar::clamp_day(self.year, self.month, self.day);
    }
}
