pub mod calendar;
pub mod date_model;

pub use calendar::WeekStart;
pub use date_model::DateModel;
