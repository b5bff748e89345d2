use crate::calc::WeekStart;
use crate::data::persistence::Persistable;
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::warn;

/// Persisted user preferences, stored as `config.json`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(default, deserialize_with = "lenient_week_start")]
    pub first_weekday: WeekStart,
    /// Keys this version does not know about, kept so a write does not drop them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Persistable for Settings {
    fn filename() -> &'static str {
        "config.json"
    }
}

impl Settings {
    pub fn try_load(dir: &Path) -> Result<Self> {
        Self::load_from(dir)
    }

    /// Loads settings, falling back to defaults on any read or parse failure.
    pub fn load(dir: &Path) -> Self {
        match Self::try_load(dir) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("settings unreadable, using defaults: {e:#}");
                Self::default()
            }
        }
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        self.save_to(dir)
    }
}

/// Accepts "sun" as Sunday; anything else, including non-strings, means Monday.
fn lenient_week_start<'de, D>(deserializer: D) -> Result<WeekStart, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value.as_str() {
        Some("sun") => WeekStart::Sunday,
        _ => WeekStart::Monday,
    })
}
