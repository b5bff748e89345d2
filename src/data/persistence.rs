use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the home directory holding the settings document.
const CONFIG_DIR_NAME: &str = ".ccal";

/// `~/.ccal`, or an error when no home directory can be determined.
pub fn default_config_dir() -> Result<PathBuf> {
    let dirs = BaseDirs::new().context("locating home directory")?;
    Ok(dirs.home_dir().join(CONFIG_DIR_NAME))
}

pub trait Persistable: Sized + Default + Serialize + for<'de> Deserialize<'de> {
    fn filename() -> &'static str;

    /// Reads `dir/filename()`. A missing file yields `Default`.
    fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::filename());
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON from {}", path.display()))
    }

    /// Writes pretty-printed JSON to `dir/filename()`, creating `dir` if needed.
    fn save_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create dir {}", dir.display()))?;
        let path = dir.join(Self::filename());
        let contents = serde_json::to_string_pretty(self).context("failed to serialize JSON")?;
        fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
