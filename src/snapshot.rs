use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::daily::DailyUpdate;

#[derive(Serialize)]
struct SnapshotFile<'a> {
    scenario: &'a str,
    written_at: DateTime<Utc>,
    #[serde(flatten)]
    update: &'a DailyUpdate,
}

/// Writes the daily update to disk every `interval_days` days (0 disables).
pub struct SnapshotWriter {
    dir: PathBuf,
    interval_days: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval_days: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_days,
        }
    }

    pub fn maybe_write(&self, update: &DailyUpdate, scenario: &str) -> Result<Option<PathBuf>> {
        if self.interval_days == 0 || update.day % self.interval_days != 0 {
            return Ok(None);
        }
        let dir = self.dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("day_{:06}.json", update.day));
        let file = SnapshotFile {
            scenario,
            written_at: Utc::now(),
            update,
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        log::debug!("snapshot written to {}", path.display());
        Ok(Some(path))
    }
}
