use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::segmentation::ReconcileConfig;

/// Where a batch run reads its exports and writes its results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub weekly_path: PathBuf,
    /// One or more daily chunk exports, merged before rescaling.
    pub daily_paths: Vec<PathBuf>,
    /// Directory of raw increment exports to audit; auditing is skipped when unset.
    pub increment_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub database_path: PathBuf,
    pub reconcile: ReconcileConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            weekly_path: "data/weekly.csv".into(),
            daily_paths: vec!["data/daily.csv".into()],
            increment_dir: None,
            output_dir: "output".into(),
            database_path: "output/trend_reconcile.sqlite3".into(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    /// Relative paths are resolved against `base`, normally the settings file's directory.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.weekly_path);
        for path in &mut self.daily_paths {
            resolve(path);
        }
        if let Some(dir) = self.increment_dir.as_mut() {
            resolve(dir);
        }
        resolve(&mut self.output_dir);
        resolve(&mut self.database_path);
        self
    }
}
