use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

const TMP_SUFFIX: &str = "tmp";

/// Settings the calling layer passes into the engine.
///
/// These are explicit inputs, never ambient state read from inside the
/// computation functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Display currency; the engine itself is single-currency.
    pub currency: String,
    /// Balances within this many minor units count as settled.
    pub settlement_epsilon_minor: i64,
    /// Cap on occurrences one due-processing pass may materialize per
    /// template.
    pub max_occurrences_per_run: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            currency: "EUR".into(),
            settlement_epsilon_minor: 1,
            max_occurrences_per_run: 120,
        }
    }
}

impl EngineSettings {
    /// Loads settings from `path`, falling back to defaults when the file
    /// does not exist yet.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        if path.exists() {
            let data = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = tmp_path(path);
        {
            let mut file = File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(TMP_SUFFIX);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = EngineSettings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings.settlement_epsilon_minor, 1);
        assert_eq!(settings.max_occurrences_per_run, 120);
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = EngineSettings {
            currency: "USD".into(),
            settlement_epsilon_minor: 2,
            max_occurrences_per_run: 12,
        };
        settings.save(&path).unwrap();
        let loaded = EngineSettings::load(&path).unwrap();
        assert_eq!(loaded.currency, "USD");
        assert_eq!(loaded.max_occurrences_per_run, 12);
    }
}
