use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::household::Household;

use super::Result;

const TMP_SUFFIX: &str = "tmp";

/// Whole-household JSON snapshot on disk.
///
/// This is deliberately a snapshot store, not a query layer: it loads and
/// saves the full aggregate, with a tmp-file-then-rename write so a crash
/// mid-save never leaves a truncated snapshot behind.
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<Household> {
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, household: &Household) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(household)?;
        let tmp = tmp_path(&self.path);
        {
            let mut file = File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), "household snapshot saved");
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
    use crate::household::{Expense, Participant};
    use crate::money::Money;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let snapshot = JsonSnapshot::new(dir.path().join("household.json"));

        let mut household = Household::new("Flat 3B");
        let anna = household.add_participant(Participant::new("Anna"));
        household.add_expense(
            Expense::new(
                "Groceries",
                Money::from_minor(4237),
                anna,
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                Vec::new(),
            )
            .unwrap(),
        );

        snapshot.save(&household).unwrap();
        assert!(snapshot.exists());

        let loaded = snapshot.load().unwrap();
        assert_eq!(loaded.id, household.id);
        assert_eq!(loaded.expenses.len(), 1);
        assert_eq!(loaded.expenses[0].total_amount, Money::from_minor(4237));
    }

    #[test]
    fn save_replaces_existing_snapshot() {
        let dir = tempdir().unwrap();
        let snapshot = JsonSnapshot::new(dir.path().join("household.json"));

        let mut household = Household::new("Flat 3B");
        snapshot.save(&household).unwrap();
        household.add_participant(Participant::new("Ben"));
        snapshot.save(&household).unwrap();

        let loaded = snapshot.load().unwrap();
        assert_eq!(loaded.participants.len(), 1);
    }
}
