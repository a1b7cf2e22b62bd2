//! On-disk snapshot of the last live fetch, used by local mode.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::{AircraftListing, JobPosting};

const SNAPSHOT_FILENAME: &str = "feed_snapshot.json";
const DATA_DIR_NAME: &str = "fse-assignment-scanner";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error("no snapshot at {0}; run once without --local first")]
    Missing(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Aircraft listings and job postings exactly as fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Unix timestamp (seconds) when the data was fetched.
    pub cached_at: u64,
    pub listings: Vec<AircraftListing>,
    pub jobs: Vec<JobPosting>,
}

impl FeedSnapshot {
    pub fn new(listings: Vec<AircraftListing>, jobs: Vec<JobPosting>) -> Self {
        let cached_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            cached_at,
            listings,
            jobs,
        }
    }

    pub fn age(&self) -> Duration {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Duration::from_secs(now.saturating_sub(self.cached_at))
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        let secs = self.age().as_secs();
        if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        }
    }
}

/// Default snapshot location in the platform data directory.
pub fn snapshot_path() -> Result<PathBuf, SnapshotError> {
    dirs::data_local_dir()
        .map(|base| base.join(DATA_DIR_NAME).join(SNAPSHOT_FILENAME))
        .ok_or(SnapshotError::StorageUnavailable)
}

pub fn load_snapshot(path: &Path) -> Result<FeedSnapshot, SnapshotError> {
    if !path.exists() {
        return Err(SnapshotError::Missing(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let snapshot: FeedSnapshot = serde_json::from_str(&content)?;
    info!(
        "[snapshot] loaded {} listings and {} jobs (age: {}) from {}",
        snapshot.listings.len(),
        snapshot.jobs.len(),
        snapshot.age_string(),
        path.display()
    );
    Ok(snapshot)
}

pub fn save_snapshot(path: &Path, snapshot: &FeedSnapshot) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(snapshot)?; // compact, job lists get large
    fs::write(path, content)?;
    info!(
        "[snapshot] saved {} listings and {} jobs to {}",
        snapshot.listings.len(),
        snapshot.jobs.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobClass, UnitType};

    fn sample() -> FeedSnapshot {
        FeedSnapshot::new(
            vec![AircraftListing {
                make_model: "Cessna 208 Caravan".to_string(),
                registration: "N208FS".to_string(),
                location: "KSEA".to_string(),
                pct_fuel: 0.5,
                rental_dry: 300.0,
                rental_wet: 420.0,
                rental_time: 36000.0,
            }],
            vec![JobPosting {
                from_icao: "KSEA".to_string(),
                to_icao: "KPDX".to_string(),
                class: JobClass::Exclusive,
                unit_type: UnitType::Passengers,
                amount: 1,
                pay: 1500.0,
                commodity: None,
                pt_assignment: true,
            }],
        )
    }

    #[test]
    fn snapshot_survives_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SNAPSHOT_FILENAME);
        let snapshot = sample();

        save_snapshot(&path, &snapshot).unwrap();
        let restored = load_snapshot(&path).unwrap();

        assert_eq!(restored, snapshot);
        assert!(restored.jobs[0].pt_assignment);
        assert!(restored.age() < Duration::from_secs(60));
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(&dir.path().join(SNAPSHOT_FILENAME)).unwrap_err();
        assert!(matches!(err, SnapshotError::Missing(_)));
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SNAPSHOT_FILENAME);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_snapshot(&path), Err(SnapshotError::Serde(_))));
    }

    #[test]
    fn age_string_units() {
        let mut snapshot = sample();
        snapshot.cached_at = snapshot.cached_at.saturating_sub(2 * 3600 + 5);
        assert_eq!(snapshot.age_string(), "2h");
    }
}
