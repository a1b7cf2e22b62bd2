//! Run configuration, layered from defaults, the config file, the environment
//! and command-line flags.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;
use tracing::debug;

use super::cli::CliArgs;
use crate::infra::fse::{Credentials, FeedSettings};
use crate::infra::retry::RetryPolicy;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "FseAssignmentScanner";
const APP_NAME: &str = "FseAssignmentScanner";

pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_RADIUS_NM: f64 = 50.0;
pub const DEFAULT_MIN_EARNINGS: f64 = 1000.0;
pub const DEFAULT_AIRPORTS_FILE: &str = "icaodata.csv";
pub const DEFAULT_AIRCRAFT_FILE: &str = "aircraft.csv";

pub const SERVICE_KEY_VAR: &str = "FSE_SERVICE_KEY";
pub const USER_KEY_VAR: &str = "FSE_USER_KEY";

/// Models that are never searched for nor offered as candidates.
pub const DEFAULT_IGNORED_MODELS: &[&str] = &[
    "Hawker Siddeley HS-748",
    "Bombardier Lear 60",
    "BAe 146-100 (Avro RJ70)",
    "Embraer ERJ-145LR",
    "Antonov An-24",
    "DeHavilland DHC-4 Caribou",
    "ATR 72-500",
    "Saab 340B",
    "Ilyushin Il-14",
    "DeHavilland DHC-6 Twin Otter",
    "Airspeed AS-57 Ambassador ",
    "Bombardier CRJ-200ER",
    "Douglas DC-4",
    "ATR 42-500",
    "Beechcraft King Air 200",
    "Boeing Vertol CH-47 Chinook",
    "DeHavilland DHC-3-T Turbo Otter",
    "Agusta Westland AW139",
    "Douglas DC-3",
    "Vickers Viscount",
    "Piper PA-42-1000 Cheyenne 400",
    "Fairchild Metro III",
    "CASA CN235",
    "Beechcraft King Air 300",
    "Beechcraft 1900C Freighter",
    "Embraer ERJ-135LR",
    "Embraer Phenom 300",
    "Bell 412",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("a service key or user key is required (--skey/--ukey or FSE_SERVICE_KEY/FSE_USER_KEY)")]
    MissingCredentials,
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: SerdeError,
    },
}

/// Optional JSON config file. Every field may be left out.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub service_key: Option<String>,
    pub user_key: Option<String>,
    pub limit: Option<usize>,
    pub radius_nm: Option<f64>,
    pub min_earnings: Option<f64>,
    pub debug: Option<bool>,
    pub ignored_models: Option<Vec<String>>,
    pub airports_path: Option<PathBuf>,
    pub aircraft_path: Option<PathBuf>,
    pub snapshot_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub request_interval_secs: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_interval_secs: Option<u64>,
    pub batch_size: Option<usize>,
}

/// Keys picked up from the environment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvKeys {
    pub service_key: Option<String>,
    pub user_key: Option<String>,
}

impl EnvKeys {
    pub fn from_env() -> Self {
        Self {
            service_key: std::env::var(SERVICE_KEY_VAR).ok(),
            user_key: std::env::var(USER_KEY_VAR).ok(),
        }
    }
}

/// Everything one scan run needs.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub credentials: Credentials,
    pub limit: usize,
    pub radius_nm: f64,
    pub min_earnings: f64,
    pub local: bool,
    /// Verbose logging, from `--debug` or the config file.
    pub debug: bool,
    pub ignored_models: HashSet<String>,
    pub airports_path: PathBuf,
    pub aircraft_path: PathBuf,
    /// `None` falls back to the platform data directory.
    pub snapshot_path: Option<PathBuf>,
    pub feed: FeedSettings,
}

fn config_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("config.json"))
}

/// Read the config file. An explicit path must exist; the default one may not.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_file() {
            Some(path) if path.exists() => path,
            _ => return Ok(FileConfig::default()),
        },
    };
    debug!("reading config from {}", path.display());
    let data = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Serde { path, source })
}

/// Layer defaults, file, environment and flags, later ones winning.
pub fn resolve(cli: &CliArgs, file: FileConfig, env: EnvKeys) -> Result<ScanConfig, ConfigError> {
    let service_key = cli
        .service_key
        .clone()
        .or(env.service_key)
        .or(file.service_key);
    let user_key = cli.user_key.clone().or(env.user_key).or(file.user_key);
    let credentials =
        Credentials::from_keys(service_key, user_key).ok_or(ConfigError::MissingCredentials)?;

    let defaults = FeedSettings::default();
    let retry = RetryPolicy {
        attempts: file.retry_attempts.unwrap_or(defaults.retry.attempts),
        interval: file
            .retry_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry.interval),
    };
    let feed = FeedSettings {
        base_url: file.base_url.unwrap_or(defaults.base_url),
        retry,
        min_interval: file
            .request_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.min_interval),
        batch_size: file.batch_size.unwrap_or(defaults.batch_size),
    };

    let ignored_models = match file.ignored_models {
        Some(models) => models.into_iter().collect(),
        None => DEFAULT_IGNORED_MODELS.iter().map(|model| model.to_string()).collect(),
    };

    Ok(ScanConfig {
        credentials,
        limit: cli.limit.or(file.limit).unwrap_or(DEFAULT_LIMIT),
        radius_nm: cli.radius_nm.or(file.radius_nm).unwrap_or(DEFAULT_RADIUS_NM),
        min_earnings: cli
            .min_earnings
            .or(file.min_earnings)
            .unwrap_or(DEFAULT_MIN_EARNINGS),
        local: cli.local,
        debug: cli.debug || file.debug.unwrap_or(false),
        ignored_models,
        airports_path: file
            .airports_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_AIRPORTS_FILE)),
        aircraft_path: file
            .aircraft_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_AIRCRAFT_FILE)),
        snapshot_path: file.snapshot_path,
        feed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_user_key() -> CliArgs {
        CliArgs {
            user_key: Some("u-123".to_string()),
            ..CliArgs::default()
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = resolve(&with_user_key(), FileConfig::default(), EnvKeys::default()).unwrap();
        assert_eq!(config.credentials, Credentials::UserKey("u-123".to_string()));
        assert_eq!(config.limit, 20);
        assert_eq!(config.radius_nm, 50.0);
        assert_eq!(config.min_earnings, 1000.0);
        assert_eq!(config.feed.batch_size, 1500);
        assert_eq!(config.feed.min_interval, Duration::from_secs(6));
        assert_eq!(config.feed.retry.attempts, 10);
        assert!(config.ignored_models.contains("Bell 412"));
        assert_eq!(config.airports_path, PathBuf::from("icaodata.csv"));
    }

    #[test]
    fn missing_keys_fail() {
        let err = resolve(&CliArgs::default(), FileConfig::default(), EnvKeys::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }

    #[test]
    fn flags_beat_environment_beats_file() {
        let file = FileConfig {
            service_key: Some("file".to_string()),
            limit: Some(5),
            radius_nm: Some(80.0),
            ..FileConfig::default()
        };
        let env = EnvKeys {
            service_key: Some("env".to_string()),
            user_key: None,
        };
        let cli = CliArgs {
            limit: Some(7),
            ..CliArgs::default()
        };

        let config = resolve(&cli, file.clone(), env).unwrap();
        assert_eq!(config.credentials, Credentials::ServiceKey("env".to_string()));
        assert_eq!(config.limit, 7);
        assert_eq!(config.radius_nm, 80.0);

        let config = resolve(&cli, file, EnvKeys::default()).unwrap();
        assert_eq!(config.credentials, Credentials::ServiceKey("file".to_string()));
    }

    #[test]
    fn file_overrides_feed_settings_and_ignore_list() {
        let file = FileConfig {
            request_interval_secs: Some(10),
            retry_attempts: Some(2),
            batch_size: Some(100),
            ignored_models: Some(vec!["Cessna 172".to_string()]),
            ..FileConfig::default()
        };
        let config = resolve(&with_user_key(), file, EnvKeys::default()).unwrap();
        assert_eq!(config.feed.min_interval, Duration::from_secs(10));
        assert_eq!(config.feed.retry.attempts, 2);
        assert_eq!(config.feed.batch_size, 100);
        assert_eq!(config.ignored_models.len(), 1);
        assert!(!config.ignored_models.contains("Bell 412"));
    }

    #[test]
    fn debug_comes_from_flag_or_file() {
        let config = resolve(&with_user_key(), FileConfig::default(), EnvKeys::default()).unwrap();
        assert!(!config.debug);

        let file = FileConfig {
            debug: Some(true),
            ..FileConfig::default()
        };
        assert!(resolve(&with_user_key(), file, EnvKeys::default()).unwrap().debug);

        let cli = CliArgs {
            debug: true,
            ..with_user_key()
        };
        let file = FileConfig {
            debug: Some(false),
            ..FileConfig::default()
        };
        assert!(resolve(&cli, file, EnvKeys::default()).unwrap().debug);
    }

    #[test]
    fn explicit_config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, r#"{ "user_key": "abc", "min_earnings": 250.5, "debug": true }"#).unwrap();

        let file = load_file_config(Some(&path)).unwrap();
        assert_eq!(file.user_key.as_deref(), Some("abc"));
        assert_eq!(file.min_earnings, Some(250.5));
        assert_eq!(file.debug, Some(true));
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file_config(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn broken_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, "{ limit: ").unwrap();
        assert!(matches!(load_file_config(Some(&path)), Err(ConfigError::Serde { .. })));
    }
}
