//! Command-line flags.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use super::version::{version_label, APP_NAME};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown argument {0}")]
    UnknownFlag(String),
    #[error("{0} needs a value")]
    MissingValue(String),
    #[error("invalid value {value:?} for {flag}")]
    InvalidValue { flag: String, value: String },
}

/// Flags as given; anything unset falls through to the config layers.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CliArgs {
    pub service_key: Option<String>,
    pub user_key: Option<String>,
    pub limit: Option<usize>,
    pub radius_nm: Option<f64>,
    pub min_earnings: Option<f64>,
    pub local: bool,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub help: bool,
    pub version: bool,
}

impl CliArgs {
    pub fn from_env() -> Result<Self, CliError> {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse flags, program name excluded. Both `--flag value` and
    /// `--flag=value` are accepted.
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };
            let mut value = || {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .ok_or_else(|| CliError::MissingValue(flag.clone()))
            };

            match flag.as_str() {
                "--skey" => parsed.service_key = Some(value()?),
                "--ukey" => parsed.user_key = Some(value()?),
                "--limit" => parsed.limit = Some(number(&flag, value()?)?),
                "--radius" => parsed.radius_nm = Some(number(&flag, value()?)?),
                "--min" => parsed.min_earnings = Some(number(&flag, value()?)?),
                "--config" => parsed.config = Some(PathBuf::from(value()?)),
                "--local" => parsed.local = true,
                "--debug" => parsed.debug = true,
                "-h" | "--help" => parsed.help = true,
                "-V" | "--version" => parsed.version = true,
                _ => return Err(CliError::UnknownFlag(flag.clone())),
            }
        }
        Ok(parsed)
    }
}

fn number<T: FromStr>(flag: &str, value: String) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::InvalidValue {
        flag: flag.to_string(),
        value,
    })
}

pub fn usage() -> String {
    format!(
        "{APP_NAME} {}

Finds the most profitable FSEconomy assignments for rentable aircraft nearby.

Usage: fse-scan [OPTIONS]

Options:
  --skey <KEY>       Service key (or FSE_SERVICE_KEY)
  --ukey <KEY>       User key (or FSE_USER_KEY)
  --limit <N>        Stop after N results [default: 20]
  --radius <NM>      Aircraft search radius in nm [default: 50]
  --min <AMOUNT>     Minimum earnings for a result [default: 1000]
  --local            Use the last saved snapshot instead of the live feed
  --debug            Verbose logging
  --config <PATH>    JSON config file
  -h, --help         Print help
  -V, --version      Print version",
        version_label()
    )
}
