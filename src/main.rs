use std::process::ExitCode;

use fse_assignment_scanner::{
    app::{self, ScanError},
    domain::sort_by_dry_earnings,
    util::{
        cli::{self, CliArgs},
        config::{self, ConfigError, EnvKeys, ScanConfig},
        logging,
        version::{version_label, APP_NAME},
    },
};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match CliArgs::from_env() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n\n{}", cli::usage());
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{}", cli::usage());
        return ExitCode::SUCCESS;
    }
    if args.version {
        println!("{APP_NAME} {}", version_label());
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            logging::init(args.debug);
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.debug);

    match scan(&config).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &CliArgs) -> Result<ScanConfig, ConfigError> {
    let file = config::load_file_config(args.config.as_deref())?;
    config::resolve(args, file, EnvKeys::from_env())
}

async fn scan(config: &ScanConfig) -> Result<ExitCode, ScanError> {
    let mut outcome = app::run(config).await?;
    sort_by_dry_earnings(&mut outcome.results);

    if outcome.results.is_empty() {
        println!("No assignments above {:.0} found.", config.min_earnings);
    }
    for result in &outcome.results {
        println!("{result}");
    }

    match outcome.feed_error {
        Some(err) => {
            error!("feed acquisition incomplete, results cover partial data: {err}");
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}
