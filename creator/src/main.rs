use clap::Parser;
use clap::builder::FalseyValueParser;
use keyrequests::config::{Config, ConfigInput};
use keyrequests::platform::HttpPlatformClient;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod logging;

use config::FileConfig;

/// Marks request names as key requests on every entity matched by their
/// entity selector.
///
/// The input file uses `|` as separator and starts with a header row:
///
///     entitySelector|request_name
///     type(SERVICE),tag(app:frontend)|/pageOne.html
#[derive(Parser, Debug)]
#[command(version, verbatim_doc_comment)]
struct Cli {
    /// Platform base URL, like https://abc12345.live.dynatrace.com
    #[arg(long, env = "dt_url")]
    platform_base_url: Option<String>,

    /// API token with the read entities and write settings permissions
    #[arg(long, env = "dt_api_token", hide_env_values = true)]
    api_token: Option<String>,

    /// Input file [default: input.csv]
    #[arg(long, env = "dt_filename")]
    input_filename: Option<PathBuf>,

    /// Log diagnostics: header row, selector checks, entity IDs and the payload.
    /// `--verbose false` turns it off when the config file enables it.
    #[arg(
        short,
        long = "verbose",
        env = "dt_logging",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = FalseyValueParser::new()
    )]
    verbose_logging: Option<bool>,

    /// Resolve selectors and build the payload without submitting it
    #[arg(
        long,
        env = "dt_dry_run",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = FalseyValueParser::new()
    )]
    dry_run: Option<bool>,

    /// Optional YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigInput {
        ConfigInput {
            platform_base_url: self.platform_base_url.clone(),
            api_token: self.api_token.clone(),
            input_filename: self.input_filename.clone(),
            verbose_logging: self.verbose_logging,
            dry_run: self.dry_run,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let file_config = match cli.config.as_deref().map(FileConfig::from_file).transpose() {
        Ok(file_config) => file_config.unwrap_or_default(),
        Err(e) => {
            eprintln!("{e}. Exiting");
            return ExitCode::FAILURE;
        }
    };
    let settings = file_config.with_overrides(cli.overrides());

    let config = match Config::new(settings.run) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}. Exiting");
            return ExitCode::FAILURE;
        }
    };

    let sentry_guard = settings.logging.as_ref().map(logging::init_sentry);
    logging::init_tracing(config.verbose_logging, sentry_guard.is_some());
    if let Some(metrics) = &settings.metrics {
        logging::init_metrics(metrics);
    }

    let client = match HttpPlatformClient::new(&config.platform) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Could not create platform client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Could not start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(keyrequests::run(&config, &client)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
