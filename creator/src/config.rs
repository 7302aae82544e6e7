use keyrequests::config::ConfigInput;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

/// Optional YAML configuration file. Every value can be overridden from the
/// command line or the environment, including switching a flag set here back
/// off. Unknown keys are rejected so a typo does not silently fall back to a
/// default.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    platform_base_url: Option<String>,
    api_token: Option<String>,
    input_filename: Option<PathBuf>,
    verbose_logging: Option<bool>,
    dry_run: Option<bool>,
    metrics: Option<MetricsConfig>,
    logging: Option<LoggingConfig>,
}

/// Everything the process needs at startup.
#[derive(Debug)]
pub struct Settings {
    pub run: ConfigInput,
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, FileConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| FileConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&contents).map_err(|source| FileConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layers the command line and environment values over the file. A value
    /// only falls through to the file when the override leaves it unset.
    pub fn with_overrides(self, overrides: ConfigInput) -> Settings {
        Settings {
            run: ConfigInput {
                platform_base_url: overrides.platform_base_url.or(self.platform_base_url),
                api_token: overrides.api_token.or(self.api_token),
                input_filename: overrides.input_filename.or(self.input_filename),
                verbose_logging: overrides.verbose_logging.or(self.verbose_logging),
                dry_run: overrides.dry_run.or(self.dry_run),
            },
            metrics: self.metrics,
            logging: self.logging,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FileConfigError {
    #[error("could not read key request creator config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid key request creator config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
