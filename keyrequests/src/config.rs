use std::path::PathBuf;
use url::Url;

pub const DEFAULT_INPUT_FILENAME: &str = "input.csv";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error(
        "platform base URL is missing. Should be like: https://abc12345.live.dynatrace.com. Please set dt_url"
    )]
    MissingBaseUrl,
    #[error(
        "API token is missing. The token requires the read entities and write settings permissions. Please set dt_api_token"
    )]
    MissingApiToken,
    #[error("invalid platform base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Connection settings for the monitoring platform.
#[derive(Clone, Debug, PartialEq)]
pub struct PlatformConfig {
    pub base_url: Url,
    pub api_token: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub platform: PlatformConfig,
    pub input_filename: PathBuf,
    pub verbose_logging: bool,
    /// Build the payload without submitting it.
    pub dry_run: bool,
}

/// Unvalidated configuration values, as collected from the command line,
/// environment and configuration file. `None` means the source did not set
/// the value, so a lower priority source may still provide it.
#[derive(Clone, Debug, Default)]
pub struct ConfigInput {
    pub platform_base_url: Option<String>,
    pub api_token: Option<String>,
    pub input_filename: Option<PathBuf>,
    pub verbose_logging: Option<bool>,
    pub dry_run: Option<bool>,
}

impl Config {
    pub fn new(input: ConfigInput) -> Result<Self, ConfigError> {
        let raw_url = input
            .platform_base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        let api_token = input
            .api_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingApiToken)?;

        let base_url = Url::parse(raw_url.trim_end_matches('/')).map_err(|source| {
            ConfigError::InvalidBaseUrl {
                url: raw_url.clone(),
                source,
            }
        })?;

        Ok(Config {
            platform: PlatformConfig {
                base_url,
                api_token,
            },
            input_filename: input
                .input_filename
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILENAME)),
            verbose_logging: input.verbose_logging.unwrap_or(false),
            dry_run: input.dry_run.unwrap_or(false),
        })
    }
}
