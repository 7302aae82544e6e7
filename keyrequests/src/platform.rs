use crate::config::PlatformConfig;
use crate::metrics_defs::PLATFORM_REQUEST_DURATION;
use crate::types::{EntityPage, WriteObject};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{StatusCode, Url};
use std::time::Instant;

const ENTITIES_PATH: &str = "api/v2/entities";
const SETTINGS_OBJECTS_PATH: &str = "api/v2/settings/objects";

#[derive(thiserror::Error, Debug)]
pub enum PlatformError {
    #[error("HTTP client error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid API token: {0}")]
    InvalidToken(#[from] InvalidHeaderValue),
    #[error("platform responded with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// The two monitoring platform calls the key request creator depends on.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Returns the first page of entities matching `entity_selector`.
    async fn query_entities(&self, entity_selector: &str) -> Result<EntityPage, PlatformError>;

    /// Writes all settings objects in a single request.
    async fn write_settings(&self, objects: &[WriteObject<'_>]) -> Result<(), PlatformError>;
}

pub struct HttpPlatformClient {
    client: reqwest::Client,
    entities_url: Url,
    settings_objects_url: Url,
}

impl HttpPlatformClient {
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let mut auth = HeaderValue::from_str(&format!("Api-Token {}", config.api_token))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(HttpPlatformClient {
            client,
            entities_url: endpoint(&config.base_url, ENTITIES_PATH)?,
            settings_objects_url: endpoint(&config.base_url, SETTINGS_OBJECTS_PATH)?,
        })
    }
}

fn endpoint(base_url: &Url, path: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}/{}",
        base_url.as_str().trim_end_matches('/'),
        path
    ))
}

/// Turns a non-success response into `PlatformError::Rejected`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PlatformError::Rejected { status, body })
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn query_entities(&self, entity_selector: &str) -> Result<EntityPage, PlatformError> {
        let start = Instant::now();

        let response = self
            .client
            .get(self.entities_url.clone())
            .query(&[("entitySelector", entity_selector)])
            .send()
            .await;

        metrics::histogram!(PLATFORM_REQUEST_DURATION.name, "endpoint" => "entities")
            .record(start.elapsed().as_secs_f64());

        let response = check_status(response?).await?;
        Ok(response.json::<EntityPage>().await?)
    }

    async fn write_settings(&self, objects: &[WriteObject<'_>]) -> Result<(), PlatformError> {
        let start = Instant::now();

        let response = self
            .client
            .post(self.settings_objects_url.clone())
            .json(objects)
            .send()
            .await;

        metrics::histogram!(PLATFORM_REQUEST_DURATION.name, "endpoint" => "settings_objects")
            .record(start.elapsed().as_secs_f64());

        check_status(response?).await?;
        Ok(())
    }
}
