//! Client for the FSEconomy data feed.
//!
//! - Every request goes through one shared [`RateLimiter`].
//! - Responses are classified by their body text: the feed answers throttling
//!   and maintenance with a 200 and a message instead of CSV.
//! - Transient rejections are retried per [`RetryPolicy`]; maintenance is not.
//! - Large ICAO lists are split into fixed-size batches issued in order.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use super::rate_limit::RateLimiter;
use super::retry::{retry, RetryPolicy};
use crate::domain::{AircraftListing, JobClass, JobPosting, UnitType};
use crate::util::version::USER_AGENT;

pub const DEFAULT_BASE_URL: &str = "https://server.fseconomy.net/data";
pub const DEFAULT_BATCH_SIZE: usize = 1500;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("request under the minimum delay: {0}")]
    UnderMinimumDelay(String),
    #[error("feed closed for maintenance: {0}")]
    Maintenance(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed feed response: {0}")]
    Csv(#[from] csv::Error),
}

impl FeedError {
    /// Throttling rejections clear up on their own; everything else is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TooManyRequests(_) | Self::UnderMinimumDelay(_))
    }
}

/// How a response body reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    TooManyRequests,
    UnderMinimumDelay,
    Maintenance,
}

pub fn classify(body: &str) -> ResponseClass {
    let lowered = body.to_ascii_lowercase();
    if lowered.contains("many requests") {
        ResponseClass::TooManyRequests
    } else if lowered.contains("under the minimum delay") {
        ResponseClass::UnderMinimumDelay
    } else if lowered.contains("closed for maintenance") {
        ResponseClass::Maintenance
    } else {
        ResponseClass::Success
    }
}

/// Feed authentication. A service key wins when both are configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    ServiceKey(String),
    UserKey(String),
}

impl Credentials {
    pub fn from_keys(service_key: Option<String>, user_key: Option<String>) -> Option<Self> {
        service_key
            .filter(|key| !key.is_empty())
            .map(Self::ServiceKey)
            .or_else(|| user_key.filter(|key| !key.is_empty()).map(Self::UserKey))
    }

    fn query_pair(&self) -> (&'static str, &str) {
        match self {
            Self::ServiceKey(key) => ("servicekey", key.as_str()),
            Self::UserKey(key) => ("userkey", key.as_str()),
        }
    }
}

/// Something that can GET a URL and hand back the body.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &Url) -> Result<String, FeedError>;
}

/// Plain reqwest transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FeedError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<String, FeedError> {
        let response = self.http.get(url.clone()).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[derive(Clone, Debug)]
pub struct FeedSettings {
    pub base_url: String,
    pub retry: RetryPolicy,
    pub min_interval: std::time::Duration,
    pub batch_size: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            min_interval: super::rate_limit::DEFAULT_MIN_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

pub struct FseClient<T = HttpTransport> {
    transport: T,
    base_url: Url,
    credentials: Credentials,
    limiter: Mutex<RateLimiter>,
    retry: RetryPolicy,
    batch_size: usize,
}

impl FseClient<HttpTransport> {
    pub fn new(credentials: Credentials, settings: &FeedSettings) -> Result<Self, FeedError> {
        Self::with_transport(HttpTransport::new()?, credentials, settings)
    }
}

impl<T: Transport> FseClient<T> {
    pub fn with_transport(
        transport: T,
        credentials: Credentials,
        settings: &FeedSettings,
    ) -> Result<Self, FeedError> {
        Ok(Self {
            transport,
            base_url: Url::parse(&settings.base_url)?,
            credentials,
            limiter: Mutex::new(RateLimiter::new(settings.min_interval)),
            retry: settings.retry,
            batch_size: settings.batch_size.max(1),
        })
    }

    /// Jobs departing any of `icaos`, fetched in batches, in batch order.
    pub async fn jobs_from(&self, icaos: &[String]) -> Result<Vec<JobPosting>, FeedError> {
        match self.jobs_from_partial(icaos).await {
            (jobs, None) => Ok(jobs),
            (_, Some(err)) => Err(err),
        }
    }

    /// Like [`Self::jobs_from`], but keeps the batches fetched before a
    /// failure.
    pub async fn jobs_from_partial(&self, icaos: &[String]) -> (Vec<JobPosting>, Option<FeedError>) {
        let mut jobs = Vec::new();
        let batches = icaos.len().div_ceil(self.batch_size);
        for (batch_no, batch) in icaos.chunks(self.batch_size).enumerate() {
            let codes = batch.join("-");
            let rows = match self
                .fetch(&[("query", "icao"), ("search", "jobsfrom"), ("icaos", codes.as_str())])
                .await
                .and_then(|body| parse_feed_csv::<JobRow>(&body))
            {
                Ok(rows) => rows,
                Err(err) => return (jobs, Some(err)),
            };
            info!(
                "[jobs] batch {}/{batches}: {} airports, {} postings",
                batch_no + 1,
                batch.len(),
                rows.len()
            );
            jobs.extend(rows.into_iter().filter_map(JobRow::into_posting));
        }
        (jobs, None)
    }

    /// Every listing of one aircraft model, wherever it is parked.
    pub async fn aircraft_by_model(&self, make_model: &str) -> Result<Vec<AircraftListing>, FeedError> {
        info!("[aircraft] searching airports with {make_model}");
        let body = self
            .fetch(&[
                ("query", "aircraft"),
                ("search", "makemodel"),
                ("makemodel", make_model),
            ])
            .await?;
        let rows: Vec<AircraftRow> = parse_feed_csv(&body)?;
        Ok(rows.into_iter().map(AircraftListing::from).collect())
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, FeedError> {
        let url = self.url(params);
        retry(&self.retry, || self.request(&url)).await
    }

    /// One rate-limited request, classified.
    async fn request(&self, url: &Url) -> Result<String, FeedError> {
        let mut limiter = self.limiter.lock().await;
        limiter.wait().await;
        debug!("GET {}", redact(url));
        let outcome = self.transport.get(url).await;
        limiter.finished();
        drop(limiter);

        let body = outcome?;
        match classify(&body) {
            ResponseClass::Success => Ok(body),
            ResponseClass::TooManyRequests => {
                warn!("feed rejected request: too many requests; a service key avoids this");
                Err(FeedError::TooManyRequests(body.trim().to_string()))
            }
            ResponseClass::UnderMinimumDelay => {
                warn!("feed rejected request: under the minimum delay");
                Err(FeedError::UnderMinimumDelay(body.trim().to_string()))
            }
            ResponseClass::Maintenance => {
                error!("feed is closed for maintenance");
                Err(FeedError::Maintenance(body.trim().to_string()))
            }
        }
    }

    fn url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("format", "csv");
            for (key, value) in params {
                query.append_pair(key, value);
            }
            let (key, value) = self.credentials.query_pair();
            query.append_pair(key, value);
        }
        url
    }
}

/// URL with key values blanked, for logs.
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key.ends_with("key") {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    clean.query_pairs_mut().clear().extend_pairs(pairs);
    clean.to_string()
}

/// Decode a feed CSV body. The first column is a row index and is dropped.
pub fn parse_feed_csv<D: DeserializeOwned>(body: &str) -> Result<Vec<D>, FeedError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: csv::StringRecord = reader.headers()?.iter().skip(1).map(str::trim).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record: csv::StringRecord = record?.iter().skip(1).collect();
        rows.push(record.deserialize(Some(&headers))?);
    }
    Ok(rows)
}

fn flag(raw: &str) -> bool {
    raw == "true"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JobRow {
    from_icao: String,
    to_icao: String,
    amount: u32,
    unit_type: String,
    #[serde(default)]
    commodity: Option<String>,
    pay: f64,
    #[serde(default)]
    pt_assignment: String,
    #[serde(default, rename = "Type")]
    kind: String,
}

impl JobRow {
    fn into_posting(self) -> Option<JobPosting> {
        let Some(unit_type) = UnitType::parse(&self.unit_type) else {
            debug!("skipping job with unit type {:?}", self.unit_type);
            return None;
        };
        Some(JobPosting {
            from_icao: self.from_icao,
            to_icao: self.to_icao,
            class: JobClass::from_type_column(&self.kind),
            unit_type,
            amount: self.amount,
            pay: self.pay,
            commodity: self.commodity.filter(|name| !name.is_empty()),
            pt_assignment: flag(&self.pt_assignment),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AircraftRow {
    make_model: String,
    registration: String,
    location: String,
    #[serde(default)]
    rental_dry: f64,
    #[serde(default)]
    rental_wet: f64,
    #[serde(default)]
    rental_time: f64,
    #[serde(default)]
    pct_fuel: f64,
}

impl From<AircraftRow> for AircraftListing {
    fn from(row: AircraftRow) -> Self {
        Self {
            make_model: row.make_model,
            registration: row.registration,
            location: row.location,
            pct_fuel: row.pct_fuel,
            rental_dry: row.rental_dry,
            rental_wet: row.rental_wet,
            rental_time: row.rental_time,
        }
    }
}
