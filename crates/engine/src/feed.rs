//! Feed orchestrator: given a feed kind, retrieves the ECB XML body through
//! a pluggable HTTP adapter and hands it to a pluggable XML parser.
//!
//! Both adapters are swappable at construction time (dependency injection)
//! so tests can inject fixture bytes and a deterministic parser without
//! touching the network.

use std::sync::Arc;

use async_trait::async_trait;
use forex_core::error::FeedError;
use forex_core::types::{DailyRateSet, FeedPayload, RateSet};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Which of the three ECB feeds to retrieve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Latest,
    NinetyDays,
    Historic,
}

impl FeedKind {
    /// Path appended to the configured base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Latest => "/eurofxref-daily.xml",
            Self::NinetyDays => "/eurofxref-hist-90d.xml",
            Self::Historic => "/eurofxref-hist.xml",
        }
    }
}

/// Retrieves raw bytes for a URL. The default implementation uses `reqwest`;
/// tests supply a fixture adapter instead.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FeedError>;
}

/// Parses raw ECB XML bytes into an ordered, most-recent-first sequence of
/// daily rate sets. The default implementation uses `quick-xml`.
pub trait XmlParse: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<FeedPayload, FeedError>;
}

/// `reqwest`-backed HTTP adapter. Historic requests ask for compressed
/// bodies since the full-history feed is large.
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .gzip(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for ReqwestFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FeedError> {
        let response = self.client.get(url).send().await.map_err(|e| FeedError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus { url: url.to_string(), status: status.as_u16() });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FeedError::Http { url: url.to_string(), message: e.to_string() })
    }
}

/// `quick-xml`-backed parser for the ECB envelope: an outer `Cube` wraps
/// per-day `Cube time="..."` elements, each wrapping per-currency
/// `Cube currency="..." rate="..."` elements. EUR is never enumerated; the
/// caller is expected to synthesize it via `with_eur_synthesized`.
#[derive(Default)]
pub struct QuickXmlParse;

impl XmlParse for QuickXmlParse {
    fn parse(&self, bytes: &[u8]) -> Result<FeedPayload, FeedError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut payload = Vec::new();
        let mut current_date: Option<chrono::NaiveDate> = None;
        let mut current_rates = RateSet::new();
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| FeedError::Xml { message: e.to_string() })?;
            match event {
                Event::Eof => break,
                Event::Start(tag) | Event::Empty(tag) => {
                    if tag.local_name().as_ref() != b"Cube" {
                        continue;
                    }
                    let mut time_attr: Option<String> = None;
                    let mut currency_attr: Option<String> = None;
                    let mut rate_attr: Option<String> = None;

                    for attr in tag.attributes().flatten() {
                        let key = attr.key.local_name();
                        let value = attr
                            .unescape_value()
                            .map_err(|e| FeedError::Xml { message: e.to_string() })?
                            .to_string();
                        match key.as_ref() {
                            b"time" => time_attr = Some(value),
                            b"currency" => currency_attr = Some(value),
                            b"rate" => rate_attr = Some(value),
                            _ => {}
                        }
                    }

                    if let Some(time) = time_attr {
                        if let Some(date) = current_date.take() {
                            payload.push(DailyRateSet::new(date, std::mem::take(&mut current_rates)));
                        }
                        let parsed = chrono::NaiveDate::parse_from_str(&time, "%Y-%m-%d")
                            .map_err(|_| FeedError::Xml { message: format!("bad date in feed: {time}") })?;
                        current_date = Some(parsed);
                    } else if let (Some(currency), Some(rate)) = (currency_attr, rate_attr) {
                        let decimal = Decimal::from_str(&rate)
                            .map_err(|_| FeedError::Xml { message: format!("bad rate in feed: {rate}") })?;
                        current_rates.insert(currency, decimal);
                    }
                }
                _ => {}
            }
            buf.clear();
        }

        if let Some(date) = current_date.take() {
            payload.push(DailyRateSet::new(date, current_rates));
        }

        if payload.is_empty() {
            return Err(FeedError::Empty);
        }

        Ok(payload)
    }
}

/// Orchestrates one feed fetch: HTTP retrieval then XML parsing, against
/// the fixed ECB base URL and the three fixed paths. Performs no retry;
/// partial-failure policy belongs to the fetcher that calls it.
pub struct FeedOrchestrator {
    base_url: String,
    http: Arc<dyn HttpFetch>,
    xml: Arc<dyn XmlParse>,
}

impl FeedOrchestrator {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpFetch>, xml: Arc<dyn XmlParse>) -> Self {
        Self { base_url: base_url.into(), http, xml }
    }

    pub fn with_defaults(base_url: impl Into<String>) -> Self {
        Self::new(base_url, Arc::new(ReqwestFetch::new()), Arc::new(QuickXmlParse))
    }

    pub async fn fetch(&self, kind: FeedKind) -> Result<FeedPayload, FeedError> {
        let url = format!("{}{}", self.base_url, kind.path());
        let bytes = self.http.get(&url).await?;
        self.xml.parse(&bytes)
    }
}
