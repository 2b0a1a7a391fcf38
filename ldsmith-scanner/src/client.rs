use crate::error::{Result, ScanError};
use crate::extractor::extract_structured_data;
use crate::result::{Extraction, PropertyTable};
use crate::vocabulary::{parse_property_table, parse_vocabulary_index};
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_REGISTRY_BASE: &str = "https://schema.org/";
pub const DEFAULT_INDEX_URL: &str = "https://schema.org/version/latest/schema.jsonld";
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_INDEX_TIMEOUT_SECS: u64 = 20;

/// HTTP side of ldsmith: scrapes arbitrary pages and talks to the schema registry.
///
/// Every call is a single GET with its own timeout. Nothing is retried and
/// nothing is cached here.
#[derive(Debug, Clone)]
pub struct SchemaClient {
    client: Client,
    registry_base: Url,
    index_url: Url,
    page_timeout: Duration,
    index_timeout: Duration,
}

impl SchemaClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "ldsmith/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/trapdoorsec/ldsmith)"
            ))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            registry_base: parse_url(DEFAULT_REGISTRY_BASE)?,
            index_url: parse_url(DEFAULT_INDEX_URL)?,
            page_timeout: Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS),
            index_timeout: Duration::from_secs(DEFAULT_INDEX_TIMEOUT_SECS),
        })
    }

    /// Base address type pages hang off. A trailing `/` is added when missing.
    pub fn with_registry_base(mut self, base: &str) -> Result<Self> {
        let mut base = base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.registry_base = parse_url(&base)?;
        Ok(self)
    }

    pub fn with_index_url(mut self, index_url: &str) -> Result<Self> {
        self.index_url = parse_url(index_url)?;
        Ok(self)
    }

    /// Timeout for the scraped page and for registry type pages
    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_index_timeout(mut self, timeout: Duration) -> Self {
        self.index_timeout = timeout;
        self
    }

    pub fn registry_base(&self) -> &Url {
        &self.registry_base
    }

    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    /// URL of the documentation page for one vocabulary type.
    ///
    /// The name is appended to the registry base as a single percent-encoded
    /// path segment, so it can never leave the registry.
    pub fn vocabulary_url(&self, vocabulary: &str) -> Result<Url> {
        if matches!(vocabulary, "" | "." | "..") {
            return Err(ScanError::InvalidUrl(format!(
                "'{}' is not a vocabulary name",
                vocabulary
            )));
        }

        let mut url = self.registry_base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ScanError::InvalidUrl(format!("{} cannot take a path", self.registry_base))
            })?
            .pop_if_empty()
            .push(vocabulary);
        Ok(url)
    }

    /// Fetch a page and extract its JSON-LD blocks.
    pub async fn extract(&self, url: &str) -> Result<Extraction> {
        let url = parse_url(url)?;
        info!("Extracting JSON-LD from {}", url);

        let body = self.get_text(&url, self.page_timeout).await?;
        let extraction = extract_structured_data(&body)?.with_url(url.to_string());

        info!(
            "Found {} documents in {} blocks ({} failed)",
            extraction.documents.len(),
            extraction.blocks_found,
            extraction.failures.len()
        );
        Ok(extraction)
    }

    /// Fetch the registry index and list every class name in it.
    pub async fn fetch_vocabulary_index(&self) -> Result<Vec<String>> {
        info!("Fetching vocabulary index from {}", self.index_url);

        let body = self.get_text(&self.index_url, self.index_timeout).await?;
        let index: Value = serde_json::from_str(&body)?;
        let names = parse_vocabulary_index(&index);

        info!("Vocabulary index lists {} types", names.len());
        Ok(names)
    }

    /// Fetch the property table of one vocabulary type.
    ///
    /// Errors (network, status, or a page without a `definition-table`) mean
    /// "no result"; an `Ok` empty table means the type documents no properties.
    pub async fn fetch_properties(&self, vocabulary: &str) -> Result<PropertyTable> {
        let url = self.vocabulary_url(vocabulary)?;
        info!("Fetching properties for {} from {}", vocabulary, url);

        let body = self.get_text(&url, self.page_timeout).await?;
        parse_property_table(&body, vocabulary)
    }

    async fn get_text(&self, url: &Url, timeout: Duration) -> Result<String> {
        debug!("GET {} (timeout {:?})", url, timeout);

        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        debug!("{} answered {} in {:?}", url, status, start.elapsed());
        if !status.is_success() {
            return Err(ScanError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ScanError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw, other
        ))),
    }
}
