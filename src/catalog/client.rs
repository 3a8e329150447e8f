//! HTTP client for the remote species catalog.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

use super::api_types::{ApiDetailResponse, ApiPageResponse};
use super::types::{DetailRecord, PageResult};

/// Source of catalog data. The repository is written against this seam so
/// tests can substitute counting or failing implementations.
///
/// Implementations perform a single attempt per call: no caching, no retry.
#[async_trait]
pub trait RemoteSource: Send + Sync {
  /// Fetch one zero-based page of list items.
  async fn fetch_page(&self, page: u32) -> Result<PageResult>;

  /// Fetch the full detail record for one catalog key.
  async fn fetch_detail(&self, key: &str) -> Result<DetailRecord>;
}

/// Remote source backed by the catalog HTTP API.
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  base_url: Url,
  page_size: u32,
}

impl CatalogClient {
  /// Build a client from configuration. Timeouts are mandatory; an expired
  /// deadline surfaces as [`Error::Timeout`], never a raw transport error.
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| Error::UnknownTransport(format!("invalid base url {}: {}", config.base_url, e)))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
      .build()
      .map_err(|e| Error::UnknownTransport(format!("failed to build http client: {}", e)))?;

    Ok(Self {
      http,
      base_url,
      page_size: config.page_size,
    })
  }

  fn page_url(&self, page: u32) -> Result<Url> {
    let mut url = self.join("catalog/items")?;
    url
      .query_pairs_mut()
      .append_pair("limit", &self.page_size.to_string())
      .append_pair("offset", &(page * self.page_size).to_string());
    Ok(url)
  }

  fn detail_url(&self, key: &str) -> Result<Url> {
    self.join(&format!("catalog/items/{}", key))
  }

  fn join(&self, path: &str) -> Result<Url> {
    // Url::join treats the last segment of a slash-less base as a file,
    // so extend segments explicitly instead.
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| Error::UnknownTransport("base url cannot be a base".to_string()))?
      .pop_if_empty()
      .extend(path.split('/'));
    Ok(url)
  }
}

#[async_trait]
impl RemoteSource for CatalogClient {
  async fn fetch_page(&self, page: u32) -> Result<PageResult> {
    let url = self.page_url(page)?;
    tracing::debug!(page, %url, "fetching catalog page");

    let resp = self.http.get(url).send().await.map_err(classify_transport)?;
    let resp = check_status(resp, &format!("page {}", page))?;

    let body: ApiPageResponse = resp.json().await.map_err(classify_transport)?;
    Ok(body.into_page(page))
  }

  async fn fetch_detail(&self, key: &str) -> Result<DetailRecord> {
    let url = self.detail_url(key)?;
    tracing::debug!(key, %url, "fetching catalog detail");

    let resp = self.http.get(url).send().await.map_err(classify_transport)?;
    let resp = check_status(resp, key)?;

    let body: ApiDetailResponse = resp.json().await.map_err(classify_transport)?;
    Ok(body.into_record())
  }
}

/// Map a reqwest failure into the error taxonomy.
fn classify_transport(err: reqwest::Error) -> Error {
  if err.is_timeout() {
    Error::Timeout
  } else if err.is_connect() {
    Error::Connection(err.to_string())
  } else {
    Error::UnknownTransport(err.to_string())
  }
}

/// Classify non-success HTTP statuses before touching the body.
fn check_status(resp: reqwest::Response, resource: &str) -> Result<reqwest::Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  if status == StatusCode::NOT_FOUND {
    return Err(Error::NotFound(resource.to_string()));
  }
  if status.is_server_error() {
    return Err(Error::Server(status.as_u16()));
  }
  Err(Error::UnknownTransport(format!(
    "unexpected status {} for {}",
    status, resource
  )))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> CatalogClient {
    CatalogClient::new(&Config {
      base_url: base.to_string(),
      ..Config::default()
    })
    .unwrap()
  }

  #[test]
  fn test_page_url_offset() {
    let client = client("https://catalog.test/api");
    let url = client.page_url(3).unwrap();
    assert_eq!(
      url.as_str(),
      "https://catalog.test/api/catalog/items?limit=20&offset=60"
    );
  }

  #[test]
  fn test_page_url_zero_page() {
    let client = client("https://catalog.test/api/");
    let url = client.page_url(0).unwrap();
    assert_eq!(
      url.as_str(),
      "https://catalog.test/api/catalog/items?limit=20&offset=0"
    );
  }

  #[test]
  fn test_detail_url() {
    let client = client("https://catalog.test/api");
    let url = client.detail_url("fernfox").unwrap();
    assert_eq!(url.as_str(), "https://catalog.test/api/catalog/items/fernfox");
  }

  #[test]
  fn test_invalid_base_url_rejected() {
    let result = CatalogClient::new(&Config {
      base_url: "not a url".to_string(),
      ..Config::default()
    });
    assert!(result.is_err());
  }

  fn response_with_status(status: u16) -> reqwest::Response {
    reqwest::Response::from(
      http::Response::builder()
        .status(status)
        .body("")
        .unwrap(),
    )
  }

  #[test]
  fn test_check_status_passes_success_through() {
    assert!(check_status(response_with_status(200), "page 0").is_ok());
  }

  #[test]
  fn test_check_status_maps_404_to_not_found() {
    let err = check_status(response_with_status(404), "fernfox").unwrap_err();
    match err {
      Error::NotFound(resource) => assert_eq!(resource, "fernfox"),
      other => panic!("expected NotFound, got {:?}", other),
    }
  }

  #[test]
  fn test_check_status_maps_5xx_to_server() {
    let err = check_status(response_with_status(503), "page 2").unwrap_err();
    assert!(matches!(err, Error::Server(503)));
  }

  #[test]
  fn test_check_status_other_4xx_is_unknown_transport() {
    let err = check_status(response_with_status(429), "page 0").unwrap_err();
    assert!(matches!(err, Error::UnknownTransport(_)));
  }
}
