//! Wikipedia link crawler.
//!
//! Expands an article into the articles it links to, using the MediaWiki
//! `prop=links` query. Long link lists are paged with `plcontinue`, which the
//! plugin hands back as a continuation connection.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::QueueConfig;
use crate::error::{FetchError, FetchResult};
use crate::traits::{Connection, CrawlerPlugin, ExpandRequest, ExpandResponse};

pub const WIKIPEDIA_API_BASE_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Env var for the delay between requests, in milliseconds.
pub const DELAY_ENV: &str = "WIKIPEDIA_PLUGIN_DELAY_MS";

/// Env var for the work queue capacity.
pub const QUEUE_SIZE_ENV: &str = "WIKIPEDIA_QUEUE_SIZE";

const DEFAULT_DELAY_MS: u64 = 500;
const DEFAULT_QUEUE_SIZE: usize = 25;

#[derive(Debug, Deserialize)]
struct LinksResponse {
    #[serde(rename = "continue", default)]
    continuation: Option<Continuation>,
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct Continuation {
    #[serde(default)]
    plcontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    title: String,
}

pub struct WikipediaPlugin {
    client: reqwest::Client,
    base_url: String,
    queue_config: QueueConfig,
}

impl WikipediaPlugin {
    /// Create a plugin against the English Wikipedia API with the default
    /// queue config.
    pub fn new() -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("handshakes-seeker/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            base_url: WIKIPEDIA_API_BASE_URL.to_string(),
            queue_config: QueueConfig::new(
                Duration::from_millis(DEFAULT_DELAY_MS),
                DEFAULT_QUEUE_SIZE,
            ),
        })
    }

    /// Create a plugin whose queue config comes from `WIKIPEDIA_PLUGIN_DELAY_MS`
    /// and `WIKIPEDIA_QUEUE_SIZE`.
    pub fn from_env() -> FetchResult<Self> {
        let queue_config =
            QueueConfig::from_env(DELAY_ENV, DEFAULT_DELAY_MS, QUEUE_SIZE_ENV, DEFAULT_QUEUE_SIZE);
        Ok(Self::new()?.with_queue_config(queue_config))
    }

    /// Point at another MediaWiki API endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_queue_config(mut self, queue_config: QueueConfig) -> Self {
        self.queue_config = queue_config;
        self
    }

    /// Build the links query for a request.
    pub fn request_url(&self, request: &ExpandRequest) -> FetchResult<Url> {
        let mut params = vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("prop", "links".to_string()),
            ("pllimit", "max".to_string()),
            ("titles", request.source_node.clone()),
        ];
        if !request.cursor.is_empty() {
            params.push(("plcontinue", request.cursor.clone()));
        }

        Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| FetchError::Decode(format!("invalid API url {}: {}", self.base_url, e)))
    }

    /// Turn a `prop=links` response body into connections.
    ///
    /// Every link becomes a connection toward the request's destination. A
    /// `plcontinue` token adds a continuation back to the request's source.
    pub fn connections_from_body(
        body: &str,
        request: &ExpandRequest,
    ) -> FetchResult<Vec<Connection>> {
        let response: LinksResponse = serde_json::from_str(body)
            .map_err(|e| FetchError::Decode(format!("links response: {}", e)))?;

        let mut connections = Vec::new();

        if let Some(query) = response.query {
            for (page_id, raw_page) in query.pages {
                let page: Page = match serde_json::from_value(raw_page) {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(page_id = %page_id, error = %e, "Skipping malformed page");
                        continue;
                    }
                };

                connections.extend(page.links.into_iter().map(|link| {
                    Connection::new(link.title, request.dest_node.as_str(), "")
                }));
            }
        }

        if let Some(cursor) = response
            .continuation
            .and_then(|c| c.plcontinue)
            .filter(|c| !c.is_empty())
        {
            connections.push(Connection::new(
                request.source_node.as_str(),
                request.dest_node.as_str(),
                cursor,
            ));
        }

        Ok(connections)
    }
}

#[async_trait]
impl CrawlerPlugin for WikipediaPlugin {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn expand(&self, request: &ExpandRequest) -> FetchResult<ExpandResponse> {
        let url = self.request_url(request)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Rejected("wikipedia rate limit".to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                source_name: self.name().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let connections = Self::connections_from_body(&body, request)?;
        debug!(
            source = %request.source_node,
            connections = connections.len(),
            "Fetched wikipedia links"
        );

        Ok(ExpandResponse { connections })
    }

    fn queue_config(&self) -> QueueConfig {
        self.queue_config
    }
}

/// Normalize a Wikipedia article URL or raw title into an API title.
///
/// `https://en.wikipedia.org/wiki/Kevin_Bacon` and `Kevin_Bacon` both become
/// `Kevin Bacon`.
pub fn title_from_url(input: &str) -> String {
    let input = input.trim();

    let parsed = if input.starts_with("http://") || input.starts_with("https://") {
        Url::parse(input).ok()
    } else {
        None
    };

    let raw = match parsed {
        Some(url) => match url.path().split_once("/wiki/") {
            Some((_, title)) => title.to_string(),
            None => url.path().trim_start_matches('/').to_string(),
        },
        None => input.to_string(),
    };

    let decoded = urlencoding::decode(&raw)
        .map(|title| title.into_owned())
        .unwrap_or(raw);

    decoded.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: &str, dest: &str, cursor: &str) -> ExpandRequest {
        ExpandRequest {
            source_node: source.into(),
            dest_node: dest.into(),
            cursor: cursor.into(),
        }
    }

    #[test]
    fn test_connections_from_links() {
        let body = r#"{
            "batchcomplete": "",
            "query": {
                "pages": {
                    "736": {
                        "pageid": 736,
                        "ns": 0,
                        "title": "Albert Einstein",
                        "links": [
                            {"ns": 0, "title": "Physics"},
                            {"ns": 0, "title": "Kevin Bacon"}
                        ]
                    }
                }
            }
        }"#;

        let connections = WikipediaPlugin::connections_from_body(
            body,
            &request("Albert Einstein", "Kevin Bacon", ""),
        )
        .unwrap();

        assert_eq!(
            connections,
            vec![
                Connection::new("Physics", "Kevin Bacon", ""),
                Connection::new("Kevin Bacon", "Kevin Bacon", ""),
            ]
        );
        assert!(connections[1].reaches_destination());
    }

    #[test]
    fn test_continuation_connection() {
        let body = r#"{
            "continue": {"plcontinue": "736|0|Zurich", "continue": "||"},
            "query": {"pages": {"736": {"title": "Albert Einstein", "links": [{"title": "Bern"}]}}}
        }"#;

        let connections = WikipediaPlugin::connections_from_body(
            body,
            &request("Albert Einstein", "Kevin Bacon", ""),
        )
        .unwrap();

        assert_eq!(connections.len(), 2);
        assert_eq!(
            connections[1],
            Connection::new("Albert Einstein", "Kevin Bacon", "736|0|Zurich")
        );
    }

    #[test]
    fn test_malformed_page_is_skipped() {
        let body = r#"{
            "query": {
                "pages": {
                    "1": {"title": "Broken", "links": "not a list"},
                    "2": {"title": "Fine", "links": [{"title": "Bern"}]}
                }
            }
        }"#;

        let connections =
            WikipediaPlugin::connections_from_body(body, &request("Fine", "X", "")).unwrap();

        assert_eq!(connections, vec![Connection::new("Bern", "X", "")]);
    }

    #[test]
    fn test_missing_page_has_no_links() {
        let body = r#"{"query": {"pages": {"-1": {"title": "Nope", "missing": ""}}}}"#;

        let connections =
            WikipediaPlugin::connections_from_body(body, &request("Nope", "X", "")).unwrap();

        assert!(connections.is_empty());
    }

    #[test]
    fn test_invalid_body() {
        let result = WikipediaPlugin::connections_from_body("<html>", &request("A", "B", ""));
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_request_url() {
        let plugin = WikipediaPlugin::new().unwrap();

        let url = plugin
            .request_url(&request("Kevin Bacon", "Albert Einstein", ""))
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(url.as_str().starts_with(WIKIPEDIA_API_BASE_URL));
        assert!(pairs.contains(&("prop".into(), "links".into())));
        assert!(pairs.contains(&("pllimit".into(), "max".into())));
        assert!(pairs.contains(&("titles".into(), "Kevin Bacon".into())));
        assert!(!pairs.iter().any(|(k, _)| k == "plcontinue"));

        let url = plugin
            .request_url(&request("Kevin Bacon", "Albert Einstein", "12|0|Zurich"))
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("plcontinue".into(), "12|0|Zurich".into())));
    }

    #[test]
    fn test_title_from_url() {
        assert_eq!(
            title_from_url("https://en.wikipedia.org/wiki/Kevin_Bacon"),
            "Kevin Bacon"
        );
        assert_eq!(
            title_from_url("https://en.wikipedia.org/wiki/Caf%C3%A9_society"),
            "Café society"
        );
        assert_eq!(title_from_url("  Albert_Einstein "), "Albert Einstein");
        assert_eq!(
            title_from_url("Rust (programming language)"),
            "Rust (programming language)"
        );
        assert_eq!(title_from_url("Category:Physics"), "Category:Physics");
    }
}
