//! iTunes Search API client
//!
//! Looks up Mac App Store software for a search term and parses the JSON payload
//! into `AppResult` values.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Base URL for the iTunes Search API
const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";

/// Number of results requested when no limit is given
pub const DEFAULT_RESULT_LIMIT: u32 = 20;

/// Errors that can occur when searching the store
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with something other than 200 OK
    #[error("non-ok status code returned ({0})")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A single app returned by the search
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppResult {
    /// Store identifier, used in `macappstores://` links
    pub track_id: i64,
    /// Display name
    pub track_name: String,
    /// 512px artwork URL
    #[serde(rename = "artworkUrl512", default)]
    pub artwork_url: String,
    /// Web page for the app
    #[serde(default)]
    pub track_view_url: String,
    /// Average rating, 0 when unrated
    #[serde(default)]
    pub average_user_rating: f64,
    /// Price as formatted by the store (e.g. "Free")
    #[serde(default)]
    pub formatted_price: String,
    /// Number of ratings
    #[serde(default)]
    pub user_rating_count: u64,
}

/// Top-level search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<AppResult>,
}

/// Parses a raw search response body
pub fn parse_response(text: &str) -> Result<Vec<AppResult>, SearchError> {
    let response: SearchResponse = serde_json::from_str(text)?;
    Ok(response.results)
}

/// Client for the iTunes Search API
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    base_url: String,
    limit: u32,
}

impl SearchClient {
    /// Creates a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Creates a client around an existing HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: ITUNES_SEARCH_URL.to_string(),
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// Points the client at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the maximum number of results requested
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Query parameters sent with every search
    fn query(&self, term: &str) -> Vec<(&'static str, String)> {
        vec![
            ("media", "software".to_string()),
            ("entity", "macSoftware".to_string()),
            ("limit", self.limit.to_string()),
            ("term", term.to_string()),
        ]
    }

    /// Searches the store for `term`
    ///
    /// # Returns
    /// * `Ok(Vec<AppResult>)` - Results in the order the store ranked them
    /// * `Err(SearchError)` - If the request, status or parsing fails
    pub async fn search(&self, term: &str) -> Result<Vec<AppResult>, SearchError> {
        debug!(url = %self.base_url, term, "sending search request");
        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query(term))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let text = response.text().await?;
        let results = parse_response(&text)?;
        debug!(count = results.len(), "successfully downloaded results");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "resultCount": 2,
        "results": [
            {
                "trackId": 497799835,
                "trackName": "Xcode",
                "artworkUrl512": "https://is1-ssl.mzstatic.com/image/xcode/512x512bb.png",
                "trackViewUrl": "https://apps.apple.com/us/app/xcode/id497799835",
                "averageUserRating": 3.4,
                "formattedPrice": "Free",
                "userRatingCount": 12000,
                "kind": "mac-software"
            },
            {
                "trackId": 1,
                "trackName": "Unrated"
            }
        ]
    }"#;

    #[test]
    fn test_parse_response_maps_fields() {
        let results = parse_response(SAMPLE).expect("Sample should parse");
        assert_eq!(results.len(), 2);

        let xcode = &results[0];
        assert_eq!(xcode.track_id, 497799835);
        assert_eq!(xcode.track_name, "Xcode");
        assert_eq!(
            xcode.artwork_url,
            "https://is1-ssl.mzstatic.com/image/xcode/512x512bb.png"
        );
        assert_eq!(
            xcode.track_view_url,
            "https://apps.apple.com/us/app/xcode/id497799835"
        );
        assert!((xcode.average_user_rating - 3.4).abs() < 0.0001);
        assert_eq!(xcode.formatted_price, "Free");
        assert_eq!(xcode.user_rating_count, 12000);
    }

    #[test]
    fn test_parse_response_defaults_missing_fields() {
        let results = parse_response(SAMPLE).expect("Sample should parse");
        let unrated = &results[1];
        assert_eq!(unrated.artwork_url, "");
        assert_eq!(unrated.average_user_rating, 0.0);
        assert_eq!(unrated.user_rating_count, 0);
    }

    #[test]
    fn test_parse_response_empty_results() {
        let results = parse_response(r#"{"resultCount":0,"results":[]}"#).unwrap();
        assert!(results.is_empty());
        let results = parse_response("{}").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_response_invalid_json() {
        let result = parse_response("not json");
        assert!(matches!(result, Err(SearchError::ParseError(_))));
    }

    #[test]
    fn test_query_parameters() {
        let client = SearchClient::with_client(Client::new()).with_limit(5);
        let query = client.query("pixel editor");
        assert!(query.contains(&("media", "software".to_string())));
        assert!(query.contains(&("entity", "macSoftware".to_string())));
        assert!(query.contains(&("limit", "5".to_string())));
        assert!(query.contains(&("term", "pixel editor".to_string())));
    }

    #[test]
    fn test_with_base_url() {
        let client = SearchClient::with_client(Client::new()).with_base_url("http://localhost:1");
        assert_eq!(client.base_url, "http://localhost:1");
        assert_eq!(client.limit, DEFAULT_RESULT_LIMIT);
    }
}
