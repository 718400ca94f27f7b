//! crates.io registry API client
//!
//! This module provides functionality to fetch crate metadata from the
//! crates.io API and parse it into our CrateInfo data structure.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL for the crates.io API
const CRATES_IO_BASE_URL: &str = "https://crates.io/api/v1/crates";

/// User agent sent with every request; crates.io rejects anonymous clients
const USER_AGENT: &str = concat!("cratever/", env!("CARGO_PKG_VERSION"));

/// Metadata about the latest published version of a crate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrateInfo {
    /// Crate name as registered on crates.io
    pub name: String,
    /// Latest stable version, falling back to the overall newest version
    /// when no stable release exists
    pub latest_version: String,
    /// Short description from the crate metadata
    pub description: Option<String>,
    /// All-time download count
    pub downloads: u64,
    /// When the crate was last updated on the registry
    pub updated_at: DateTime<Utc>,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Errors that can occur when fetching crate metadata
#[derive(Debug, Error)]
pub enum RegistryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The crate does not exist on the registry
    #[error("Crate not found: {0}")]
    NotFound(String),
}

/// Client for fetching crate metadata from the crates.io API
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
}

impl RegistryClient {
    /// Create a new RegistryClient with the default HTTP client
    pub fn new() -> Result<Self, RegistryError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Create a new RegistryClient with a custom HTTP client
    #[allow(dead_code)]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch metadata for the given crate
    ///
    /// # Arguments
    /// * `name` - Crate name to look up
    ///
    /// # Returns
    /// * `Ok(CrateInfo)` - Metadata for the crate's latest version
    /// * `Err(RegistryError)` - If the request or parsing fails, or the
    ///   crate does not exist
    pub async fn fetch_crate(&self, name: &str) -> Result<CrateInfo, RegistryError> {
        let url = format!("{}/{}", CRATES_IO_BASE_URL, name);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        let response = response.error_for_status()?;
        let text = response.text().await?;
        let api_response: CratesIoResponse = serde_json::from_str(&text)?;

        Ok(parse_response(api_response))
    }
}

/// Convert the wire-format response into a CrateInfo
fn parse_response(response: CratesIoResponse) -> CrateInfo {
    let data = response.krate;
    let latest_version = data.max_stable_version.unwrap_or(data.max_version);

    CrateInfo {
        name: data.name,
        latest_version,
        description: data.description,
        downloads: data.downloads,
        updated_at: data.updated_at,
        fetched_at: Utc::now(),
    }
}

/// crates.io API response structure
#[derive(Debug, Deserialize)]
struct CratesIoResponse {
    #[serde(rename = "crate")]
    krate: CrateData,
}

/// Crate metadata from crates.io
#[derive(Debug, Deserialize)]
struct CrateData {
    name: String,
    max_version: String,
    max_stable_version: Option<String>,
    description: Option<String>,
    downloads: u64,
    updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sample valid crates.io API response, trimmed to the fields we read
    /// plus the surrounding noise the real endpoint returns
    const VALID_RESPONSE: &str = r#"{
        "categories": [],
        "crate": {
            "id": "serde",
            "name": "serde",
            "updated_at": "2024-08-05T17:30:00.000000Z",
            "created_at": "2014-12-05T20:20:32.000000Z",
            "downloads": 123456789,
            "recent_downloads": 9876543,
            "max_version": "1.0.210",
            "max_stable_version": "1.0.209",
            "description": "A generic serialization/deserialization framework",
            "homepage": "https://serde.rs",
            "repository": "https://github.com/serde-rs/serde"
        },
        "versions": [],
        "keywords": []
    }"#;

    #[test]
    fn test_parse_valid_response() {
        let response: CratesIoResponse =
            serde_json::from_str(VALID_RESPONSE).expect("Failed to parse valid response");

        let info = parse_response(response);

        assert_eq!(info.name, "serde");
        assert_eq!(info.latest_version, "1.0.209");
        assert_eq!(
            info.description.as_deref(),
            Some("A generic serialization/deserialization framework")
        );
        assert_eq!(info.downloads, 123456789);
        assert_eq!(info.updated_at.date_naive().to_string(), "2024-08-05");
    }

    #[test]
    fn test_missing_stable_version_falls_back_to_max() {
        let body = r#"{
            "crate": {
                "name": "nightly-only",
                "updated_at": "2024-01-01T00:00:00Z",
                "downloads": 10,
                "max_version": "0.2.0-beta.1",
                "max_stable_version": null,
                "description": null
            }
        }"#;

        let response: CratesIoResponse = serde_json::from_str(body).expect("Failed to parse");
        let info = parse_response(response);

        assert_eq!(info.latest_version, "0.2.0-beta.1");
        assert!(info.description.is_none());
    }

    #[test]
    fn test_parse_malformed_json() {
        let malformed = "{ invalid json }";
        let result: Result<CratesIoResponse, _> = serde_json::from_str(malformed);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_missing_crate_key() {
        let missing = r#"{ "versions": [] }"#;
        let result: Result<CratesIoResponse, _> = serde_json::from_str(missing);
        assert!(result.is_err());
    }

    #[test]
    fn test_crate_info_serialization_roundtrip() {
        let info = CrateInfo {
            name: "serde".to_string(),
            latest_version: "1.0.209".to_string(),
            description: Some("A generic serialization/deserialization framework".to_string()),
            downloads: 123456789,
            updated_at: Utc::now(),
            fetched_at: Utc::now(),
        };

        let json = serde_json::to_string(&info).expect("Failed to serialize CrateInfo");
        let deserialized: CrateInfo =
            serde_json::from_str(&json).expect("Failed to deserialize CrateInfo");

        assert_eq!(deserialized, info);
    }

    #[test]
    fn test_registry_client_new() {
        let client = RegistryClient::new();
        assert!(client.is_ok());
    }
}
