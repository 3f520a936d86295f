use reqwest::blocking::Client;
use serde::Deserialize;

use crate::HttpError;

pub const USER_AGENT: &str = "pp";

/// A file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_count: u64,
}

impl Asset {
    /// Size in mebibytes, for display.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1024.0 / 1024.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Fetch the latest published release of `owner/repo`, including its assets.
pub fn fetch_latest_release(
    client: &Client,
    api_base: &str,
    owner: &str,
    repo: &str,
) -> Result<Release, HttpError> {
    let url = format!("{api_base}/repos/{owner}/{repo}/releases/latest");
    log::debug!("fetching {url}");

    let resp = client
        .get(&url)
        .header("User-Agent", USER_AGENT)
        .header("Accept", "application/vnd.github+json")
        .send()
        .map_err(|source| HttpError::Request {
            url: url.clone(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(HttpError::Status {
            url,
            status: status.to_string(),
        });
    }

    let text = resp.text().map_err(|source| HttpError::Body {
        url: url.clone(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| HttpError::Parse { url, source })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::significant_drop_tightening
)]
mod tests {
    use super::*;

    const LATEST: &str = "/repos/octo/tool/releases/latest";

    #[test]
    fn fetch_parses_release_and_assets() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", LATEST)
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "tag_name": "v1.2.0",
                    "name": "Release 1.2.0",
                    "assets": [
                        {
                            "name": "tool_v1.2.0_linux_amd64.tar.gz",
                            "browser_download_url": "https://example.com/tool_v1.2.0_linux_amd64.tar.gz",
                            "size": 2097152,
                            "download_count": 42
                        },
                        {
                            "name": "tool_v1.2.0_darwin_arm64.tar.gz",
                            "browser_download_url": "https://example.com/tool_v1.2.0_darwin_arm64.tar.gz",
                            "size": 1024,
                            "download_count": 7
                        }
                    ]
                }"#,
            )
            .create();

        let release = fetch_latest_release(&Client::new(), &server.url(), "octo", "tool").unwrap();
        mock.assert();

        assert_eq!(release.tag_name, "v1.2.0");
        assert_eq!(release.name.as_deref(), Some("Release 1.2.0"));
        assert_eq!(release.assets.len(), 2);
        assert_eq!(release.assets[0].name, "tool_v1.2.0_linux_amd64.tar.gz");
        assert_eq!(
            release.assets[0].download_url,
            "https://example.com/tool_v1.2.0_linux_amd64.tar.gz"
        );
        assert_eq!(release.assets[0].download_count, 42);
        assert!((release.assets[0].size_mb() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fetch_tolerates_null_name_and_missing_assets() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", LATEST)
            .with_status(200)
            .with_body(r#"{"tag_name": "v0.1.0", "name": null}"#)
            .create();

        let release = fetch_latest_release(&Client::new(), &server.url(), "octo", "tool").unwrap();
        mock.assert();

        assert_eq!(release.tag_name, "v0.1.0");
        assert!(release.name.is_none());
        assert!(release.assets.is_empty());
    }

    #[test]
    fn fetch_non_success_status_carries_status_text() {
        let mut server = mockito::Server::new();
        let mock = server.mock("GET", LATEST).with_status(404).create();

        let err = fetch_latest_release(&Client::new(), &server.url(), "octo", "tool").unwrap_err();
        mock.assert();

        match err {
            HttpError::Status { status, .. } => assert!(status.contains("404")),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn fetch_invalid_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", LATEST)
            .with_status(200)
            .with_body("not-json")
            .create();

        let err = fetch_latest_release(&Client::new(), &server.url(), "octo", "tool").unwrap_err();
        mock.assert();

        assert!(matches!(err, HttpError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse response"));
    }

    #[test]
    fn fetch_missing_tag_name_is_a_parse_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", LATEST)
            .with_status(200)
            .with_body(r#"{"name": "Release 1"}"#)
            .create();

        let err = fetch_latest_release(&Client::new(), &server.url(), "octo", "tool").unwrap_err();
        mock.assert();

        assert!(matches!(err, HttpError::Parse { .. }));
    }

    #[test]
    fn fetch_unreachable_server_is_a_request_error() {
        let err =
            fetch_latest_release(&Client::new(), "http://127.0.0.1:1", "octo", "tool").unwrap_err();
        assert!(matches!(err, HttpError::Request { .. }));
    }
}
