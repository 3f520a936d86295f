use std::fs::File;
use std::path::Path;

use reqwest::blocking::Client;

use crate::github::USER_AGENT;
use crate::HttpError;

const FALLBACK_FILE_NAME: &str = "download.tar.gz";

/// Stream the body at `url` into `dest`, creating or truncating it.
///
/// Returns the number of bytes written.
pub fn download(client: &Client, url: &str, dest: &Path) -> Result<u64, HttpError> {
    let mut resp = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .map_err(|source| HttpError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(HttpError::Status {
            url: url.to_string(),
            status: status.to_string(),
        });
    }

    let mut out = File::create(dest).map_err(|source| HttpError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    resp.copy_to(&mut out).map_err(|source| HttpError::Body {
        url: url.to_string(),
        source,
    })
}

/// Local file name for a downloaded asset: the last path segment of `url`.
#[must_use]
pub fn archive_file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => FALLBACK_FILE_NAME,
    }
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
    use std::fs;

    #[test]
    fn download_writes_body_verbatim() {
        let mut server = mockito::Server::new();
        let body: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
        let mock = server
            .mock("GET", "/tool_linux_amd64.tar.gz")
            .with_status(200)
            .with_body(&body)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool_linux_amd64.tar.gz");
        let url = format!("{}/tool_linux_amd64.tar.gz", server.url());

        let written = download(&Client::new(), &url, &dest).unwrap();
        mock.assert();

        assert_eq!(written, 70_000);
        assert_eq!(fs::read(&dest).unwrap(), body);
    }

    #[test]
    fn download_truncates_existing_file() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/asset")
            .with_status(200)
            .with_body("short")
            .create();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("asset");
        fs::write(&dest, "previous, longer contents").unwrap();

        download(&Client::new(), &format!("{}/asset", server.url()), &dest).unwrap();
        mock.assert();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "short");
    }

    #[test]
    fn download_non_success_status() {
        let mut server = mockito::Server::new();
        let mock = server.mock("GET", "/asset").with_status(500).create();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("asset");

        let err = download(&Client::new(), &format!("{}/asset", server.url()), &dest).unwrap_err();
        mock.assert();

        match err {
            HttpError::Status { status, .. } => assert!(status.contains("500")),
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(!dest.exists(), "nothing is written for a failed response");
    }

    #[test]
    fn download_into_missing_directory() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/asset")
            .with_status(200)
            .with_body("data")
            .create();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join("asset");

        let err = download(&Client::new(), &format!("{}/asset", server.url()), &dest).unwrap_err();
        assert!(matches!(err, HttpError::Io { .. }));
    }

    #[test]
    fn file_name_is_last_path_segment() {
        assert_eq!(
            archive_file_name(
                "https://github.com/o/r/releases/download/v1.0.0/tool_v1.0.0_linux_amd64.tar.gz"
            ),
            "tool_v1.0.0_linux_amd64.tar.gz"
        );
    }

    #[test]
    fn file_name_ignores_query_and_fragment() {
        assert_eq!(
            archive_file_name("https://example.com/dl/tool.tar.gz?token=abc#frag"),
            "tool.tar.gz"
        );
    }

    #[test]
    fn file_name_falls_back_when_url_has_no_segment() {
        assert_eq!(archive_file_name("https://example.com/"), FALLBACK_FILE_NAME);
        assert_eq!(archive_file_name(""), FALLBACK_FILE_NAME);
    }
}
