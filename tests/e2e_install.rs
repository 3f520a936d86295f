//! End-to-end tests for the install pipeline.
//!
//! A mock release API serves the release metadata and the asset archives, so
//! these run offline: fetch, select, download, extract and chmod.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;
use std::io::Write;
use std::path::Path;

use pp::{Config, ExtractError, HttpError, InstallerError, OsAliases, TargetPlatform};

const LATEST: &str = "/repos/octo/tool/releases/latest";

fn tar_gz(name: &str, content: &[u8]) -> Vec<u8> {
    let mut tar_builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar_builder.append_data(&mut header, name, content).unwrap();
    let tar_bytes = tar_builder.into_inner().unwrap();

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap()
}

fn release_json(base: &str, names: &[&str]) -> String {
    let assets: Vec<String> = names
        .iter()
        .map(|name| {
            format!(
                r#"{{"name": "{name}", "browser_download_url": "{base}/download/{name}", "size": 1024, "download_count": 3}}"#
            )
        })
        .collect();
    format!(
        r#"{{"tag_name": "v1.0.0", "name": "v1.0.0", "assets": [{}]}}"#,
        assets.join(",")
    )
}

fn config(api_base: &str, install_dir: &Path, os: &str, arch: &str) -> Config {
    Config {
        api_base: api_base.to_string(),
        target: TargetPlatform::new(os, arch),
        aliases: OsAliases::default(),
        install_dir: install_dir.to_path_buf(),
        ..Config::default()
    }
}

const ASSETS: [&str; 3] = [
    "tool_v1.0.0_macos_arm64.tar.gz",
    "tool_v1.0.0_linux_amd64.tar.gz",
    "tool_v1.0.0_windows_amd64.tar.gz",
];

#[test]
fn installs_matching_binary() {
    let mut server = mockito::Server::new();
    let release = server
        .mock("GET", LATEST)
        .with_status(200)
        .with_body(release_json(&server.url(), &ASSETS))
        .create();
    let linux = server
        .mock("GET", "/download/tool_v1.0.0_linux_amd64.tar.gz")
        .with_status(200)
        .with_body(tar_gz("tool", b"linux-binary"))
        .create();
    let windows = server
        .mock("GET", "/download/tool_v1.0.0_windows_amd64.tar.gz")
        .expect(0)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let path = pp::install(
        &config(&server.url(), dir.path(), "linux", "amd64"),
        "octo",
        "tool",
    )
    .unwrap();

    release.assert();
    linux.assert();
    windows.assert();

    assert_eq!(path, dir.path().join("tool"));
    assert_eq!(fs::read(&path).unwrap(), b"linux-binary");
    assert!(
        !dir.path().join("tool_v1.0.0_linux_amd64.tar.gz").exists(),
        "downloaded archive should be removed"
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "binary should have executable bits set");
    }
}

#[test]
fn installs_through_os_alias() {
    let mut server = mockito::Server::new();
    let _release = server
        .mock("GET", LATEST)
        .with_status(200)
        .with_body(release_json(&server.url(), &ASSETS))
        .create();
    let macos = server
        .mock("GET", "/download/tool_v1.0.0_macos_arm64.tar.gz")
        .with_status(200)
        .with_body(tar_gz("tool", b"mac-binary"))
        .create();

    let dir = tempfile::tempdir().unwrap();
    let path = pp::install(
        &config(&server.url(), dir.path(), "darwin", "arm64"),
        "octo",
        "tool",
    )
    .unwrap();

    macos.assert();
    assert_eq!(fs::read(path).unwrap(), b"mac-binary");
}

#[test]
fn reinstall_overwrites_previous_binary() {
    let mut server = mockito::Server::new();
    let _release = server
        .mock("GET", LATEST)
        .with_status(200)
        .with_body(release_json(&server.url(), &ASSETS))
        .create();
    let _linux = server
        .mock("GET", "/download/tool_v1.0.0_linux_amd64.tar.gz")
        .with_status(200)
        .with_body(tar_gz("tool", b"fresh"))
        .create();

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tool"), b"an older and longer binary").unwrap();

    let path = pp::install(
        &config(&server.url(), dir.path(), "linux", "amd64"),
        "octo",
        "tool",
    )
    .unwrap();

    assert_eq!(fs::read(path).unwrap(), b"fresh");
}

#[test]
fn no_matching_asset_downloads_nothing() {
    let mut server = mockito::Server::new();
    let _release = server
        .mock("GET", LATEST)
        .with_status(200)
        .with_body(release_json(&server.url(), &ASSETS))
        .create();
    let downloads = server
        .mock("GET", mockito::Matcher::Regex("^/download/".to_string()))
        .expect(0)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let err = pp::install(
        &config(&server.url(), dir.path(), "freebsd", "riscv64"),
        "octo",
        "tool",
    )
    .unwrap_err();

    downloads.assert();
    assert!(matches!(err, InstallerError::Select(_)), "{err:?}");
    assert!(err
        .to_string()
        .contains("no matching binaries found for os=freebsd arch=riscv64"));
    assert!(!dir.path().join("tool").exists());
}

#[test]
fn release_not_found() {
    let mut server = mockito::Server::new();
    let _release = server.mock("GET", LATEST).with_status(404).create();

    let dir = tempfile::tempdir().unwrap();
    let err = pp::install(
        &config(&server.url(), dir.path(), "linux", "amd64"),
        "octo",
        "tool",
    )
    .unwrap_err();

    assert!(
        matches!(err, InstallerError::Fetch(HttpError::Status { .. })),
        "{err:?}"
    );
    assert!(err.to_string().starts_with("error fetching latest release"));
}

#[test]
fn asset_download_fails() {
    let mut server = mockito::Server::new();
    let _release = server
        .mock("GET", LATEST)
        .with_status(200)
        .with_body(release_json(&server.url(), &ASSETS))
        .create();
    let _linux = server
        .mock("GET", "/download/tool_v1.0.0_linux_amd64.tar.gz")
        .with_status(403)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let err = pp::install(
        &config(&server.url(), dir.path(), "linux", "amd64"),
        "octo",
        "tool",
    )
    .unwrap_err();

    assert!(
        matches!(err, InstallerError::Download(HttpError::Status { .. })),
        "{err:?}"
    );
    assert!(!dir.path().join("tool").exists());
}

#[test]
fn empty_binary_is_not_installed() {
    let mut server = mockito::Server::new();
    let _release = server
        .mock("GET", LATEST)
        .with_status(200)
        .with_body(release_json(&server.url(), &ASSETS))
        .create();
    let _linux = server
        .mock("GET", "/download/tool_v1.0.0_linux_amd64.tar.gz")
        .with_status(200)
        .with_body(tar_gz("tool", b""))
        .create();

    let dir = tempfile::tempdir().unwrap();
    let err = pp::install(
        &config(&server.url(), dir.path(), "linux", "amd64"),
        "octo",
        "tool",
    )
    .unwrap_err();

    assert!(
        matches!(err, InstallerError::Extract(ExtractError::EmptyOutput { .. })),
        "{err:?}"
    );
    assert!(!dir.path().join("tool").exists());
    assert!(!dir.path().join("tool_v1.0.0_linux_amd64.tar.gz").exists());
}
