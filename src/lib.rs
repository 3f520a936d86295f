mod config;
mod download;
mod extract;
mod github;
mod install;
mod platform;
mod select;

use std::io;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

pub use config::{Config, ConfigError};
pub use download::{archive_file_name, download};
pub use extract::{extract_single_file, ExtractError};
pub use github::{fetch_latest_release, Asset, Release};
pub use install::{make_executable, PermissionError};
pub use platform::{OsAliases, TargetPlatform};
pub use select::{select, SelectError};

/// Failures talking to the release API or downloading an asset.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("making request to {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("non-200 response code from {url}: {status}")]
    Status { url: String, status: String },

    #[error("reading response from {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("failed to parse response from {url}: {source}")]
    Parse {
        url: String,
        source: serde_json::Error,
    },

    #[error("creating file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum InstallerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("error fetching latest release: {0}")]
    Fetch(#[source] HttpError),

    #[error("error choosing binary: {0}")]
    Select(#[from] SelectError),

    #[error("error downloading binary: {0}")]
    Download(#[source] HttpError),

    #[error("error extracting binary: {0}")]
    Extract(#[from] ExtractError),

    #[error("error making binary executable: {0}")]
    Permission(#[from] PermissionError),
}

/// Install the binary from the latest release of `owner/repo`.
///
/// The asset matching `config.target` is downloaded into `config.install_dir`,
/// its single entry unpacked to a file named `repo`, and that file made
/// executable. Returns the path of the installed binary.
pub fn install(config: &Config, owner: &str, repo: &str) -> Result<PathBuf, InstallerError> {
    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| InstallerError::Fetch(HttpError::Client(e)))?;

    let release = fetch_latest_release(&client, &config.api_base, owner, repo)
        .map_err(InstallerError::Fetch)?;
    log::info!("latest release of {owner}/{repo} is {}", release.tag_name);

    for asset in &release.assets {
        log::debug!("asset {} ({:.2} MB)", asset.name, asset.size_mb());
    }

    let asset = select(&release.assets, &config.target, &config.aliases)?;
    log::info!(
        "selected {} for os={} arch={}",
        asset.name,
        config.target.os,
        config.target.arch
    );

    let binary_path = config.install_dir.join(repo);
    let archive_path = archive_path_for(&config.install_dir, &asset.download_url, repo);

    let bytes = download(&client, &asset.download_url, &archive_path)
        .map_err(InstallerError::Download)?;
    log::debug!("downloaded {bytes} bytes to {}", archive_path.display());

    let written = extract_single_file(&archive_path, &binary_path)?;
    log::debug!("extracted {written} bytes to {}", binary_path.display());

    make_executable(&binary_path)?;
    log::info!("installed {}", binary_path.display());

    Ok(binary_path)
}

/// Where the downloaded archive is kept until extraction. Never the same path
/// as the installed binary.
fn archive_path_for(install_dir: &Path, url: &str, repo: &str) -> PathBuf {
    let name = archive_file_name(url);
    if name == repo {
        install_dir.join(format!("{name}.download"))
    } else {
        install_dir.join(name)
    }
}
