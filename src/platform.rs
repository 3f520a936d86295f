use std::collections::BTreeMap;
use std::env::consts::{ARCH, OS};

/// The OS/architecture pair an asset must be built for.
///
/// Names follow the convention most release feeds use for asset names
/// (`darwin`, `amd64`, `arm64`) rather than Rust's target naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlatform {
    pub os: String,
    pub arch: String,
}

impl TargetPlatform {
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this binary was compiled for.
    #[must_use]
    pub fn host() -> Self {
        Self::new(feed_os_name(OS), feed_arch_name(ARCH))
    }
}

fn feed_os_name(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn feed_arch_name(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

/// OS names that vendors publish under a different label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsAliases {
    table: BTreeMap<String, Vec<String>>,
}

impl OsAliases {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Register `alias` as an accepted synonym for `os`. Aliases keep
    /// insertion order.
    #[must_use]
    pub fn with(mut self, os: impl Into<String>, alias: impl Into<String>) -> Self {
        self.table.entry(os.into()).or_default().push(alias.into());
        self
    }

    #[must_use]
    pub fn aliases_for(&self, os: &str) -> &[String] {
        self.table.get(os).map(Vec::as_slice).unwrap_or_default()
    }
}

impl Default for OsAliases {
    fn default() -> Self {
        Self::empty().with("darwin", "macos")
    }
}
