use crate::github::Asset;
use crate::platform::{OsAliases, TargetPlatform};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no matching binaries found for os={os} arch={arch}")]
    NoMatch { os: String, arch: String },
}

/// Choose the asset built for `target`.
///
/// Matching is plain substring containment on the asset name. Assets are first
/// narrowed to those naming the architecture; within that set the first one
/// naming the OS wins, and only if none does are the OS aliases tried, each in
/// table order. Input order decides ties, so the result is deterministic.
pub fn select<'a>(
    assets: &'a [Asset],
    target: &TargetPlatform,
    aliases: &OsAliases,
) -> Result<&'a Asset, SelectError> {
    let candidates: Vec<&Asset> = assets
        .iter()
        .filter(|a| a.name.contains(target.arch.as_str()))
        .collect();

    if let Some(asset) = find_containing(&candidates, &target.os) {
        return Ok(asset);
    }

    for alias in aliases.aliases_for(&target.os) {
        if let Some(asset) = find_containing(&candidates, alias) {
            log::debug!("matched {} via os alias {alias}", asset.name);
            return Ok(asset);
        }
    }

    Err(SelectError::NoMatch {
        os: target.os.clone(),
        arch: target.arch.clone(),
    })
}

fn find_containing<'a>(candidates: &[&'a Asset], needle: &str) -> Option<&'a Asset> {
    candidates.iter().copied().find(|a| a.name.contains(needle))
}
