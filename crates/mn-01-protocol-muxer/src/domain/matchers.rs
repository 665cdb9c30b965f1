//! Protocol match functions.
//!
//! A matcher is called with the registered protocol id and the id the peer
//! requested. The multiplexer does not care which policy is used.

use std::sync::Arc;

/// `(registered, requested) -> accepted`.
pub type MatchFn = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Exact string equality. The default when no matcher is given.
#[must_use]
pub fn exact() -> MatchFn {
    Arc::new(|registered, requested| registered == requested)
}

/// Accepts any request that starts with the registered id.
#[must_use]
pub fn prefix() -> MatchFn {
    Arc::new(|registered, requested| requested.starts_with(registered))
}

/// Semantic-version compatibility on the last path segment.
///
/// `/name/X.Y.Z` accepts `/name/X.Y.W` for every `W <= Z`: the base path must
/// be identical, major and minor must agree, and the registered patch level
/// must be at least the requested one.
#[must_use]
pub fn semver() -> MatchFn {
    Arc::new(|registered, requested| semver_compatible(registered, requested))
}

fn semver_compatible(registered: &str, requested: &str) -> bool {
    let (Some((base_a, ver_a)), Some((base_b, ver_b))) =
        (registered.rsplit_once('/'), requested.rsplit_once('/'))
    else {
        return false;
    };
    if base_a != base_b {
        return false;
    }
    match (parse_version(ver_a), parse_version(ver_b)) {
        (Some(mine), Some(theirs)) => {
            mine.0 == theirs.0 && mine.1 == theirs.1 && mine.2 >= theirs.2
        }
        _ => false,
    }
}

fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    let patch = parts.next().unwrap_or("0").parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}
