use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid package version '{0}'")]
pub struct ParseVersionError(pub String);

/// A package version: dotted numeric release, optional `-prerelease` label and
/// ignored `+metadata`.
///
/// `1.0` and `1.0.0` are equal; a prerelease sorts before its release.
#[derive(Clone, Debug)]
pub struct PackageVersion {
    release: Vec<u64>,
    prerelease: Option<SmolStr>,
    original: SmolStr,
}

impl PackageVersion {
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn prerelease(&self) -> Option<&str> {
        self.prerelease.as_deref()
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl FromStr for PackageVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let without_metadata = trimmed.split_once('+').map_or(trimmed, |(v, _)| v);
        let (release, prerelease) = match without_metadata.split_once('-') {
            Some((release, label)) if !label.is_empty() => (release, Some(SmolStr::new(label))),
            Some(_) => return Err(ParseVersionError(s.to_string())),
            None => (without_metadata, None),
        };

        let release = release
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ParseVersionError(s.to_string()))?;

        Ok(Self {
            release,
            prerelease,
            original: SmolStr::new(trimmed),
        })
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn compare_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Dot-separated labels; numeric parts compare numerically and sort before
/// alphanumeric ones, which compare case-insensitively.
fn compare_labels(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let order = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase()),
                };
                if order.is_ne() {
                    return order;
                }
            }
        }
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_release(&self.release, &other.release).then_with(|| {
            match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_labels(a, b),
            }
        })
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}
