//! Maven version ordering, pre-release detection, and range parsing.

use crate::error::{PomError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Detects if a Maven version string is a pre-release.
///
/// Maven pre-release qualifiers: SNAPSHOT, alpha, beta, rc, M (milestone).
pub fn is_prerelease(version: &str) -> bool {
    let v = version.to_uppercase();
    v.contains("-SNAPSHOT")
        || v.contains("-ALPHA")
        || v.contains("-BETA")
        || v.contains("-RC")
        || v.contains(".RC")
        || contains_milestone_qualifier(&v)
}

fn contains_milestone_qualifier(upper: &str) -> bool {
    // Match -M followed by digits: e.g. -M1, -M2, -M10
    let bytes = upper.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        if bytes[i] == b'-' && bytes[i + 1] == b'M' {
            let rest = &upper[i + 2..];
            if rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_digit()) {
                return true;
            }
        }
    }
    false
}

/// Compares two Maven version strings.
///
/// Splits on `.` and `-`, compares numeric segments numerically,
/// string segments lexicographically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = split_version(a);
    let b_parts = split_version(b);

    let max_len = a_parts.len().max(b_parts.len());
    for i in 0..max_len {
        let ap = a_parts.get(i).map_or("", |s| s.as_str());
        let bp = b_parts.get(i).map_or("", |s| s.as_str());

        let ord = compare_segment(ap, bp);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

fn split_version(v: &str) -> Vec<String> {
    v.split(['.', '-'])
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(an), Ok(bn)) => an.cmp(&bn),
        _ => a.cmp(b),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    Unbounded,
    Inclusive(String),
    Exclusive(String),
}

/// One interval of a Maven version range set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub lower: Bound,
    pub upper: Bound,
}

impl VersionRange {
    pub fn matches(&self, version: &str) -> bool {
        let lower_ok = match &self.lower {
            Bound::Unbounded => true,
            Bound::Inclusive(v) => compare_versions(version, v) != Ordering::Less,
            Bound::Exclusive(v) => compare_versions(version, v) == Ordering::Greater,
        };
        let upper_ok = match &self.upper {
            Bound::Unbounded => true,
            Bound::Inclusive(v) => compare_versions(version, v) != Ordering::Greater,
            Bound::Exclusive(v) => compare_versions(version, v) == Ordering::Less,
        };
        lower_ok && upper_ok
    }
}

/// A parsed version requirement string.
///
/// `Soft` is a plain version like `1.0` (a preference, not a constraint).
/// `Ranges` is a Maven range set like `[1.0,2.0)` or `(,1.0],[1.2,)`; the
/// version must fall inside at least one interval of the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionSpec {
    Soft(String),
    Ranges(Vec<VersionRange>),
}

impl VersionSpec {
    pub fn parse(requested: &str) -> Result<Self> {
        let trimmed = requested.trim();
        if !trimmed.starts_with(['[', '(']) {
            return Ok(Self::Soft(trimmed.to_string()));
        }

        let mut ranges = Vec::new();
        let mut rest = trimmed;
        while !rest.is_empty() {
            rest = rest.trim_start_matches(',').trim_start();
            if rest.is_empty() {
                break;
            }
            let open = rest.chars().next().unwrap_or(' ');
            if open != '[' && open != '(' {
                return Err(PomError::malformed(format!(
                    "invalid version range '{requested}'"
                )));
            }
            let close_idx = rest.find([']', ')']).ok_or_else(|| {
                PomError::malformed(format!("unterminated version range '{requested}'"))
            })?;
            let close = rest.as_bytes()[close_idx] as char;
            let inner = &rest[1..close_idx];
            ranges.push(parse_interval(inner, open, close, requested)?);
            rest = &rest[close_idx + 1..];
        }

        if ranges.is_empty() {
            return Err(PomError::malformed(format!(
                "empty version range '{requested}'"
            )));
        }
        Ok(Self::Ranges(ranges))
    }

    pub fn matches(&self, version: &str) -> bool {
        match self {
            Self::Soft(_) => true,
            Self::Ranges(ranges) => ranges.iter().any(|r| r.matches(version)),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Self::Ranges(_))
    }
}

fn parse_interval(inner: &str, open: char, close: char, raw: &str) -> Result<VersionRange> {
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    match parts.as_slice() {
        // [1.0] pins exactly
        [single] if !single.is_empty() => {
            if open != '[' || close != ']' {
                return Err(PomError::malformed(format!(
                    "exact range must use brackets: '{raw}'"
                )));
            }
            Ok(VersionRange {
                lower: Bound::Inclusive((*single).to_string()),
                upper: Bound::Inclusive((*single).to_string()),
            })
        }
        [lower, upper] => {
            let lower = if lower.is_empty() {
                Bound::Unbounded
            } else if open == '[' {
                Bound::Inclusive((*lower).to_string())
            } else {
                Bound::Exclusive((*lower).to_string())
            };
            let upper = if upper.is_empty() {
                Bound::Unbounded
            } else if close == ']' {
                Bound::Inclusive((*upper).to_string())
            } else {
                Bound::Exclusive((*upper).to_string())
            };
            Ok(VersionRange { lower, upper })
        }
        _ => Err(PomError::malformed(format!(
            "invalid version range '{raw}'"
        ))),
    }
}
