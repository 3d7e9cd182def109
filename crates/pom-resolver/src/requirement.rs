//! Version requirements accumulated while walking the dependency tree.
//!
//! Every sighting of a coordinate contributes a term tagged with the depth
//! it was seen at. Soft versions resolve nearest-wins; as soon as any term
//! is a hard range the repository version listing decides instead.

use pom_core::error::Result;
use pom_core::types::GroupArtifact;
use pom_core::version::{VersionSpec, compare_versions};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    spec: VersionSpec,
    depth: usize,
}

/// All version constraints seen so far for one group:artifact coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequirement {
    terms: Vec<Term>,
}

/// Outcome of resolving a requirement against the available versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVersion {
    /// A soft version won, no metadata listing needed.
    Pinned(String),
    /// A range term was present and this listed version satisfies all ranges.
    FromListing(String),
    /// No listed version satisfies every range term.
    NoneMatching,
}

impl VersionRequirement {
    pub fn from_version(requested: &str, depth: usize) -> Result<Self> {
        Ok(Self {
            terms: vec![Term {
                spec: VersionSpec::parse(requested)?,
                depth,
            }],
        })
    }

    /// Adds another sighting. Returns true if the requirement changed,
    /// which forces a walk restart when the winning version moves.
    pub fn add_requirement(&mut self, requested: &str, depth: usize) -> Result<bool> {
        let spec = VersionSpec::parse(requested)?;
        if self.terms.iter().any(|t| t.spec == spec && t.depth <= depth) {
            return Ok(false);
        }
        self.terms.push(Term { spec, depth });
        Ok(true)
    }

    pub fn has_ranges(&self) -> bool {
        self.terms.iter().any(|t| t.spec.is_range())
    }

    /// Winning soft version under nearest-wins: smallest depth, first
    /// declaration on a tie. Only meaningful when no range terms exist.
    pub fn nearest(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for term in &self.terms {
            if let VersionSpec::Soft(version) = &term.spec {
                match best {
                    Some((_, depth)) if depth <= term.depth => {}
                    _ => best = Some((version, term.depth)),
                }
            }
        }
        best.map(|(version, _)| version)
    }

    /// Resolves the requirement, consulting `available` (a repository
    /// version listing) only when a range term is present.
    pub fn resolve(&self, ga: &GroupArtifact, available: &[String]) -> ResolvedVersion {
        if !self.has_ranges() {
            match self.nearest() {
                Some(version) => return ResolvedVersion::Pinned(version.to_string()),
                None => return ResolvedVersion::NoneMatching,
            }
        }
        let mut candidates: Vec<&String> = available
            .iter()
            .filter(|v| self.terms.iter().all(|t| t.spec.matches(v)))
            .collect();
        candidates.sort_by(|a, b| compare_versions(a, b));
        match candidates.last() {
            Some(version) => ResolvedVersion::FromListing((*version).clone()),
            None => {
                tracing::debug!(coordinate = %ga, "no listed version satisfies all ranges");
                ResolvedVersion::NoneMatching
            }
        }
    }
}
