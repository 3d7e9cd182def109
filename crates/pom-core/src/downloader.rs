//! The downloader seam between the resolution engine and artifact transport.
//!
//! The engine only suspends inside these methods; everything else is
//! synchronous. Cancellation, timeouts, and retry policy belong to the
//! implementor, which signals them as ordinary download errors.

use crate::error::{PomError, Result};
use crate::types::{Gav, GroupArtifact, Pom, Repository};
use async_trait::async_trait;
use std::collections::HashMap;

/// Version listing for a group:artifact, as published in repository metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub versions: Vec<String>,
    pub latest: Option<String>,
    pub release: Option<String>,
}

/// Downloads POMs and version metadata on behalf of the resolver.
///
/// Consulted for parent POMs, BOM imports, and every transitive dependency's
/// POM.
#[async_trait]
pub trait PomDownloader: Send + Sync {
    /// Downloads and parses the POM for a coordinate.
    ///
    /// `relative_path` is the parent declaration's `<relativePath>`, if any;
    /// `containing` is the POM that referenced this one. Repositories are
    /// tried in merged order.
    async fn download(
        &self,
        gav: &Gav,
        relative_path: Option<&str>,
        containing: Option<&Gav>,
        repositories: &[Repository],
    ) -> Result<Pom>;

    /// Downloads the version listing for a coordinate.
    async fn download_metadata(
        &self,
        group_artifact: &GroupArtifact,
        containing: Option<&Gav>,
        repositories: &[Repository],
    ) -> Result<Metadata>;
}

/// A GAV-keyed in-memory downloader for tests and offline resolution.
#[derive(Debug, Default)]
pub struct MapPomDownloader {
    poms: HashMap<Gav, Pom>,
    metadata: HashMap<GroupArtifact, Metadata>,
}

impl MapPomDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a POM under its declared coordinate.
    pub fn with_pom(mut self, pom: Pom) -> Self {
        if let Some(gav) = pom.gav() {
            self.poms.insert(gav, pom);
        }
        self
    }

    pub fn with_metadata(mut self, group_artifact: GroupArtifact, metadata: Metadata) -> Self {
        self.metadata.insert(group_artifact, metadata);
        self
    }
}

#[async_trait]
impl PomDownloader for MapPomDownloader {
    async fn download(
        &self,
        gav: &Gav,
        _relative_path: Option<&str>,
        _containing: Option<&Gav>,
        _repositories: &[Repository],
    ) -> Result<Pom> {
        self.poms
            .get(gav)
            .cloned()
            .ok_or_else(|| PomError::Download {
                gav: gav.to_string(),
                message: "not present in downloader map".into(),
            })
    }

    async fn download_metadata(
        &self,
        group_artifact: &GroupArtifact,
        _containing: Option<&Gav>,
        _repositories: &[Repository],
    ) -> Result<Metadata> {
        // Fall back to the versions of registered POMs so simple fixtures
        // don't need explicit metadata.
        if let Some(metadata) = self.metadata.get(group_artifact) {
            return Ok(metadata.clone());
        }
        let mut versions: Vec<String> = self
            .poms
            .keys()
            .filter(|gav| {
                gav.group_id == group_artifact.group_id
                    && gav.artifact_id == group_artifact.artifact_id
            })
            .map(|gav| gav.version.clone())
            .collect();
        if versions.is_empty() {
            return Err(PomError::MetadataDownload {
                group_artifact: group_artifact.to_string(),
                message: "no versions known".into(),
            });
        }
        versions.sort_by(|a, b| crate::version::compare_versions(a, b));
        Ok(Metadata {
            latest: versions.last().cloned(),
            release: versions
                .iter()
                .rev()
                .find(|v| !crate::version::is_prerelease(v))
                .cloned(),
            versions,
        })
    }
}
