//! HTTP downloader backed by standard Maven repository layout.

use async_trait::async_trait;
use pom_core::downloader::{Metadata, PomDownloader};
use pom_core::error::{PomError, Result};
use pom_core::types::{Gav, GroupArtifact, Pom, Repository};
use serde::Deserialize;

use crate::parser::parse_pom_xml;

pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Downloads POMs and maven-metadata.xml over HTTP, trying each repository
/// in merged order and falling back to Maven Central.
#[derive(Clone)]
pub struct RemotePomDownloader {
    client: reqwest::Client,
    default_repositories: Vec<Repository>,
}

impl Default for RemotePomDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl RemotePomDownloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            default_repositories: vec![Repository::new("central", MAVEN_CENTRAL_URL)],
        }
    }

    /// Replaces the fallback repositories tried after the POM-declared ones.
    #[must_use]
    pub fn with_default_repositories(mut self, repositories: Vec<Repository>) -> Self {
        self.default_repositories = repositories;
        self
    }

    fn candidate_repositories<'a>(&'a self, declared: &'a [Repository]) -> Vec<&'a Repository> {
        declared.iter().chain(&self.default_repositories).collect()
    }

    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PomError::Download {
                gav: url.to_string(),
                message: e.to_string(),
            })?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PomError::Download {
                gav: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }
        let body = response.text().await.map_err(|e| PomError::Download {
            gav: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(body))
    }
}

fn repository_accepts(repository: &Repository, version: &str) -> bool {
    if version.ends_with("-SNAPSHOT") {
        repository.snapshots.unwrap_or(true)
    } else {
        repository.releases.unwrap_or(true)
    }
}

fn artifact_path(group_id: &str, artifact_id: &str) -> String {
    format!(
        "{}/{}",
        group_id.replace('.', "/"),
        urlencoding::encode(artifact_id)
    )
}

pub fn pom_url(base: &str, gav: &Gav) -> String {
    format!(
        "{}/{}/{version}/{artifact}-{version}.pom",
        base.trim_end_matches('/'),
        artifact_path(&gav.group_id, &gav.artifact_id),
        artifact = urlencoding::encode(&gav.artifact_id),
        version = urlencoding::encode(&gav.version),
    )
}

pub fn metadata_url(base: &str, ga: &GroupArtifact) -> String {
    format!(
        "{}/{}/maven-metadata.xml",
        base.trim_end_matches('/'),
        artifact_path(&ga.group_id, &ga.artifact_id),
    )
}

#[async_trait]
impl PomDownloader for RemotePomDownloader {
    async fn download(
        &self,
        gav: &Gav,
        _relative_path: Option<&str>,
        _containing: Option<&Gav>,
        repositories: &[Repository],
    ) -> Result<Pom> {
        let mut last_error: Option<PomError> = None;
        for repository in self.candidate_repositories(repositories) {
            if !repository_accepts(repository, &gav.version) {
                continue;
            }
            let url = pom_url(&repository.url, gav);
            match self.fetch(&url).await {
                Ok(Some(body)) => {
                    let mut pom = parse_pom_xml(&body)?;
                    pom.repository = Some(repository.clone());
                    return Ok(pom);
                }
                Ok(None) => {
                    tracing::debug!(%url, "POM not found, trying next repository");
                }
                Err(err) => {
                    tracing::debug!(%url, error = %err, "POM fetch failed, trying next repository");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| PomError::Download {
            gav: gav.to_string(),
            message: "not found in any repository".into(),
        }))
    }

    async fn download_metadata(
        &self,
        group_artifact: &GroupArtifact,
        _containing: Option<&Gav>,
        repositories: &[Repository],
    ) -> Result<Metadata> {
        let mut last_error: Option<PomError> = None;
        for repository in self.candidate_repositories(repositories) {
            let url = metadata_url(&repository.url, group_artifact);
            match self.fetch(&url).await {
                Ok(Some(body)) => return parse_metadata_xml(&body),
                Ok(None) => {}
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| PomError::MetadataDownload {
            group_artifact: group_artifact.to_string(),
            message: "not found in any repository".into(),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct MetadataXml {
    versioning: Option<VersioningXml>,
}

#[derive(Debug, Deserialize)]
struct VersioningXml {
    latest: Option<String>,
    release: Option<String>,
    versions: Option<VersionsXml>,
}

#[derive(Debug, Deserialize)]
struct VersionsXml {
    #[serde(default, rename = "version")]
    versions: Vec<String>,
}

fn parse_metadata_xml(content: &str) -> Result<Metadata> {
    let parsed: MetadataXml = quick_xml::de::from_str(content)
        .map_err(|e| PomError::parse(format!("invalid maven-metadata.xml: {e}")))?;
    let versioning = parsed.versioning.unwrap_or(VersioningXml {
        latest: None,
        release: None,
        versions: None,
    });
    Ok(Metadata {
        versions: versioning.versions.map(|v| v.versions).unwrap_or_default(),
        latest: versioning.latest,
        release: versioning.release,
    })
}
