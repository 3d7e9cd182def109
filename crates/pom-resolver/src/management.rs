//! Effective dependency-management table.
//!
//! Entries are appended during the ancestry walk in closest-first order and
//! never reordered, so the first match on lookup is the winning declaration.
//! BOM-imported entries carry provenance for both the declaring POM and the
//! BOM that contributed them.

use pom_core::types::{Gav, GroupArtifact, Scope, glob_matches};
use serde::{Deserialize, Serialize};

/// A fully resolved managed-dependency entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedManagedDependency {
    pub gav: Gav,
    pub scope: Option<Scope>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub classifier: Option<String>,
    pub exclusions: Vec<GroupArtifact>,
    /// POM whose dependencyManagement section declared this entry.
    pub declared_in: Gav,
    /// BOM that contributed the entry, when it arrived via an import.
    pub imported_from: Option<Gav>,
}

impl ResolvedManagedDependency {
    fn matches(&self, group_id: &str, artifact_id: &str, type_: &str, classifier: Option<&str>) -> bool {
        glob_matches(&self.gav.group_id, group_id)
            && glob_matches(&self.gav.artifact_id, artifact_id)
            && self.type_.as_deref().unwrap_or("jar") == type_
            && self.classifier.as_deref() == classifier
    }
}

/// Ordered, first-declared-wins managed-dependency table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyManagement {
    entries: Vec<ResolvedManagedDependency>,
}

impl DependencyManagement {
    pub fn append(&mut self, entry: ResolvedManagedDependency) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ResolvedManagedDependency] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry matching the coordinate, by declaration order.
    pub fn find(
        &self,
        group_id: &str,
        artifact_id: &str,
        type_: &str,
        classifier: Option<&str>,
    ) -> Option<&ResolvedManagedDependency> {
        self.entries
            .iter()
            .find(|e| e.matches(group_id, artifact_id, type_, classifier))
    }

    /// Managed version for a coordinate, if any matching entry pins one.
    pub fn managed_version(
        &self,
        group_id: &str,
        artifact_id: &str,
        type_: &str,
        classifier: Option<&str>,
    ) -> Option<&str> {
        self.entries
            .iter()
            .filter(|e| e.matches(group_id, artifact_id, type_, classifier))
            .map(|e| e.gav.version.as_str())
            .find(|v| !v.is_empty())
    }

    pub fn managed_scope(
        &self,
        group_id: &str,
        artifact_id: &str,
        type_: &str,
        classifier: Option<&str>,
    ) -> Option<Scope> {
        self.entries
            .iter()
            .filter(|e| e.matches(group_id, artifact_id, type_, classifier))
            .find_map(|e| e.scope)
    }

    /// Exclusions contributed by every matching entry.
    pub fn managed_exclusions(
        &self,
        group_id: &str,
        artifact_id: &str,
        type_: &str,
        classifier: Option<&str>,
    ) -> Vec<GroupArtifact> {
        let mut exclusions = Vec::new();
        for entry in self
            .entries
            .iter()
            .filter(|e| e.matches(group_id, artifact_id, type_, classifier))
        {
            for exclusion in &entry.exclusions {
                if !exclusions.contains(exclusion) {
                    exclusions.push(exclusion.clone());
                }
            }
        }
        exclusions
    }

    /// Drops later duplicates, keeping the first occurrence per
    /// (gav, type, classifier, scope) key.
    pub fn deduplicate(&mut self) {
        let mut seen: Vec<(Gav, Option<String>, Option<String>, Option<Scope>)> = Vec::new();
        self.entries.retain(|e| {
            let key = (
                e.gav.clone(),
                e.type_.clone(),
                e.classifier.clone(),
                e.scope,
            );
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        });
    }
}
