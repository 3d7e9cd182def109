//! Effective POM construction: the three-pass ancestry walk.
//!
//! Pass one merges properties and repositories while downloading the parent
//! chain, pass two merges dependency management (including BOM imports) and
//! requested dependencies, pass three merges plugins. The passes are kept
//! separate because dependency versions may reference properties declared
//! at any ancestry level, so the full property table must exist before the
//! other two passes run.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use pom_core::downloader::PomDownloader;
use pom_core::error::Result;
use pom_core::listener::{NoopListener, ResolutionListener};
use pom_core::types::{
    Dependency, Gav, GroupArtifact, ManagedDependency, Plugin, Pom, Repository, Scope,
};

use crate::cache::{InMemoryResolutionCache, ResolutionCache};
use crate::management::{DependencyManagement, ResolvedManagedDependency};
use crate::plugin::{apply_plugin_management, merge_plugins};
use crate::properties::{reflective_value, substitute};
use crate::repositories::merge_repositories;

/// Collaborators and caller inputs shared by a resolution run.
#[derive(Clone)]
pub struct ResolutionContext {
    pub downloader: Arc<dyn PomDownloader>,
    pub cache: Arc<dyn ResolutionCache>,
    pub listener: Arc<dyn ResolutionListener>,
    /// Profile names activated by the caller, in order.
    pub active_profiles: Vec<String>,
    /// Caller-supplied properties that shadow every POM-declared property.
    pub property_overrides: HashMap<String, String>,
}

impl ResolutionContext {
    pub fn new(downloader: Arc<dyn PomDownloader>) -> Self {
        Self {
            downloader,
            cache: Arc::new(InMemoryResolutionCache::new()),
            listener: Arc::new(NoopListener),
            active_profiles: Vec::new(),
            property_overrides: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ResolutionCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ResolutionListener>) -> Self {
        self.listener = listener;
        self
    }

    #[must_use]
    pub fn with_active_profiles(mut self, profiles: Vec<String>) -> Self {
        self.active_profiles = profiles;
        self
    }

    #[must_use]
    pub fn with_property_override(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.property_overrides.insert(key.into(), value.into());
        self
    }
}

/// A POM with the effect of its whole ancestry folded in.
///
/// Immutable once built; shared through the resolution cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPom {
    /// The as-declared leaf POM this view was built from.
    pub requested: Pom,
    pub properties: HashMap<String, String>,
    pub dependency_management: DependencyManagement,
    pub requested_dependencies: Vec<Dependency>,
    pub repositories: Vec<Repository>,
    pub plugins: Vec<Plugin>,
    pub plugin_management: Vec<Plugin>,
    property_overrides: HashMap<String, String>,
}

impl ResolvedPom {
    /// Property lookup: reflective keys first, then caller overrides, then
    /// the merged property table.
    pub fn get_value(&self, key: &str) -> Option<String> {
        reflective_value(key, &self.requested)
            .or_else(|| self.property_overrides.get(key).cloned())
            .or_else(|| self.properties.get(key).cloned())
    }

    /// Substitutes `${...}` placeholders in `raw`; unknown keys are kept
    /// verbatim.
    pub fn resolve_value(&self, raw: &str) -> String {
        substitute(raw, |key| self.get_value(key))
    }

    fn resolve_opt(&self, raw: Option<&str>) -> Option<String> {
        raw.map(|v| self.resolve_value(v))
    }

    /// The resolved coordinate of this POM, placeholders substituted.
    pub fn gav(&self) -> Option<Gav> {
        let declared = self.requested.gav()?;
        Some(Gav::new(
            self.resolve_value(&declared.group_id),
            self.resolve_value(&declared.artifact_id),
            self.resolve_value(&declared.version),
        ))
    }

    /// Resolves a dependency declaration against this POM's properties and
    /// management table: placeholders substituted, then missing version,
    /// scope, and exclusions filled from matching managed entries.
    pub fn get_values(&self, dependency: &Dependency) -> Dependency {
        let group_id = self.resolve_value(&dependency.group_id);
        let artifact_id = self.resolve_value(&dependency.artifact_id);
        let classifier = self.resolve_opt(dependency.classifier.as_deref());
        let type_ = self.resolve_opt(dependency.type_.as_deref());
        let effective_type = type_.as_deref().unwrap_or("jar").to_string();

        let version = self
            .resolve_opt(dependency.version.as_deref())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                self.dependency_management
                    .managed_version(&group_id, &artifact_id, &effective_type, classifier.as_deref())
                    .map(String::from)
            });
        let scope = self
            .resolve_opt(dependency.scope.as_deref())
            .or_else(|| {
                self.dependency_management
                    .managed_scope(&group_id, &artifact_id, &effective_type, classifier.as_deref())
                    .map(|s| s.to_string())
            });

        let mut exclusions = dependency.exclusions.clone();
        for exclusion in self.dependency_management.managed_exclusions(
            &group_id,
            &artifact_id,
            &effective_type,
            classifier.as_deref(),
        ) {
            if !exclusions.contains(&exclusion) {
                exclusions.push(exclusion);
            }
        }

        Dependency {
            group_id,
            artifact_id,
            version,
            classifier,
            type_,
            scope,
            optional: dependency.optional,
            exclusions,
        }
    }
}

/// Resolves a requested POM into its effective view, downloading parents
/// and imported BOMs through the context's downloader.
pub async fn resolve(requested: Pom, ctx: &ResolutionContext) -> Result<Arc<ResolvedPom>> {
    resolve_inner(requested, ctx, Vec::new()).await
}

// Boxed because BOM imports recurse back into resolution.
fn resolve_inner<'a>(
    requested: Pom,
    ctx: &'a ResolutionContext,
    import_stack: Vec<Gav>,
) -> BoxFuture<'a, Result<Arc<ResolvedPom>>> {
    Box::pin(async move {
        if let Some(gav) = requested.gav()
            && !gav.has_placeholders()
            && let Some(cached) = ctx.cache.resolved_pom(&gav)
        {
            return Ok(cached);
        }

        let leaf = requested.clone();
        let mut properties: HashMap<String, String> = HashMap::new();
        let mut repositories: Vec<Repository> = Vec::new();

        // Pass one: properties and repositories, interleaved with parent
        // downloads since the parent lookup itself needs the repositories
        // merged so far.
        let mut ancestry: Vec<Pom> = vec![requested];
        let mut path: Vec<Gav> = Vec::new();
        let mut index = 0;
        while index < ancestry.len() {
            let current = ancestry[index].clone();
            for profile in current.active_profiles(&ctx.active_profiles) {
                merge_properties(&mut properties, &profile.properties, ctx.listener.as_ref());
            }
            merge_properties(&mut properties, &current.properties, ctx.listener.as_ref());

            let lookup = |key: &str| {
                reflective_value(key, &leaf)
                    .or_else(|| ctx.property_overrides.get(key).cloned())
                    .or_else(|| properties.get(key).cloned())
            };
            let resolve_raw = |raw: &str| substitute(raw, &lookup);
            for profile in current.active_profiles(&ctx.active_profiles) {
                merge_repositories(&mut repositories, &profile.repositories, resolve_raw);
            }
            merge_repositories(&mut repositories, &current.repositories, resolve_raw);

            let current_gav = current.gav().map(|g| {
                Gav::new(
                    resolve_raw(&g.group_id),
                    resolve_raw(&g.artifact_id),
                    resolve_raw(&g.version),
                )
            });
            if let Some(gav) = &current_gav {
                path.push(gav.clone());
            }

            if let Some(parent) = &current.parent {
                let parent_gav = Gav::new(
                    resolve_raw(&parent.gav.group_id),
                    resolve_raw(&parent.gav.artifact_id),
                    resolve_raw(&parent.gav.version),
                );
                // A parent already on the path means a cycle: nothing
                // further to merge.
                if path.contains(&parent_gav) {
                    tracing::warn!(parent = %parent_gav, "parent cycle detected, stopping ancestry walk");
                } else {
                    let parent_pom = ctx
                        .downloader
                        .download(
                            &parent_gav,
                            parent.relative_path.as_deref(),
                            current_gav.as_ref(),
                            &repositories,
                        )
                        .await?;
                    if let Some(child) = &current_gav {
                        ctx.listener.parent_resolved(&parent_gav, child);
                    }
                    ancestry.push(parent_pom);
                }
            }
            index += 1;
        }

        // Passes two and three run over the completed ancestry with the
        // full property table in hand.
        let view = ResolvedPom {
            requested: leaf.clone(),
            properties: properties.clone(),
            property_overrides: ctx.property_overrides.clone(),
            ..Default::default()
        };

        let mut dependency_management = DependencyManagement::default();
        let mut requested_dependencies: Vec<Dependency> = Vec::new();
        for current in &ancestry {
            let declared_in = current
                .gav()
                .map(|g| {
                    Gav::new(
                        view.resolve_value(&g.group_id),
                        view.resolve_value(&g.artifact_id),
                        view.resolve_value(&g.version),
                    )
                })
                .unwrap_or_else(|| Gav::new("", current.artifact_id.clone(), ""));

            let mut managed: Vec<&ManagedDependency> = Vec::new();
            for profile in current.active_profiles(&ctx.active_profiles) {
                managed.extend(profile.dependency_management.iter());
            }
            managed.extend(current.dependency_management.iter());
            for entry in managed {
                merge_managed_entry(
                    entry,
                    &declared_in,
                    &view,
                    &repositories,
                    ctx,
                    &import_stack,
                    &mut dependency_management,
                )
                .await?;
            }

            let mut declared: Vec<&Dependency> = Vec::new();
            for profile in current.active_profiles(&ctx.active_profiles) {
                declared.extend(profile.dependencies.iter());
            }
            declared.extend(current.dependencies.iter());
            for dependency in declared {
                let ga = GroupArtifact::new(
                    view.resolve_value(&dependency.group_id),
                    view.resolve_value(&dependency.artifact_id),
                );
                let already_declared = requested_dependencies.iter().any(|d| {
                    view.resolve_value(&d.group_id) == ga.group_id
                        && view.resolve_value(&d.artifact_id) == ga.artifact_id
                });
                if !already_declared {
                    requested_dependencies.push(dependency.clone());
                }
            }
        }

        let mut plugins: Vec<Plugin> = Vec::new();
        let mut plugin_management: Vec<Plugin> = Vec::new();
        for (level, current) in ancestry.iter().enumerate() {
            let inheriting = level > 0;
            for profile in current.active_profiles(&ctx.active_profiles) {
                merge_plugins(&mut plugins, &profile.plugins, inheriting);
                merge_plugins(&mut plugin_management, &profile.plugin_management, inheriting);
            }
            merge_plugins(&mut plugins, &current.plugins, inheriting);
            merge_plugins(&mut plugin_management, &current.plugin_management, inheriting);
        }
        apply_plugin_management(&mut plugins, &plugin_management);

        let resolved = Arc::new(ResolvedPom {
            requested: leaf,
            properties,
            dependency_management,
            requested_dependencies,
            repositories,
            plugins,
            plugin_management,
            property_overrides: ctx.property_overrides.clone(),
        });

        match resolved.gav() {
            Some(gav) if !gav.has_placeholders() => {
                Ok(ctx.cache.put_resolved_pom(&gav, resolved))
            }
            _ => Ok(resolved),
        }
    })
}

async fn merge_managed_entry(
    entry: &ManagedDependency,
    declared_in: &Gav,
    view: &ResolvedPom,
    repositories: &[Repository],
    ctx: &ResolutionContext,
    import_stack: &[Gav],
    out: &mut DependencyManagement,
) -> Result<()> {
    match entry {
        ManagedDependency::Defined(dependency) => {
            let gav = Gav::new(
                view.resolve_value(&dependency.group_id),
                view.resolve_value(&dependency.artifact_id),
                view.resolve_value(dependency.version.as_deref().unwrap_or("")),
            );
            let scope = dependency
                .scope
                .as_deref()
                .map(|s| view.resolve_value(s))
                .and_then(|s| Scope::from_str(&s).ok());
            ctx.listener.dependency_management_merged(&gav);
            out.append(ResolvedManagedDependency {
                gav,
                scope,
                type_: dependency.type_.clone(),
                classifier: dependency.classifier.clone(),
                exclusions: dependency.exclusions.clone(),
                declared_in: declared_in.clone(),
                imported_from: None,
            });
        }
        ManagedDependency::Imported(bom) => {
            let bom_gav = Gav::new(
                view.resolve_value(&bom.group_id),
                view.resolve_value(&bom.artifact_id),
                view.resolve_value(&bom.version),
            );
            if bom_gav.has_placeholders() {
                tracing::warn!(bom = %bom_gav, "skipping BOM import with unresolved placeholders");
                return Ok(());
            }
            if import_stack.contains(&bom_gav) {
                tracing::warn!(bom = %bom_gav, "BOM import cycle detected, nothing further to merge");
                return Ok(());
            }
            let bom_pom = ctx
                .downloader
                .download(&bom_gav, None, Some(declared_in), repositories)
                .await?;
            let mut stack = import_stack.to_vec();
            stack.push(bom_gav.clone());
            let bom_resolved = resolve_inner(bom_pom, ctx, stack).await?;
            ctx.listener.bom_imported(&bom_gav, declared_in);
            for imported in bom_resolved.dependency_management.entries() {
                out.append(ResolvedManagedDependency {
                    imported_from: Some(bom_gav.clone()),
                    ..imported.clone()
                });
            }
        }
    }
    Ok(())
}

fn merge_properties(
    current: &mut HashMap<String, String>,
    incoming: &HashMap<String, String>,
    listener: &dyn ResolutionListener,
) {
    for (key, value) in incoming {
        // First write wins: the closest declaration already merged prevails.
        if !current.contains_key(key) {
            current.insert(key.clone(), value.clone());
            listener.property_merged(key, value);
        }
    }
}
