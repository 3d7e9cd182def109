//! Breadth-first transitive dependency expansion.
//!
//! The walk is depth-numbered: requested dependencies of the root seed
//! level zero, their dependencies level one, and so on. Version conflicts
//! are settled nearest-wins; when a later sighting tightens a requirement
//! enough to change an already chosen version, the whole walk restarts
//! with the accumulated requirements carried over. Per-dependency failures
//! never abort the walk, they are recorded on the node and stop its
//! expansion.

use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::Arc;

use pom_core::error::{PomError, Result};
use pom_core::types::{Dependency, Gav, GroupArtifact, License, Repository, Scope};

use crate::requirement::{ResolvedVersion, VersionRequirement};
use crate::resolved::{ResolutionContext, ResolvedPom, resolve};

/// Restart bound for the conflict re-resolution loop. Requirements only
/// grow, so each restart settles at least one coordinate; pathological
/// inputs that keep flip-flopping past this many runs are rejected.
const MAX_RESTARTS: usize = 100;

/// Index of a node in a [`DependencyGraph`] arena.
pub type NodeId = usize;

/// Why a dependency could not be fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// The dependency's POM or metadata could not be downloaded or parsed.
    Download(String),
    /// A coordinate still contained `${...}` after property resolution.
    UnresolvedPlaceholder(String),
    /// No version satisfies the accumulated requirements, or none was
    /// declared or managed at all.
    NoVersionMatching(String),
}

/// One node of the expanded graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDependency {
    /// Repository the dependency's POM came from, when known.
    pub repository: Option<Repository>,
    pub gav: Gav,
    /// The declaration that introduced this node.
    pub requested: Dependency,
    pub scope: Scope,
    pub type_: Option<String>,
    pub classifier: Option<String>,
    pub optional: bool,
    /// BFS level this node was first kept at.
    pub depth: usize,
    pub children: Vec<NodeId>,
    pub licenses: Vec<License>,
    /// Exclusion patterns that actually suppressed a child of this node.
    pub effective_exclusions: Vec<GroupArtifact>,
    pub failure: Option<ResolutionFailure>,
}

/// Arena of resolved dependencies plus the flat classpath members list.
///
/// Nodes reference each other by index, so the same artifact reached from
/// several parents is one node with many incoming links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    nodes: Vec<ResolvedDependency>,
    members: Vec<NodeId>,
}

impl DependencyGraph {
    pub fn node(&self, id: NodeId) -> &ResolvedDependency {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[ResolvedDependency] {
        &self.nodes
    }

    /// Classpath members in discovery order.
    pub fn members(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.members.iter().map(|id| &self.nodes[*id])
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn find(&self, group_id: &str, artifact_id: &str) -> Option<&ResolvedDependency> {
        self.members()
            .find(|d| d.gav.group_id == group_id && d.gav.artifact_id == artifact_id)
    }
}

struct WorkItem {
    dependency: Dependency,
    defined_in: Arc<ResolvedPom>,
    /// Effective scope computed when the item was enqueued.
    effective_scope: Scope,
    parent: Option<NodeId>,
    depth: usize,
    /// Exclusion patterns accumulated from every ancestor declaration.
    exclusions: Vec<GroupArtifact>,
}

enum WalkOutcome {
    Complete(DependencyGraph),
    Restart,
}

/// Expands the root POM's dependencies into the flattened graph for
/// `target` scope.
pub async fn resolve_dependencies(
    root: &Arc<ResolvedPom>,
    target: Scope,
    ctx: &ResolutionContext,
) -> Result<DependencyGraph> {
    let mut requirements: HashMap<GroupArtifact, VersionRequirement> = HashMap::new();
    for restart in 0..MAX_RESTARTS {
        if restart > 0 {
            tracing::debug!(restart, "restarting dependency walk after version change");
        }
        match walk_once(root, target, ctx, &mut requirements).await? {
            WalkOutcome::Complete(graph) => return Ok(graph),
            WalkOutcome::Restart => {}
        }
    }
    Err(PomError::ResolutionLoop {
        restarts: MAX_RESTARTS,
    })
}

async fn walk_once(
    root: &Arc<ResolvedPom>,
    target: Scope,
    ctx: &ResolutionContext,
    requirements: &mut HashMap<GroupArtifact, VersionRequirement>,
) -> Result<WalkOutcome> {
    let root_gav = root.gav();
    let mut graph = DependencyGraph::default();
    let mut resolved_index: HashMap<(String, String, Option<String>), NodeId> = HashMap::new();
    let mut selected: HashMap<GroupArtifact, String> = HashMap::new();
    let mut queue: VecDeque<WorkItem> = VecDeque::new();

    for dependency in &root.requested_dependencies {
        let values = root.get_values(dependency);
        let declared = scope_of(&values);
        if !declared.is_in_classpath_of(target) {
            continue;
        }
        queue.push_back(WorkItem {
            dependency: dependency.clone(),
            defined_in: Arc::clone(root),
            effective_scope: declared,
            parent: None,
            depth: 0,
            exclusions: Vec::new(),
        });
    }

    while let Some(item) = queue.pop_front() {
        let mut values = item.defined_in.get_values(&item.dependency);

        // The root's management overrides a transitive declaration: the
        // version unconditionally, the scope only when that would not
        // change whether the dependency lands on the classpath.
        let mut scope = item.effective_scope;
        if item.depth > 0 {
            let type_ = values.type_.as_deref().unwrap_or("jar").to_string();
            if let Some(pinned) = root.dependency_management.managed_version(
                &values.group_id,
                &values.artifact_id,
                &type_,
                values.classifier.as_deref(),
            ) {
                values.version = Some(pinned.to_string());
            }
            if let Some(managed_scope) = root.dependency_management.managed_scope(
                &values.group_id,
                &values.artifact_id,
                &type_,
                values.classifier.as_deref(),
            ) && managed_scope.is_in_classpath_of(target) == scope.is_in_classpath_of(target)
            {
                scope = managed_scope;
            }
        }

        let type_ = values.type_.as_deref().unwrap_or("jar");
        if type_ != "jar" && type_ != "pom" {
            continue;
        }

        if values.group_id.contains("${") || values.artifact_id.contains("${") {
            let gav = Gav::new(
                values.group_id.clone(),
                values.artifact_id.clone(),
                values.version.clone().unwrap_or_default(),
            );
            push_failure(
                &mut graph,
                &mut resolved_index,
                &item,
                gav.clone(),
                scope,
                &values,
                ResolutionFailure::UnresolvedPlaceholder(gav.to_string()),
            );
            continue;
        }

        let ga = GroupArtifact::new(values.group_id.clone(), values.artifact_id.clone());
        let Some(requested_version) = values.version.clone().filter(|v| !v.is_empty()) else {
            push_failure(
                &mut graph,
                &mut resolved_index,
                &item,
                Gav::new(ga.group_id.clone(), ga.artifact_id.clone(), ""),
                scope,
                &values,
                ResolutionFailure::NoVersionMatching(format!("no version declared for {ga}")),
            );
            continue;
        };
        if requested_version.contains("${") {
            let gav = Gav::new(ga.group_id.clone(), ga.artifact_id.clone(), requested_version);
            push_failure(
                &mut graph,
                &mut resolved_index,
                &item,
                gav.clone(),
                scope,
                &values,
                ResolutionFailure::UnresolvedPlaceholder(gav.to_string()),
            );
            continue;
        }

        // A version that fails to parse as a range is recorded on its node;
        // one bad declaration must not abort the rest of the walk.
        let requirement = match requirements.entry(ga.clone()) {
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                if let Err(err) = entry.get_mut().add_requirement(&requested_version, item.depth) {
                    push_failure(
                        &mut graph,
                        &mut resolved_index,
                        &item,
                        Gav::new(ga.group_id.clone(), ga.artifact_id.clone(), requested_version),
                        scope,
                        &values,
                        ResolutionFailure::NoVersionMatching(err.to_string()),
                    );
                    continue;
                }
                entry.into_mut()
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                match VersionRequirement::from_version(&requested_version, item.depth) {
                    Ok(requirement) => entry.insert(requirement),
                    Err(err) => {
                        push_failure(
                            &mut graph,
                            &mut resolved_index,
                            &item,
                            Gav::new(ga.group_id.clone(), ga.artifact_id.clone(), requested_version),
                            scope,
                            &values,
                            ResolutionFailure::NoVersionMatching(err.to_string()),
                        );
                        continue;
                    }
                }
            }
        };

        let available = if requirement.has_ranges() {
            match ctx
                .downloader
                .download_metadata(&ga, root_gav.as_ref(), &root.repositories)
                .await
            {
                Ok(metadata) => metadata.versions,
                Err(err) => {
                    push_failure(
                        &mut graph,
                        &mut resolved_index,
                        &item,
                        Gav::new(ga.group_id.clone(), ga.artifact_id.clone(), requested_version),
                        scope,
                        &values,
                        ResolutionFailure::Download(err.to_string()),
                    );
                    continue;
                }
            }
        } else {
            Vec::new()
        };
        let version = match requirement.resolve(&ga, &available) {
            ResolvedVersion::Pinned(v) | ResolvedVersion::FromListing(v) => v,
            ResolvedVersion::NoneMatching => {
                push_failure(
                    &mut graph,
                    &mut resolved_index,
                    &item,
                    Gav::new(ga.group_id.clone(), ga.artifact_id.clone(), requested_version),
                    scope,
                    &values,
                    ResolutionFailure::NoVersionMatching(format!(
                        "no version of {ga} satisfies all requirements"
                    )),
                );
                continue;
            }
        };

        // A tightened requirement that moves an already chosen version
        // invalidates everything built so far.
        match selected.get(&ga) {
            Some(chosen) if *chosen != version => return Ok(WalkOutcome::Restart),
            Some(_) => {}
            None => {
                selected.insert(ga.clone(), version.clone());
            }
        }

        let key = (
            ga.group_id.clone(),
            ga.artifact_id.clone(),
            values.classifier.clone(),
        );
        if let Some(existing) = resolved_index.get(&key) {
            // Already kept at a shallower depth; only link it.
            link_child(&mut graph, item.parent, *existing);
            continue;
        }

        let gav = Gav::new(ga.group_id.clone(), ga.artifact_id.clone(), version);

        // System dependencies come from the local toolchain, there is no
        // POM to fetch and nothing transitive to expand.
        if scope == Scope::System {
            let node = new_node(&item, gav, scope, &values, None);
            insert_node(&mut graph, &mut resolved_index, key, node, &item, target);
            continue;
        }

        let dep_resolved = match ctx
            .downloader
            .download(&gav, None, root_gav.as_ref(), &root.repositories)
            .await
        {
            Ok(pom) => match resolve(pom, ctx).await {
                Ok(resolved) => resolved,
                Err(err) => {
                    push_failure(
                        &mut graph,
                        &mut resolved_index,
                        &item,
                        gav,
                        scope,
                        &values,
                        ResolutionFailure::Download(err.to_string()),
                    );
                    continue;
                }
            },
            Err(err) => {
                push_failure(
                    &mut graph,
                    &mut resolved_index,
                    &item,
                    gav,
                    scope,
                    &values,
                    ResolutionFailure::Download(err.to_string()),
                );
                continue;
            }
        };

        let mut node = new_node(&item, gav, scope, &values, None);
        node.repository = dep_resolved.requested.repository.clone();
        node.licenses = dep_resolved.requested.licenses.clone();
        let node_id = insert_node(&mut graph, &mut resolved_index, key, node, &item, target);

        // Child expansion: exclusions accumulate down the subtree, optional
        // dependencies only apply at the declaring level.
        let mut inherited_exclusions = item.exclusions.clone();
        for exclusion in &values.exclusions {
            if !inherited_exclusions.contains(exclusion) {
                inherited_exclusions.push(exclusion.clone());
            }
        }
        for child in &dep_resolved.requested_dependencies {
            let child_values = dep_resolved.get_values(child);
            if child_values.optional {
                continue;
            }
            if let Some(matched) = inherited_exclusions
                .iter()
                .find(|e| e.glob_matches(&child_values.group_id, &child_values.artifact_id))
            {
                let matched = matched.clone();
                let suppressed = &mut graph.nodes[node_id].effective_exclusions;
                if !suppressed.contains(&matched) {
                    suppressed.push(matched);
                }
                continue;
            }
            let Some(child_scope) = scope_of(&child_values).transitive_of(scope) else {
                continue;
            };
            queue.push_back(WorkItem {
                dependency: child.clone(),
                defined_in: Arc::clone(&dep_resolved),
                effective_scope: child_scope,
                parent: Some(node_id),
                depth: item.depth + 1,
                exclusions: inherited_exclusions.clone(),
            });
        }
    }

    Ok(WalkOutcome::Complete(graph))
}

fn scope_of(values: &Dependency) -> Scope {
    values
        .scope
        .as_deref()
        .map(|s| Scope::from_str(s).unwrap_or_default())
        .unwrap_or_default()
}

fn new_node(
    item: &WorkItem,
    gav: Gav,
    scope: Scope,
    values: &Dependency,
    failure: Option<ResolutionFailure>,
) -> ResolvedDependency {
    ResolvedDependency {
        repository: None,
        gav,
        requested: item.dependency.clone(),
        scope,
        type_: values.type_.clone(),
        classifier: values.classifier.clone(),
        optional: values.optional,
        depth: item.depth,
        children: Vec::new(),
        licenses: Vec::new(),
        effective_exclusions: Vec::new(),
        failure,
    }
}

fn insert_node(
    graph: &mut DependencyGraph,
    resolved_index: &mut HashMap<(String, String, Option<String>), NodeId>,
    key: (String, String, Option<String>),
    node: ResolvedDependency,
    item: &WorkItem,
    target: Scope,
) -> NodeId {
    let in_classpath = node.scope.is_in_classpath_of(target);
    let node_id = graph.nodes.len();
    graph.nodes.push(node);
    if in_classpath {
        graph.members.push(node_id);
    }
    resolved_index.insert(key, node_id);
    link_child(graph, item.parent, node_id);
    node_id
}

// Failure nodes are kept visible in the output but never expanded. They
// share the dedup index with resolved nodes, so the same failing
// coordinate reached from several parents stays a single entry and later
// sightings only link to it.
fn push_failure(
    graph: &mut DependencyGraph,
    resolved_index: &mut HashMap<(String, String, Option<String>), NodeId>,
    item: &WorkItem,
    gav: Gav,
    scope: Scope,
    values: &Dependency,
    failure: ResolutionFailure,
) {
    let key = (
        values.group_id.clone(),
        values.artifact_id.clone(),
        values.classifier.clone(),
    );
    if let Some(existing) = resolved_index.get(&key) {
        link_child(graph, item.parent, *existing);
        return;
    }
    let node = new_node(item, gav, scope, values, Some(failure));
    let node_id = graph.nodes.len();
    graph.nodes.push(node);
    graph.members.push(node_id);
    resolved_index.insert(key, node_id);
    link_child(graph, item.parent, node_id);
}

fn link_child(graph: &mut DependencyGraph, parent: Option<NodeId>, child: NodeId) {
    if let Some(parent) = parent
        && !graph.nodes[parent].children.contains(&child)
    {
        graph.nodes[parent].children.push(child);
    }
}
