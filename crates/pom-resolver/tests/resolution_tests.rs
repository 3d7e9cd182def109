//! End-to-end resolution scenarios over in-memory POM fixtures.

use std::sync::Arc;

use pom_core::downloader::MapPomDownloader;
use pom_core::types::{
    Dependency, Gav, GroupArtifact, ManagedDependency, Parent, Plugin, PluginExecution, Pom,
    Scope,
};
use pom_resolver::walker::ResolutionFailure;
use pom_resolver::{ResolutionContext, resolve, resolve_dependencies};

fn pom(group: &str, artifact: &str, version: &str) -> Pom {
    Pom {
        group_id: Some(group.into()),
        artifact_id: artifact.into(),
        version: Some(version.into()),
        ..Default::default()
    }
}

fn dep(group: &str, artifact: &str, version: &str) -> Dependency {
    Dependency::new(group, artifact, Some(version.into()))
}

fn context(poms: Vec<Pom>) -> ResolutionContext {
    let mut downloader = MapPomDownloader::new();
    for p in poms {
        downloader = downloader.with_pom(p);
    }
    ResolutionContext::new(Arc::new(downloader))
}

#[tokio::test]
async fn transitive_chain_with_depths() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "b", "2.0"));
    let b = pom("com.g", "b", "2.0");

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));

    let ctx = context(vec![a, b]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    let members: Vec<String> = graph.members().map(|d| d.gav.to_string()).collect();
    assert_eq!(members, vec!["com.g:a:1.0", "com.g:b:2.0"]);

    let a_node = graph.find("com.g", "a").unwrap();
    assert_eq!(a_node.depth, 0);
    assert_eq!(a_node.children.len(), 1);
    assert_eq!(graph.node(a_node.children[0]).gav, Gav::new("com.g", "b", "2.0"));
    assert_eq!(graph.find("com.g", "b").unwrap().depth, 1);
}

#[tokio::test]
async fn root_management_pins_transitive_version() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "b", "2.0"));
    let b2 = pom("com.g", "b", "2.0");
    let b3 = pom("com.g", "b", "3.0");

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));
    root.dependency_management
        .push(ManagedDependency::Defined(dep("com.g", "b", "3.0")));

    let ctx = context(vec![a, b2, b3]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    assert_eq!(
        graph.find("com.g", "b").unwrap().gav.version,
        "3.0".to_string()
    );
}

#[tokio::test]
async fn exclusion_suppresses_transitive_subtree() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "b", "2.0"));
    let b = pom("com.g", "b", "2.0");

    let mut root = pom("com.g", "root", "1.0");
    let mut a_dep = dep("com.g", "a", "1.0");
    a_dep.exclusions.push(GroupArtifact::new("com.g", "b"));
    root.dependencies.push(a_dep);

    let ctx = context(vec![a, b]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    let members: Vec<String> = graph.members().map(|d| d.gav.to_string()).collect();
    assert_eq!(members, vec!["com.g:a:1.0"]);
    assert_eq!(
        graph.find("com.g", "a").unwrap().effective_exclusions,
        vec![GroupArtifact::new("com.g", "b")]
    );
}

#[tokio::test]
async fn exclusion_glob_matches_artifacts() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "lib-core", "1.0"));
    a.dependencies.push(dep("com.g", "other", "1.0"));
    let lib_core = pom("com.g", "lib-core", "1.0");
    let other = pom("com.g", "other", "1.0");

    let mut root = pom("com.g", "root", "1.0");
    let mut a_dep = dep("com.g", "a", "1.0");
    a_dep.exclusions.push(GroupArtifact::new("com.g", "lib-*"));
    root.dependencies.push(a_dep);

    let ctx = context(vec![a, lib_core, other]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    assert!(graph.find("com.g", "lib-core").is_none());
    assert!(graph.find("com.g", "other").is_some());
}

#[tokio::test]
async fn diamond_resolves_once() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "c", "1.0"));
    let mut b = pom("com.g", "b", "1.0");
    b.dependencies.push(dep("com.g", "c", "1.0"));
    let c = pom("com.g", "c", "1.0");

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));
    root.dependencies.push(dep("com.g", "b", "1.0"));

    let ctx = context(vec![a, b, c]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    let c_members = graph
        .members()
        .filter(|d| d.gav.artifact_id == "c")
        .count();
    assert_eq!(c_members, 1);

    // both parents link to the single node
    let c_node = graph.find("com.g", "c").unwrap();
    let parents = graph
        .nodes()
        .iter()
        .filter(|n| n.children.iter().any(|id| graph.node(*id) == c_node))
        .count();
    assert_eq!(parents, 2);
}

#[tokio::test]
async fn nearest_version_wins_over_deeper_declaration() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "x", "2.0"));
    let x1 = pom("com.g", "x", "1.0");
    let x2 = pom("com.g", "x", "2.0");

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));
    root.dependencies.push(dep("com.g", "x", "1.0"));

    let ctx = context(vec![a, x1, x2]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    assert_eq!(graph.find("com.g", "x").unwrap().gav.version, "1.0");
    assert_eq!(graph.find("com.g", "x").unwrap().depth, 0);
}

#[tokio::test]
async fn tightened_range_restarts_and_converges() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "x", "[1.0,2.0]"));
    let mut b = pom("com.g", "b", "1.0");
    b.dependencies.push(dep("com.g", "x", "[1.0,1.5]"));

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));
    root.dependencies.push(dep("com.g", "b", "1.0"));

    let ctx = context(vec![
        a,
        b,
        pom("com.g", "x", "1.0"),
        pom("com.g", "x", "1.5"),
        pom("com.g", "x", "2.0"),
    ]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    // intersection of both ranges, highest available
    assert_eq!(graph.find("com.g", "x").unwrap().gav.version, "1.5");
    let x_members = graph
        .members()
        .filter(|d| d.gav.artifact_id == "x")
        .count();
    assert_eq!(x_members, 1);
}

#[tokio::test]
async fn download_failure_is_recorded_not_thrown() {
    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "missing", "1.0"));
    root.dependencies.push(dep("com.g", "present", "1.0"));

    let ctx = context(vec![pom("com.g", "present", "1.0")]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    let missing = graph.find("com.g", "missing").unwrap();
    assert!(matches!(missing.failure, Some(ResolutionFailure::Download(_))));
    assert!(missing.children.is_empty());
    assert!(graph.find("com.g", "present").unwrap().failure.is_none());
}

#[tokio::test]
async fn unresolved_placeholder_is_recorded_not_thrown() {
    let mut root = pom("com.g", "root", "1.0");
    root.dependencies
        .push(dep("com.g", "lib", "${undeclared.version}"));

    let ctx = context(vec![]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    assert!(matches!(
        graph.find("com.g", "lib").unwrap().failure,
        Some(ResolutionFailure::UnresolvedPlaceholder(_))
    ));
}

#[tokio::test]
async fn missing_version_is_recorded_not_thrown() {
    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(Dependency::new("com.g", "lib", None));

    let ctx = context(vec![]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    assert!(matches!(
        graph.find("com.g", "lib").unwrap().failure,
        Some(ResolutionFailure::NoVersionMatching(_))
    ));
}

#[tokio::test]
async fn shared_failure_is_a_single_node() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "missing", "1.0"));
    let mut b = pom("com.g", "b", "1.0");
    b.dependencies.push(dep("com.g", "missing", "1.0"));

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));
    root.dependencies.push(dep("com.g", "b", "1.0"));

    let ctx = context(vec![a, b]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    let failing: Vec<_> = graph
        .members()
        .filter(|d| d.gav.artifact_id == "missing")
        .collect();
    assert_eq!(failing.len(), 1);
    assert!(matches!(failing[0].failure, Some(ResolutionFailure::Download(_))));

    // both parents link to the one shared node
    let failing_id = graph
        .nodes()
        .iter()
        .position(|d| d.gav.artifact_id == "missing")
        .unwrap();
    for parent in ["a", "b"] {
        let node = graph.find("com.g", parent).unwrap();
        assert!(node.children.contains(&failing_id));
    }
}

#[tokio::test]
async fn malformed_range_is_recorded_not_thrown() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "x", "[1.0"));

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));

    let ctx = context(vec![a]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    assert!(graph.find("com.g", "a").unwrap().failure.is_none());
    assert!(matches!(
        graph.find("com.g", "x").unwrap().failure,
        Some(ResolutionFailure::NoVersionMatching(_))
    ));
}

#[tokio::test]
async fn optional_dependencies_are_not_transitive() {
    let mut a = pom("com.g", "a", "1.0");
    let mut optional = dep("com.g", "opt", "1.0");
    optional.optional = true;
    a.dependencies.push(optional);

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));

    let ctx = context(vec![a, pom("com.g", "opt", "1.0")]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    assert!(graph.find("com.g", "opt").is_none());
}

#[tokio::test]
async fn test_scoped_transitives_do_not_leak() {
    let mut a = pom("com.g", "a", "1.0");
    let mut test_dep = dep("com.g", "t", "1.0");
    test_dep.scope = Some("test".into());
    a.dependencies.push(test_dep);

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));

    let ctx = context(vec![a, pom("com.g", "t", "1.0")]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Test, &ctx)
        .await
        .unwrap();

    // a's own test dependencies are not transitive at all
    assert!(graph.find("com.g", "t").is_none());
    assert!(graph.find("com.g", "a").is_some());
}

#[tokio::test]
async fn runtime_transitive_links_but_stays_off_compile_classpath() {
    let mut a = pom("com.g", "a", "1.0");
    let mut rt = dep("com.g", "r", "1.0");
    rt.scope = Some("runtime".into());
    a.dependencies.push(rt);

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));

    let ctx = context(vec![a, pom("com.g", "r", "1.0")]);
    let resolved = resolve(root, &ctx).await.unwrap();

    let compile = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();
    assert!(compile.find("com.g", "r").is_none());
    // resolved for linking, visible in the arena
    assert!(compile.nodes().iter().any(|n| n.gav.artifact_id == "r"));

    let runtime = resolve_dependencies(&resolved, Scope::Runtime, &ctx)
        .await
        .unwrap();
    let r = runtime.find("com.g", "r").unwrap();
    assert_eq!(r.scope, Scope::Runtime);
}

#[tokio::test]
async fn parent_property_resolves_dependency_version() {
    let mut parent = pom("com.g", "parent", "1.0");
    parent.properties.insert("app.version".into(), "1.0".into());

    let mut child = pom("com.g", "child", "1.0");
    child.parent = Some(Parent {
        gav: Gav::new("com.g", "parent", "1.0"),
        relative_path: None,
    });
    child.dependencies.push(dep("com.g", "lib", "${app.version}"));

    let ctx = context(vec![parent, pom("com.g", "lib", "1.0")]);
    let resolved = resolve(child, &ctx).await.unwrap();
    assert_eq!(resolved.get_value("app.version").as_deref(), Some("1.0"));

    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();
    assert_eq!(graph.find("com.g", "lib").unwrap().gav.version, "1.0");
}

#[tokio::test]
async fn bom_import_pins_transitive_versions() {
    let mut bom = pom("com.g", "bom", "1.0");
    bom.packaging = Some("pom".into());
    bom.dependency_management
        .push(ManagedDependency::Defined(dep("com.g", "b", "3.0")));

    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "b", "2.0"));

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));
    root.dependency_management
        .push(ManagedDependency::Imported(Gav::new("com.g", "bom", "1.0")));

    let ctx = context(vec![bom, a, pom("com.g", "b", "2.0"), pom("com.g", "b", "3.0")]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let graph = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();

    let b = graph.find("com.g", "b").unwrap();
    assert_eq!(b.gav.version, "3.0");
}

#[tokio::test]
async fn plugin_management_defaults_applied_to_declared_plugins() {
    use pom_core::types::DEFAULT_PLUGIN_GROUP_ID;

    let mut managed = Plugin::new(DEFAULT_PLUGIN_GROUP_ID, "p");
    managed.version = Some("3.1".into());
    managed.executions.push(PluginExecution {
        id: "e1".into(),
        goals: vec!["g1".into()],
        ..Default::default()
    });
    let mut parent = pom("com.g", "parent", "1.0");
    parent.plugin_management.push(managed);

    let mut declared = Plugin::new(DEFAULT_PLUGIN_GROUP_ID, "p");
    declared.executions.push(PluginExecution {
        id: "e1".into(),
        goals: vec!["g2".into()],
        ..Default::default()
    });
    let mut child = pom("com.g", "child", "1.0");
    child.parent = Some(Parent {
        gav: Gav::new("com.g", "parent", "1.0"),
        relative_path: None,
    });
    child.plugins.push(declared);

    let ctx = context(vec![parent]);
    let resolved = resolve(child, &ctx).await.unwrap();

    assert_eq!(resolved.plugins.len(), 1);
    let plugin = &resolved.plugins[0];
    assert_eq!(plugin.version.as_deref(), Some("3.1"));
    let mut goals = plugin.executions[0].goals.clone();
    goals.sort();
    assert_eq!(goals, vec!["g1", "g2"]);
}

#[tokio::test]
async fn resolving_twice_yields_equal_graphs() {
    let mut a = pom("com.g", "a", "1.0");
    a.dependencies.push(dep("com.g", "b", "2.0"));

    let mut root = pom("com.g", "root", "1.0");
    root.dependencies.push(dep("com.g", "a", "1.0"));

    let ctx = context(vec![a, pom("com.g", "b", "2.0")]);
    let resolved = resolve(root, &ctx).await.unwrap();
    let first = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();
    let second = resolve_dependencies(&resolved, Scope::Compile, &ctx)
        .await
        .unwrap();
    assert_eq!(first, second);
}
