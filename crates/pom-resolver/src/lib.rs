//! POM resolution engine.
//!
//! This crate turns a parsed POM into its effective view (parent chain,
//! profiles, properties, dependency management, plugins) and expands the
//! effective view into a flattened transitive dependency graph with
//! nearest-wins version conflict resolution.

pub mod cache;
pub mod management;
pub mod parser;
pub mod plugin;
pub mod properties;
pub mod remote;
pub mod repositories;
pub mod requirement;
pub mod resolved;
pub mod walker;

pub use cache::{InMemoryResolutionCache, ResolutionCache};
pub use management::{DependencyManagement, ResolvedManagedDependency};
pub use parser::parse_pom_xml;
pub use plugin::{apply_plugin_management, merge_configurations, merge_plugins};
pub use remote::RemotePomDownloader;
pub use requirement::{ResolvedVersion, VersionRequirement};
pub use resolved::{ResolutionContext, ResolvedPom, resolve};
pub use walker::{
    DependencyGraph, NodeId, ResolutionFailure, ResolvedDependency, resolve_dependencies,
};
