//! Domain model and collaborator traits for POM dependency resolution.
//!
//! This crate holds what the resolver and its transport collaborators share:
//! the requested-POM model, Maven scope and version semantics, the downloader
//! and listener seams, and the error taxonomy.

pub mod downloader;
pub mod error;
pub mod listener;
pub mod types;
pub mod version;

pub use downloader::{MapPomDownloader, Metadata, PomDownloader};
pub use error::{PomError, Result};
pub use listener::{NoopListener, ResolutionListener};
pub use types::{
    Dependency, Gav, GroupArtifact, License, ManagedDependency, Parent, Plugin, PluginExecution,
    Pom, Profile, ProfileActivation, Repository, Scope, glob_matches,
};
pub use version::{Bound, VersionRange, VersionSpec, compare_versions, is_prerelease};
