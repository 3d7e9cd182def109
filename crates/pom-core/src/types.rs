//! Domain types for the requested (as-declared) POM model.
//!
//! All types here are immutable once built; transformations produce new
//! instances. Coordinates may still contain `${...}` placeholders until
//! property resolution runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A group:artifact pair. Equality is by string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupArtifact {
    pub group_id: String,
    pub artifact_id: String,
}

impl GroupArtifact {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for GroupArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// A group:artifact:version triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gav {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Gav {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(self.group_id.clone(), self.artifact_id.clone())
    }

    /// True if any coordinate still carries an unresolved `${...}` placeholder.
    pub fn has_placeholders(&self) -> bool {
        self.group_id.contains("${")
            || self.artifact_id.contains("${")
            || self.version.contains("${")
    }
}

impl fmt::Display for Gav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Maven dependency scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
}

impl std::str::FromStr for Scope {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "provided" => Self::Provided,
            "runtime" => Self::Runtime,
            "test" => Self::Test,
            "system" => Self::System,
            "import" => Self::Import,
            _ => Self::Compile,
        })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Compile => "compile",
            Self::Provided => "provided",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::System => "system",
            Self::Import => "import",
        };
        f.write_str(s)
    }
}

impl Scope {
    /// Maven's transitive-scope table: the scope a dependency declared with
    /// `self` contributes when reached through a dependency of `parent` scope.
    /// `None` means the dependency is not transitive in that context.
    pub fn transitive_of(self, parent: Self) -> Option<Self> {
        match self {
            Self::Compile => match parent {
                Self::Compile => Some(Self::Compile),
                Self::Provided => Some(Self::Provided),
                Self::Runtime => Some(Self::Runtime),
                Self::Test => Some(Self::Test),
                _ => None,
            },
            Self::Runtime => match parent {
                Self::Compile | Self::Runtime => Some(Self::Runtime),
                Self::Provided => Some(Self::Provided),
                Self::Test => Some(Self::Test),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether a dependency of this scope is on the classpath named `target`.
    pub fn is_in_classpath_of(self, target: Self) -> bool {
        match target {
            Self::Compile => matches!(self, Self::Compile | Self::Provided | Self::System),
            Self::Runtime => matches!(self, Self::Compile | Self::Runtime),
            Self::Test => !matches!(self, Self::Import),
            Self::Provided => matches!(self, Self::Provided),
            _ => false,
        }
    }
}

/// Matches a group or artifact id against a `*` glob pattern.
pub fn glob_matches(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }
    let mut remainder = value;
    let parts: Vec<&str> = pattern.split('*').collect();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match remainder.strip_prefix(part) {
                Some(rest) => remainder = rest,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return remainder.ends_with(part);
        } else {
            match remainder.find(part) {
                Some(pos) => remainder = &remainder[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

impl GroupArtifact {
    /// Treats `self` as a glob pattern and matches it against a coordinate.
    pub fn glob_matches(&self, group_id: &str, artifact_id: &str) -> bool {
        glob_matches(&self.group_id, group_id) && glob_matches(&self.artifact_id, artifact_id)
    }
}

/// A requested dependency declaration.
///
/// `version` and `scope` are kept as raw strings since they may reference
/// properties declared anywhere in the ancestry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub classifier: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub exclusions: Vec<GroupArtifact>,
}

impl Dependency {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version,
            classifier: None,
            type_: None,
            scope: None,
            optional: false,
            exclusions: Vec::new(),
        }
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(self.group_id.clone(), self.artifact_id.clone())
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.group_id,
            self.artifact_id,
            self.version.as_deref().unwrap_or("")
        )
    }
}

/// A `<dependencyManagement>` entry as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagedDependency {
    /// A regular pinned entry.
    Defined(Dependency),
    /// A BOM import (`scope=import`, `type=pom`) whose own managed entries
    /// are spliced in during resolution.
    Imported(Gav),
}

/// The `<parent>` reference of a POM. A parent without a version is a
/// malformed input and is rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    pub gav: Gav,
    pub relative_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: Option<String>,
    pub url: String,
    pub releases: Option<bool>,
    pub snapshots: Option<bool>,
}

impl Repository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            url: url.into(),
            releases: None,
            snapshots: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileActivation {
    pub active_by_default: bool,
}

/// A build profile with its own declarations, merged only when active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<String>,
    pub activation: Option<ProfileActivation>,
    pub properties: HashMap<String, String>,
    pub dependencies: Vec<Dependency>,
    pub dependency_management: Vec<ManagedDependency>,
    pub repositories: Vec<Repository>,
    pub plugins: Vec<Plugin>,
    pub plugin_management: Vec<Plugin>,
}

/// A plugin execution, identified by id within its plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginExecution {
    pub id: String,
    pub phase: Option<String>,
    pub goals: Vec<String>,
    pub inherited: Option<bool>,
    pub configuration: Option<serde_json::Value>,
}

impl Default for PluginExecution {
    fn default() -> Self {
        Self {
            id: "default".into(),
            phase: None,
            goals: Vec::new(),
            inherited: None,
            configuration: None,
        }
    }
}

pub const DEFAULT_PLUGIN_GROUP_ID: &str = "org.apache.maven.plugins";

/// A plugin declaration, identified by group:artifact.
///
/// Configuration is a JSON-like tagged tree; `combine.children` and
/// `combine.self` directives are kept as `@combine.*` attribute keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub extensions: Option<bool>,
    pub inherited: Option<bool>,
    pub configuration: Option<serde_json::Value>,
    pub dependencies: Vec<Dependency>,
    pub executions: Vec<PluginExecution>,
}

impl Plugin {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            extensions: None,
            inherited: None,
            configuration: None,
            dependencies: Vec::new(),
            executions: Vec::new(),
        }
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(self.group_id.clone(), self.artifact_id.clone())
    }
}

/// The as-declared project descriptor, produced by parsing a pom.xml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pom {
    pub parent: Option<Parent>,
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub name: Option<String>,
    pub properties: HashMap<String, String>,
    pub dependencies: Vec<Dependency>,
    pub dependency_management: Vec<ManagedDependency>,
    pub repositories: Vec<Repository>,
    pub licenses: Vec<License>,
    pub profiles: Vec<Profile>,
    pub plugins: Vec<Plugin>,
    pub plugin_management: Vec<Plugin>,
    /// Repository this POM was downloaded from, when known.
    pub repository: Option<Repository>,
}

impl Pom {
    /// Effective groupId: own, falling back to the parent declaration.
    pub fn group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.gav.group_id.as_str()))
    }

    /// Effective version: own, falling back to the parent declaration.
    pub fn version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.gav.version.as_str()))
    }

    /// The declared coordinate, if group and version can be determined.
    /// May still contain placeholders.
    pub fn gav(&self) -> Option<Gav> {
        Some(Gav::new(
            self.group_id()?,
            self.artifact_id.clone(),
            self.version()?,
        ))
    }

    /// Profiles active under the given active-profile names.
    ///
    /// A profile is active when its id is in `active_names`, or when it is
    /// `activeByDefault` and no profile of this POM was explicitly named.
    pub fn active_profiles(&self, active_names: &[String]) -> Vec<&Profile> {
        let explicitly_active: Vec<&Profile> = self
            .profiles
            .iter()
            .filter(|p| {
                p.id.as_ref()
                    .is_some_and(|id| active_names.iter().any(|n| n == id))
            })
            .collect();
        if !explicitly_active.is_empty() {
            return explicitly_active;
        }
        self.profiles
            .iter()
            .filter(|p| {
                p.activation
                    .as_ref()
                    .is_some_and(|a| a.active_by_default)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_scope_parsing() {
        assert_eq!(Scope::from_str("test").unwrap(), Scope::Test);
        assert_eq!(Scope::from_str("Runtime").unwrap(), Scope::Runtime);
        assert_eq!(Scope::from_str("provided").unwrap(), Scope::Provided);
        assert_eq!(Scope::from_str("system").unwrap(), Scope::System);
        assert_eq!(Scope::from_str("import").unwrap(), Scope::Import);
        assert_eq!(Scope::from_str("compile").unwrap(), Scope::Compile);
        assert_eq!(Scope::from_str("unknown").unwrap(), Scope::Compile);
    }

    #[test]
    fn test_transitive_scope_table() {
        assert_eq!(
            Scope::Compile.transitive_of(Scope::Compile),
            Some(Scope::Compile)
        );
        assert_eq!(
            Scope::Runtime.transitive_of(Scope::Compile),
            Some(Scope::Runtime)
        );
        assert_eq!(
            Scope::Compile.transitive_of(Scope::Test),
            Some(Scope::Test)
        );
        assert_eq!(
            Scope::Runtime.transitive_of(Scope::Provided),
            Some(Scope::Provided)
        );
        // provided and test dependencies are never transitive
        assert_eq!(Scope::Provided.transitive_of(Scope::Compile), None);
        assert_eq!(Scope::Test.transitive_of(Scope::Compile), None);
        assert_eq!(Scope::Test.transitive_of(Scope::Test), None);
    }

    #[test]
    fn test_classpath_membership() {
        assert!(Scope::Compile.is_in_classpath_of(Scope::Compile));
        assert!(Scope::Provided.is_in_classpath_of(Scope::Compile));
        assert!(!Scope::Runtime.is_in_classpath_of(Scope::Compile));
        assert!(Scope::Compile.is_in_classpath_of(Scope::Runtime));
        assert!(!Scope::Provided.is_in_classpath_of(Scope::Runtime));
        assert!(Scope::Test.is_in_classpath_of(Scope::Test));
        assert!(Scope::Runtime.is_in_classpath_of(Scope::Test));
    }

    #[test]
    fn test_glob_matching() {
        assert!(glob_matches("*", "anything"));
        assert!(glob_matches("com.example", "com.example"));
        assert!(!glob_matches("com.example", "org.example"));
        assert!(glob_matches("com.*", "com.example"));
        assert!(glob_matches("*-core", "library-core"));
        assert!(!glob_matches("*-core", "library-api"));
        assert!(glob_matches("com.*.impl", "com.example.impl"));
    }

    #[test]
    fn test_exclusion_glob() {
        let exclusion = GroupArtifact::new("com.g", "*");
        assert!(exclusion.glob_matches("com.g", "b"));
        assert!(!exclusion.glob_matches("org.g", "b"));

        let exact = GroupArtifact::new("com.g", "b");
        assert!(exact.glob_matches("com.g", "b"));
        assert!(!exact.glob_matches("com.g", "c"));
    }

    #[test]
    fn test_gav_placeholders() {
        assert!(Gav::new("com.g", "a", "${rev}").has_placeholders());
        assert!(!Gav::new("com.g", "a", "1.0").has_placeholders());
        assert_eq!(Gav::new("com.g", "a", "1.0").to_string(), "com.g:a:1.0");
    }

    #[test]
    fn test_pom_coordinate_falls_back_to_parent() {
        let pom = Pom {
            parent: Some(Parent {
                gav: Gav::new("com.g", "parent", "2.0"),
                relative_path: None,
            }),
            artifact_id: "child".into(),
            ..Default::default()
        };
        assert_eq!(pom.group_id(), Some("com.g"));
        assert_eq!(pom.version(), Some("2.0"));
        assert_eq!(pom.gav().unwrap(), Gav::new("com.g", "child", "2.0"));
    }

    #[test]
    fn test_active_profiles() {
        let pom = Pom {
            artifact_id: "a".into(),
            profiles: vec![
                Profile {
                    id: Some("default".into()),
                    activation: Some(ProfileActivation {
                        active_by_default: true,
                    }),
                    ..Default::default()
                },
                Profile {
                    id: Some("ci".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        // no explicit activation: activeByDefault wins
        let active = pom.active_profiles(&[]);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_deref(), Some("default"));

        // explicit activation suppresses activeByDefault
        let active = pom.active_profiles(&["ci".to_string()]);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_deref(), Some("ci"));
    }
}
