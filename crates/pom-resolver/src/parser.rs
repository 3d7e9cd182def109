//! pom.xml parser.
//!
//! Uses a quick-xml event reader to build a lightweight element tree, then
//! maps it onto the requested-POM model. Namespaces are ignored (local names
//! only) and unknown elements are skipped, so partial or extended POMs still
//! parse.

use pom_core::error::{PomError, Result};
use pom_core::types::{
    DEFAULT_PLUGIN_GROUP_ID, Dependency, Gav, GroupArtifact, License, ManagedDependency, Parent,
    Plugin, PluginExecution, Pom, Profile, ProfileActivation, Repository,
};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Minimal element tree: name, attributes, ordered children, merged text.
#[derive(Debug, Clone, Default)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|c| c.text.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn read_element_tree(content: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| PomError::parse(e.to_string()))?;
        match event {
            Event::Start(ref e) => {
                let mut element = XmlElement {
                    name: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
                    ..Default::default()
                };
                for attr in e.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default();
                    element.attributes.push((key, value));
                }
                stack.push(element);
            }
            Event::Empty(ref e) => {
                let mut element = XmlElement {
                    name: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
                    ..Default::default()
                };
                for attr in e.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default();
                    element.attributes.push((key, value));
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(ref e) => {
                let text = match e.decode() {
                    Ok(cow) => {
                        let s = cow.trim().to_string();
                        quick_xml::escape::unescape(&s)
                            .map(|c| c.into_owned())
                            .unwrap_or(s)
                    }
                    Err(_) => String::from_utf8_lossy(e.as_ref()).trim().to_string(),
                };
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(ref e) => {
                if let Some(top) = stack.last_mut() {
                    top.text
                        .push_str(String::from_utf8_lossy(e.as_ref()).trim());
                }
            }
            Event::End(_) => {
                let finished = stack
                    .pop()
                    .ok_or_else(|| PomError::parse("unbalanced closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(finished),
                    None => root = Some(finished),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(PomError::parse("unterminated element"));
    }
    root.ok_or_else(|| PomError::parse("empty document"))
}

/// Parses a pom.xml document into the requested-POM model.
///
/// # Errors
///
/// Returns `PomError::Parse` on malformed XML and `PomError::Malformed` on
/// invariant violations no retry can fix (e.g. a parent without a version).
pub fn parse_pom_xml(content: &str) -> Result<Pom> {
    let project = read_element_tree(content)?;

    let parent = match project.child("parent") {
        Some(parent_el) => Some(parse_parent(parent_el)?),
        None => None,
    };

    let artifact_id = project.child_text("artifactId").ok_or_else(|| {
        PomError::malformed("POM is missing an artifactId")
    })?;

    let mut pom = Pom {
        parent,
        group_id: project.child_text("groupId"),
        artifact_id,
        version: project.child_text("version"),
        packaging: project.child_text("packaging"),
        name: project.child_text("name"),
        properties: parse_properties(&project),
        dependencies: parse_dependency_list(project.child("dependencies")),
        dependency_management: parse_dependency_management(&project),
        repositories: parse_repositories(&project),
        licenses: parse_licenses(&project),
        profiles: Vec::new(),
        plugins: parse_build_plugins(&project, "plugins"),
        plugin_management: parse_build_plugins(&project, "pluginManagement"),
        repository: None,
    };

    if let Some(profiles_el) = project.child("profiles") {
        for profile_el in profiles_el.children_named("profile") {
            pom.profiles.push(parse_profile(profile_el));
        }
    }

    Ok(pom)
}

fn parse_parent(parent_el: &XmlElement) -> Result<Parent> {
    let group_id = parent_el
        .child_text("groupId")
        .ok_or_else(|| PomError::malformed("parent declared without a groupId"))?;
    let artifact_id = parent_el
        .child_text("artifactId")
        .ok_or_else(|| PomError::malformed("parent declared without an artifactId"))?;
    let version = parent_el
        .child_text("version")
        .ok_or_else(|| PomError::malformed("parent declared without a version"))?;
    Ok(Parent {
        gav: Gav::new(group_id, artifact_id, version),
        relative_path: parent_el.child_text("relativePath"),
    })
}

fn parse_properties(el: &XmlElement) -> HashMap<String, String> {
    let mut properties = HashMap::new();
    if let Some(props_el) = el.child("properties") {
        for prop in &props_el.children {
            let value = prop.text.trim();
            if !value.is_empty() {
                properties.insert(prop.name.clone(), value.to_string());
            }
        }
    }
    properties
}

fn parse_dependency_list(deps_el: Option<&XmlElement>) -> Vec<Dependency> {
    let Some(deps_el) = deps_el else {
        return Vec::new();
    };
    deps_el
        .children_named("dependency")
        .filter_map(parse_dependency)
        .collect()
}

fn parse_dependency(dep_el: &XmlElement) -> Option<Dependency> {
    let group_id = dep_el.child_text("groupId")?;
    let artifact_id = dep_el.child_text("artifactId")?;

    let mut exclusions = Vec::new();
    if let Some(exclusions_el) = dep_el.child("exclusions") {
        for exclusion_el in exclusions_el.children_named("exclusion") {
            exclusions.push(GroupArtifact::new(
                exclusion_el.child_text("groupId").unwrap_or_default(),
                exclusion_el.child_text("artifactId").unwrap_or_default(),
            ));
        }
    }

    Some(Dependency {
        group_id,
        artifact_id,
        version: dep_el.child_text("version"),
        classifier: dep_el.child_text("classifier"),
        type_: dep_el.child_text("type"),
        scope: dep_el.child_text("scope"),
        optional: dep_el
            .child_text("optional")
            .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        exclusions,
    })
}

fn parse_dependency_management(el: &XmlElement) -> Vec<ManagedDependency> {
    let Some(deps_el) = el
        .child("dependencyManagement")
        .and_then(|dm| dm.child("dependencies"))
    else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for dep_el in deps_el.children_named("dependency") {
        let Some(dep) = parse_dependency(dep_el) else {
            continue;
        };
        let is_import = dep.scope.as_deref() == Some("import")
            && dep.type_.as_deref().unwrap_or("jar") == "pom";
        if is_import {
            match &dep.version {
                Some(version) => entries.push(ManagedDependency::Imported(Gav::new(
                    dep.group_id,
                    dep.artifact_id,
                    version.clone(),
                ))),
                None => {
                    tracing::warn!(
                        "skipping BOM import {}:{} without a version",
                        dep.group_id,
                        dep.artifact_id
                    );
                }
            }
        } else {
            entries.push(ManagedDependency::Defined(dep));
        }
    }
    entries
}

fn parse_repositories(el: &XmlElement) -> Vec<Repository> {
    let Some(repos_el) = el.child("repositories") else {
        return Vec::new();
    };
    repos_el
        .children_named("repository")
        .filter_map(|repo_el| {
            let url = repo_el.child_text("url")?;
            Some(Repository {
                id: repo_el.child_text("id"),
                url,
                releases: repo_el
                    .child("releases")
                    .and_then(|r| r.child_text("enabled"))
                    .map(|v| v.eq_ignore_ascii_case("true")),
                snapshots: repo_el
                    .child("snapshots")
                    .and_then(|s| s.child_text("enabled"))
                    .map(|v| v.eq_ignore_ascii_case("true")),
            })
        })
        .collect()
}

fn parse_licenses(el: &XmlElement) -> Vec<License> {
    let Some(licenses_el) = el.child("licenses") else {
        return Vec::new();
    };
    licenses_el
        .children_named("license")
        .filter_map(|license_el| {
            Some(License {
                name: license_el.child_text("name")?,
                url: license_el.child_text("url"),
            })
        })
        .collect()
}

/// Plugins under `<build>`, either directly (`plugins`) or via
/// `<pluginManagement>`.
fn parse_build_plugins(el: &XmlElement, section: &str) -> Vec<Plugin> {
    let Some(build_el) = el.child("build") else {
        return Vec::new();
    };
    let plugins_el = if section == "pluginManagement" {
        build_el
            .child("pluginManagement")
            .and_then(|pm| pm.child("plugins"))
    } else {
        build_el.child("plugins")
    };
    let Some(plugins_el) = plugins_el else {
        return Vec::new();
    };
    plugins_el
        .children_named("plugin")
        .filter_map(parse_plugin)
        .collect()
}

fn parse_plugin(plugin_el: &XmlElement) -> Option<Plugin> {
    let artifact_id = plugin_el.child_text("artifactId")?;
    let mut executions = Vec::new();
    if let Some(executions_el) = plugin_el.child("executions") {
        for execution_el in executions_el.children_named("execution") {
            let mut goals = Vec::new();
            if let Some(goals_el) = execution_el.child("goals") {
                for goal_el in goals_el.children_named("goal") {
                    let goal = goal_el.text.trim();
                    if !goal.is_empty() {
                        goals.push(goal.to_string());
                    }
                }
            }
            executions.push(PluginExecution {
                id: execution_el
                    .child_text("id")
                    .unwrap_or_else(|| "default".into()),
                phase: execution_el.child_text("phase"),
                goals,
                inherited: execution_el
                    .child_text("inherited")
                    .map(|v| v.eq_ignore_ascii_case("true")),
                configuration: execution_el.child("configuration").map(configuration_value),
            });
        }
    }

    Some(Plugin {
        group_id: plugin_el
            .child_text("groupId")
            .unwrap_or_else(|| DEFAULT_PLUGIN_GROUP_ID.into()),
        artifact_id,
        version: plugin_el.child_text("version"),
        extensions: plugin_el
            .child_text("extensions")
            .map(|v| v.eq_ignore_ascii_case("true")),
        inherited: plugin_el
            .child_text("inherited")
            .map(|v| v.eq_ignore_ascii_case("true")),
        configuration: plugin_el.child("configuration").map(configuration_value),
        dependencies: parse_dependency_list(plugin_el.child("dependencies")),
        executions,
    })
}

fn parse_profile(profile_el: &XmlElement) -> Profile {
    Profile {
        id: profile_el.child_text("id"),
        activation: profile_el.child("activation").map(|activation_el| {
            ProfileActivation {
                active_by_default: activation_el
                    .child_text("activeByDefault")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            }
        }),
        properties: parse_properties(profile_el),
        dependencies: parse_dependency_list(profile_el.child("dependencies")),
        dependency_management: parse_dependency_management(profile_el),
        repositories: parse_repositories(profile_el),
        plugins: parse_build_plugins(profile_el, "plugins"),
        plugin_management: parse_build_plugins(profile_el, "pluginManagement"),
    }
}

/// Maps a configuration element onto a JSON-like tagged tree.
///
/// Leaf elements become strings, repeated sibling names become arrays, and
/// XML attributes (notably `combine.children` / `combine.self`) become
/// `@`-prefixed keys so the merge pass can consult them.
fn configuration_value(el: &XmlElement) -> serde_json::Value {
    if el.children.is_empty() && el.attributes.is_empty() {
        return serde_json::Value::String(el.text.trim().to_string());
    }

    let mut map = serde_json::Map::new();
    for (key, value) in &el.attributes {
        map.insert(format!("@{key}"), serde_json::Value::String(value.clone()));
    }
    for child in &el.children {
        let value = configuration_value(child);
        match map.get_mut(&child.name) {
            Some(serde_json::Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = serde_json::Value::Array(vec![first, value]);
            }
            None => {
                map.insert(child.name.clone(), value);
            }
        }
    }
    let text = el.text.trim();
    if !text.is_empty() {
        map.insert("#text".into(), serde_json::Value::String(text.to_string()));
    }
    serde_json::Value::Object(map)
}
