//! Plugin and plugin-management merging across the ancestry chain.
//!
//! Plugins are keyed by `groupId:artifactId`. When a child redeclares a
//! plugin its own values win, except configuration trees which merge
//! recursively honoring the `combine.children` and `combine.self`
//! attributes carried as `@combine.children` / `@combine.self` keys.

use pom_core::types::{Plugin, PluginExecution};
use serde_json::Value;

/// Merges `incoming` plugins into `current`.
///
/// Entries already present keep their own values and absorb what they lack.
/// When `inheriting` (the incoming declarations come from an ancestor),
/// entries marked `inherited=false` are skipped; a POM's own declarations
/// always merge.
pub fn merge_plugins(current: &mut Vec<Plugin>, incoming: &[Plugin], inheriting: bool) {
    for inc in incoming {
        if inheriting && !inc.inherited.unwrap_or(true) {
            tracing::debug!(plugin = %inc.artifact_id, "skipping non-inherited plugin");
            continue;
        }
        let key = inc.group_artifact();
        if let Some(existing) = current.iter_mut().find(|p| p.group_artifact() == key) {
            merge_plugin(existing, inc);
        } else {
            current.push(inc.clone());
        }
    }
}

/// Fills declared plugins with defaults from pluginManagement entries
/// sharing the same key. Declarations keep their own values.
pub fn apply_plugin_management(plugins: &mut [Plugin], management: &[Plugin]) {
    for plugin in plugins.iter_mut() {
        if let Some(managed) = management
            .iter()
            .find(|m| m.group_artifact() == plugin.group_artifact())
        {
            merge_plugin(plugin, managed);
        }
    }
}

fn merge_plugin(existing: &mut Plugin, incoming: &Plugin) {
    if existing.version.is_none() {
        existing.version = incoming.version.clone();
    }
    if existing.extensions.is_none() {
        existing.extensions = incoming.extensions;
    }
    if existing.inherited.is_none() {
        existing.inherited = incoming.inherited;
    }
    existing.configuration = match (existing.configuration.take(), &incoming.configuration) {
        (Some(own), Some(inherited)) => Some(merge_configurations(&own, inherited)),
        (Some(own), None) => Some(own),
        (None, inherited) => inherited.clone(),
    };
    for dep in &incoming.dependencies {
        let present = existing
            .dependencies
            .iter()
            .any(|d| d.group_id == dep.group_id && d.artifact_id == dep.artifact_id);
        if !present {
            existing.dependencies.push(dep.clone());
        }
    }
    merge_executions(&mut existing.executions, &incoming.executions);
}

fn merge_executions(current: &mut Vec<PluginExecution>, incoming: &[PluginExecution]) {
    for inc in incoming {
        if let Some(existing) = current.iter_mut().find(|e| e.id == inc.id) {
            if let Some(phase) = &inc.phase {
                if existing.phase.as_ref() != Some(phase) {
                    existing.phase = Some(phase.clone());
                }
            }
            if existing.inherited.is_none() {
                existing.inherited = inc.inherited;
            }
            for goal in &inc.goals {
                if !existing.goals.contains(goal) {
                    existing.goals.push(goal.clone());
                }
            }
            existing.configuration =
                match (existing.configuration.take(), &inc.configuration) {
                    (Some(own), Some(inherited)) => Some(merge_configurations(&own, inherited)),
                    (Some(own), None) => Some(own),
                    (None, inherited) => inherited.clone(),
                };
        } else {
            current.push(inc.clone());
        }
    }
}

/// Merges a dominant (child) configuration tree over a recessive (parent) one.
///
/// Default is recursive: objects merge key by key with the dominant side
/// winning on leaf conflicts. `@combine.self="override"` on the dominant
/// node discards the recessive node entirely, and
/// `@combine.children="append"` concatenates child lists instead of
/// merging them positionally.
pub fn merge_configurations(dominant: &Value, recessive: &Value) -> Value {
    match (dominant, recessive) {
        (Value::Object(dom), Value::Object(rec)) => {
            if dom.get("@combine.self").and_then(Value::as_str) == Some("override") {
                return dominant.clone();
            }
            let append = dom.get("@combine.children").and_then(Value::as_str) == Some("append");
            let mut merged = rec.clone();
            for (key, dom_value) in dom {
                match merged.get(key) {
                    Some(rec_value) if append => {
                        let combined = append_values(rec_value, dom_value);
                        merged.insert(key.clone(), combined);
                    }
                    Some(rec_value) => {
                        let rec_value = rec_value.clone();
                        merged.insert(key.clone(), merge_configurations(dom_value, &rec_value));
                    }
                    None => {
                        merged.insert(key.clone(), dom_value.clone());
                    }
                }
            }
            Value::Object(merged)
        }
        (Value::Array(dom), Value::Array(rec)) => {
            // Positional merge, dominant entries win where both sides have one.
            let mut merged = Vec::with_capacity(dom.len().max(rec.len()));
            for i in 0..dom.len().max(rec.len()) {
                match (dom.get(i), rec.get(i)) {
                    (Some(d), Some(r)) => merged.push(merge_configurations(d, r)),
                    (Some(d), None) => merged.push(d.clone()),
                    (None, Some(r)) => merged.push(r.clone()),
                    (None, None) => {}
                }
            }
            Value::Array(merged)
        }
        // Dominant leaf wins over anything recessive.
        _ => dominant.clone(),
    }
}

fn append_values(recessive: &Value, dominant: &Value) -> Value {
    let mut items = match recessive {
        Value::Array(values) => values.clone(),
        other => vec![other.clone()],
    };
    match dominant {
        Value::Array(values) => items.extend(values.iter().cloned()),
        other => items.push(other.clone()),
    }
    Value::Array(items)
}
