//! `${...}` placeholder substitution.
//!
//! Substitution is single-pass per occurrence: a substituted value is not
//! re-expanded, but merge routines re-invoke resolution as new properties
//! surface while walking the ancestry. Unknown placeholders are left in
//! place rather than erroring; the walker later records them as per-node
//! failures when they survive into a coordinate.

use pom_core::types::Pom;

/// Replaces every `${key}` occurrence in `raw` using `lookup`, leaving
/// unmatched occurrences verbatim.
pub fn substitute<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                // unterminated placeholder, keep as-is
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Well-known reflective keys, resolved from the requested POM itself.
///
/// These take precedence over the generic properties map: `project.*`,
/// `pom.*`, bare coordinate names, and `parent.*`.
pub fn reflective_value(key: &str, requested: &Pom) -> Option<String> {
    let normalized = key
        .strip_prefix("project.")
        .or_else(|| key.strip_prefix("pom."))
        .unwrap_or(key);

    match normalized {
        "groupId" => requested.group_id().map(str::to_string),
        "artifactId" => Some(requested.artifact_id.clone()),
        "version" => requested.version().map(str::to_string),
        "packaging" => requested.packaging.clone(),
        _ => {
            let parent_key = normalized.strip_prefix("parent.")?;
            let parent = requested.parent.as_ref()?;
            match parent_key {
                "groupId" => Some(parent.gav.group_id.clone()),
                "artifactId" => Some(parent.gav.artifact_id.clone()),
                "version" => Some(parent.gav.version.clone()),
                _ => None,
            }
        }
    }
}
