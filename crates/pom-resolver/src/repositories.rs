//! Repository list merging.

use pom_core::types::Repository;

/// Appends `incoming` repositories to `current`, resolving `${}` in id/url
/// through `resolve` and skipping entries whose non-empty id is already
/// present. First-seen order is preserved, so the closest descendant's
/// repositories keep priority position.
pub fn merge_repositories<F>(current: &mut Vec<Repository>, incoming: &[Repository], resolve: F)
where
    F: Fn(&str) -> String,
{
    for repository in incoming {
        let id = repository.id.as_deref().map(&resolve);
        let url = resolve(&repository.url);

        if let Some(id) = id.as_deref().filter(|id| !id.is_empty())
            && current
                .iter()
                .any(|existing| existing.id.as_deref() == Some(id))
        {
            tracing::debug!("skipping repository '{id}': id already merged");
            continue;
        }

        current.push(Repository {
            id,
            url,
            releases: repository.releases,
            snapshots: repository.snapshots,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_props(raw: &str) -> String {
        raw.to_string()
    }

    #[test]
    fn test_merge_appends_in_order() {
        let mut current = vec![Repository::new("central", "https://repo1.maven.org/maven2")];
        merge_repositories(
            &mut current,
            &[Repository::new("internal", "https://repo.example.com")],
            no_props,
        );
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].id.as_deref(), Some("central"));
        assert_eq!(current[1].id.as_deref(), Some("internal"));
    }

    #[test]
    fn test_merge_dedupes_by_id() {
        let mut current = vec![Repository::new("central", "https://repo1.maven.org/maven2")];
        merge_repositories(
            &mut current,
            &[Repository::new("central", "https://mirror.example.com")],
            no_props,
        );
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].url, "https://repo1.maven.org/maven2");
    }

    #[test]
    fn test_merge_keeps_idless_repositories() {
        let mut current = Vec::new();
        let incoming = [
            Repository {
                id: None,
                url: "https://a.example.com".into(),
                releases: None,
                snapshots: None,
            },
            Repository {
                id: None,
                url: "https://b.example.com".into(),
                releases: None,
                snapshots: None,
            },
        ];
        merge_repositories(&mut current, &incoming, no_props);
        assert_eq!(current.len(), 2);
    }

    #[test]
    fn test_merge_resolves_placeholders() {
        let mut current = Vec::new();
        merge_repositories(
            &mut current,
            &[Repository::new("internal", "${repo.base}/maven2")],
            |raw| raw.replace("${repo.base}", "https://repo.example.com"),
        );
        assert_eq!(current[0].url, "https://repo.example.com/maven2");
    }
}
