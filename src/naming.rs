//! Canonical component name resolution.
//!
//! A workload is the primary component of its instance when its `name` label
//! is the instance itself or an instance-prefixed variant (`<instance>-...`).
//! Any other name is a sub-component suffix and gets qualified by the
//! instance.

/// Derive the canonical component name for an `instance`/`name` label pair.
///
/// `instance` is matched literally; `name` is never interpreted as a pattern.
pub fn resolve_component_name(instance: &str, name: &str) -> String {
    if is_instance_qualified(instance, name) {
        return name.to_string();
    }
    format!("{instance}-{name}")
}

/// `name` is `instance` itself or `instance` followed by a `-` suffix.
fn is_instance_qualified(instance: &str, name: &str) -> bool {
    name.strip_prefix(instance)
        .is_some_and(|suffix| suffix.is_empty() || suffix.starts_with('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_bare_sub_component_names() {
        assert_eq!(resolve_component_name("app", "worker"), "app-worker");
        assert_eq!(resolve_component_name("app", "other"), "app-other");
    }

    #[test]
    fn keeps_names_already_prefixed_by_instance() {
        assert_eq!(resolve_component_name("app", "app"), "app");
        assert_eq!(resolve_component_name("app", "app-worker"), "app-worker");
        assert_eq!(resolve_component_name("app", "app-"), "app-");
    }

    #[test]
    fn prefix_must_end_at_a_dash_boundary() {
        assert_eq!(resolve_component_name("app", "apple"), "app-apple");
        assert_eq!(resolve_component_name("app", "my-app"), "app-my-app");
    }

    #[test]
    fn resolution_is_idempotent_once_canonical() {
        let once = resolve_component_name("app", "worker");
        assert_eq!(resolve_component_name("app", &once), once);
    }

    #[test]
    fn instance_metacharacters_are_literal() {
        assert_eq!(resolve_component_name("a.p", "axp"), "a.p-axp");
        assert_eq!(resolve_component_name("a.p", "a.p-db"), "a.p-db");
        assert_eq!(resolve_component_name("(app", "(app"), "(app");
        assert_eq!(resolve_component_name("app+", "appp"), "app+-appp");
    }

    #[test]
    fn name_metacharacters_are_not_compiled() {
        assert_eq!(resolve_component_name("app", ".*"), "app-.*");
        assert_eq!(resolve_component_name("app", "app-[x"), "app-[x");
    }

    #[test]
    fn empty_instance_accepts_dash_prefixed_or_empty_names() {
        assert_eq!(resolve_component_name("", ""), "");
        assert_eq!(resolve_component_name("", "-db"), "-db");
        assert_eq!(resolve_component_name("", "db"), "-db");
    }

    #[test]
    fn literal_prefix_handles_non_ascii_instances() {
        assert_eq!(resolve_component_name("café", "café-api"), "café-api");
        assert_eq!(resolve_component_name("café", "cafébar"), "café-cafébar");
    }

    #[test]
    fn multiline_suffix_still_matches_anchored_prefix() {
        assert_eq!(resolve_component_name("app", "app-a\nb"), "app-a\nb");
    }
}
