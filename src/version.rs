//! Version label normalization.
//!
//! Charts label versions inconsistently (`v1.2.3`, `version-10`, `1.2.3`).
//! A leading `v` or `version-` directly followed by a digit is stripped.
use regex::Regex;
use std::sync::OnceLock;

const VERSION_PREFIX: &str = r"^(?:version-|v)([0-9])";

fn version_prefix() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(VERSION_PREFIX))
        .as_ref()
        .ok()
}

/// Strip a recognised version prefix, keeping the leading digit.
///
/// Inputs without a recognised prefix are returned unchanged.
pub fn normalize_version(raw: &str) -> String {
    let Some(re) = version_prefix() else {
        tracing::warn!(pattern = VERSION_PREFIX, "version pattern unavailable");
        return raw.to_string();
    };
    re.replace(raw, "${1}").into_owned()
}
