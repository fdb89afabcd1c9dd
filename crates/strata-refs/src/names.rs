//! Ref name validation and qualification.
//!
//! A full ref name is either `HEAD` or `refs/<namespace>/<path>` where the
//! path follows git-style rules:
//! - no whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - no `..` and no `@{`
//! - no empty components and no component starting with `.`
//! - must not end with `.lock` or `/`

use crate::error::{RefError, Result};
use crate::types::{HEAD, HEADS_PREFIX, REMOTES_PREFIX, TAGS_PREFIX};

const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a full ref name.
///
/// ```
/// use strata_refs::validate_ref_name;
///
/// assert!(validate_ref_name("HEAD").is_ok());
/// assert!(validate_ref_name("refs/heads/feature/roads").is_ok());
/// assert!(validate_ref_name("main").is_err());
/// assert!(validate_ref_name("refs/heads/bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> Result<()> {
    if name == HEAD {
        return Ok(());
    }
    let Some(path) = name.strip_prefix("refs/") else {
        return Err(invalid(name, "must be HEAD or start with 'refs/'"));
    };
    if path.is_empty() {
        return Err(invalid(name, "empty ref path"));
    }
    if let Some(ch) = FORBIDDEN_CHARS.iter().find(|c| name.contains(**c)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }
    for component in path.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }
    Ok(())
}

/// Full name for a possibly-short spec: `HEAD` and `refs/...` are kept,
/// anything else is taken as a branch name.
pub fn qualify(spec: &str) -> String {
    if spec == HEAD || spec.starts_with("refs/") {
        spec.to_string()
    } else {
        format!("{HEADS_PREFIX}{spec}")
    }
}

/// Names tried, in order, when resolving a short spec.
pub fn search_candidates(spec: &str) -> Vec<String> {
    vec![
        spec.to_string(),
        format!("refs/{spec}"),
        format!("{HEADS_PREFIX}{spec}"),
        format!("{TAGS_PREFIX}{spec}"),
        format!("{REMOTES_PREFIX}{spec}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_ref_name("refs/heads/main").is_ok());
        assert!(validate_ref_name("refs/tags/v1.0").is_ok());
        assert!(validate_ref_name("refs/remotes/origin/main").is_ok());
    }

    #[test]
    fn rejects_unqualified_and_empty() {
        assert!(validate_ref_name("").is_err());
        assert!(validate_ref_name("main").is_err());
        assert!(validate_ref_name("refs/").is_err());
        assert!(validate_ref_name("refs/heads//x").is_err());
        assert!(validate_ref_name("refs/heads/x/").is_err());
    }

    #[test]
    fn rejects_forbidden_sequences() {
        for bad in [
            "refs/heads/a b",
            "refs/heads/a~b",
            "refs/heads/a:b",
            "refs/heads/a..b",
            "refs/heads/a@{1}",
            "refs/heads/.hidden",
            "refs/heads/x.lock",
        ] {
            assert!(validate_ref_name(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn qualify_short_names_as_branches() {
        assert_eq!(qualify("main"), "refs/heads/main");
        assert_eq!(qualify("refs/tags/v1"), "refs/tags/v1");
        assert_eq!(qualify("HEAD"), "HEAD");
    }

    #[test]
    fn search_order_prefers_exact_then_heads() {
        let c = search_candidates("main");
        assert_eq!(c[0], "main");
        assert_eq!(c[2], "refs/heads/main");
        assert_eq!(c[3], "refs/tags/main");
    }
}
