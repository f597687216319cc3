use regex::Regex;
use std::env;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{(\w+)\}|\$(\w+)")
            .unwrap_or_else(|e| panic!("invalid placeholder regex: {e}"))
    })
}

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
pub fn substitute_env_vars(content: &str) -> String {
    substitute_with(content, |name| env::var(name).ok())
}

/// Substitute placeholders using an arbitrary lookup.
///
/// Unresolved placeholders are left in place.
pub fn substitute_with<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();

    let result = placeholder_regex().replace_all(content, |caps: &regex::Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();

        match lookup(name) {
            Some(value) => {
                debug!(var = name, "Substituting environment variable");
                value
            }
            None => {
                missing.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if !missing.is_empty() {
        warn!(?missing, "Environment variables referenced in config are not set");
    }

    result.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_substitute_both_forms() {
        let vars: HashMap<&str, &str> = [("HOST", "cache"), ("PORT", "6380")].into();
        let out = substitute_with("redis://${HOST}:$PORT", |k| {
            vars.get(k).map(|v| v.to_string())
        });
        assert_eq!(out, "redis://cache:6380");
    }

    #[test]
    fn test_missing_placeholder_kept() {
        let out = substitute_with("url: ${NOPE}", |_| None);
        assert_eq!(out, "url: ${NOPE}");
    }
}
