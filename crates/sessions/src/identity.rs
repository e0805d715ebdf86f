//! User identity normalization.
//!
//! Front-ends tag user ids with a platform prefix, and not always
//! consistently. Stripping any known prefix and re-applying the canonical one
//! keeps one person from being split across two sessions.

use crate::error::{Error, Result};

/// Known front-end prefixes, stripped before re-tagging.
const PLATFORM_PREFIXES: &[&str] = &["slack_", "discord_", "web_"];

/// Platform assumed when an id carries no recognizable prefix.
pub const DEFAULT_PLATFORM: &str = "slack";

/// Normalize a raw user id to `<platform>_<id>` with the default platform.
pub fn normalize_user_id(user_id: &str) -> Result<String> {
    normalize_for_platform(user_id, DEFAULT_PLATFORM)
}

/// Normalize a raw user id to `<platform>_<id>`.
///
/// Any known platform prefix already present is stripped first, so
/// `slack_U123` and `U123` normalize identically.
pub fn normalize_for_platform(user_id: &str, platform: &str) -> Result<String> {
    if user_id.is_empty() {
        return Err(Error::EmptyUserId);
    }

    let bare = PLATFORM_PREFIXES
        .iter()
        .find_map(|prefix| user_id.strip_prefix(prefix))
        .unwrap_or(user_id);

    Ok(format!("{platform}_{bare}"))
}

/// Extract the platform tag from a normalized id.
#[must_use]
pub fn platform_of(user_id: &str) -> &str {
    user_id.split_once('_').map_or(DEFAULT_PLATFORM, |(p, _)| p)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn bare_ids_gain_the_default_prefix() {
        assert_eq!(normalize_user_id("U123").unwrap(), "slack_U123");
    }

    #[test]
    fn existing_prefixes_are_canonicalized() {
        // The same person must never map to two different sessions.
        assert_eq!(normalize_user_id("slack_U123").unwrap(), "slack_U123");
        assert_eq!(normalize_user_id("web_U123").unwrap(), "slack_U123");
        assert_eq!(
            normalize_for_platform("slack_U123", "web").unwrap(),
            "web_U123"
        );
    }

    #[test]
    fn empty_ids_are_rejected() {
        assert!(matches!(normalize_user_id(""), Err(Error::EmptyUserId)));
    }

    #[test]
    fn platform_extraction() {
        assert_eq!(platform_of("slack_U123"), "slack");
        assert_eq!(platform_of("discord_42"), "discord");
        assert_eq!(platform_of("noprefix"), "slack");
    }
}
