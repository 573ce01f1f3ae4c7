//! Semantic path helpers
//!
//! Semantic paths are slash-delimited, rooted identifiers namespaced by role:
//! `/input/keyboard/key/32`, `/action/jump`, `/filter/min-max`.
//!
//! Listener patterns are either an exact path or a path whose final segment
//! is `*`, which matches exactly one segment: `/action/menu/*` matches
//! `/action/menu/open` but neither `/action/menu` nor `/action/menu/open/now`.

/// Root of every input path
pub const INPUT_ROOT: &str = "/input";
/// Root of every action path
pub const ACTION_ROOT: &str = "/action";
/// Root of every filter path
pub const FILTER_ROOT: &str = "/filter";

/// Single-segment wildcard suffix for listener patterns
const WILDCARD_SUFFIX: &str = "/*";

/// Join a root and a name into a path, tolerating stray slashes on either side.
#[must_use]
pub fn join(root: &str, name: &str) -> String {
    format!(
        "{}/{}",
        root.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}

/// Whether a listener `pattern` matches `action_path`.
#[must_use]
pub fn pattern_matches(pattern: &str, action_path: &str) -> bool {
    if pattern == action_path {
        return true;
    }
    let Some(parent) = pattern.strip_suffix(WILDCARD_SUFFIX) else {
        return false;
    };
    action_path
        .strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|segment| !segment.is_empty() && !segment.contains('/'))
}

/// The sibling `target` path built from the first two segments of `input_path`.
///
/// `/input/mouse/button/0` becomes `/input/mouse/target`. Paths with fewer
/// than two segments have no target.
#[must_use]
pub fn target_path(input_path: &str) -> Option<String> {
    let mut segments = input_path.strip_prefix('/')?.split('/');
    let first = segments.next().filter(|s| !s.is_empty())?;
    let second = segments.next().filter(|s| !s.is_empty())?;
    Some(format!("/{first}/{second}/target"))
}
