//! Slash-separated telemetry paths.
//!
//! List keys may carry slashes (`interface[name=Ethernet1/1]`), so splitting
//! only happens outside of `[...]` selectors.

pub const ROOT_PATH: &str = "/";

/// Splits a path into its elements, ignoring separators inside key selectors.
#[must_use]
pub fn split(path: &str) -> Vec<&str> {
    let mut elements = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;

    for (idx, ch) in path.char_indices() {
        match ch {
            '[' => depth = depth.saturating_add(1),
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                if let Some(element) = path.get(start..idx).filter(|e| !e.is_empty()) {
                    elements.push(element);
                }
                start = idx + 1;
            }
            _ => {}
        }
    }

    if let Some(element) = path.get(start..).filter(|e| !e.is_empty()) {
        elements.push(element);
    }

    elements
}

/// Appends one element to a base path. The root path joins without doubling
/// the separator.
#[must_use]
pub fn join(base: &str, element: &str) -> String {
    let base = base.trim_end_matches('/');
    format!("{base}/{element}")
}

/// Whether `path` is `ancestor` itself or lives underneath it.
#[must_use]
pub fn is_within(ancestor: &str, path: &str) -> bool {
    let ancestor = ancestor.trim_end_matches('/');
    if ancestor.is_empty() {
        return true;
    }

    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
