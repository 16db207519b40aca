//! Placeholder substitution engine.
//!
//! Replaces every `{{ dotted.path }}` in a string with the value found by
//! walking the payload one segment at a time. Paths are not declared up
//! front; whatever the payload contains can be referenced.

use std::borrow::Cow;

use serde_json::Value;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Substitute all placeholders in `template` against `payload`.
///
/// Every closed `{{ ... }}` is replaced: by the resolved value, or by an
/// empty string when the path is malformed or resolves to nothing. An
/// unclosed `{{` is left as written.
pub fn substitute_placeholders(template: &str, payload: &Value) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(placeholder) = next_placeholder(rest) {
        output.push_str(placeholder.before);
        if is_placeholder_path(placeholder.inner) {
            output.push_str(&resolve_path(payload, placeholder.inner).unwrap_or_default());
        }
        rest = placeholder.after;
    }

    output.push_str(rest);
    output
}

/// A closed placeholder found by [`next_placeholder`]
struct Placeholder<'a> {
    /// Text preceding the placeholder, stray braces included
    before: &'a str,
    /// Trimmed text between the braces
    inner: &'a str,
    after: &'a str,
}

/// Find the next closed placeholder.
///
/// A placeholder opens at the last `{{` before its `}}`, so a stray `{{`
/// earlier in the text stays plain text. A `}}` with no `{{` before it is
/// skipped.
fn next_placeholder(text: &str) -> Option<Placeholder<'_>> {
    let mut from = 0;

    loop {
        let close = from + text[from..].find(CLOSE)?;
        if let Some(open) = text[from..close].rfind(OPEN) {
            let open = from + open;
            return Some(Placeholder {
                before: &text[..open],
                inner: text[open + OPEN.len()..close].trim(),
                after: &text[close + CLOSE.len()..],
            });
        }
        from = close + CLOSE.len();
    }
}

/// Resolve a dotted path against the payload and stringify the leaf.
///
/// Returns `None` when a segment is missing, when an intermediate value is
/// neither an object nor an array, or when the leaf is `null`.
pub fn resolve_path<'a>(payload: &'a Value, path: &str) -> Option<Cow<'a, str>> {
    let leaf = path
        .split('.')
        .try_fold(payload, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })?;

    match leaf {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        // Objects and arrays render as their JSON text
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// Dotted paths of non-empty `[A-Za-z0-9_-]` segments
fn is_placeholder_path(inner: &str) -> bool {
    !inner.is_empty()
        && inner.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

/// List the distinct placeholder paths used in a template, in order of first use
pub fn placeholder_paths(template: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(placeholder) = next_placeholder(rest) {
        let inner = placeholder.inner;
        if is_placeholder_path(inner) && !paths.iter().any(|p| p == inner) {
            paths.push(inner.to_string());
        }
        rest = placeholder.after;
    }

    paths
}
