//! Resource line span mapping.
//!
//! Works on raw text rather than a parsed tree: a resource starts on the line
//! where its identifier appears at the resource-key indentation directly under
//! the start token, and ends one line before the next resource starts. Deeper
//! lines (properties, lists, block scalars, nested JSON objects) never start a
//! resource, so nested structure inside a declaration is never mistaken for a
//! boundary.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use crate::lines::Lines;

/// Key that introduces the resources section of a template.
pub const RESOURCES_START_TOKEN: &str = "Resources";

/// How keys and filler lines look in a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// `Key: value`, with `#` comments.
    Yaml,
    /// `"Key": value`.
    Json,
}

impl LineStyle {
    /// The mapping key declared on this line, if any. JSON escapes are
    /// decoded.
    pub fn key_of(self, line: &str) -> Option<Cow<'_, str>> {
        let trimmed = line.trim_start();
        match self {
            Self::Yaml => yaml_key(trimmed).map(Cow::Borrowed),
            Self::Json => json_key(trimmed),
        }
    }

    /// Blank lines, and comment-only lines in YAML.
    pub fn is_filler(self, line: &str) -> bool {
        let trimmed = line.trim();
        match self {
            Self::Yaml => trimmed.is_empty() || trimmed.starts_with('#'),
            Self::Json => trimmed.is_empty(),
        }
    }
}

/// Width of the leading whitespace of a line.
pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn yaml_key(trimmed: &str) -> Option<&str> {
    if trimmed.starts_with(['-', '#']) {
        return None;
    }
    if let Some(quote) = trimmed.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let rest = &trimmed[1..];
        let close = rest.find(quote)?;
        let after = rest[close + 1..].trim_start();
        return after.starts_with(':').then(|| &rest[..close]);
    }
    let bytes = trimmed.as_bytes();
    bytes.iter().enumerate().find_map(|(i, b)| {
        let ends_key = *b == b':' && matches!(bytes.get(i + 1), None | Some(b' ' | b'\t'));
        ends_key.then(|| trimmed[..i].trim_end())
    })
}

fn json_key(trimmed: &str) -> Option<Cow<'_, str>> {
    let rest = trimmed.strip_prefix('"')?;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => {
                if !rest[i + 1..].trim_start().starts_with(':') {
                    return None;
                }
                let raw = &rest[..i];
                if !raw.contains('\\') {
                    return Some(Cow::Borrowed(raw));
                }
                return serde_json::from_str::<String>(&trimmed[..i + 2])
                    .ok()
                    .map(Cow::Owned);
            }
            _ => {}
        }
    }
    None
}

/// Location of the resources section in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcesSection {
    /// Line holding the start token.
    pub token_line: usize,
    /// Non-filler content after the token, trailing filler excluded.
    /// `None` when the section is empty.
    pub body: Option<Lines>,
    /// Indentation of resource identifiers.
    pub key_indent: Option<usize>,
}

/// Find the resources section introduced by `start_token`.
///
/// When the token occurs more than once, the least indented occurrence wins.
pub fn find_resources_section(
    content: &str,
    start_token: &str,
    style: LineStyle,
) -> Option<ResourcesSection> {
    let lines: Vec<&str> = content.lines().collect();
    find_section(&lines, start_token, style)
}

fn find_section(lines: &[&str], start_token: &str, style: LineStyle) -> Option<ResourcesSection> {
    let (token_idx, token_indent) = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| {
            !style.is_filler(line) && style.key_of(line).as_deref() == Some(start_token)
        })
        .map(|(idx, line)| (idx, indent_of(line)))
        .min_by_key(|(idx, indent)| (*indent, *idx))?;

    let mut first = None;
    let mut last = None;
    let mut key_indent = None;
    for (idx, line) in lines.iter().enumerate().skip(token_idx + 1) {
        if style.is_filler(line) {
            continue;
        }
        let indent = indent_of(line);
        if indent <= token_indent {
            break;
        }
        key_indent.get_or_insert(indent);
        first.get_or_insert(idx);
        last = Some(idx);
    }

    Some(ResourcesSection {
        token_line: token_idx + 1,
        body: first.zip(last).map(|(f, l)| Lines::new(f + 1, l + 1)),
        key_indent,
    })
}

/// Map each known resource identifier to its line span.
///
/// Identifiers that do not appear at the resource-key indentation are absent
/// from the result, as is everything when the start token is missing.
pub fn map_resource_lines<S: AsRef<str>>(
    content: &str,
    resource_ids: &[S],
    start_token: &str,
    style: LineStyle,
) -> HashMap<String, Lines> {
    let lines: Vec<&str> = content.lines().collect();
    let Some(section) = find_section(&lines, start_token, style) else {
        return HashMap::new();
    };
    let (Some(body), Some(key_indent)) = (section.body, section.key_indent) else {
        return HashMap::new();
    };

    let wanted: HashSet<&str> = resource_ids.iter().map(|id| id.as_ref()).collect();
    let mut starts: Vec<(usize, Cow<'_, str>)> = Vec::new();
    for idx in body.indices() {
        let line = lines[idx];
        if indent_of(line) != key_indent || style.is_filler(line) {
            continue;
        }
        let Some(key) = style.key_of(line) else {
            continue;
        };
        if wanted.contains(key.as_ref()) && !starts.iter().any(|(_, seen)| *seen == key) {
            starts.push((idx + 1, key));
        }
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, (start, key))| {
            let end = starts
                .get(i + 1)
                .map(|(next, _)| next - 1)
                .unwrap_or(body.end);
            (key.to_string(), Lines::new(*start, end))
        })
        .collect()
}
