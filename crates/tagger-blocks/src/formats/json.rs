//! CloudFormation JSON templates
//!
//! Tags live in an array under `Properties`:
//!
//! ```json
//! "MyBucket": {
//!   "Type": "AWS::S3::Bucket",
//!   "Properties": {
//!     "Tags": [
//!       { "Key": "MyTag", "Value": "TagValue" }
//!     ]
//!   }
//! }
//! ```
//!
//! The declaration text is scanned structurally (string-aware bracket
//! matching), so arrays and objects may be laid out on one line or many.
//! Untouched array items are copied verbatim; the separators the array
//! already uses are reused for new items.

use serde_json::Value;
use std::ops::Range;
use std::path::Path;

use super::{ResourceDecl, TemplateFormat, spaces};
use crate::block::Block;
use crate::error::{Error, Result};
use crate::mapper::{LineStyle, RESOURCES_START_TOKEN, indent_of};
use crate::tag::Tag;

/// JSON template dialect
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormat;

impl JsonFormat {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json", "template"]
    }

    fn line_style(&self) -> LineStyle {
        LineStyle::Json
    }

    fn looks_like(&self, content: &str) -> bool {
        content.trim_start().starts_with('{')
    }

    fn parse_resources(&self, path: &Path, content: &str) -> Result<Option<Vec<ResourceDecl>>> {
        let document: Value =
            serde_json::from_str(content).map_err(|e| Error::parse(path, e.to_string()))?;
        let Some(resources) = document.get(RESOURCES_START_TOKEN) else {
            return Ok(None);
        };
        let resources = match resources {
            Value::Null => return Ok(Some(Vec::new())),
            Value::Object(map) => map,
            _ => return Err(Error::parse(path, "Resources is not an object")),
        };

        let decls = resources
            .iter()
            .map(|(id, body)| {
                let properties = body.get("Properties");
                ResourceDecl {
                    id: id.clone(),
                    resource_type: body.get("Type").map(json_text),
                    tags: properties.map(tags_of).unwrap_or_default(),
                    taggable: properties.is_some_and(Value::is_object),
                }
            })
            .collect();
        Ok(Some(decls))
    }

    fn rewrite_block(&self, lines: &[&str], block: &Block) -> Result<Vec<String>> {
        let fail = |message: &str| Error::rewrite(block.resource_id(), message);

        let text = lines.join("\n");
        let bytes = text.as_bytes();
        let header = lines.first().ok_or_else(|| fail("empty declaration"))?;
        let header_indent = indent_of(header);
        let unit = lines
            .iter()
            .skip(1)
            .find(|line| !line.trim().is_empty())
            .map(|line| indent_of(line).saturating_sub(header_indent))
            .filter(|unit| *unit > 0)
            .unwrap_or(2);

        let key_end = string_end(bytes, header_indent).ok_or_else(|| fail("no resource key"))?;
        let colon = skip_ws(bytes, key_end + 1);
        let open = skip_ws(bytes, colon + 1);
        if bytes.get(colon) != Some(&b':') || bytes.get(open) != Some(&b'{') {
            return Err(fail("resource is not an object"));
        }
        let close = matching_close(bytes, open).ok_or_else(|| fail("unbalanced resource object"))?;

        let props_open = find_member(bytes, open, close, "Properties")
            .map(|member| member.value)
            .filter(|value| bytes.get(*value) == Some(&b'{'))
            .ok_or_else(|| fail("no Properties object"))?;
        let props_close =
            matching_close(bytes, props_open).ok_or_else(|| fail("unbalanced Properties"))?;

        let new_text = match find_member(bytes, props_open, props_close, "Tags") {
            Some(member) if bytes.get(member.value) == Some(&b'[') => {
                let tags_close = matching_close(bytes, member.value)
                    .ok_or_else(|| fail("unbalanced Tags array"))?;
                let tags_indent = indent_of(line_at(&text, member.key));
                rewrite_array(&text, member.value, tags_close, tags_indent, unit, block)
            }
            Some(_) => return Err(fail("Tags is not an array")),
            None => insert_tags(&text, props_open, props_close, unit, block),
        };

        Ok(new_text.split('\n').map(str::to_string).collect())
    }
}

/// Textual form of a value, used for tag keys and values.
pub(crate) fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn tags_of(properties: &Value) -> Vec<Tag> {
    let Some(items) = properties.get("Tags").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let key = item.get("Key")?;
            let value = item.get("Value").map(json_text).unwrap_or_default();
            Some(Tag::new(json_text(key), value))
        })
        .collect()
}

fn json_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// How `{Key, Value}` objects are laid out inside an array.
#[derive(Debug, Clone, Copy)]
enum ItemStyle {
    /// `{"Key": "k", "Value": "v"}`, with `padded` adding spaces inside braces.
    Inline { padded: bool },
    /// One member per line, members at `indent + unit`, brace at `indent`.
    Multiline { indent: usize, unit: usize },
}

impl ItemStyle {
    fn render(&self, key: &str, value: &str) -> String {
        match *self {
            Self::Inline { padded } => {
                let pad = if padded { " " } else { "" };
                format!(
                    "{{{pad}\"Key\": {}, \"Value\": {}{pad}}}",
                    json_string(key),
                    json_string(value)
                )
            }
            Self::Multiline { indent, unit } => format!(
                "{{\n{inner}\"Key\": {},\n{inner}\"Value\": {}\n{outer}}}",
                json_string(key),
                json_string(value),
                inner = spaces(indent + unit),
                outer = spaces(indent),
            ),
        }
    }
}

/// Rewrite the `[..]` at `open..=close`, keeping untouched items verbatim.
fn rewrite_array(
    text: &str,
    open: usize,
    close: usize,
    tags_indent: usize,
    unit: usize,
    block: &Block,
) -> String {
    let bytes = text.as_bytes();
    let items = split_items(bytes, open, close);

    let (lead, sep, trail, style) = match (items.first(), items.last()) {
        (Some(first), Some(last)) => {
            let lead = &text[open + 1..first.start];
            let trail = &text[last.end..close];
            let multiline = text[open..close].contains('\n');
            let column = first.start - line_start(text, first.start);
            let sep = match items.get(1) {
                Some(second) => text[first.end..second.start].to_string(),
                None if multiline => format!(",\n{}", spaces(column)),
                None => ", ".to_string(),
            };
            let first_text = &text[first.clone()];
            let style = match first_text.split('\n').nth(1) {
                Some(member) => ItemStyle::Multiline {
                    indent: column,
                    unit: indent_of(member).saturating_sub(column).max(1),
                },
                None => ItemStyle::Inline {
                    padded: first_text.starts_with("{ "),
                },
            };
            (lead.to_string(), sep, trail.to_string(), style)
        }
        _ => {
            let column = tags_indent + unit;
            (
                format!("\n{}", spaces(column)),
                format!(",\n{}", spaces(column)),
                format!("\n{}", spaces(tags_indent)),
                ItemStyle::Multiline {
                    indent: column,
                    unit,
                },
            )
        }
    };

    let mut rendered: Vec<String> = items
        .iter()
        .map(|range| {
            let item = &text[range.clone()];
            serde_json::from_str::<Value>(item)
                .ok()
                .and_then(|value| value.get("Key").map(json_text))
                .and_then(|key| block.changed_value(&key).map(|value| style.render(&key, value)))
                .unwrap_or_else(|| item.to_string())
        })
        .collect();
    rendered.extend(
        block
            .added_tags()
            .into_iter()
            .map(|tag| style.render(&tag.key, &tag.value)),
    );

    format!(
        "{}{}{}{}{}",
        &text[..=open],
        lead,
        rendered.join(&sep),
        trail,
        &text[close..]
    )
}

/// Add a `"Tags"` member to the Properties object at `open..=close`.
fn insert_tags(text: &str, open: usize, close: usize, unit: usize, block: &Block) -> String {
    let added = block.added_tags();
    let inner = &text[open + 1..close];
    let last_content = inner.trim_end().len();
    let has_members = !inner.trim().is_empty();

    if !inner.contains('\n') {
        let style = ItemStyle::Inline { padded: false };
        let items: Vec<String> = added
            .iter()
            .map(|tag| style.render(&tag.key, &tag.value))
            .collect();
        let member = format!("\"Tags\": [{}]", items.join(", "));
        let insert_at = open + 1 + last_content;
        let joiner = if has_members { ", " } else { "" };
        return format!("{}{joiner}{member}{}", &text[..insert_at], &text[insert_at..]);
    }

    let prop_indent = if has_members {
        let first_member = open + 1 + (inner.len() - inner.trim_start().len());
        first_member - line_start(text, first_member)
    } else {
        indent_of(line_at(text, open)) + unit
    };
    let column = prop_indent + unit;
    let style = ItemStyle::Multiline {
        indent: column,
        unit,
    };
    let items: Vec<String> = added
        .iter()
        .map(|tag| format!("{}{}", spaces(column), style.render(&tag.key, &tag.value)))
        .collect();
    let member = format!(
        "\n{indent}\"Tags\": [\n{}\n{indent}]",
        items.join(",\n"),
        indent = spaces(prop_indent)
    );
    let insert_at = open + 1 + last_content;
    let comma = if has_members { "," } else { "" };
    format!("{}{comma}{member}{}", &text[..insert_at], &text[insert_at..])
}

struct Member {
    key: usize,
    value: usize,
}

/// Locate the direct member `name` of the object at `open..=close`.
fn find_member(bytes: &[u8], open: usize, close: usize, name: &str) -> Option<Member> {
    let mut depth = 0usize;
    let mut idx = open + 1;
    while idx < close {
        match bytes[idx] {
            b'"' => {
                let end = string_end(bytes, idx)?;
                if depth == 0 {
                    let colon = skip_ws(bytes, end + 1);
                    if bytes.get(colon) == Some(&b':') && &bytes[idx + 1..end] == name.as_bytes() {
                        return Some(Member {
                            key: idx,
                            value: skip_ws(bytes, colon + 1),
                        });
                    }
                }
                idx = end;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.checked_sub(1)?,
            _ => {}
        }
        idx += 1;
    }
    None
}

/// Index of the quote closing the string that starts at `start`.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start) != Some(&b'"') {
        return None;
    }
    let mut escaped = false;
    for (idx, b) in bytes.iter().enumerate().skip(start + 1) {
        if escaped {
            escaped = false;
        } else if *b == b'\\' {
            escaped = true;
        } else if *b == b'"' {
            return Some(idx);
        }
    }
    None
}

/// Index of the bracket closing the one at `open`.
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut idx = open;
    while idx < bytes.len() {
        match bytes[idx] {
            b'"' => idx = string_end(bytes, idx)?,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
        idx += 1;
    }
    None
}

/// Trimmed byte ranges of the top-level items of the array at `open..=close`.
fn split_items(bytes: &[u8], open: usize, close: usize) -> Vec<Range<usize>> {
    let mut raw = Vec::new();
    let mut depth = 0usize;
    let mut start = open + 1;
    let mut idx = open + 1;
    while idx < close {
        match bytes[idx] {
            b'"' => idx = string_end(bytes, idx).unwrap_or(close),
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                raw.push(start..idx);
                start = idx + 1;
            }
            _ => {}
        }
        idx += 1;
    }
    raw.push(start..close);

    raw.into_iter()
        .filter_map(|range| {
            let segment = &bytes[range.clone()];
            let lead = segment.iter().position(|b| !b.is_ascii_whitespace())?;
            let tail = segment.iter().rposition(|b| !b.is_ascii_whitespace())?;
            Some(range.start + lead..range.start + tail + 1)
        })
        .collect()
}

fn skip_ws(bytes: &[u8], from: usize) -> usize {
    bytes
        .iter()
        .skip(from)
        .position(|b| !b.is_ascii_whitespace())
        .map_or(bytes.len(), |offset| from + offset)
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |idx| idx + 1)
}

fn line_at(text: &str, pos: usize) -> &str {
    let start = line_start(text, pos);
    let end = text[pos..].find('\n').map_or(text.len(), |idx| pos + idx);
    &text[start..end]
}
