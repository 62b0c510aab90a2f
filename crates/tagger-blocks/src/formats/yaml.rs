//! CloudFormation YAML templates
//!
//! Tags live in a block sequence under `Properties`:
//!
//! ```yaml
//! Resources:
//!   NewVolume:
//!     Type: AWS::EC2::Volume
//!     Properties:
//!       Tags:
//!         - Key: MyTag
//!           Value: TagValue
//! ```
//!
//! Indentless sequences (`- Key` directly under `Tags:`) and one-line flow
//! sequences (`Tags: [{Key: a, Value: b}]`) are understood too.
//! Rewriting keeps untouched sequence items byte-for-byte, re-renders items
//! whose value changed, and appends new items in the layout of the first
//! existing item.

use serde_yaml::Value;
use std::ops::Range;
use std::path::Path;

use super::{ResourceDecl, TemplateFormat, spaces};
use crate::block::Block;
use crate::error::{Error, Result};
use crate::mapper::{LineStyle, RESOURCES_START_TOKEN, indent_of};
use crate::tag::Tag;

const STYLE: LineStyle = LineStyle::Yaml;

/// YAML template dialect
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlFormat;

impl YamlFormat {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateFormat for YamlFormat {
    fn name(&self) -> &'static str {
        "YAML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml", "template"]
    }

    fn line_style(&self) -> LineStyle {
        STYLE
    }

    fn parse_resources(&self, path: &Path, content: &str) -> Result<Option<Vec<ResourceDecl>>> {
        let document: Value =
            serde_yaml::from_str(content).map_err(|e| Error::parse(path, e.to_string()))?;
        let Some(resources) = document.get(RESOURCES_START_TOKEN) else {
            return Ok(None);
        };
        let resources = match resources {
            Value::Null => return Ok(Some(Vec::new())),
            Value::Mapping(mapping) => mapping,
            _ => return Err(Error::parse(path, "Resources is not a mapping")),
        };

        let decls = resources
            .iter()
            .map(|(id, body)| {
                let properties = body.get("Properties");
                ResourceDecl {
                    id: yaml_text(id),
                    resource_type: body.get("Type").map(yaml_text),
                    tags: properties.map(tags_of).unwrap_or_default(),
                    taggable: matches!(properties, Some(Value::Mapping(_))),
                }
            })
            .collect();
        Ok(Some(decls))
    }

    fn rewrite_block(&self, lines: &[&str], block: &Block) -> Result<Vec<String>> {
        let fail = |message: &str| Error::rewrite(block.resource_id(), message);

        let header = lines.first().ok_or_else(|| fail("empty declaration"))?;
        let header_indent = indent_of(header);
        let child_indent = lines
            .iter()
            .skip(1)
            .find(|line| !STYLE.is_filler(line))
            .map(|line| indent_of(line))
            .filter(|indent| *indent > header_indent)
            .ok_or_else(|| fail("declaration has no body"))?;
        let unit = child_indent - header_indent;
        let props = find_key(lines, 1..lines.len(), child_indent, "Properties")
            .ok_or_else(|| fail("no Properties mapping"))?;

        let mut out: Vec<String> = lines.iter().map(|line| line.to_string()).collect();

        match inline_value(lines[props]) {
            "" => {}
            "{}" => {
                let prop_indent = child_indent + unit;
                out[props] = format!("{}Properties:", spaces(child_indent));
                let mut section = vec![format!("{}Tags:", spaces(prop_indent))];
                section.extend(render_added(block, ItemLayout::fresh(prop_indent + unit)));
                out.splice(props + 1..props + 1, section);
                return Ok(out);
            }
            _ => return Err(fail("inline Properties mappings are not supported")),
        }

        let props_end = scope_end(lines, props, child_indent, false);
        let prop_indent = if props_end > props {
            first_content_indent(lines, props + 1).unwrap_or(child_indent + unit)
        } else {
            child_indent + unit
        };

        let Some(tags) = find_key(lines, props + 1..props_end + 1, prop_indent, "Tags") else {
            let mut section = vec![format!("{}Tags:", spaces(prop_indent))];
            section.extend(render_added(block, ItemLayout::fresh(prop_indent + unit)));
            out.splice(props_end + 1..props_end + 1, section);
            return Ok(out);
        };

        match inline_value(lines[tags]) {
            "" => {}
            "[]" => {
                out[tags] = format!("{}Tags:", spaces(prop_indent));
                out.splice(
                    tags + 1..tags + 1,
                    render_added(block, ItemLayout::fresh(prop_indent + unit)),
                );
                return Ok(out);
            }
            flow if flow.starts_with('[') => {
                out[tags] = rewrite_flow_tags(lines[tags], block)
                    .ok_or_else(|| fail("multi-line flow-style Tags are not supported"))?;
                return Ok(out);
            }
            _ => return Err(fail("Tags is not a sequence")),
        }

        let tags_end = scope_end(lines, tags, prop_indent, true);
        let items = sequence_items(lines, tags + 1, tags_end);
        let Some(first_item) = items.first() else {
            out.splice(
                tags + 1..tags + 1,
                render_added(block, ItemLayout::fresh(prop_indent + unit)),
            );
            return Ok(out);
        };
        let layout = ItemLayout::detect(&lines[first_item.clone()]);

        let mut rendered = Vec::new();
        for range in &items {
            let item = &lines[range.clone()];
            let changed = item_key(item, layout.dash)
                .and_then(|key| block.changed_value(&key).map(|value| layout.render(&key, value)));
            match changed {
                Some(replacement) => rendered.extend(replacement),
                None => rendered.extend(item.iter().map(|line| line.to_string())),
            }
        }
        rendered.extend(render_added(block, layout));
        out.splice(first_item.start..tags_end + 1, rendered);
        Ok(out)
    }
}

/// Textual form of a scalar, used for tag keys and values.
pub(crate) fn yaml_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, yaml_text(&tagged.value)),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn tags_of(properties: &Value) -> Vec<Tag> {
    let Some(items) = properties.get("Tags").and_then(Value::as_sequence) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let key = item.get("Key")?;
            let value = item.get("Value").map(yaml_text).unwrap_or_default();
            Some(Tag::new(yaml_text(key), value))
        })
        .collect()
}

/// Render a scalar, quoting only when YAML needs it.
fn yaml_scalar(value: &str) -> String {
    match serde_yaml::to_string(value) {
        Ok(rendered) if !rendered.trim_end().contains('\n') => rendered.trim_end().to_string(),
        // Multi-line strings would become block scalars; a JSON string is valid YAML.
        _ => serde_json::Value::String(value.to_string()).to_string(),
    }
}

fn find_key(lines: &[&str], range: Range<usize>, indent: usize, key: &str) -> Option<usize> {
    let end = range.end.min(lines.len());
    (range.start..end).find(|&idx| {
        let line = lines[idx];
        !STYLE.is_filler(line) && indent_of(line) == indent && STYLE.key_of(line).as_deref() == Some(key)
    })
}

fn first_content_indent(lines: &[&str], from: usize) -> Option<usize> {
    lines
        .iter()
        .skip(from)
        .find(|line| !STYLE.is_filler(line))
        .map(|line| indent_of(line))
}

/// Last content line nested under the key on line `from`. Sequence items at
/// the key's own indentation count as nested when `indentless_items` is set.
fn scope_end(lines: &[&str], from: usize, parent_indent: usize, indentless_items: bool) -> usize {
    let mut end = from;
    for (idx, line) in lines.iter().enumerate().skip(from + 1) {
        if STYLE.is_filler(line) {
            continue;
        }
        let indent = indent_of(line);
        let nested = indent > parent_indent
            || (indentless_items && indent == parent_indent && is_item_start(line));
        if !nested {
            break;
        }
        end = idx;
    }
    end
}

fn is_item_start(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed == "-" || trimmed.starts_with("- ")
}

/// Line ranges of the sequence items between `from` and `to` (inclusive).
fn sequence_items(lines: &[&str], from: usize, to: usize) -> Vec<Range<usize>> {
    if to < from {
        return Vec::new();
    }
    let Some(dash) = (from..=to)
        .find(|&idx| is_item_start(lines[idx]))
        .map(|idx| indent_of(lines[idx]))
    else {
        return Vec::new();
    };
    let starts: Vec<usize> = (from..=to)
        .filter(|&idx| is_item_start(lines[idx]) && indent_of(lines[idx]) == dash)
        .collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, start)| *start..starts.get(i + 1).copied().unwrap_or(to + 1))
        .collect()
}

/// The `Key` of a `{Key, Value}` sequence item.
fn item_key(item: &[&str], dash: usize) -> Option<String> {
    let text = item
        .iter()
        .map(|line| {
            if indent_of(line) >= dash {
                &line[dash..]
            } else {
                line.trim_start()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    let value: Value = serde_yaml::from_str(&text).ok()?;
    value.as_sequence()?.first()?.get("Key").map(yaml_text)
}

/// Value after `key:` on a line, without a trailing comment.
fn inline_value(line: &str) -> &str {
    let trimmed = line.trim_start();
    let key_end = match trimmed.chars().next() {
        Some(quote @ ('"' | '\'')) => trimmed[1..].find(quote).map_or(0, |i| i + 2),
        _ => 0,
    };
    let Some(colon) = trimmed[key_end..].find(':').map(|i| key_end + i) else {
        return "";
    };
    let value = trimmed[colon + 1..].trim();
    if value.starts_with('#') {
        return "";
    }
    value.split(" #").next().unwrap_or_default().trim()
}

/// Columns of the dash and the mapping keys of a `- Key: ..` item.
#[derive(Debug, Clone, Copy)]
struct ItemLayout {
    dash: usize,
    key: usize,
}

impl ItemLayout {
    fn fresh(dash: usize) -> Self {
        Self { dash, key: dash + 2 }
    }

    fn detect(item: &[&str]) -> Self {
        let first = item[0];
        let dash = indent_of(first);
        let after_dash = &first.trim_start()[1..];
        let key = if after_dash.trim().is_empty() {
            item.iter()
                .skip(1)
                .find(|line| !STYLE.is_filler(line))
                .map(|line| indent_of(line))
                .unwrap_or(dash + 2)
        } else {
            dash + 1 + (after_dash.len() - after_dash.trim_start().len())
        };
        Self {
            dash,
            key: key.max(dash + 2),
        }
    }

    fn render(&self, key: &str, value: &str) -> Vec<String> {
        vec![
            format!(
                "{}-{}Key: {}",
                spaces(self.dash),
                spaces(self.key - self.dash - 1),
                yaml_scalar(key)
            ),
            format!("{}Value: {}", spaces(self.key), yaml_scalar(value)),
        ]
    }
}

/// Like [`yaml_scalar`], but quoted when flow indicators would end it early.
fn flow_scalar(value: &str) -> String {
    let rendered = yaml_scalar(value);
    if !rendered.starts_with(['\'', '"']) && rendered.contains([',', '[', ']', '{', '}']) {
        return serde_json::Value::String(value.to_string()).to_string();
    }
    rendered
}

fn flow_item(key: &str, value: &str) -> String {
    format!("{{Key: {}, Value: {}}}", flow_scalar(key), flow_scalar(value))
}

/// Whether a quote at `idx` opens a quoted scalar rather than sitting inside
/// a plain one.
fn opens_quote(bytes: &[u8], idx: usize) -> bool {
    bytes[..idx]
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
        .is_none_or(|b| matches!(b, b'[' | b'{' | b',' | b':'))
}

/// Top-level item ranges of the flow sequence opening at `open`, and the
/// position of its closing bracket. `None` when it does not close on `line`.
fn flow_items(line: &str, open: usize) -> Option<(Vec<Range<usize>>, usize)> {
    let bytes = line.as_bytes();
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut item_start = open + 1;
    let mut idx = open + 1;
    while idx < bytes.len() {
        let b = bytes[idx];
        match quote {
            Some(b'\'') if b == b'\'' && bytes.get(idx + 1) == Some(&b'\'') => idx += 1,
            Some(b'"') if b == b'\\' => idx += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' if opens_quote(bytes, idx) => quote = Some(b),
                b'[' | b'{' => depth += 1,
                b']' | b'}' if depth > 0 => depth -= 1,
                b']' => {
                    push_item(&mut items, line, item_start..idx);
                    return Some((items, idx));
                }
                b',' if depth == 0 => {
                    push_item(&mut items, line, item_start..idx);
                    item_start = idx + 1;
                }
                _ => {}
            },
        }
        idx += 1;
    }
    None
}

/// Record the item in `range`, trimmed; empty items are ignored.
fn push_item(items: &mut Vec<Range<usize>>, line: &str, range: Range<usize>) {
    let text = &line[range.clone()];
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        let from = range.start + (text.len() - text.trim_start().len());
        items.push(from..from + trimmed.len());
    }
}

/// Rewrite a `Tags: [..]` line, keeping untouched items verbatim.
fn rewrite_flow_tags(line: &str, block: &Block) -> Option<String> {
    let open = line.find('[')?;
    let (items, close) = flow_items(line, open)?;

    let (lead, sep, trail) = match (items.first(), items.last()) {
        (Some(first), Some(last)) => {
            let sep = match items.get(1) {
                Some(second) => &line[first.end..second.start],
                None => ", ",
            };
            (&line[open + 1..first.start], sep, &line[last.end..close])
        }
        _ => ("", ", ", ""),
    };

    let mut rendered: Vec<String> = items
        .iter()
        .map(|range| {
            let item = &line[range.clone()];
            serde_yaml::from_str::<Value>(item)
                .ok()
                .and_then(|value| value.get("Key").map(yaml_text))
                .and_then(|key| block.changed_value(&key).map(|value| flow_item(&key, value)))
                .unwrap_or_else(|| item.to_string())
        })
        .collect();
    rendered.extend(
        block
            .added_tags()
            .into_iter()
            .map(|tag| flow_item(&tag.key, &tag.value)),
    );

    Some(format!(
        "{}{lead}{}{trail}{}",
        &line[..=open],
        rendered.join(sep),
        &line[close..]
    ))
}

fn render_added(block: &Block, layout: ItemLayout) -> Vec<String> {
    block
        .added_tags()
        .into_iter()
        .flat_map(|tag| layout.render(&tag.key, &tag.value))
        .collect()
}
