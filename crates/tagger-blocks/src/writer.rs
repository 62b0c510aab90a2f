//! Tag region write-back.
//!
//! Only blocks whose merged tags differ from their existing tags are touched,
//! and within those only the lines the dialect reports as changed. Every other
//! byte of the source, line endings included, is copied through.

use std::path::Path;

use crate::block::Block;
use crate::error::{Error, Result};
use crate::formats::{self, TemplateFormat};
use crate::parser::{BOM, strip_bom};

/// A source line split from its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceLine {
    text: String,
    eol: String,
}

fn split_lines(content: &str) -> Vec<SourceLine> {
    content
        .split_inclusive('\n')
        .map(|raw| {
            let text = raw
                .strip_suffix("\r\n")
                .or_else(|| raw.strip_suffix('\n'))
                .unwrap_or(raw);
            SourceLine {
                text: text.to_string(),
                eol: raw[text.len()..].to_string(),
            }
        })
        .collect()
}

/// Rewrite the tag regions of changed blocks in `content`.
///
/// A leading byte order mark is kept.
pub fn rewrite(content: &str, blocks: &[Block], format: &dyn TemplateFormat) -> Result<String> {
    let mut changed: Vec<&Block> = blocks.iter().filter(|b| b.has_tag_changes()).collect();
    if changed.is_empty() {
        return Ok(content.to_string());
    }
    let bom = content.starts_with(BOM);
    let content = strip_bom(content);
    // Bottom-up, so splicing a block never shifts the spans still to come.
    changed.sort_by_key(|block| std::cmp::Reverse(block.lines().start));

    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines = split_lines(content);
    let final_eol_missing = lines.last().is_some_and(|line| line.eol.is_empty());

    for block in changed {
        let span = block.lines();
        if span.end > lines.len() {
            return Err(Error::rewrite(
                block.resource_id(),
                format!("span {span} is past the end of the file"),
            ));
        }
        let original: Vec<&str> = lines[span.indices()].iter().map(|l| l.text.as_str()).collect();
        let updated = format.rewrite_block(&original, block)?;

        // Trim the common prefix and suffix so untouched lines keep their bytes.
        let prefix = original
            .iter()
            .zip(&updated)
            .take_while(|(old, new)| **old == new.as_str())
            .count();
        let suffix = original[prefix..]
            .iter()
            .rev()
            .zip(updated[prefix..].iter().rev())
            .take_while(|(old, new)| **old == new.as_str())
            .count();
        let start = span.start - 1 + prefix;
        let end = span.end - suffix;
        let replacement: Vec<SourceLine> = updated[prefix..updated.len() - suffix]
            .iter()
            .map(|text| SourceLine {
                text: text.clone(),
                eol: newline.to_string(),
            })
            .collect();
        tracing::debug!(
            resource = block.resource_id(),
            removed = end.saturating_sub(start),
            inserted = replacement.len(),
            "Rewrote tag region"
        );
        lines.splice(start..end.max(start), replacement);
    }

    let count = lines.len();
    for (idx, line) in lines.iter_mut().enumerate() {
        if idx + 1 == count && final_eol_missing {
            line.eol.clear();
        } else if line.eol.is_empty() {
            line.eol = newline.to_string();
        }
    }
    let mut out = if bom { BOM.to_string() } else { String::new() };
    out.extend(lines.into_iter().map(|line| line.text + &line.eol));
    Ok(out)
}

/// Rewrite `source` with the tags of `blocks` merged in and write the result
/// to `destination`, which may be `source` itself.
///
/// The destination is replaced atomically; on error it is left as it was.
pub fn write_file(source: impl AsRef<Path>, blocks: &[Block], destination: impl AsRef<Path>) -> Result<()> {
    let source = source.as_ref();
    let destination = destination.as_ref();
    let content = tagger_fs::read_text(source)?;
    let builtin = formats::builtin_formats();
    let format = formats::detect(&builtin, source, strip_bom(&content)).ok_or_else(|| {
        Error::UnsupportedFormat {
            path: source.to_path_buf(),
        }
    })?;

    let updated = rewrite(&content, blocks, format)?;
    tagger_fs::write_text(destination, &updated)?;
    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        changed = blocks.iter().filter(|b| b.has_tag_changes()).count(),
        "Wrote template"
    );
    Ok(())
}
