//! Per-file resource extraction.
//!
//! [`TemplateParser`] reads a template, picks its dialect, extracts the
//! resource declarations and maps each one to its line span. It also keeps an
//! index of the resources-section span of every file it parsed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::block::Block;
use crate::error::{Error, Result};
use crate::formats::{self, TemplateFormat};
use crate::lines::Lines;
use crate::mapper::{find_resources_section, map_resource_lines};

/// Options applied by [`TemplateParser::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Extensions to accept (without the dot). Empty accepts every extension
    /// a built-in dialect claims.
    pub extensions: Vec<String>,
}

/// Parses templates into [`Block`]s.
pub struct TemplateParser {
    root: Option<PathBuf>,
    formats: Vec<&'static dyn TemplateFormat>,
    extensions: Vec<String>,
    file_resource_lines: HashMap<PathBuf, Lines>,
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateParser")
            .field("root", &self.root)
            .field(
                "formats",
                &self.formats.iter().map(|fmt| fmt.name()).collect::<Vec<_>>(),
            )
            .field("extensions", &self.extensions)
            .field("files", &self.file_resource_lines.len())
            .finish()
    }
}

impl TemplateParser {
    /// Create a parser with the built-in YAML and JSON dialects.
    pub fn new() -> Self {
        Self {
            root: None,
            formats: formats::builtin_formats(),
            extensions: Vec::new(),
            file_resource_lines: HashMap::new(),
        }
    }

    /// Configure the parser for a root directory.
    pub fn init(&mut self, root: impl AsRef<Path>, options: ParserOptions) -> Result<()> {
        let root = tagger_fs::canonicalize(root)?;
        tracing::debug!(root = %root.display(), extensions = ?options.extensions, "Parser initialised");
        self.root = Some(root);
        self.extensions = options
            .extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        Ok(())
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Whether `path` has an extension this parser accepts.
    pub fn supports(&self, path: impl AsRef<Path>) -> bool {
        let Some(extension) = tagger_fs::extension(path) else {
            return false;
        };
        if !self.extensions.is_empty() && !self.extensions.contains(&extension) {
            return false;
        }
        self.formats
            .iter()
            .any(|format| format.extensions().contains(&extension.as_str()))
    }

    /// Parse a template into one block per resource, in document order.
    ///
    /// A file whose resources section is empty yields no blocks.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<Block>> {
        let path = path.as_ref();
        if !self.supports(path) {
            return Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
        let content = tagger_fs::read_text(path)?;
        let content = strip_bom(&content);
        let format = formats::detect(&self.formats, path, content).ok_or_else(|| {
            Error::UnsupportedFormat {
                path: path.to_path_buf(),
            }
        })?;

        let (blocks, section) = match parse_content(format, path, content) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.file_resource_lines.remove(path);
                return Err(e);
            }
        };
        match section {
            Some(lines) => {
                self.file_resource_lines.insert(path.to_path_buf(), lines);
            }
            None => {
                self.file_resource_lines.remove(path);
            }
        }
        tracing::debug!(
            path = %path.display(),
            format = format.name(),
            resources = blocks.len(),
            "Parsed template"
        );
        Ok(blocks)
    }

    /// Resources-section span of a parsed file, keyed as passed to `parse_file`.
    pub fn resource_lines(&self, path: impl AsRef<Path>) -> Option<Lines> {
        self.file_resource_lines.get(path.as_ref()).copied()
    }

    pub fn file_resource_lines(&self) -> &HashMap<PathBuf, Lines> {
        &self.file_resource_lines
    }
}

/// Byte order mark some editors put at the start of a file.
pub(crate) const BOM: char = '\u{feff}';

/// `content` without a leading byte order mark.
pub(crate) fn strip_bom(content: &str) -> &str {
    content.strip_prefix(BOM).unwrap_or(content)
}

/// Extract blocks from template text, plus the span covering all of them.
pub fn parse_content(
    format: &dyn TemplateFormat,
    path: &Path,
    content: &str,
) -> Result<(Vec<Block>, Option<Lines>)> {
    let content = strip_bom(content);
    let decls = format
        .parse_resources(path, content)?
        .ok_or_else(|| Error::ResourcesNotFound {
            path: path.to_path_buf(),
        })?;
    if decls.is_empty() {
        return Ok((Vec::new(), None));
    }

    let section = find_resources_section(content, format.start_token(), format.line_style())
        .and_then(|section| section.body)
        .ok_or_else(|| Error::parse(path, "resources section has no declarations"))?;

    let ids: Vec<&str> = decls.iter().map(|decl| decl.id.as_str()).collect();
    let spans = map_resource_lines(content, &ids, format.start_token(), format.line_style());

    let mut blocks = decls
        .into_iter()
        .map(|decl| {
            let lines = spans.get(&decl.id).copied().ok_or_else(|| {
                Error::parse(path, format!("no line span found for resource {}", decl.id))
            })?;
            if !section.contains_span(&lines) {
                return Err(Error::parse(
                    path,
                    format!("resource {} spans {lines}, outside of {section}", decl.id),
                ));
            }
            Ok(Block::new(decl.id, lines, decl.tags)
                .with_resource_type(decl.resource_type)
                .with_taggable(decl.taggable))
        })
        .collect::<Result<Vec<_>>>()?;
    blocks.sort_by_key(|block| block.lines().start);

    let span = match (blocks.first(), blocks.last()) {
        (Some(first), Some(last)) => Some(Lines::new(first.lines().start, last.lines().end)),
        _ => None,
    };
    Ok((blocks, span))
}
