//! Template dialects
//!
//! Each dialect implements [`TemplateFormat`]: it extracts resource
//! declarations and their existing tags from a document, and rewrites the tag
//! region of a single declaration given that declaration's source lines.

pub mod json;
pub mod yaml;

use std::path::Path;

use crate::block::Block;
use crate::error::Result;
use crate::mapper::{LineStyle, RESOURCES_START_TOKEN};
use crate::tag::Tag;

/// A resource declaration as found in the parsed document, before line mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDecl {
    pub id: String,
    pub resource_type: Option<String>,
    pub tags: Vec<Tag>,
    /// The declaration has a `Properties` mapping to hold tags.
    pub taggable: bool,
}

/// Handler for one template dialect.
pub trait TemplateFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower-case file extensions this dialect claims.
    fn extensions(&self) -> &'static [&'static str];

    fn line_style(&self) -> LineStyle;

    fn start_token(&self) -> &'static str {
        RESOURCES_START_TOKEN
    }

    /// Content sniffing for extensions claimed by several dialects.
    fn looks_like(&self, _content: &str) -> bool {
        true
    }

    /// Resource declarations in document order.
    ///
    /// `Ok(None)` when the document has no resources section.
    fn parse_resources(&self, path: &Path, content: &str) -> Result<Option<Vec<ResourceDecl>>>;

    /// New source lines for a declaration whose merged tags differ from its
    /// existing ones. Only the tag region may differ from `lines`.
    fn rewrite_block(&self, lines: &[&str], block: &Block) -> Result<Vec<String>>;
}

/// Dialects shipped with the crate, in sniffing order.
pub fn builtin_formats() -> Vec<&'static dyn TemplateFormat> {
    let formats: [&'static dyn TemplateFormat; 2] = [&json::JsonFormat, &yaml::YamlFormat];
    formats.to_vec()
}

/// Pick the dialect for a file from its extension, sniffing the content when
/// several dialects claim the extension.
pub fn detect<'a>(
    formats: &[&'a dyn TemplateFormat],
    path: &Path,
    content: &str,
) -> Option<&'a dyn TemplateFormat> {
    let extension = tagger_fs::extension(path)?;
    let candidates: Vec<&'a dyn TemplateFormat> = formats
        .iter()
        .copied()
        .filter(|f| f.extensions().contains(&extension.as_str()))
        .collect();
    match candidates.as_slice() {
        [] => None,
        [only] => Some(*only),
        many => many.iter().copied().find(|f| f.looks_like(content)),
    }
}

pub(crate) fn spaces(width: usize) -> String {
    " ".repeat(width)
}

pub use json::JsonFormat;
pub use yaml::YamlFormat;
