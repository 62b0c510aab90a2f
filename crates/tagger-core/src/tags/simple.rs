//! Fixed key/value tags

use tagger_blocks::Tag;

use super::{TagContext, TagError, TagProvider};

/// Provider that returns the same pair for every block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTag {
    key: String,
    value: String,
}

impl StaticTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse a `KEY=VALUE` pair. The value may itself contain `=`.
    pub fn parse(pair: &str) -> Option<Self> {
        let (key, value) = pair.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key, value))
    }
}

impl TagProvider for StaticTag {
    fn init(&mut self) {}

    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn calculate_value(&self, _context: &TagContext<'_>) -> Result<Tag, TagError> {
        if self.key.trim().is_empty() {
            return Err(TagError::new("tag key is empty"));
        }
        Ok(Tag::new(self.key.clone(), self.value.clone()))
    }
}
