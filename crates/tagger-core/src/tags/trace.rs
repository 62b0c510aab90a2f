//! Per-resource trace identifiers

use tagger_blocks::Tag;
use uuid::Uuid;

use super::{TagContext, TagError, TagProvider};

pub const TRACE_TAG_KEY: &str = "tagger_trace";

/// Provider that gives every resource a stable unique identifier.
///
/// A resource that already carries a trace tag keeps its value, so tagging a
/// template twice leaves it unchanged.
#[derive(Debug, Clone, Default)]
pub struct TraceTag;

impl TraceTag {
    pub fn new() -> Self {
        Self
    }
}

impl TagProvider for TraceTag {
    fn init(&mut self) {}

    fn key(&self) -> &str {
        TRACE_TAG_KEY
    }

    fn value(&self) -> &str {
        ""
    }

    fn calculate_value(&self, context: &TagContext<'_>) -> Result<Tag, TagError> {
        let value = match context.existing_value(TRACE_TAG_KEY) {
            Some(existing) if !existing.trim().is_empty() => existing.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        Ok(Tag::new(TRACE_TAG_KEY, value))
    }
}
