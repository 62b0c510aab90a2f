//! Tag providers
//!
//! A [`TagProvider`] computes one tag for each resource block it is asked
//! about. Providers are registered on a [`TagGroup`](crate::TagGroup) as
//! trait objects, so adding a provider never requires touching the group.

pub mod simple;
pub mod trace;

use std::path::Path;

use tagger_blocks::{Block, Tag};

pub use simple::StaticTag;
pub use trace::{TRACE_TAG_KEY, TraceTag};

/// What a provider may inspect when computing a value for one block.
#[derive(Debug, Clone, Copy)]
pub struct TagContext<'a> {
    pub file_path: &'a Path,
    pub resource_id: &'a str,
    pub resource_type: Option<&'a str>,
    pub existing_tags: &'a [Tag],
}

impl<'a> TagContext<'a> {
    pub fn for_block(file_path: &'a Path, block: &'a Block) -> Self {
        Self {
            file_path,
            resource_id: block.resource_id(),
            resource_type: block.resource_type(),
            existing_tags: block.existing_tags(),
        }
    }

    /// Value already declared on the resource for `key`.
    pub fn existing_value(&self, key: &str) -> Option<&'a str> {
        self.existing_tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }
}

/// Failure of a single provider for a single block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TagError {
    message: String,
}

impl TagError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A source of one tag.
pub trait TagProvider: Send + Sync {
    /// Prepare the provider before it is registered.
    fn init(&mut self);

    fn key(&self) -> &str;

    /// Configured value; empty for providers that compute per block.
    fn value(&self) -> &str;

    /// Compute the tag for one block.
    fn calculate_value(&self, context: &TagContext<'_>) -> Result<Tag, TagError>;
}

impl std::fmt::Debug for dyn TagProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagProvider")
            .field("key", &self.key())
            .field("value", &self.value())
            .finish()
    }
}
