//! In-memory resource declarations

use crate::lines::Lines;
use crate::tag::Tag;

/// One resource declaration of a parsed template.
///
/// Created by the parser, mutated by tag merging and read by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    resource_id: String,
    resource_type: Option<String>,
    lines: Lines,
    existing_tags: Vec<Tag>,
    new_tags: Vec<Tag>,
    taggable: bool,
}

impl Block {
    pub fn new(resource_id: impl Into<String>, lines: Lines, existing_tags: Vec<Tag>) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_type: None,
            lines,
            existing_tags,
            new_tags: Vec::new(),
            taggable: true,
        }
    }

    pub fn with_resource_type(mut self, resource_type: Option<String>) -> Self {
        self.resource_type = resource_type;
        self
    }

    pub fn with_taggable(mut self, taggable: bool) -> Self {
        self.taggable = taggable;
        self
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    pub fn lines(&self) -> Lines {
        self.lines
    }

    pub fn existing_tags(&self) -> &[Tag] {
        &self.existing_tags
    }

    pub fn new_tags(&self) -> &[Tag] {
        &self.new_tags
    }

    /// Whether the declaration has somewhere to put tags (a `Properties` map).
    pub fn is_taggable(&self) -> bool {
        self.taggable
    }

    /// Queue computed tags. A key queued twice keeps only the latest value.
    pub fn add_new_tags(&mut self, tags: impl IntoIterator<Item = Tag>) {
        for tag in tags {
            match self.new_tags.iter_mut().find(|t| t.key == tag.key) {
                Some(pending) => pending.value = tag.value,
                None => self.new_tags.push(tag),
            }
        }
    }

    pub fn existing_tag(&self, key: &str) -> Option<&Tag> {
        self.existing_tags.iter().find(|t| t.key == key)
    }

    /// Existing tags in source order with overrides applied, then new keys.
    pub fn merged_tags(&self) -> Vec<Tag> {
        let mut merged: Vec<Tag> = self
            .existing_tags
            .iter()
            .map(|existing| {
                self.new_tags
                    .iter()
                    .find(|t| t.key == existing.key)
                    .cloned()
                    .unwrap_or_else(|| existing.clone())
            })
            .collect();
        merged.extend(self.added_tags().into_iter().cloned());
        merged
    }

    /// New value for an existing key, when the computed value differs.
    pub fn changed_value(&self, key: &str) -> Option<&str> {
        let existing = self.existing_tag(key)?;
        self.new_tags
            .iter()
            .find(|t| t.key == key && t.value != existing.value)
            .map(|t| t.value.as_str())
    }

    /// Queued tags whose key the declaration does not carry yet.
    pub fn added_tags(&self) -> Vec<&Tag> {
        self.new_tags
            .iter()
            .filter(|t| self.existing_tag(&t.key).is_none())
            .collect()
    }

    pub fn has_tag_changes(&self) -> bool {
        self.merged_tags() != self.existing_tags
    }
}
