//! Provider registry with skip patterns

use std::path::Path;

use regex::Regex;
use tagger_blocks::Block;

use crate::error::{Error, Result, TagComputationError};
use crate::tags::{TagContext, TagProvider};

/// A compiled skip pattern, kept with its source text for log messages.
#[derive(Debug, Clone)]
struct SkipPattern {
    source: String,
    regex: Regex,
}

impl SkipPattern {
    /// `*` matches any run of characters; everything else is literal. The
    /// pattern matches anywhere in the key.
    fn compile(source: &str) -> Result<Self> {
        let expression = source
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&expression).map_err(|e| Error::InvalidSkipPattern {
            pattern: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }
}

/// The set of providers applied to every block, minus the skipped ones.
#[derive(Debug, Default)]
pub struct TagGroup {
    tags: Vec<Box<dyn TagProvider>>,
    skip_patterns: Vec<SkipPattern>,
}

impl TagGroup {
    /// Create an empty group, compiling each skip pattern once.
    pub fn new<S: AsRef<str>>(skip_patterns: &[S]) -> Result<Self> {
        let skip_patterns = skip_patterns
            .iter()
            .map(|pattern| SkipPattern::compile(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            tags: Vec::new(),
            skip_patterns,
        })
    }

    /// Initialise and register providers, dropping those whose key is skipped.
    pub fn set_tags(&mut self, tags: Vec<Box<dyn TagProvider>>) {
        for mut tag in tags {
            tag.init();
            if self.is_tag_skipped(tag.key()) {
                continue;
            }
            tracing::debug!(key = tag.key(), "Registered tag provider");
            self.tags.push(tag);
        }
    }

    pub fn tags(&self) -> &[Box<dyn TagProvider>] {
        &self.tags
    }

    pub fn is_tag_skipped(&self, key: &str) -> bool {
        match self.skip_patterns.iter().find(|p| p.regex.is_match(key)) {
            Some(pattern) => {
                tracing::info!(
                    key,
                    pattern = %pattern.source,
                    "Skipping tag due to skip-tags constraint"
                );
                true
            }
            None => false,
        }
    }

    /// Compute every registered tag for `block` and queue them on it.
    ///
    /// Tags that could be computed are attached even when others fail; the
    /// failures are returned together. A computed tag whose key is skipped is
    /// dropped, whatever key its provider registered under.
    pub fn create_tags_for_block(&self, file_path: &Path, block: &mut Block) -> Result<()> {
        if !block.is_taggable() {
            tracing::debug!(
                resource = block.resource_id(),
                "Resource has no properties to tag, skipping"
            );
            return Ok(());
        }

        let context = TagContext::for_block(file_path, block);
        let mut computed = Vec::with_capacity(self.tags.len());
        let mut errors = Vec::new();
        for provider in &self.tags {
            match provider.calculate_value(&context) {
                Ok(tag) if self.is_tag_skipped(&tag.key) => {}
                Ok(tag) => computed.push(tag),
                Err(e) => {
                    tracing::error!(
                        key = provider.key(),
                        resource = context.resource_id,
                        error = %e,
                        "Failed to create tag for resource"
                    );
                    errors.push(TagComputationError {
                        key: provider.key().to_string(),
                        resource_id: context.resource_id.to_string(),
                        message: e.message().to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            resource = block.resource_id(),
            tags = computed.len(),
            "Computed tags"
        );
        block.add_new_tags(computed);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::TagComputation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{StaticTag, TagError};
    use rstest::rstest;
    use tagger_blocks::{Lines, Tag};

    #[derive(Debug)]
    struct Failing;

    impl TagProvider for Failing {
        fn init(&mut self) {}
        fn key(&self) -> &str {
            "broken"
        }
        fn value(&self) -> &str {
            ""
        }
        fn calculate_value(&self, _context: &TagContext<'_>) -> std::result::Result<Tag, TagError> {
            Err(TagError::new("no value available"))
        }
    }

    /// Registered under one key, produces a tag under another.
    #[derive(Debug)]
    struct Renaming;

    impl TagProvider for Renaming {
        fn init(&mut self) {}
        fn key(&self) -> &str {
            "env"
        }
        fn value(&self) -> &str {
            "x"
        }
        fn calculate_value(&self, _context: &TagContext<'_>) -> std::result::Result<Tag, TagError> {
            Ok(Tag::new("foo_bar", "x"))
        }
    }

    fn block() -> Block {
        Block::new("Bucket", Lines::new(2, 5), vec![])
    }

    #[rstest]
    #[case("foo*", "foo_bar", true)]
    #[case("foo*", "my_foo", true)]
    #[case("foo", "prefix_foo_suffix", true)]
    #[case("foo*", "bar", false)]
    #[case("a.b", "axb", false)]
    #[case("a.b", "a.b", true)]
    #[case("*", "anything", true)]
    fn skip_pattern_matching(#[case] pattern: &str, #[case] key: &str, #[case] skipped: bool) {
        let group = TagGroup::new(&[pattern]).unwrap();
        assert_eq!(group.is_tag_skipped(key), skipped);
    }

    #[test]
    fn skipped_providers_are_not_registered() {
        let mut group = TagGroup::new(&["foo*"]).unwrap();
        group.set_tags(vec![
            Box::new(StaticTag::new("foo_bar", "1")),
            Box::new(StaticTag::new("env", "prod")),
        ]);
        let keys: Vec<&str> = group.tags().iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["env"]);

        let mut block = block();
        group.create_tags_for_block(Path::new("t.yaml"), &mut block).unwrap();
        assert!(block.new_tags().iter().all(|t| t.key != "foo_bar"));
    }

    #[test]
    fn computed_tags_with_skipped_keys_are_dropped() {
        let mut group = TagGroup::new(&["foo*"]).unwrap();
        group.set_tags(vec![Box::new(Renaming), Box::new(StaticTag::new("env2", "prod"))]);
        assert_eq!(group.tags().len(), 2);

        let mut block = block();
        group.create_tags_for_block(Path::new("t.yaml"), &mut block).unwrap();
        assert_eq!(block.new_tags(), &[Tag::new("env2", "prod")]);
    }

    #[test]
    fn failures_are_collected_and_successes_kept() {
        let mut group = TagGroup::new::<&str>(&[]).unwrap();
        group.set_tags(vec![Box::new(Failing), Box::new(StaticTag::new("env", "prod"))]);

        let mut block = block();
        let result = group.create_tags_for_block(Path::new("t.yaml"), &mut block);

        match result {
            Err(Error::TagComputation(errors)) => {
                assert_eq!(
                    errors,
                    vec![TagComputationError {
                        key: "broken".into(),
                        resource_id: "Bucket".into(),
                        message: "no value available".into(),
                    }]
                );
            }
            other => panic!("expected tag computation error, got {other:?}"),
        }
        assert_eq!(block.new_tags(), &[Tag::new("env", "prod")]);
    }

    #[test]
    fn non_taggable_blocks_are_left_alone() {
        let mut group = TagGroup::new::<&str>(&[]).unwrap();
        group.set_tags(vec![Box::new(StaticTag::new("env", "prod"))]);

        let mut block = block().with_taggable(false);
        group.create_tags_for_block(Path::new("t.yaml"), &mut block).unwrap();
        assert!(block.new_tags().is_empty());
    }
}
