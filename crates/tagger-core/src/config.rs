//! Run configuration
//!
//! A [`TaggerConfig`] can be read from a TOML file and then overlaid with
//! command-line values:
//!
//! ```toml
//! skip_tags = ["internal_*"]
//! skip_dirs = [".git", "node_modules"]
//! trace = true
//!
//! [tags]
//! team = "platform"
//! env = "prod"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tag_group::TagGroup;
use crate::tags::{StaticTag, TagProvider, TraceTag};

/// Directory names never descended into unless configured otherwise.
pub const DEFAULT_SKIP_DIRS: [&str; 3] = [".git", ".DS_Store", ".idea"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Tag key patterns to leave out; `*` matches any run of characters.
    pub skip_tags: Vec<String>,
    /// File and directory names to ignore while walking.
    pub skip_dirs: Vec<String>,
    /// Static tags applied to every resource.
    pub tags: BTreeMap<String, String>,
    /// Add a `tagger_trace` identifier to every resource.
    pub trace: bool,
    /// Restrict the run to these file extensions.
    pub extensions: Vec<String>,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            skip_tags: Vec::new(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|d| d.to_string()).collect(),
            tags: BTreeMap::new(),
            trace: false,
            extensions: Vec::new(),
        }
    }
}

/// Values given on the command line, applied on top of a loaded config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub tags: Vec<(String, String)>,
    pub skip_tags: Vec<String>,
    pub skip_dirs: Vec<String>,
    pub trace: bool,
}

impl TaggerConfig {
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tagger_fs::read_text(path)?;
        let config = Self::parse(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Overlay command-line values. Tags given on the command line replace
    /// configured tags with the same key; lists are extended.
    pub fn merge_cli(&mut self, overrides: ConfigOverrides) {
        for (key, value) in overrides.tags {
            self.tags.insert(key, value);
        }
        extend_unique(&mut self.skip_tags, overrides.skip_tags);
        extend_unique(&mut self.skip_dirs, overrides.skip_dirs);
        self.trace |= overrides.trace;
    }

    /// Providers for this configuration: static tags in key order, then the
    /// trace tag when enabled.
    pub fn providers(&self) -> Vec<Box<dyn TagProvider>> {
        let mut providers: Vec<Box<dyn TagProvider>> = self
            .tags
            .iter()
            .map(|(key, value)| Box::new(StaticTag::new(key, value)) as Box<dyn TagProvider>)
            .collect();
        if self.trace {
            providers.push(Box::new(TraceTag::new()));
        }
        providers
    }

    /// A tag group with this configuration's skip patterns and providers.
    pub fn tag_group(&self) -> Result<TagGroup> {
        let mut group = TagGroup::new(self.skip_tags.as_slice())?;
        group.set_tags(self.providers());
        Ok(group)
    }
}

fn extend_unique(target: &mut Vec<String>, values: Vec<String>) {
    for value in values {
        if !target.contains(&value) {
            target.push(value);
        }
    }
}
