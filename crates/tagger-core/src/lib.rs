//! Tag computation and directory runs for infrastructure templates
//!
//! This crate sits on top of `tagger-blocks` and decides *which* tags every
//! resource should carry:
//!
//! - **Providers**: [`TagProvider`] implementations compute one tag per block
//!   ([`StaticTag`], [`TraceTag`]).
//! - **Tag group**: [`TagGroup`] registers providers, filters them through
//!   skip patterns and queues computed tags on each block.
//! - **Configuration**: [`TaggerConfig`] loaded from TOML and overlaid with
//!   command-line values.
//! - **Runner**: [`Runner`] walks a directory and rewrites every template.
//!
//! ```text
//!                 tagger-cli
//!                     |
//!                tagger-core
//!                     |
//!          +----------+----------+
//!          |                     |
//!    tagger-blocks          tagger-fs
//! ```

pub mod config;
pub mod error;
pub mod runner;
pub mod tag_group;
pub mod tags;

pub use config::{ConfigOverrides, DEFAULT_SKIP_DIRS, TaggerConfig};
pub use error::{Error, Result, TagComputationError};
pub use runner::{FileError, FileReport, ListedFile, Listing, RunReport, Runner, TagFailure};
pub use tag_group::TagGroup;
pub use tags::{StaticTag, TRACE_TAG_KEY, TagContext, TagError, TagProvider, TraceTag};
