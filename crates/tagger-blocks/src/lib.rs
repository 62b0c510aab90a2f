//! Resource block extraction and line-exact tag rewriting.
//!
//! A template is read into one [`Block`] per resource declaration. Each block
//! knows the exact 1-based line span of its declaration, so tags merged onto
//! it can be written back by replacing only the tag region of that
//! declaration:
//!
//! ```text
//! Resources:
//!   NewVolume:              <- Block "NewVolume", Lines { start: 2, .. }
//!     Type: AWS::EC2::Volume
//!     Properties:
//!       Tags:               <- tag region, the only part the writer touches
//!         - Key: MyTag
//!           Value: TagValue <- Lines { .., end: 7 }
//! ```
//!
//! # Modules
//!
//! - [`mapper`]: computes resource line spans from raw text.
//! - [`formats`]: per-dialect extraction and tag region rewriting (YAML, JSON).
//! - [`parser`]: [`TemplateParser`], which ties the two together per file.
//! - [`writer`]: substitutes tag regions and writes the result atomically.

pub mod block;
pub mod error;
pub mod formats;
pub mod lines;
pub mod mapper;
pub mod parser;
pub mod tag;
pub mod writer;

pub use block::Block;
pub use error::{Error, Result};
pub use formats::{JsonFormat, ResourceDecl, TemplateFormat, YamlFormat};
pub use lines::Lines;
pub use mapper::{LineStyle, RESOURCES_START_TOKEN, map_resource_lines};
pub use parser::{ParserOptions, TemplateParser};
pub use tag::Tag;
pub use writer::{rewrite, write_file};
