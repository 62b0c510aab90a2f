//! File I/O for cfn-tagger
//!
//! Reads templates verbatim and writes rewritten templates atomically, so a
//! failed write never leaves a half-written file behind.

pub mod error;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use io::{read_text, write_atomic, write_text};
pub use path::{canonicalize, extension};
