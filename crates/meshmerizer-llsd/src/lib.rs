//! Binary LLSD: the self-describing container format used by uploaded mesh
//! assets.
//!
//! A mesh asset starts with a binary LLSD map whose entries point into a body
//! region that follows the header. Decoding therefore needs two things from
//! this crate: the decoded [`Value`], and the byte offset at which the header
//! ended. [`from_slice`] returns both.
//!
//! # Key functions
//!
//! - [`from_slice`]: Parse one value, returning it and the number of bytes consumed
//! - [`to_vec`]: Serialize a value to binary LLSD

mod error;
mod read;
mod value;
mod write;

pub use error::{LlsdError, LlsdResult};
pub use read::{MAX_DEPTH, from_slice};
pub use value::{Map, Value};
pub use write::{to_vec, write_value};

/// Optional preamble some writers place before the first value.
pub const BINARY_HEADER: &[u8] = b"<? LLSD/Binary ?>\n";
