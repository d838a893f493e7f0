//! Bounded byte cursor and writer for the deltastate patch format.
//!
//! This crate provides [`ByteReader`] and [`ByteWriter`] for the primitive
//! encodings a patch is made of: fixed-width little-endian integers and
//! floats, the prefix-tagged `number` encoding, and length-prefixed strings.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked against the buffer length.
//! - **No domain knowledge** - This crate knows nothing about schemas, references or operations.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bytestream::{ByteReader, ByteWriter};
//!
//! let mut writer = ByteWriter::new();
//! writer.write_number(300.0);
//! writer.write_str("hello");
//!
//! let bytes = writer.finish();
//!
//! let mut reader = ByteReader::new(&bytes);
//! assert_eq!(reader.read_number().unwrap(), 300.0);
//! assert_eq!(reader.read_str().unwrap(), "hello");
//! ```

mod error;
mod reader;
mod writer;

pub use error::{ByteError, ByteResult};
pub use reader::ByteReader;
pub use writer::ByteWriter;
