/*!
Streaming CSV state machines with encoding detection.

This crate provides the byte-to-row core used by the `csvcodec` crate: an
encoding detector, a lazy scalar source, and the reader and writer state
machines. It has no opinions about how rows map onto user types; that
layering lives upstream.
*/

pub use crate::encoding::{detect, Detection, Encoding};
pub use crate::error::{Error, ErrorKind, Position, Result};
pub use crate::reader::{Reader, ReaderBuilder, Status};
pub use crate::scalar::ScalarSource;
pub use crate::settings::{Delimiters, HeaderPolicy, TrimPolicy};
pub use crate::writer::{Writer, WriterBuilder};

mod encoding;
mod error;
mod reader;
mod scalar;
mod settings;
mod writer;
