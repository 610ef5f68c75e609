use std::fs::File;
use std::io;
use std::path::Path;

use csvcodec_core::{
    Status, TrimPolicy, Writer as CoreWriter,
    WriterBuilder as CoreWriterBuilder,
};

use crate::buffer::WriteBuffering;
use crate::encoder::{Encode, Encoder};
use crate::error::{write_error, Error, ErrorKind, Result};
use crate::sink::Sink;

/// Builds a CSV encoder with various configuration knobs.
///
/// This forwards the dialect configuration to the core writer and adds
/// the codec-level buffering strategy.
#[derive(Clone, Debug)]
pub struct WriterBuilder {
    core: CoreWriterBuilder,
    headers: Option<Vec<String>>,
    buffering: WriteBuffering,
    #[cfg(feature = "serde")]
    serialize_headers: bool,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            core: CoreWriterBuilder::default(),
            headers: None,
            buffering: WriteBuffering::default(),
            #[cfg(feature = "serde")]
            serialize_headers: false,
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring CSV encoding.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// The field delimiter to use when writing CSV. The default is `","`.
    pub fn field_delimiter(&mut self, delim: &str) -> &mut WriterBuilder {
        self.core.field_delimiter(delim);
        self
    }

    /// The row delimiter to use when writing CSV. The default is `"\n"`.
    pub fn row_delimiter(&mut self, delim: &str) -> &mut WriterBuilder {
        self.core.row_delimiter(delim);
        self
    }

    /// The escape scalar. The default is `"`; `None` disables quoting.
    pub fn escape(&mut self, escape: Option<char>) -> &mut WriterBuilder {
        self.core.escape(escape);
        self
    }

    /// A trim policy mirroring the reader's; trimmable boundary scalars
    /// force quoting.
    pub fn trim(&mut self, trim: TrimPolicy) -> &mut WriterBuilder {
        self.core.trim(trim);
        self
    }

    /// A header row to emit before the first data row. It settles the
    /// row width and resolves name keys during structured encoding.
    pub fn headers(&mut self, headers: Vec<String>) -> &mut WriterBuilder {
        self.core.headers(headers.clone());
        self.headers = Some(headers);
        self
    }

    /// Emit a UTF-8 byte-order mark before any other output. Disabled by
    /// default.
    pub fn write_bom(&mut self, yes: bool) -> &mut WriterBuilder {
        self.core.write_bom(yes);
        self
    }

    /// How fields put out of order are staged during structured
    /// encoding. The default is `WriteBuffering::KeepAll`.
    pub fn buffering(&mut self, strategy: WriteBuffering) -> &mut WriterBuilder {
        self.buffering = strategy;
        self
    }

    /// When serializing structs with serde, emit the struct's field
    /// names as a header row before the first record. Disabled by
    /// default; ignored when explicit headers are configured.
    #[cfg(feature = "serde")]
    pub fn serialize_headers(&mut self, yes: bool) -> &mut WriterBuilder {
        self.serialize_headers = yes;
        self
    }

    /// Build a CSV writer from this configuration that writes to `wtr`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Result<Writer<W>> {
        let core = self.core.from_writer(wtr).map_err(write_error)?;
        Ok(self.finish(core))
    }

    /// Build a CSV writer that writes to the file at `path`.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        let core = self.core.from_path(path).map_err(write_error)?;
        Ok(self.finish(core))
    }

    /// Build a CSV writer over an in-memory buffer, retrievable with
    /// `Writer::into_bytes`.
    pub fn from_memory(&self) -> Result<Writer<Vec<u8>>> {
        let core = self.core.from_memory().map_err(write_error)?;
        Ok(self.finish(core))
    }

    fn finish<W: io::Write>(&self, core: CoreWriter<W>) -> Writer<W> {
        Writer {
            core,
            headers: self.headers.clone(),
            buffering: self.buffering,
            #[cfg(feature = "serde")]
            serialize_headers: self.serialize_headers,
        }
    }
}

/// A CSV writer.
///
/// Fields and rows can be written one at a time, rows can be serialized
/// with serde through `serialize`, or a whole `Encode` value can be
/// encoded through the container tree with `encode`.
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    core: CoreWriter<W>,
    headers: Option<Vec<String>>,
    buffering: WriteBuffering,
    #[cfg(feature = "serde")]
    serialize_headers: bool,
}

impl<W: io::Write> Writer<W> {
    /// Create a writer over `wtr` with the default configuration.
    pub fn from_writer(wtr: W) -> Result<Writer<W>> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Append one field to the current row.
    pub fn write_field(&mut self, field: &str) -> Result<()> {
        self.core.write_field(field).map_err(write_error)
    }

    /// Terminate the current row.
    pub fn end_row(&mut self) -> Result<()> {
        self.core.end_row().map_err(write_error)
    }

    /// Write a whole row of fields.
    pub fn write_row<I, S>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for field in row {
            self.write_field(field.as_ref())?;
        }
        self.end_row()
    }

    /// Finish the output, flushing buffered bytes.
    pub fn end_encoding(&mut self) -> Result<()> {
        self.core.end_encoding().map_err(write_error)
    }

    /// The index of the data row currently being assembled.
    pub fn row_index(&self) -> u64 {
        self.core.row_index()
    }

    /// The index of the field that will be written next.
    pub fn field_index(&self) -> u64 {
        self.core.field_index()
    }

    /// The expected number of fields per row; `0` until it is settled.
    pub fn expected_fields(&self) -> u64 {
        self.core.expected_fields()
    }

    /// The lifecycle state of this writer.
    pub fn status(&self) -> Status {
        self.core.status()
    }

    /// Encode `value` through the container tree and finish the output,
    /// returning the underlying writer.
    ///
    /// The writer must be fresh: once fields have been written through
    /// the row interface, the container tree would interleave with them,
    /// so this reports `AlreadyParsed`.
    pub fn encode<T: Encode>(self, value: &T) -> Result<W> {
        if self.core.row_index() > 0 || self.core.field_index() > 0 {
            return Err(Error::new(ErrorKind::AlreadyParsed));
        }
        let mut sink =
            Sink::new(self.core, self.headers.clone(), self.buffering)?;
        {
            let mut encoder = Encoder::file(&mut sink);
            value.encode(&mut encoder)?;
        }
        sink.complete()?;
        sink.into_inner()
    }

    /// Serialize one value as the next row with serde.
    ///
    /// When `serialize_headers` is enabled and the value is a struct,
    /// its field names are emitted as a header row before the first
    /// record.
    #[cfg(feature = "serde")]
    pub fn serialize<T: serde::Serialize>(&mut self, value: &T) -> Result<()> {
        let (fields, names) = crate::serde_impl::serialize_row(value)?;
        if self.serialize_headers
            && self.headers.is_none()
            && self.core.row_index() == 0
            && self.core.field_index() == 0
        {
            if let Some(names) = names {
                self.write_row(names)?;
            }
        }
        self.write_row(fields)
    }

    /// Unwrap this writer, flushing any buffered output.
    pub fn into_inner(self) -> Result<W> {
        self.core.into_inner().map_err(write_error)
    }
}

impl Writer<Vec<u8>> {
    /// Create a writer over an in-memory buffer with the default
    /// configuration.
    pub fn from_memory() -> Writer<Vec<u8>> {
        Writer {
            core: CoreWriter::from_memory(),
            headers: None,
            buffering: WriteBuffering::default(),
            #[cfg(feature = "serde")]
            serialize_headers: false,
        }
    }

    /// Return the written CSV data, flushing the internal buffer.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.into_inner()
    }
}
