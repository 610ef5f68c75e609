use std::fs::File;
use std::io;
use std::io::Write as _;
use std::path::Path;

use memchr::memchr3;

use crate::error::{Error, ErrorKind, Position, Result, Sticky};
use crate::reader::Status;
use crate::settings::{Delimiters, TrimPolicy};

/// A builder for configuring a CSV writer.
///
/// This builder permits specifying the field and row delimiters, the
/// escape scalar, a header row and BOM emission.
#[derive(Clone, Debug)]
pub struct WriterBuilder {
    field_delimiter: String,
    row_delimiter: String,
    escape: Option<char>,
    trim: TrimPolicy,
    headers: Option<Vec<String>>,
    write_bom: bool,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            field_delimiter: ",".to_string(),
            row_delimiter: "\n".to_string(),
            escape: Some('"'),
            trim: TrimPolicy::None,
            headers: None,
            write_bom: false,
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring a CSV writer.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `","`.
    pub fn field_delimiter(&mut self, delim: &str) -> &mut WriterBuilder {
        self.field_delimiter = delim.to_string();
        self
    }

    /// The row delimiter to use when writing CSV.
    ///
    /// The default is `"\n"`.
    pub fn row_delimiter(&mut self, delim: &str) -> &mut WriterBuilder {
        self.row_delimiter = delim.to_string();
        self
    }

    /// The escape scalar used to quote fields that contain delimiter or
    /// escape scalars.
    ///
    /// The default is `"`. With `None`, a field requiring quotes is a
    /// configuration error.
    pub fn escape(&mut self, escape: Option<char>) -> &mut WriterBuilder {
        self.escape = escape;
        self
    }

    /// A trim policy mirroring the reader's.
    ///
    /// When set, fields whose leading or trailing scalars would be
    /// trimmed on re-read are quoted to preserve them.
    pub fn trim(&mut self, trim: TrimPolicy) -> &mut WriterBuilder {
        self.trim = trim;
        self
    }

    /// A header row to emit before the first data row.
    ///
    /// The headers establish the expected row width.
    pub fn headers(&mut self, headers: Vec<String>) -> &mut WriterBuilder {
        self.headers = Some(headers);
        self
    }

    /// Emit a UTF-8 byte-order mark before any other output.
    ///
    /// Disabled by default.
    pub fn write_bom(&mut self, yes: bool) -> &mut WriterBuilder {
        self.write_bom = yes;
        self
    }

    /// Build a CSV writer from this configuration that writes to `wtr`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Result<Writer<W>> {
        Writer::new(self, wtr)
    }

    /// Build a CSV writer that writes to the file at `path`, truncating
    /// it if it exists.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        Writer::new(self, File::create(path)?)
    }

    /// Build a CSV writer that writes to an in-memory buffer, retrievable
    /// with `Writer::into_bytes`.
    pub fn from_memory(&self) -> Result<Writer<Vec<u8>>> {
        Writer::new(self, Vec::with_capacity(1024))
    }
}

/// A streaming CSV writer.
///
/// Fields are accepted one at a time; `end_row` terminates a row and
/// `end_encoding` finishes the output. After the first completed row,
/// every row must contain the same number of fields.
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    out: io::BufWriter<W>,
    delims: Delimiters,
    field_delim: String,
    row_delim: String,
    trim: TrimPolicy,
    headers: Option<Vec<String>>,
    headers_written: bool,
    write_bom: bool,
    bom_written: bool,
    /// The raw first field of the current row, held back so that a row
    /// consisting of a single empty field can be emitted as a quoted
    /// empty field rather than a bare row terminator (which a matching
    /// reader would skip).
    pending_first: Option<String>,
    row_index: u64,
    field_index: u64,
    expected: u64,
    bytes_written: u64,
    status: Status,
    sticky: Option<Sticky>,
}

impl<W: io::Write> Writer<W> {
    fn new(builder: &WriterBuilder, wtr: W) -> Result<Writer<W>> {
        let delims = Delimiters::resolve(
            &builder.field_delimiter,
            &builder.row_delimiter,
            builder.escape,
            &builder.trim,
        )?;
        if let Some(ref headers) = builder.headers {
            if headers.is_empty() {
                return Err(Error::configuration(
                    "the header row must have at least one column",
                ));
            }
        }
        let field_delim = delims.field_str();
        let row_delim = delims.row_str();
        Ok(Writer {
            out: io::BufWriter::new(wtr),
            delims,
            field_delim,
            row_delim,
            trim: builder.trim.clone(),
            headers: builder.headers.clone(),
            headers_written: false,
            write_bom: builder.write_bom,
            bom_written: false,
            pending_first: None,
            row_index: 0,
            field_index: 0,
            expected: 0,
            bytes_written: 0,
            status: Status::Active,
            sticky: None,
        })
    }

    /// The index of the data row the writer is currently assembling.
    ///
    /// A configured header row does not count: the first data row is row
    /// `0` whether or not headers were emitted before it.
    pub fn row_index(&self) -> u64 {
        self.row_index
    }

    /// The index of the field that `write_field` will emit next.
    pub fn field_index(&self) -> u64 {
        self.field_index
    }

    /// The expected number of fields per row. `0` until the first
    /// `end_row` (or until the header row is emitted).
    pub fn expected_fields(&self) -> u64 {
        self.expected
    }

    /// The lifecycle state of this writer.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Append one field to the current row.
    pub fn write_field(&mut self, field: &str) -> Result<()> {
        self.check_usable()?;
        match self.write_field_inner(field) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn write_field_inner(&mut self, field: &str) -> Result<()> {
        self.ensure_headers()?;
        if self.expected > 0 && self.field_index >= self.expected {
            return Err(self.width_error(self.field_index + 1));
        }
        if self.field_index == 0 {
            self.pending_first = Some(field.to_string());
            self.field_index = 1;
            return Ok(());
        }
        if let Some(first) = self.pending_first.take() {
            self.emit_field(&first, false)?;
        }
        self.emit(&self.field_delim.clone())?;
        self.emit_field(field, false)?;
        self.field_index += 1;
        Ok(())
    }

    /// Terminate the current row.
    ///
    /// The first completed row establishes the expected width; every
    /// later row must match it exactly.
    pub fn end_row(&mut self) -> Result<()> {
        self.check_usable()?;
        match self.end_row_inner() {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn end_row_inner(&mut self) -> Result<()> {
        self.ensure_headers()?;
        if self.field_index == 0 {
            return Err(self.width_error(0));
        }
        if let Some(first) = self.pending_first.take() {
            // A row of one empty field must survive a re-read.
            let force = self.field_index == 1 && first.is_empty();
            self.emit_field(&first, force)?;
        }
        if self.expected == 0 {
            self.expected = self.field_index;
        } else if self.field_index != self.expected {
            return Err(self.width_error(self.field_index));
        }
        self.emit(&self.row_delim.clone())?;
        self.row_index += 1;
        self.field_index = 0;
        Ok(())
    }

    /// Finish the output.
    ///
    /// Fails when a row is partially written. When a header row was
    /// configured but no row was ever written, the headers are still
    /// emitted, so that encoding an empty sequence yields the header row
    /// alone.
    pub fn end_encoding(&mut self) -> Result<()> {
        self.check_usable()?;
        match self.end_encoding_inner() {
            Ok(()) => {
                self.status = Status::Finished;
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn end_encoding_inner(&mut self) -> Result<()> {
        if self.field_index != 0 {
            return Err(self.width_error(self.field_index));
        }
        self.ensure_headers()?;
        self.out.flush()?;
        Ok(())
    }

    /// Flush buffered output to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Unwrap this writer, flushing any buffered output.
    pub fn into_inner(self) -> Result<W> {
        match self.out.into_inner() {
            Ok(wtr) => Ok(wtr),
            Err(err) => Err(Error::from(err.into_error())),
        }
    }

    fn check_usable(&self) -> Result<()> {
        if let Some(ref sticky) = self.sticky {
            return Err(Error::resurface(sticky));
        }
        if self.status == Status::Finished {
            return Err(Error::new(ErrorKind::InvalidConfiguration {
                msg: "the writer has already been finished".to_string(),
            }));
        }
        Ok(())
    }

    fn fail(&mut self, err: Error) -> Error {
        self.status = Status::Failed;
        self.sticky = Some(err.sticky());
        err
    }

    fn pos(&self) -> Position {
        Position {
            byte: self.bytes_written,
            line: self.row_index + 1,
            row: self.row_index,
        }
    }

    fn width_error(&self, got: u64) -> Error {
        Error::new(ErrorKind::InvalidFieldCount {
            pos: self.pos(),
            expected: self.expected,
            got,
        })
    }

    /// Emit the configured header row, once, before any other row data.
    fn ensure_headers(&mut self) -> Result<()> {
        if self.headers_written {
            return Ok(());
        }
        self.headers_written = true;
        let headers = match self.headers.take() {
            None => return Ok(()),
            Some(headers) => headers,
        };
        let single_empty =
            headers.len() == 1 && headers[0].is_empty();
        for (i, header) in headers.iter().enumerate() {
            if i > 0 {
                self.emit(&self.field_delim.clone())?;
            }
            self.emit_field(header, single_empty)?;
        }
        self.emit(&self.row_delim.clone())?;
        self.expected = headers.len() as u64;
        Ok(())
    }

    /// Emit one field value, quoting it when necessary.
    fn emit_field(&mut self, field: &str, force_quote: bool) -> Result<()> {
        if !force_quote && !self.needs_quotes(field) {
            return self.emit(field);
        }
        let esc = match self.delims.escape {
            Some(esc) => esc,
            None => {
                return Err(Error::new(ErrorKind::InvalidConfiguration {
                    msg: format!(
                        "field {:?} requires quoting, but no escape scalar \
                         is configured",
                        field
                    ),
                }));
            }
        };
        let mut quoted = String::with_capacity(field.len() + 2);
        quoted.push(esc);
        for c in field.chars() {
            if c == esc {
                quoted.push(esc);
            }
            quoted.push(c);
        }
        quoted.push(esc);
        self.emit(&quoted)
    }

    /// A field is emitted verbatim only when it contains no delimiter or
    /// escape scalars and no trimmable boundary scalars.
    fn needs_quotes(&self, field: &str) -> bool {
        if !self.trim.is_none() {
            let mut chars = field.chars();
            let leading = chars.clone().next().map_or(false, |c| {
                self.trim.matches(c)
            });
            let trailing =
                chars.next_back().map_or(false, |c| self.trim.matches(c));
            if leading || trailing {
                return true;
            }
        }
        if let Some(needles) = self.ascii_needles() {
            return memchr3(
                needles[0],
                needles[1],
                needles[2],
                field.as_bytes(),
            )
            .is_some();
        }
        field.chars().any(|c| {
            self.delims.field.contains(&c)
                || self.delims.row.contains(&c)
                || self.delims.escape == Some(c)
        })
    }

    /// The single-byte needles for the common all-ASCII dialect, enabling
    /// a bulk scan instead of a per-scalar walk.
    fn ascii_needles(&self) -> Option<[u8; 3]> {
        match (
            &self.delims.field[..],
            &self.delims.row[..],
            self.delims.escape,
        ) {
            (&[f], &[r], Some(e))
                if f.is_ascii() && r.is_ascii() && e.is_ascii() =>
            {
                Some([f as u8, r as u8, e as u8])
            }
            _ => None,
        }
    }

    fn emit(&mut self, data: &str) -> Result<()> {
        if self.write_bom && !self.bom_written {
            self.bom_written = true;
            self.out.write_all(&[0xEF, 0xBB, 0xBF])?;
            self.bytes_written += 3;
        }
        self.out.write_all(data.as_bytes())?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }
}

impl Writer<Vec<u8>> {
    /// Create a writer over an in-memory buffer with the default
    /// configuration.
    pub fn from_memory() -> Writer<Vec<u8>> {
        match WriterBuilder::new().from_memory() {
            Ok(wtr) => wtr,
            // The default configuration always resolves.
            Err(_) => unreachable!(),
        }
    }

    /// Return the written CSV data, flushing the internal buffer.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.into_inner()
    }
}
