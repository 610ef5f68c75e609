use std::error::Error as StdError;
use std::fmt;
use std::fmt::Display as _;
use std::io;
use std::result;

use crate::key::CodingPath;

/// A type alias for `Result<T, csvcodec::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when encoding or decoding CSV data.
///
/// Errors raised below the codec layer (by the reader or writer state
/// machines) are wrapped as `Read` or `Write` kinds; codec errors carry
/// the coding path of the failing site.
#[derive(Debug)]
pub struct Error {
    kind: Box<ErrorKind>,
    path: CodingPath,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error { kind: Box::new(kind), path: CodingPath::root() }
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.kind
    }

    /// The coding path at which this error was raised.
    ///
    /// Empty for errors raised outside a codec call.
    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    /// Attach a coding path, unless one was already recorded deeper in
    /// the call tree.
    pub(crate) fn at(mut self, path: &CodingPath) -> Error {
        if self.path.is_empty() {
            self.path = path.clone();
        }
        self
    }

    /// Returns true if this is an I/O error raised by the underlying
    /// reader or writer.
    pub fn is_io_error(&self) -> bool {
        match *self.kind {
            ErrorKind::Read(ref err) | ErrorKind::Write(ref err) => {
                err.is_io_error()
            }
            _ => false,
        }
    }
}

/// The specific type of an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// The reader state machine failed.
    Read(csvcodec_core::Error),
    /// The writer state machine failed.
    Write(csvcodec_core::Error),
    /// A row index beyond the end of the input was requested.
    RowOutOfBounds {
        /// The requested row index.
        row: u64,
        /// The number of rows the input turned out to contain.
        num_rows: u64,
    },
    /// A field index beyond the row's width was requested.
    FieldOutOfBounds {
        /// The requested field index.
        field: u64,
        /// The width of the addressed row.
        width: u64,
    },
    /// A previously produced row was requested after the buffering
    /// strategy evicted it.
    ExpiredCache {
        /// The requested row index.
        row: u64,
    },
    /// A field was looked up by name, but the input has no header row.
    EmptyHeader,
    /// A field was looked up by a name that is not among the headers.
    UnmatchedHeader {
        /// The name that failed to resolve.
        name: String,
    },
    /// Two header names collide, so name lookups are ambiguous.
    InvalidHashableHeader {
        /// The colliding name.
        name: String,
    },
    /// A field was written behind the writer's focus, which has already
    /// been emitted.
    WritingSurpassed {
        /// The requested row index.
        row: u64,
        /// The requested field index.
        field: u64,
    },
    /// Staged fields could not be flushed when the encoding completed.
    CorruptedBuffer {
        /// A human-readable description of the residue.
        msg: String,
    },
    /// A container operation addressed the CSV grid in a way its
    /// hierarchy does not permit.
    InvalidPath {
        /// A human-readable description of the violation.
        msg: String,
    },
    /// A nested container below field level was requested.
    InvalidNestedContainer,
    /// Structured decoding was requested on a reader whose rows were
    /// already partially consumed.
    AlreadyParsed,
    /// An unkeyed container was advanced past its end.
    IsAtEnd,
    /// A single-value container was used at file or record level against
    /// data that is not a single column.
    IsNotSingleColumn,
    /// A textual field could not be interpreted as the requested type.
    Mismatch {
        /// The requested type or shape.
        expected: String,
        /// The offending field text or a description of it.
        value: String,
    },
    /// An error that occurred while serializing a value into a row with
    /// serde.
    #[cfg(feature = "serde")]
    Serialize(String),
    /// An error that occurred while deserializing a row into a value
    /// with serde.
    #[cfg(feature = "serde")]
    Deserialize {
        /// The index of the row that failed, if known.
        row: Option<u64>,
        /// The deserialization error.
        err: crate::serde_impl::DeserializeError,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Read(csvcodec_core::Error::from(err)))
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.kind {
            ErrorKind::Read(ref err) | ErrorKind::Write(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_kind(f)?;
        if !self.path.is_empty() {
            write!(f, " (at {})", self.path)?;
        }
        Ok(())
    }
}

impl Error {
    fn fmt_kind(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.kind {
            ErrorKind::Read(ref err) | ErrorKind::Write(ref err) => {
                err.fmt(f)
            }
            ErrorKind::RowOutOfBounds { row, num_rows } => write!(
                f,
                "CSV decode error: row {} requested, but the input has {} \
                 rows",
                row, num_rows
            ),
            ErrorKind::FieldOutOfBounds { field, width } => write!(
                f,
                "CSV decode error: field {} requested, but rows have {} \
                 fields",
                field, width
            ),
            ErrorKind::ExpiredCache { row } => write!(
                f,
                "CSV decode error: row {} was evicted by the buffering \
                 strategy and cannot be revisited",
                row
            ),
            ErrorKind::EmptyHeader => write!(
                f,
                "CSV decode error: fields cannot be addressed by name \
                 because the input has no headers"
            ),
            ErrorKind::UnmatchedHeader { ref name } => {
                write!(f, "CSV decode error: no header is named {:?}", name)
            }
            ErrorKind::InvalidHashableHeader { ref name } => write!(
                f,
                "CSV decode error: the header name {:?} appears more than \
                 once",
                name
            ),
            ErrorKind::WritingSurpassed { row, field } => write!(
                f,
                "CSV encode error: row {} field {} has already been \
                 written and surpassed",
                row, field
            ),
            ErrorKind::CorruptedBuffer { ref msg } => {
                write!(f, "CSV encode error: {}", msg)
            }
            ErrorKind::InvalidPath { ref msg } => {
                write!(f, "CSV codec error: {}", msg)
            }
            ErrorKind::InvalidNestedContainer => write!(
                f,
                "CSV codec error: containers nest no deeper than file, \
                 record, field"
            ),
            ErrorKind::AlreadyParsed => write!(
                f,
                "CSV decode error: rows were already read from this input"
            ),
            ErrorKind::IsAtEnd => {
                write!(f, "CSV codec error: the container has no more values")
            }
            ErrorKind::IsNotSingleColumn => write!(
                f,
                "CSV codec error: a single-value container requires \
                 exactly one column"
            ),
            ErrorKind::Mismatch { ref expected, ref value } => write!(
                f,
                "CSV decode error: cannot interpret {:?} as {}",
                value, expected
            ),
            #[cfg(feature = "serde")]
            ErrorKind::Serialize(ref msg) => {
                write!(f, "CSV serialize error: {}", msg)
            }
            #[cfg(feature = "serde")]
            ErrorKind::Deserialize { row: None, ref err } => {
                write!(f, "CSV deserialize error: {}", err)
            }
            #[cfg(feature = "serde")]
            ErrorKind::Deserialize { row: Some(row), ref err } => {
                write!(f, "CSV deserialize error: row {}: {}", row, err)
            }
        }
    }
}

pub(crate) fn read_error(err: csvcodec_core::Error) -> Error {
    Error::new(ErrorKind::Read(err))
}

pub(crate) fn write_error(err: csvcodec_core::Error) -> Error {
    Error::new(ErrorKind::Write(err))
}
