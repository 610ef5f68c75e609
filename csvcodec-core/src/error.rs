use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

/// A type alias for `Result<T, csvcodec_core::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading or writing CSV data.
///
/// Once a reader or writer reports an error, it is permanently failed:
/// every subsequent call reports an error of the same kind.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Create a configuration error.
    ///
    /// Exposed so that layers above the state machines can report their
    /// own unusable configurations with the same kind.
    pub fn configuration(msg: impl Into<String>) -> Error {
        Error::new(ErrorKind::InvalidConfiguration { msg: msg.into() })
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns true if this is an I/O error.
    ///
    /// If this is true, the underlying `ErrorKind` is guaranteed to be
    /// `ErrorKind::Io`.
    pub fn is_io_error(&self) -> bool {
        match *self.0 {
            ErrorKind::Io(_) => true,
            _ => false,
        }
    }

    /// Re-create this error from its sticky copy.
    ///
    /// Readers and writers become permanently unusable after their first
    /// failure. Since `io::Error` is not `Clone`, a failed state machine
    /// stores a `Sticky` and re-raises through this constructor.
    pub(crate) fn resurface(sticky: &Sticky) -> Error {
        match *sticky {
            Sticky::Io { kind, ref msg } => {
                Error::new(ErrorKind::Io(io::Error::new(kind, msg.clone())))
            }
            Sticky::InvalidInput { pos, ref msg } => {
                Error::new(ErrorKind::InvalidInput { pos, msg: msg.clone() })
            }
            Sticky::InvalidConfiguration { ref msg } => {
                Error::new(ErrorKind::InvalidConfiguration { msg: msg.clone() })
            }
            Sticky::InvalidFieldCount { pos, expected, got } => {
                Error::new(ErrorKind::InvalidFieldCount { pos, expected, got })
            }
        }
    }

    pub(crate) fn sticky(&self) -> Sticky {
        match *self.0 {
            ErrorKind::Io(ref err) => Sticky::Io {
                kind: err.kind(),
                msg: err.to_string(),
            },
            ErrorKind::InvalidInput { pos, ref msg } => {
                Sticky::InvalidInput { pos, msg: msg.clone() }
            }
            ErrorKind::InvalidConfiguration { ref msg } => {
                Sticky::InvalidConfiguration { msg: msg.clone() }
            }
            ErrorKind::InvalidFieldCount { pos, expected, got } => {
                Sticky::InvalidFieldCount { pos, expected, got }
            }
        }
    }
}

/// The specific type of an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// An I/O error that occurred while reading or writing CSV data.
    Io(io::Error),
    /// Malformed input: bad quoting, an undecodable byte sequence, or a row
    /// whose width differs from the first row.
    InvalidInput {
        /// The position at which the malformed input was found.
        pos: Position,
        /// A human-readable description of the problem.
        msg: String,
    },
    /// The reader or writer was configured with unusable settings, such as
    /// an empty delimiter or a field that cannot be represented without an
    /// escape scalar.
    InvalidConfiguration {
        /// A human-readable description of the problem.
        msg: String,
    },
    /// A row was ended with a number of fields different from the first
    /// row's. Reported by the writer; the reader reports width mismatches
    /// as `InvalidInput`.
    InvalidFieldCount {
        /// The position of the offending row.
        pos: Position,
        /// The expected number of fields per row.
        expected: u64,
        /// The number of fields actually written.
        got: u64,
    },
}

/// A cloneable copy of an error, retained by failed readers and writers.
#[derive(Clone, Debug)]
pub(crate) enum Sticky {
    Io { kind: io::ErrorKind, msg: String },
    InvalidInput { pos: Position, msg: String },
    InvalidConfiguration { msg: String },
    InvalidFieldCount { pos: Position, expected: u64, got: u64 },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::InvalidInput { ref pos, ref msg } => {
                write!(
                    f,
                    "CSV parse error: row {} (line {}, byte {}): {}",
                    pos.row(),
                    pos.line(),
                    pos.byte(),
                    msg
                )
            }
            ErrorKind::InvalidConfiguration { ref msg } => {
                write!(f, "CSV configuration error: {}", msg)
            }
            ErrorKind::InvalidFieldCount { ref pos, expected, got } => {
                write!(
                    f,
                    "CSV error: row {}: found row with {} fields, but the \
                     first row has {} fields",
                    pos.row(),
                    got,
                    expected
                )
            }
        }
    }
}

/// A position in CSV data.
///
/// All positions include the byte offset, line number and row index at
/// which an error occurred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    pub(crate) byte: u64,
    pub(crate) line: u64,
    pub(crate) row: u64,
}

impl Position {
    /// Returns a new position initialized to the start value.
    pub fn new() -> Position {
        Position { byte: 0, line: 1, row: 0 }
    }

    /// The byte offset, starting at `0`, of this position.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The line number, starting at `1`, of this position.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The row index, starting at `0`, of this position.
    pub fn row(&self) -> u64 {
        self.row
    }
}
