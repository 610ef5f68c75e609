use crate::error::{Error, ErrorKind, Result};

/// How the first row of the input is interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HeaderPolicy {
    /// The input has no header row; every row is data.
    None,
    /// The first row names the columns and is excluded from the data rows.
    FirstLine,
    /// Decide from the first row itself: it is treated as headers exactly
    /// when every field is non-empty and all fields are pairwise
    /// distinct; otherwise it is data.
    Infer,
}

impl Default for HeaderPolicy {
    fn default() -> HeaderPolicy {
        HeaderPolicy::None
    }
}

/// Which scalars are discarded at field boundaries, outside quoting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TrimPolicy {
    /// No trimming.
    None,
    /// Discard Unicode whitespace.
    Whitespace,
    /// Discard exactly the given scalars.
    Scalars(Vec<char>),
}

impl Default for TrimPolicy {
    fn default() -> TrimPolicy {
        TrimPolicy::None
    }
}

impl TrimPolicy {
    pub(crate) fn matches(&self, c: char) -> bool {
        match *self {
            TrimPolicy::None => false,
            TrimPolicy::Whitespace => c.is_whitespace(),
            TrimPolicy::Scalars(ref set) => set.contains(&c),
        }
    }

    pub(crate) fn is_none(&self) -> bool {
        *self == TrimPolicy::None
    }
}

/// The resolved dialect shared by the reader and writer state machines.
///
/// Construction validates the delimiter pair and produces the raw scalar
/// views the state machines match against.
#[derive(Clone, Debug)]
pub struct Delimiters {
    pub(crate) field: Vec<char>,
    pub(crate) row: Vec<char>,
    pub(crate) escape: Option<char>,
}

impl Delimiters {
    /// Resolve and validate a delimiter configuration.
    ///
    /// The field and row delimiters must be non-empty, must differ, and
    /// neither may be a prefix of the other; the escape scalar must not
    /// occur in either. Violations report `InvalidConfiguration`.
    pub fn resolve(
        field: &str,
        row: &str,
        escape: Option<char>,
        trim: &TrimPolicy,
    ) -> Result<Delimiters> {
        let field: Vec<char> = field.chars().collect();
        let row: Vec<char> = row.chars().collect();
        if field.is_empty() {
            return Err(config_error("the field delimiter is empty"));
        }
        if row.is_empty() {
            return Err(config_error("the row delimiter is empty"));
        }
        if is_prefix(&field, &row) || is_prefix(&row, &field) {
            return Err(config_error(
                "the field and row delimiters overlap; neither may be a \
                 prefix of the other",
            ));
        }
        if let Some(esc) = escape {
            if field.contains(&esc) || row.contains(&esc) {
                return Err(config_error(
                    "the escape scalar occurs in a delimiter",
                ));
            }
        }
        if let Some(esc) = escape {
            if trim.matches(esc) {
                return Err(config_error("the escape scalar is trimmed"));
            }
        }
        Ok(Delimiters { field, row, escape })
    }

    pub(crate) fn field_str(&self) -> String {
        self.field.iter().collect()
    }

    pub(crate) fn row_str(&self) -> String {
        self.row.iter().collect()
    }
}

impl Default for Delimiters {
    fn default() -> Delimiters {
        Delimiters { field: vec![','], row: vec!['\n'], escape: Some('"') }
    }
}

fn is_prefix(shorter: &[char], longer: &[char]) -> bool {
    shorter.len() <= longer.len() && longer[..shorter.len()] == *shorter
}

fn config_error(msg: &str) -> Error {
    Error::new(ErrorKind::InvalidConfiguration { msg: msg.to_string() })
}
