use std::fmt;

/// A single step in a coding path: either a positional index or a header
/// name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Key {
    /// A zero-based row or column index.
    Index(u64),
    /// A column name, resolved against the header row.
    Name(String),
}

impl Key {
    /// The integer form of this key, when it has one.
    pub fn index(&self) -> Option<u64> {
        match *self {
            Key::Index(i) => Some(i),
            Key::Name(_) => None,
        }
    }
}

impl From<u64> for Key {
    fn from(i: u64) -> Key {
        Key::Index(i)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Key {
        Key::Index(i as u64)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Key {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Key {
        Key::Name(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(ref name) => f.write_str(name),
        }
    }
}

/// The ordered list of keys from the root container down to the current
/// coding site.
///
/// Paths are threaded by value through container operations; they are
/// never shared mutable state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CodingPath(Vec<Key>);

impl CodingPath {
    /// The empty path, addressing the file container.
    pub fn root() -> CodingPath {
        CodingPath(Vec::new())
    }

    /// The path one level below `self`.
    pub fn child(&self, key: Key) -> CodingPath {
        let mut keys = self.0.clone();
        keys.push(key);
        CodingPath(keys)
    }

    /// The keys of this path, outermost first.
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CodingPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}
