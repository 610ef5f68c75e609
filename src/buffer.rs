use std::collections::BTreeMap;

use log::trace;

/// How rows produced by the reader are retained for random access.
///
/// A third strategy, "unfulfilled" (drop each row after its first
/// delivery), is reserved but its eviction policy is not settled, so it
/// cannot be constructed yet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadBuffering {
    /// Every row is retained indefinitely. Any earlier row can be
    /// revisited at the cost of holding the whole input in memory.
    KeepAll,
    /// Only the most recently produced row is retained. Revisiting an
    /// earlier row reports `ExpiredCache`.
    Sequential,
}

impl Default for ReadBuffering {
    fn default() -> ReadBuffering {
        ReadBuffering::KeepAll
    }
}

/// How fields put ahead of the writer's focus are staged.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteBuffering {
    /// Every field is staged and flushed only when the encoding
    /// completes. Required when the row width is unknown up front, since
    /// the writer cannot emit a row terminator before the width is
    /// settled.
    KeepAll,
    /// A row is flushed as soon as all of its fields are present
    /// contiguously at the writer's focus. Requires a known row width
    /// (a configured header row).
    Assembled,
    /// Fields at the focus are written through immediately and staging
    /// is limited to coordinates ahead of the focus. Writing behind the
    /// focus reports `WritingSurpassed`.
    Sequential,
}

impl Default for WriteBuffering {
    fn default() -> WriteBuffering {
        WriteBuffering::KeepAll
    }
}

/// Retention of rows already produced by the reader.
#[derive(Debug)]
pub(crate) struct RowBuffer {
    strategy: ReadBuffering,
    rows: BTreeMap<u64, Vec<String>>,
}

impl RowBuffer {
    pub(crate) fn new(strategy: ReadBuffering) -> RowBuffer {
        RowBuffer { strategy, rows: BTreeMap::new() }
    }

    /// Store a freshly produced row. Under `Sequential`, this evicts
    /// every earlier row.
    pub(crate) fn store(&mut self, index: u64, row: Vec<String>) {
        if self.strategy == ReadBuffering::Sequential && !self.rows.is_empty()
        {
            trace!("evicting buffered rows before row {}", index);
            self.rows.clear();
        }
        self.rows.insert(index, row);
    }

    /// The row at `index`, when the strategy still retains it.
    pub(crate) fn retrieve(&self, index: u64) -> Option<&Vec<String>> {
        self.rows.get(&index)
    }
}

/// Staged fields for rows the writer has not reached yet, keyed by
/// coordinate.
#[derive(Debug, Default)]
pub(crate) struct FieldBuffer {
    fields: BTreeMap<(u64, u64), String>,
}

impl FieldBuffer {
    pub(crate) fn new() -> FieldBuffer {
        FieldBuffer::default()
    }

    pub(crate) fn stage(&mut self, row: u64, field: u64, value: String) {
        self.fields.insert((row, field), value);
    }

    pub(crate) fn take(&mut self, row: u64, field: u64) -> Option<String> {
        self.fields.remove(&(row, field))
    }

    /// The smallest staged coordinate, in row-major order.
    pub(crate) fn first_coordinate(&self) -> Option<(u64, u64)> {
        self.fields.keys().next().copied()
    }

    /// The largest staged field index across all rows.
    pub(crate) fn max_field(&self) -> Option<u64> {
        self.fields.keys().map(|&(_, field)| field).max()
    }

    /// The largest staged row index.
    pub(crate) fn max_row(&self) -> Option<u64> {
        self.fields.keys().map(|&(row, _)| row).max()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }
}
