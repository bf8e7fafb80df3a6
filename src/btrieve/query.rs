//! The keyed cursor: tracks which key is being scanned, in which direction,
//! and where the last row was served from.

use super::value::TypedValue;

/// Which way a cursor is currently scanning its key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDirection {
    Seek,
    Forward,
    Reverse,
}

/// State needed to resume a keyed scan: the key being queried, the value
/// last bound into the scan's `WHERE` clause, and the position of the row
/// last served (so a direction reversal can skip past it, matching
/// duplicate-key rows that would otherwise be re-served).
#[derive(Debug, Clone)]
pub struct Query {
    pub key_number: u16,
    pub cursor_direction: CursorDirection,
    pub last_key_value: Option<TypedValue>,
    pub last_position: Option<u32>,
}

impl Query {
    pub fn new(key_number: u16) -> Self {
        Query {
            key_number,
            cursor_direction: CursorDirection::Seek,
            last_key_value: None,
            last_position: None,
        }
    }

    pub(crate) fn record_served(&mut self, direction: CursorDirection, key_value: TypedValue, position: u32) {
        self.cursor_direction = direction;
        self.last_key_value = Some(key_value);
        self.last_position = Some(position);
    }
}
