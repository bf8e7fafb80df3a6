//! A single record: its store position and raw bytes.

/// A record read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub position: u32,
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(position: u32, data: Vec<u8>) -> Self {
        Record { position, data }
    }
}
