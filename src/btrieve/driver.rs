//! The stateful per-handle facade: owns one opened store, the last query,
//! and dispatches normalized [`OperationCode`]s the way the legacy call
//! surface did, without reproducing its raw fixed-size-buffer ABI.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::key_segment::KeyDataType;
use super::open_mode::OpenMode;
use super::operation::OperationCode;
use super::query::Query;
use super::record::Record;
use super::store::SqlStore;
use super::value::TypedValue;
use crate::error::{BtrieveError, Result};

/// What a successful [`Driver::perform`] call produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A record was acquired, along with the bytes of the key that was
    /// queried (if any) extracted from it.
    Record { record: Record, key: Vec<u8> },
    /// The current physical position (`GetPosition`).
    Position(u32),
    /// Number of records in the store (`Stat`).
    RecordCount(u32),
    /// An operation that has no data to return (`Close`, `Delete`, ...).
    Unit,
}

/// One opened handle onto a legacy file's SQL-backed store.
pub struct Driver {
    store: Arc<Mutex<SqlStore>>,
    previous_query: Option<Query>,
    opened_filename: PathBuf,
    open_mode: OpenMode,
}

impl Driver {
    /// Open `path` (a legacy `.DAT` file or an already-converted `.db`
    /// store), converting in place the first time a `.DAT` file is seen.
    pub fn open(path: impl AsRef<Path>, open_mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let db_path = path.with_extension("db");

        let store = if db_path.exists() {
            SqlStore::open(&db_path)?
        } else {
            SqlStore::create(path, &db_path)?
        };

        Ok(Driver {
            store: Arc::new(Mutex::new(store)),
            previous_query: None,
            opened_filename: path.to_path_buf(),
            open_mode,
        })
    }

    /// Share this handle's store with another handle opened on the same
    /// canonical path, serializing access behind the shared mutex.
    pub fn share(&self) -> Arc<Mutex<SqlStore>> {
        Arc::clone(&self.store)
    }

    pub fn opened_filename(&self) -> &Path {
        &self.opened_filename
    }

    pub fn open_mode(&self) -> OpenMode {
        self.open_mode
    }

    fn key_value_from_bytes(store: &SqlStore, key_number: u16, key_bytes: &[u8]) -> Result<TypedValue> {
        let key = store.key_by_number(key_number)?;
        if key_bytes.len() < key.length() {
            return Err(BtrieveError::KeyBufferTooShort {
                need: key.length(),
                got: key_bytes.len(),
            });
        }
        key.key_data_to_typed_value(&key_bytes[..key.length()])
    }

    fn extract_key(store: &SqlStore, key_number: u16, data: &[u8]) -> Result<Vec<u8>> {
        store.key_by_number(key_number)?.extract_key_data_from_record(data)
    }

    /// Run one normalized operation. `key_bytes` is consulted for
    /// operations that require a key value to seek by; `record` is
    /// consulted for `Insert`/`Update`. `data_buffer_len`, if supplied, is
    /// the size of the caller's data buffer: an operation that would
    /// return a record body larger than it fails with
    /// `DataBufferLengthOverrun` instead, and leaves the handle's position
    /// and previous query exactly as they were before the call. Pass
    /// `None` when the caller has no fixed-size buffer to police.
    pub fn perform(
        &mut self,
        operation: OperationCode,
        key_number: Option<u16>,
        key_bytes: &[u8],
        record: Option<&[u8]>,
        data_buffer_len: Option<usize>,
    ) -> Result<Outcome> {
        let mut store = self.store.lock().unwrap_or_else(|p| p.into_inner());
        let old_position = store.position;
        let old_query = self.previous_query.clone();

        let outcome = (match operation {
            OperationCode::Insert => {
                let data = record.ok_or(BtrieveError::DataBufferLengthOverrun { need: 1, got: 0 })?;
                let position = store.insert_record(data)?;
                Ok(Outcome::Position(position))
            }
            OperationCode::Update => {
                let data = record.ok_or(BtrieveError::DataBufferLengthOverrun { need: 1, got: 0 })?;
                let position = store.position;
                store.update_record(position, data)?;
                Ok(Outcome::Unit)
            }
            OperationCode::Delete => {
                store.delete_record()?;
                Ok(Outcome::Unit)
            }

            OperationCode::StepFirst
            | OperationCode::StepLast
            | OperationCode::StepNext
            | OperationCode::StepNextExtended
            | OperationCode::StepPrevious
            | OperationCode::StepPreviousExtended => {
                let old_position = store.position;
                let result = match operation {
                    OperationCode::StepFirst => store.step_first(),
                    OperationCode::StepLast => store.step_last(),
                    OperationCode::StepNext | OperationCode::StepNextExtended => store.step_next(),
                    _ => store.step_previous(),
                };
                match result {
                    Ok(record) => Ok(Outcome::Record { record, key: Vec::new() }),
                    Err(e) => {
                        store.position = old_position;
                        Err(e)
                    }
                }
            }

            OperationCode::GetPosition => Ok(Outcome::Position(store.position)),

            OperationCode::GetDirectChunkOrRecord => {
                let position = u32::from_le_bytes(
                    key_bytes
                        .get(0..4)
                        .ok_or(BtrieveError::KeyBufferTooShort { need: 4, got: key_bytes.len() })?
                        .try_into()
                        .unwrap(),
                );
                let record = store.get_record(position)?;
                let key = match key_number {
                    Some(n) => {
                        let query = store.logical_currency_seek(n, position)?;
                        let key = Self::extract_key(&store, n, &record.data)?;
                        self.previous_query = Some(query);
                        key
                    }
                    None => Vec::new(),
                };
                Ok(Outcome::Record { record, key })
            }

            OperationCode::Stat => Ok(Outcome::RecordCount(store.record_count()?)),

            OperationCode::AcquireEqual
            | OperationCode::AcquireGreater
            | OperationCode::AcquireGreaterOrEqual
            | OperationCode::AcquireLess
            | OperationCode::AcquireLessOrEqual
            | OperationCode::QueryEqual
            | OperationCode::QueryGreater
            | OperationCode::QueryGreaterOrEqual
            | OperationCode::QueryLess
            | OperationCode::QueryLessOrEqual => {
                let key_number = key_number.ok_or(BtrieveError::InvalidKeyNumber(0))?;
                let value = Self::key_value_from_bytes(&store, key_number, key_bytes)?;
                let mut query = store.new_query(key_number)?;
                let record = match operation {
                    OperationCode::AcquireEqual | OperationCode::QueryEqual => {
                        store.get_by_key_equal(&mut query, &value)
                    }
                    OperationCode::AcquireGreater | OperationCode::QueryGreater => {
                        store.get_by_key_greater(&mut query, &value)
                    }
                    OperationCode::AcquireGreaterOrEqual | OperationCode::QueryGreaterOrEqual => {
                        store.get_by_key_greater_or_equal(&mut query, &value)
                    }
                    OperationCode::AcquireLess | OperationCode::QueryLess => {
                        store.get_by_key_less(&mut query, &value)
                    }
                    _ => store.get_by_key_less_or_equal(&mut query, &value),
                }?;
                let key = Self::extract_key(&store, key_number, &record.data)?;
                self.previous_query = Some(query);
                Ok(Outcome::Record { record, key })
            }

            OperationCode::AcquireFirst | OperationCode::QueryFirst => {
                let key_number = key_number.ok_or(BtrieveError::InvalidKeyNumber(0))?;
                let mut query = store.new_query(key_number)?;
                let record = store.get_by_key_first(&mut query)?;
                let key = Self::extract_key(&store, key_number, &record.data)?;
                self.previous_query = Some(query);
                Ok(Outcome::Record { record, key })
            }

            OperationCode::AcquireLast | OperationCode::QueryLast => {
                let key_number = key_number.ok_or(BtrieveError::InvalidKeyNumber(0))?;
                let mut query = store.new_query(key_number)?;
                let record = store.get_by_key_last(&mut query)?;
                let key = Self::extract_key(&store, key_number, &record.data)?;
                self.previous_query = Some(query);
                Ok(Outcome::Record { record, key })
            }

            OperationCode::AcquireNext
            | OperationCode::AcquirePrevious
            | OperationCode::QueryNext
            | OperationCode::QueryPrevious => {
                let mut query = self.previous_query.take().ok_or(BtrieveError::InvalidPositioning)?;
                let result = match operation {
                    OperationCode::AcquireNext | OperationCode::QueryNext => {
                        store.get_by_key_next(&mut query)
                    }
                    _ => store.get_by_key_previous(&mut query),
                };
                match result {
                    Ok(record) => {
                        let key = Self::extract_key(&store, query.key_number, &record.data)?;
                        self.previous_query = Some(query);
                        Ok(Outcome::Record { record, key })
                    }
                    Err(e) => {
                        self.previous_query = Some(query);
                        Err(e)
                    }
                }
            }

            OperationCode::Close
            | OperationCode::Create
            | OperationCode::Extend
            | OperationCode::SetOwner
            | OperationCode::Stop
            | OperationCode::Open => Ok(Outcome::Unit),
        })?;

        if let Outcome::Record { record, .. } = &outcome {
            if let Some(cap) = data_buffer_len {
                if cap < record.data.len() {
                    store.position = old_position;
                    self.previous_query = old_query;
                    return Err(BtrieveError::DataBufferLengthOverrun {
                        need: record.data.len(),
                        got: cap,
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Position a new query for `key_number` at the key value found in the
    /// record at `position`, equivalent to the legacy "logical currency
    /// seek" used by `GetDirectChunkOrRecord` with a key number supplied.
    pub fn logical_currency_seek(&mut self, key_number: u16, position: u32) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|p| p.into_inner());
        let query = store.logical_currency_seek(key_number, position)?;
        self.previous_query = Some(query);
        Ok(())
    }
}

/// `AutoInc` keys are exempt from the "supplied key value" requirement on
/// insert: their field is filled in from the store rather than the
/// caller's buffer. Exposed so a driver caller can decide whether to
/// validate a key buffer's length before calling `perform`.
pub fn key_is_caller_supplied(data_type: KeyDataType) -> bool {
    !matches!(data_type, KeyDataType::AutoInc)
}
