//! The composite key: one or more [`KeySegment`]s sharing a key number.

use super::key_segment::{KeyDataType, KeySegment};
use super::value::TypedValue;
use crate::error::{BtrieveError, Result};

/// A key, made of one or more ordered segments.
///
/// Segmented (composite) keys concatenate their segments' raw bytes in
/// declaration order before ACS application, null detection, and typed
/// conversion; a single-segment key behaves exactly like its lone segment.
#[derive(Debug, Clone)]
pub struct Key {
    segments: Vec<KeySegment>,
}

impl Key {
    /// Build a key from its segments, already ordered by `segment_index`.
    pub fn new(segments: Vec<KeySegment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(BtrieveError::BadKeyLength("key has no segments".into()));
        }
        Ok(Key { segments })
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    pub fn primary_segment(&self) -> &KeySegment {
        &self.segments[0]
    }

    pub fn number(&self) -> u16 {
        self.primary_segment().number
    }

    pub fn is_composite(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn is_modifiable(&self) -> bool {
        self.primary_segment().is_modifiable()
    }

    pub fn is_unique(&self) -> bool {
        self.primary_segment().is_unique()
    }

    pub fn is_nullable(&self) -> bool {
        self.primary_segment().is_nullable()
    }

    pub fn requires_acs(&self) -> bool {
        self.segments.iter().any(KeySegment::requires_acs)
    }

    pub fn length(&self) -> usize {
        self.segments.iter().map(|s| s.length as usize).sum()
    }

    /// The column name this key's indexed value is stored under in the
    /// `data_t` table.
    pub fn sql_key_name(&self) -> String {
        format!("key_{}", self.number())
    }

    /// Concatenate this key's segment bytes out of `record`.
    pub fn extract_key_data_from_record(&self, record: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.length());
        for seg in &self.segments {
            let start = seg.offset as usize;
            let end = start + seg.length as usize;
            let slice = record.get(start..end).ok_or_else(|| {
                BtrieveError::BadRecordLength(format!(
                    "record too short to extract key segment at {start}..{end}"
                ))
            })?;
            out.extend_from_slice(slice);
        }
        Ok(out)
    }

    fn is_all_same_byte(data: &[u8], value: u8) -> bool {
        data.iter().all(|&b| b == value)
    }

    /// True if the key's bytes within `record` are entirely the primary
    /// segment's null sentinel value.
    pub fn key_in_record_is_null(&self, record: &[u8]) -> Result<bool> {
        if !self.is_nullable() {
            return Ok(false);
        }
        let data = self.extract_key_data_from_record(record)?;
        Ok(Self::is_all_same_byte(&data, self.primary_segment().null_value))
    }

    /// Apply each segment's ACS table (if it has one) to already-extracted
    /// key bytes of this key's total length.
    pub fn apply_acs(&self, key_data: &[u8]) -> Vec<u8> {
        if !self.requires_acs() {
            return key_data.to_vec();
        }
        let mut dst = vec![0u8; key_data.len()];
        let mut offset = 0usize;
        for seg in &self.segments {
            let len = seg.length as usize;
            let src = &key_data[offset..offset + len];
            match &seg.acs {
                Some(table) => {
                    for i in 0..len {
                        dst[offset + i] = table[src[i] as usize];
                    }
                }
                None => dst[offset..offset + len].copy_from_slice(src),
            }
            offset += len;
        }
        dst
    }

    /// Extract a null-terminated-prefix ASCII string from `b` (length is
    /// the offset of the first `0x00` byte, or the whole slice if none).
    fn extract_null_terminated_string(b: &[u8]) -> String {
        let len = b.iter().position(|&c| c == 0).unwrap_or(b.len());
        String::from_utf8_lossy(&b[..len]).into_owned()
    }

    /// Convert this key's raw bytes within `record` into the [`TypedValue`]
    /// stored in the indexed `data_t` key column.
    pub fn extract_key_in_record_to_typed_value(&self, record: &[u8]) -> Result<TypedValue> {
        let raw = self.extract_key_data_from_record(record)?;
        self.key_data_to_typed_value(&raw)
    }

    /// Convert already-extracted key bytes into the [`TypedValue`] this key
    /// stores in SQL.
    pub fn key_data_to_typed_value(&self, key_data: &[u8]) -> Result<TypedValue> {
        if self.is_nullable() && Self::is_all_same_byte(key_data, self.primary_segment().null_value) {
            return Ok(TypedValue::Null);
        }

        let key_data = self.apply_acs(key_data);

        if self.is_composite() {
            return Ok(TypedValue::Blob(key_data));
        }

        let seg = self.primary_segment();
        use byteorder::{ByteOrder, LittleEndian};
        Ok(match seg.data_type {
            KeyDataType::Unsigned | KeyDataType::UnsignedBinary | KeyDataType::OldBinary => {
                match seg.length {
                    2 => TypedValue::Integer(LittleEndian::read_u16(&key_data) as i64),
                    4 => TypedValue::Integer(LittleEndian::read_u32(&key_data) as i64),
                    6 => {
                        let low = LittleEndian::read_u32(&key_data[0..4]) as u64;
                        let high = LittleEndian::read_u16(&key_data[4..6]) as u64;
                        TypedValue::Integer((low | (high << 32)) as i64)
                    }
                    8 => TypedValue::Integer(LittleEndian::read_u64(&key_data) as i64),
                    _ => {
                        let mut reversed = key_data.clone();
                        reversed.reverse();
                        TypedValue::Blob(reversed)
                    }
                }
            }
            KeyDataType::AutoInc | KeyDataType::Integer => match seg.length {
                2 => TypedValue::Integer(LittleEndian::read_i16(&key_data) as i64),
                4 => TypedValue::Integer(LittleEndian::read_i32(&key_data) as i64),
                6 => {
                    let low = LittleEndian::read_u32(&key_data[0..4]) as i64;
                    let high = LittleEndian::read_i16(&key_data[4..6]) as i64;
                    TypedValue::Integer(low | (high << 32))
                }
                8 => TypedValue::Integer(LittleEndian::read_i64(&key_data)),
                other => {
                    return Err(BtrieveError::BadKeyLength(format!(
                        "bad integer key length {other}"
                    )))
                }
            },
            KeyDataType::String | KeyDataType::Lstring | KeyDataType::Zstring | KeyDataType::OldAscii => {
                TypedValue::Text(Self::extract_null_terminated_string(&key_data))
            }
            KeyDataType::Float => match seg.length {
                4 => TypedValue::Double(LittleEndian::read_f32(&key_data) as f64),
                8 => TypedValue::Double(LittleEndian::read_f64(&key_data)),
                other => {
                    return Err(BtrieveError::BadKeyLength(format!(
                        "float key must be 4 or 8 bytes, got {other}"
                    )))
                }
            },
            _ => TypedValue::Blob(key_data),
        })
    }

    /// The SQL column type used for this key's indexed column, matching the
    /// typed-conversion rules above.
    pub fn sql_column_type(&self) -> String {
        let mut ty = if self.is_composite() {
            "BLOB".to_string()
        } else {
            let seg = self.primary_segment();
            match seg.data_type {
                KeyDataType::AutoInc => return "INTEGER NOT NULL UNIQUE".to_string(),
                KeyDataType::Integer
                | KeyDataType::Unsigned
                | KeyDataType::UnsignedBinary
                | KeyDataType::OldBinary
                    if seg.length <= 8 =>
                {
                    "INTEGER".to_string()
                }
                KeyDataType::String | KeyDataType::Lstring | KeyDataType::Zstring | KeyDataType::OldAscii => {
                    "TEXT".to_string()
                }
                _ => "BLOB".to_string(),
            }
        };
        if !self.is_nullable() {
            ty.push_str(" NOT NULL");
        }
        if self.is_unique() {
            ty.push_str(" UNIQUE");
        }
        ty
    }
}
