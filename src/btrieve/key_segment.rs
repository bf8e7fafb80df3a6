//! A single key segment, as decoded from one `0x1E`-byte key definition
//! record.

use super::constants::attribute;
use crate::error::{BtrieveError, Result};

/// Data type of a key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDataType {
    String = 0,
    Integer = 1,
    Float = 2,
    Date = 3,
    Time = 4,
    Decimal = 5,
    Money = 6,
    Logical = 7,
    Numeric = 8,
    Bfloat = 9,
    Lstring = 0xA,
    Zstring = 0xB,
    Unsigned = 0xD,
    UnsignedBinary = 0xE,
    AutoInc = 0xF,
    OldAscii = 0x20,
    OldBinary = 0x21,
}

impl KeyDataType {
    /// Decode a raw data-type byte. `old_style_binary` selects the fallback
    /// used for key definitions that predate the extended data-type field
    /// (`UseExtendedDataType` not set in the attribute mask).
    pub fn from_raw(raw: u8, old_style_binary: bool) -> Result<Self> {
        Ok(match raw {
            0 => KeyDataType::String,
            1 => KeyDataType::Integer,
            2 => KeyDataType::Float,
            3 => KeyDataType::Date,
            4 => KeyDataType::Time,
            5 => KeyDataType::Decimal,
            6 => KeyDataType::Money,
            7 => KeyDataType::Logical,
            8 => KeyDataType::Numeric,
            9 => KeyDataType::Bfloat,
            0xA => KeyDataType::Lstring,
            0xB => KeyDataType::Zstring,
            0xD => KeyDataType::Unsigned,
            0xE => KeyDataType::UnsignedBinary,
            0xF => KeyDataType::AutoInc,
            0x20 => KeyDataType::OldAscii,
            0x21 => KeyDataType::OldBinary,
            _ if old_style_binary => KeyDataType::OldBinary,
            other => return Err(BtrieveError::NotBtrieveFile(format!(
                "unrecognized key data type {other:#x}"
            ))),
        })
    }

    pub fn is_string(self) -> bool {
        matches!(
            self,
            KeyDataType::String | KeyDataType::Lstring | KeyDataType::Zstring | KeyDataType::OldAscii
        )
    }
}

/// One segment of a key definition, decoded from the on-disk key definition
/// table.
///
/// A composite (segmented) key is represented as several `KeySegment`s
/// sharing the same [`KeySegment::number`], ordered by
/// [`KeySegment::segment_index`].
#[derive(Debug, Clone)]
pub struct KeySegment {
    pub number: u16,
    pub length: u16,
    pub offset: u16,
    pub data_type: KeyDataType,
    pub attributes: u16,
    pub is_segment: bool,
    pub segment_index: u16,
    pub null_value: u8,
    pub acs_name: Option<String>,
    pub acs: Option<Box<[u8; 256]>>,
}

impl KeySegment {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: u16,
        length: u16,
        offset: u16,
        data_type: KeyDataType,
        attributes: u16,
        is_segment: bool,
        segment_index: u16,
        null_value: u8,
        acs_name: Option<String>,
        acs: Option<Box<[u8; 256]>>,
    ) -> Result<Self> {
        let requires_acs = attributes & attribute::NUMBERED_ACS != 0;
        if requires_acs && (acs_name.is_none() || acs.is_none()) {
            return Err(BtrieveError::InvalidACS);
        }
        if data_type == KeyDataType::Float && length != 4 && length != 8 {
            return Err(BtrieveError::BadKeyLength(format!(
                "float key must be 4 or 8 bytes, got {length}"
            )));
        }
        Ok(KeySegment {
            number,
            length,
            offset,
            data_type,
            attributes,
            is_segment,
            segment_index,
            null_value,
            acs_name,
            acs,
        })
    }

    pub fn requires_acs(&self) -> bool {
        self.attributes & attribute::NUMBERED_ACS != 0
    }

    pub fn is_modifiable(&self) -> bool {
        self.attributes & attribute::MODIFIABLE != 0
    }

    pub fn allows_duplicates(&self) -> bool {
        self.attributes & (attribute::DUPLICATES | attribute::REPEATING_DUPLICATES_KEY) != 0
    }

    pub fn is_unique(&self) -> bool {
        !self.allows_duplicates()
    }

    pub fn is_nullable(&self) -> bool {
        self.attributes & (attribute::NULL_ALL_SEGMENTS | attribute::NULL_ANY_SEGMENT) != 0
            || self.data_type.is_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_key_requires_4_or_8_byte_length() {
        let err = KeySegment::new(
            0, 2, 0, KeyDataType::Float, 0, false, 0, 0, None, None,
        )
        .unwrap_err();
        assert_eq!(err, BtrieveError::BadKeyLength("float key must be 4 or 8 bytes, got 2".into()));
    }

    #[test]
    fn numbered_acs_without_table_is_rejected() {
        let err = KeySegment::new(
            0,
            4,
            0,
            KeyDataType::String,
            attribute::NUMBERED_ACS,
            false,
            0,
            0,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, BtrieveError::InvalidACS);
    }

    #[test]
    fn duplicates_and_repeating_duplicates_both_mean_not_unique() {
        let seg = KeySegment::new(
            0,
            4,
            0,
            KeyDataType::Integer,
            attribute::REPEATING_DUPLICATES_KEY,
            false,
            0,
            0,
            None,
            None,
        )
        .unwrap();
        assert!(!seg.is_unique());
        assert!(seg.allows_duplicates());
    }

    #[test]
    fn old_style_binary_fallback_accepts_unrecognized_raw_codes() {
        assert_eq!(KeyDataType::from_raw(0x99, true).unwrap(), KeyDataType::OldBinary);
        assert!(KeyDataType::from_raw(0x99, false).is_err());
    }
}
