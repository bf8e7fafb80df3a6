//! Decoder for the legacy paged `.DAT` record-manager file format.
//!
//! Reads the 512-byte file control record, the deleted-record linked list,
//! the optional ACS page, the key definition table, and finally walks every
//! data page to recover fixed or variable-length records.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use super::constants::*;
use super::key::Key;
use super::key_segment::{KeyDataType, KeySegment};
use crate::error::{BtrieveError, Result};

/// A fully decoded legacy file: header metadata, deleted-record positions,
/// optional ACS table, and key definitions. Records themselves are streamed
/// through [`Database::for_each_record`] rather than held in memory.
#[derive(Debug)]
pub struct Database {
    pub page_length: u16,
    pub page_count: u32,
    pub record_count: u32,
    pub record_length: u16,
    pub physical_record_length: u16,
    pub variable_length_records: bool,
    pub keys: Vec<Key>,
    pub acs_name: Option<String>,
    pub acs: Option<Box<[u8; 256]>>,
    file_length: u64,
    deleted_record_offsets: HashSet<u32>,
}

fn record_pointer(data: &[u8]) -> u32 {
    (LittleEndian::read_u16(&data[0..2]) as u32) << 16
        | LittleEndian::read_u16(&data[2..4]) as u32
}

impl Database {
    /// Open and fully decode `path`'s header, deleted list, ACS page and key
    /// definitions. Does not yet read any data page.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_length = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        let mut first_page = [0u8; PAGE_ZERO_SIZE];
        file.read_exact(&mut first_page)?;

        let header = Header::validate(&first_page, file_length)?;

        let deleted_record_offsets = Self::load_deleted_record_list(&mut file)?;

        let (acs_name, acs) = Self::load_acs(&mut file, header.page_length)?;

        let keys = Self::load_key_definitions(
            &first_page,
            header.key_count,
            acs_name.clone(),
            acs.clone(),
        )?;

        Ok(Database {
            page_length: header.page_length,
            page_count: header.page_count,
            record_count: header.record_count,
            record_length: header.record_length,
            physical_record_length: header.physical_record_length,
            variable_length_records: header.variable_length_records,
            keys,
            acs_name,
            acs,
            file_length,
            deleted_record_offsets,
        })
    }

    fn load_deleted_record_list(file: &mut File) -> Result<HashSet<u32>> {
        let mut set = HashSet::new();
        let mut cursor = read_pointer_at(file, FCR_DELETED_LIST_HEAD as u64)?;
        while cursor != u32::MAX {
            if !set.insert(cursor) {
                // revisiting an offset means a cycle; stop rather than loop forever.
                break;
            }
            cursor = read_pointer_at(file, cursor as u64)?;
        }
        Ok(set)
    }

    fn load_acs(file: &mut File, page_length: u16) -> Result<(Option<String>, Option<Box<[u8; 256]>>)> {
        file.seek(SeekFrom::Start(page_length as u64))?;
        let mut page = vec![0u8; PAGE_ZERO_SIZE];
        file.read_exact(&mut page)?;

        if page[..ACS_PAGE_MAGIC.len()] != ACS_PAGE_MAGIC[..] {
            return Ok((None, None));
        }

        let name_bytes = &page[ACS_NAME_OFFSET..ACS_NAME_OFFSET + ACS_NAME_LENGTH];
        let len = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        let name = String::from_utf8_lossy(&name_bytes[..len]).into_owned();

        let mut table = Box::new([0u8; ACS_LENGTH]);
        table.copy_from_slice(&page[ACS_TABLE_OFFSET..ACS_TABLE_OFFSET + ACS_LENGTH]);

        Ok((Some(name), Some(table)))
    }

    fn load_key_definitions(
        first_page: &[u8],
        key_count: u16,
        acs_name: Option<String>,
        acs: Option<Box<[u8; 256]>>,
    ) -> Result<Vec<Key>> {
        let mut per_key: Vec<Vec<KeySegment>> = Vec::new();
        let mut base = KEY_DEFINITION_BASE;
        let mut current_key_number = 0u16;

        while (current_key_number as usize) < key_count as usize {
            let data = &first_page[base..base + KEY_DEFINITION_LENGTH];
            let attributes = LittleEndian::read_u16(&data[KEY_DEF_ATTRIBUTES..KEY_DEF_ATTRIBUTES + 2]);
            let old_style_binary = attributes & attribute::OLD_STYLE_BINARY != 0;
            let is_segment = attributes & attribute::SEGMENTED_KEY != 0;

            let data_type = if attributes & attribute::USE_EXTENDED_DATA_TYPE != 0 {
                KeyDataType::from_raw(data[KEY_DEF_DATA_TYPE], old_style_binary)?
            } else if old_style_binary {
                KeyDataType::OldBinary
            } else {
                KeyDataType::OldAscii
            };

            let segment = KeySegment::new(
                current_key_number,
                LittleEndian::read_u16(&data[KEY_DEF_LENGTH..KEY_DEF_LENGTH + 2]),
                LittleEndian::read_u16(&data[KEY_DEF_OFFSET..KEY_DEF_OFFSET + 2]),
                data_type,
                attributes,
                is_segment,
                0,
                data[KEY_DEF_NULL_VALUE],
                acs_name.clone(),
                acs.clone(),
            )?;

            if per_key.len() <= current_key_number as usize {
                per_key.resize(current_key_number as usize + 1, Vec::new());
            }
            per_key[current_key_number as usize].push(segment);

            if !is_segment {
                current_key_number += 1;
            }
            base += KEY_DEFINITION_LENGTH;
        }

        per_key
            .into_iter()
            .map(|mut segments| {
                for (i, seg) in segments.iter_mut().enumerate() {
                    seg.segment_index = i as u16;
                }
                Key::new(segments)
            })
            .collect()
    }

    fn is_unused_record(&self, data: &[u8]) -> bool {
        if data.len() < 4 || !data[4..].iter().all(|&b| b == 0) {
            return false;
        }
        record_pointer(data) < self.file_length as u32
    }

    /// Stream every live record in declaration order, calling `on_record`
    /// with its byte position and assembled bytes. `on_record` returns
    /// `false` to stop the walk early.
    pub fn for_each_record<F>(&self, path: impl AsRef<Path>, mut on_record: F) -> Result<()>
    where
        F: FnMut(u32, &[u8]) -> Result<bool>,
    {
        if self.record_count == 0 {
            return Ok(());
        }

        let mut file = File::open(path)?;
        let page_length = self.page_length as u64;
        let records_in_page =
            (self.page_length as usize - PAGE_RECORD_AREA_START) / self.physical_record_length as usize;

        let mut records_loaded = 0u32;
        let mut page_offset = page_length;

        file.seek(SeekFrom::Start(page_length))?;
        let mut page = vec![0u8; self.page_length as usize];

        'pages: for _ in 1..=self.page_count {
            file.read_exact(&mut page)?;

            if page[PAGE_USAGE_COUNT] & 0x80 == 0 {
                page_offset += page_length;
                continue;
            }

            let mut record_offset = PAGE_RECORD_AREA_START;
            for _ in 0..records_in_page {
                if records_loaded == self.record_count {
                    break 'pages;
                }

                let absolute = page_offset + record_offset as u64;
                if self.deleted_record_offsets.contains(&(absolute as u32)) {
                    record_offset += self.physical_record_length as usize;
                    continue;
                }

                let record = &page[record_offset..record_offset + self.record_length as usize];
                if self.is_unused_record(record) {
                    break;
                }

                if self.variable_length_records {
                    let mut stream = record.to_vec();
                    let fragment_pointer = &page[record_offset + self.record_length as usize
                        ..record_offset + self.physical_record_length as usize];
                    let tail = self.get_variable_length_data(&mut file, fragment_pointer)?;
                    stream.extend_from_slice(&tail);
                    if !on_record(absolute as u32, &stream)? {
                        break 'pages;
                    }
                } else if !on_record(absolute as u32, record)? {
                    break 'pages;
                }

                records_loaded += 1;
                record_offset += self.physical_record_length as usize;
            }

            page_offset += page_length;
        }

        if records_loaded != self.record_count {
            eprintln!(
                "file declares {} records but only read {}",
                self.record_count, records_loaded
            );
        }

        Ok(())
    }

    /// Compute the byte offset and length of `fragment` within `page`, and
    /// whether a further fragment follows it.
    fn get_fragment(
        &self,
        page: &[u8],
        fragment: u32,
        num_fragments: u32,
    ) -> Result<(u32, u32, bool)> {
        let page_length = self.page_length as u32;
        let offset_pointer = page_length - 2 * (fragment + 1);
        let (offset, next_pointer_exists) =
            fragment_array_entry(&page[offset_pointer as usize..offset_pointer as usize + 2]);

        let mut next_fragment_offset = offset_pointer;
        let mut next_offset = 0xFFFFFFFFu32;
        for _ in (fragment + 1)..=num_fragments {
            next_fragment_offset -= 2;
            let (candidate, _) = fragment_array_entry(
                &page[next_fragment_offset as usize..next_fragment_offset as usize + 2],
            );
            if candidate == 0xFFFF {
                continue;
            }
            next_offset = candidate as u32;
            break;
        }

        if next_offset == 0xFFFFFFFF {
            return Err(BtrieveError::BadRecordLength(format!(
                "can't find next fragment offset, numFragments {num_fragments}"
            )));
        }

        let length = next_offset - offset as u32;
        if (offset as u32) < 0xC || offset as u32 + length > page_length - 2 * (num_fragments + 1) {
            return Err(BtrieveError::BadRecordLength(format!(
                "variable data overflows page at offset {offset}, numFragments {num_fragments}"
            )));
        }

        Ok((offset as u32, length, next_pointer_exists))
    }

    fn get_variable_length_data(&self, file: &mut File, pointer: &[u8]) -> Result<Vec<u8>> {
        let saved_position = file.stream_position()?;

        let mut vrec_page = (pointer[0] as u32) << 16 | pointer[1] as u32 | (pointer[2] as u32) << 8;
        let mut vrec_fragment = pointer[3] as u32;

        let mut stream = Vec::new();
        let mut page = vec![0u8; self.page_length as usize];

        loop {
            if vrec_page == OVERFLOW_SENTINEL_PAGE && vrec_fragment == OVERFLOW_SENTINEL_FRAGMENT as u32 {
                break;
            }

            file.seek(SeekFrom::Start(vrec_page as u64 * self.page_length as u64))?;
            file.read_exact(&mut page)?;

            let num_fragments = LittleEndian::read_u16(
                &page[OVERFLOW_FRAGMENT_COUNT..OVERFLOW_FRAGMENT_COUNT + 2],
            ) as u32;
            let (offset, length, next_pointer_exists) =
                self.get_fragment(&page, vrec_fragment, num_fragments)?;

            let fragment_data = &page[offset as usize..offset as usize + length as usize];
            if !next_pointer_exists {
                stream.extend_from_slice(fragment_data);
                break;
            }

            vrec_page = (fragment_data[0] as u32) << 16
                | fragment_data[1] as u32
                | (fragment_data[2] as u32) << 8;
            vrec_fragment = fragment_data[3] as u32;
            stream.extend_from_slice(&fragment_data[4..]);
        }

        file.seek(SeekFrom::Start(saved_position))?;
        Ok(stream)
    }
}

fn fragment_array_entry(entry: &[u8]) -> (u16, bool) {
    if entry[0] == 0xFF && entry[1] == 0xFF {
        return (OVERFLOW_UNUSED_FRAGMENT_ENTRY, false);
    }
    let offset = entry[0] as u16 | ((entry[1] as u16 & 0x7F) << 8);
    let next_pointer_exists = entry[1] & 0x80 != 0;
    (offset, next_pointer_exists)
}

fn read_pointer_at(file: &mut File, offset: u64) -> Result<u32> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf)?;
    Ok(record_pointer(&buf))
}

struct Header {
    page_length: u16,
    page_count: u32,
    record_count: u32,
    record_length: u16,
    physical_record_length: u16,
    variable_length_records: bool,
    key_count: u16,
}

impl Header {
    fn validate(first_page: &[u8], file_length: u64) -> Result<Self> {
        if first_page[0] == b'F' && first_page[1] == b'C' {
            return Err(BtrieveError::NotBtrieveFile(
                "v6 Btrieve databases are not supported, only v5".into(),
            ));
        }
        if first_page[0] != 0 || first_page[1] != 0 || first_page[2] != 0 || first_page[3] != 0 {
            return Err(BtrieveError::NotBtrieveFile("bad header".into()));
        }

        let version_code = (first_page[FCR_VERSION] as u32) << 16 | first_page[FCR_VERSION + 1] as u32;
        if !SUPPORTED_VERSIONS.contains(&(version_code as u8)) {
            return Err(BtrieveError::NotBtrieveFile(format!(
                "invalid version code {version_code}, wanted 3/4/5"
            )));
        }

        let needs_recovery = first_page[FCR_NEEDS_RECOVERY] == 0xFF
            && first_page[FCR_NEEDS_RECOVERY + 1] == 0xFF;
        if needs_recovery {
            return Err(BtrieveError::NotBtrieveFile(
                "database is marked inconsistent and needs recovery".into(),
            ));
        }

        let page_length = LittleEndian::read_u16(&first_page[FCR_PAGE_LENGTH..FCR_PAGE_LENGTH + 2]);
        if page_length < 512 || page_length & 0x1FF != 0 {
            return Err(BtrieveError::NotBtrieveFile(format!(
                "page length must be a multiple of 512, got {page_length}"
            )));
        }

        let accel_flags = LittleEndian::read_u16(&first_page[FCR_ACCEL_FLAGS..FCR_ACCEL_FLAGS + 2]);
        if accel_flags != 0 {
            return Err(BtrieveError::NotBtrieveFile(format!(
                "invalid accel flags, got {accel_flags}, expected 0"
            )));
        }

        let user_flags = LittleEndian::read_u16(&first_page[FCR_USER_FLAGS..FCR_USER_FLAGS + 2]);
        if user_flags & USER_FLAG_COMPRESSED != 0 {
            return Err(BtrieveError::NotBtrieveFile("compressed databases are not supported".into()));
        }

        let variable_length_records = user_flags & USER_FLAG_VARIABLE_LENGTH != 0;
        let records_contain_variable_length = first_page[FCR_VARIABLE_LENGTH_FLAG_BYTE] == 0xFF;
        if variable_length_records != records_contain_variable_length {
            return Err(BtrieveError::NotBtrieveFile("mismatched variable length fields".into()));
        }

        let page_count = (file_length / page_length as u64 - 1) as u32;

        let record_count = (LittleEndian::read_u16(
            &first_page[FCR_RECORD_COUNT_HIGH..FCR_RECORD_COUNT_HIGH + 2],
        ) as u32)
            << 16
            | LittleEndian::read_u16(&first_page[FCR_RECORD_COUNT_LOW..FCR_RECORD_COUNT_LOW + 2]) as u32;

        let record_length =
            LittleEndian::read_u16(&first_page[FCR_RECORD_LENGTH..FCR_RECORD_LENGTH + 2]);
        let physical_record_length = LittleEndian::read_u16(
            &first_page[FCR_PHYSICAL_RECORD_LENGTH..FCR_PHYSICAL_RECORD_LENGTH + 2],
        );
        let key_count = LittleEndian::read_u16(&first_page[FCR_KEY_COUNT..FCR_KEY_COUNT + 2]);

        Ok(Header {
            page_length,
            page_count,
            record_count,
            record_length,
            physical_record_length,
            variable_length_records,
            key_count,
        })
    }
}
