//! End-to-end scenarios against synthetic legacy `.DAT` fixtures.
//!
//! These build minimal paged files in memory (matching the on-disk layout
//! `recman::btrieve::database` decodes) and drive them through the full
//! `Driver::open` → `perform` pipeline, the same path a real caller uses.

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};
use tempfile::NamedTempFile;

use recman::btrieve::constants::*;
use recman::btrieve::{Driver, KeyDataType, OpenMode, OperationCode, TypedValue};
use recman::BtrieveError;

const PAGE: usize = 512;

fn header_page(
    key_count: u16,
    record_count: u32,
    record_length: u16,
    physical_record_length: u16,
    variable_length: bool,
) -> [u8; PAGE] {
    let mut page = [0u8; PAGE];
    LittleEndian::write_u16(&mut page[FCR_PAGE_LENGTH..], PAGE as u16);
    page[FCR_VERSION] = 0;
    page[FCR_VERSION + 1] = 5;
    LittleEndian::write_u16(&mut page[FCR_KEY_COUNT..], key_count);
    LittleEndian::write_u16(&mut page[FCR_RECORD_LENGTH..], record_length);
    LittleEndian::write_u16(&mut page[FCR_PHYSICAL_RECORD_LENGTH..], physical_record_length);
    LittleEndian::write_u16(&mut page[FCR_RECORD_COUNT_HIGH..], (record_count >> 16) as u16);
    LittleEndian::write_u16(&mut page[FCR_RECORD_COUNT_LOW..], (record_count & 0xFFFF) as u16);
    page[FCR_DELETED_LIST_HEAD] = 0xFF;
    page[FCR_DELETED_LIST_HEAD + 1] = 0xFF;
    page[FCR_DELETED_LIST_HEAD + 2] = 0xFF;
    page[FCR_DELETED_LIST_HEAD + 3] = 0xFF;
    if variable_length {
        let mut flags = LittleEndian::read_u16(&page[FCR_USER_FLAGS..]);
        flags |= USER_FLAG_VARIABLE_LENGTH;
        LittleEndian::write_u16(&mut page[FCR_USER_FLAGS..], flags);
        page[FCR_VARIABLE_LENGTH_FLAG_BYTE] = 0xFF;
    }
    page
}

fn write_key_def(page: &mut [u8; PAGE], index: usize, offset: u16, length: u16, data_type: u8, attrs: u16) {
    let base = KEY_DEFINITION_BASE + index * KEY_DEFINITION_LENGTH;
    let attrs = attrs | attribute::USE_EXTENDED_DATA_TYPE;
    LittleEndian::write_u16(&mut page[base + KEY_DEF_ATTRIBUTES..], attrs);
    LittleEndian::write_u16(&mut page[base + KEY_DEF_OFFSET..], offset);
    LittleEndian::write_u16(&mut page[base + KEY_DEF_LENGTH..], length);
    page[base + KEY_DEF_DATA_TYPE] = data_type;
    page[base + KEY_DEF_NULL_VALUE] = 0;
}

fn zstring_field(dst: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    dst[..bytes.len()].copy_from_slice(bytes);
}

/// One row of the `MBBSEMU.DAT`-shaped fixture: 74-byte record body with
/// `string1` (offset 2, 32 bytes), `int1` (offset 34, 4 bytes), `string2`
/// (offset 38, 32 bytes), `int2` (offset 70, 4 bytes).
fn mbbsemu_record(string1: &str, int1: i32, string2: &str, int2: i32) -> [u8; 74] {
    let mut rec = [0u8; 74];
    zstring_field(&mut rec[2..34], string1);
    LittleEndian::write_i32(&mut rec[34..38], int1);
    zstring_field(&mut rec[38..70], string2);
    LittleEndian::write_i32(&mut rec[70..74], int2);
    rec
}

/// Build the `MBBSEMU.DAT` fixture: four fixed-length records, four
/// single-segment keys, one page of data.
fn build_mbbsemu_dat() -> NamedTempFile {
    let mut header = header_page(4, 4, 74, 90, false);
    write_key_def(&mut header, 0, 2, 32, KeyDataType::Zstring as u8, attribute::DUPLICATES);
    write_key_def(&mut header, 1, 34, 4, KeyDataType::Integer as u8, attribute::MODIFIABLE);
    write_key_def(
        &mut header,
        2,
        38,
        32,
        KeyDataType::Zstring as u8,
        attribute::DUPLICATES | attribute::MODIFIABLE,
    );
    write_key_def(&mut header, 3, 70, 4, KeyDataType::AutoInc as u8, 0);

    let rows = [
        mbbsemu_record("Sysop", 3444, "3444", 1),
        mbbsemu_record("Sysop", 7776, "7776", 2),
        mbbsemu_record("Sysop", 1052234073, "StringValue", 3),
        mbbsemu_record("Sysop", -615634567, "stringValue", 4),
    ];

    let mut data_page = [0u8; PAGE];
    data_page[PAGE_USAGE_COUNT] = 0x80;
    for (i, rec) in rows.iter().enumerate() {
        let offset = PAGE_RECORD_AREA_START + i * 90;
        data_page[offset..offset + 74].copy_from_slice(rec);
    }

    let mut tmp = NamedTempFile::new().expect("create temp file");
    tmp.write_all(&header).unwrap();
    tmp.write_all(&data_page).unwrap();
    tmp.flush().unwrap();
    tmp
}

fn open_mbbsemu() -> (NamedTempFile, Driver) {
    let dat = build_mbbsemu_dat();
    let driver = Driver::open(dat.path(), OpenMode::Normal).expect("open fixture");
    (dat, driver)
}

fn record_data(outcome: recman::btrieve::Outcome) -> Vec<u8> {
    match outcome {
        recman::btrieve::Outcome::Record { record, .. } => record.data,
        other => panic!("expected Outcome::Record, got {other:?}"),
    }
}

fn position(outcome: recman::btrieve::Outcome) -> u32 {
    match outcome {
        recman::btrieve::Outcome::Position(p) => p,
        other => panic!("expected Outcome::Position, got {other:?}"),
    }
}

// S1. StepFirst -> row 1; GetPosition -> 1; StepPrevious -> InvalidPositioning;
// StepNext -> row 2; GetPosition -> 2.
#[test]
fn s1_step_first_previous_next_and_position() {
    let (_dat, mut driver) = open_mbbsemu();

    let first = record_data(driver.perform(OperationCode::StepFirst, None, &[], None, None).unwrap());
    assert_eq!(&first[2..7], b"Sysop");

    let pos = position(driver.perform(OperationCode::GetPosition, None, &[], None, None).unwrap());
    assert_eq!(pos, 1);

    let err = driver.perform(OperationCode::StepPrevious, None, &[], None, None).unwrap_err();
    assert_eq!(err, BtrieveError::InvalidPositioning);

    // a failed step must not move the position
    let pos = position(driver.perform(OperationCode::GetPosition, None, &[], None, None).unwrap());
    assert_eq!(pos, 1);

    let second = record_data(driver.perform(OperationCode::StepNext, None, &[], None, None).unwrap());
    assert_eq!(LittleEndian::read_i32(&second[34..38]), 7776);

    let pos = position(driver.perform(OperationCode::GetPosition, None, &[], None, None).unwrap());
    assert_eq!(pos, 2);
}

// S2. AcquireGreater on key 1 (int1), keyData = 4000 -> row 2 (7776).
// AcquireNext -> row 3 (1052234073).
#[test]
fn s2_acquire_greater_then_next() {
    let (_dat, mut driver) = open_mbbsemu();

    let record = record_data(
        driver
            .perform(OperationCode::AcquireGreater, Some(1), &4000i32.to_le_bytes(), None, None)
            .unwrap(),
    );
    assert_eq!(LittleEndian::read_i32(&record[34..38]), 7776);

    let record = record_data(driver.perform(OperationCode::AcquireNext, None, &[], None, None).unwrap());
    assert_eq!(LittleEndian::read_i32(&record[34..38]), 1052234073);
}

// S3. Insert a row duplicating row 1's unique key values -> DuplicateKeyValue;
// record count unaffected.
#[test]
fn s3_insert_duplicate_key_is_rejected() {
    let (_dat, mut driver) = open_mbbsemu();

    let dup = mbbsemu_record("Sysop", 3444, "3444", 1);
    let err = driver.perform(OperationCode::Insert, None, &[], Some(&dup), None).unwrap_err();
    assert_eq!(err, BtrieveError::DuplicateKeyValue);

    let count = match driver.perform(OperationCode::Stat, None, &[], None, None).unwrap() {
        recman::btrieve::Outcome::RecordCount(n) => n,
        other => panic!("expected RecordCount, got {other:?}"),
    };
    assert_eq!(count, 4);
}

// S4. StepLast -> row 4; set int1 = -7000 and Update -> success; re-reading
// the row shows int1 updated and int2 unchanged.
#[test]
fn s4_update_modifiable_key_succeeds() {
    let (_dat, mut driver) = open_mbbsemu();

    let last = record_data(driver.perform(OperationCode::StepLast, None, &[], None, None).unwrap());
    assert_eq!(LittleEndian::read_i32(&last[70..74]), 4);

    let mut updated = [0u8; 74];
    updated.copy_from_slice(&last);
    LittleEndian::write_i32(&mut updated[34..38], -7000);

    driver.perform(OperationCode::Update, None, &[], Some(&updated), None).unwrap();

    let reread = record_data(
        driver
            .perform(OperationCode::GetDirectChunkOrRecord, None, &4u32.to_le_bytes(), None, None)
            .unwrap(),
    );
    assert_eq!(LittleEndian::read_i32(&reread[34..38]), -7000);
    assert_eq!(LittleEndian::read_i32(&reread[70..74]), 4);
}

// S5. StepLast -> row 4; change int2 (the AutoInc key, not modifiable) and
// Update -> NonModifiableKeyValue.
#[test]
fn s5_update_non_modifiable_key_is_rejected() {
    let (_dat, mut driver) = open_mbbsemu();

    let last = record_data(driver.perform(OperationCode::StepLast, None, &[], None, None).unwrap());
    let mut updated = [0u8; 74];
    updated.copy_from_slice(&last);
    LittleEndian::write_i32(&mut updated[70..74], 5);

    let err = driver.perform(OperationCode::Update, None, &[], Some(&updated), None).unwrap_err();
    assert_eq!(err, BtrieveError::NonModifiableKeyValue);
}

#[test]
fn step_next_past_last_row_returns_invalid_positioning() {
    let (_dat, mut driver) = open_mbbsemu();
    driver.perform(OperationCode::StepLast, None, &[], None, None).unwrap();
    let err = driver.perform(OperationCode::StepNext, None, &[], None, None).unwrap_err();
    assert_eq!(err, BtrieveError::InvalidPositioning);
}

#[test]
fn acquire_next_past_last_row_returns_end_of_file() {
    let (_dat, mut driver) = open_mbbsemu();
    driver.perform(OperationCode::AcquireLast, Some(1), &[], None, None).unwrap();
    let err = driver.perform(OperationCode::AcquireNext, None, &[], None, None).unwrap_err();
    assert_eq!(err, BtrieveError::EndOfFile);
}

#[test]
fn key_buffer_shorter_than_key_length_is_rejected() {
    let (_dat, mut driver) = open_mbbsemu();
    // key 0 (string1) is 32 bytes long; supply only 2.
    let err = driver
        .perform(OperationCode::AcquireEqual, Some(0), &[b'S', b'y'], None, None)
        .unwrap_err();
    assert!(matches!(err, BtrieveError::KeyBufferTooShort { need: 32, got: 2 }));
}

#[test]
fn lock_modifier_synonym_behaves_like_base_operation() {
    let (_dat, mut driver) = open_mbbsemu();
    // StepFirst with the "single wait" lock modifier (+100) folds to the
    // base StepFirst and behaves identically.
    let op = OperationCode::from_code(0x21 + 100).unwrap();
    assert_eq!(op, OperationCode::StepFirst);
    let first = record_data(driver.perform(op, None, &[], None, None).unwrap());
    assert_eq!(&first[2..7], b"Sysop");
}

// ---------------------------------------------------------------------
// S6: a variable-length fixture, scaled down from a 1024-record VARIABLE.DAT
// to a handful of records spanning the overflow-fragment boundary,
// exercising the same magic/key1/key2/tail shape.
// ---------------------------------------------------------------------

const OVERFLOW_PAGE: u32 = 2;

/// Build one overflow page holding `fragments` contiguous byte blobs,
/// addressed from the end of the page by a 2-byte offset table (one entry
/// per fragment, written high-to-low) as `get_fragment` expects. The table
/// carries one extra trailing entry past the last fragment, recording the
/// first free byte, so `get_fragment` can bound the last fragment's length.
fn build_overflow_page(fragments: &[Vec<u8>]) -> [u8; PAGE] {
    let mut page = [0u8; PAGE];
    LittleEndian::write_u16(&mut page[OVERFLOW_FRAGMENT_COUNT..], fragments.len() as u16);

    let mut cursor = OVERFLOW_MIN_DATA_OFFSET;
    let mut entries = Vec::with_capacity(fragments.len() + 1);
    for frag in fragments {
        entries.push(cursor as u16);
        page[cursor..cursor + frag.len()].copy_from_slice(frag);
        cursor += frag.len();
    }
    entries.push(cursor as u16);

    // Offset-array entries are written from the end of the page backward;
    // the high bit of the second byte marks "another fragment follows"
    // (unused here: every chain is one fragment long).
    for (i, &offset) in entries.iter().enumerate() {
        let slot = PAGE - 2 * (i + 1);
        page[slot] = (offset & 0xFF) as u8;
        page[slot + 1] = ((offset >> 8) & 0x7F) as u8;
    }
    page
}

fn variable_record(magic: u32, key1: i32, key2: i32) -> [u8; 8] {
    let mut rec = [0u8; 8];
    LittleEndian::write_u32(&mut rec[0..4], magic);
    // key1 and key2 live inside the 8-byte fixed body per the fixture's
    // declared key offsets (4 and 6, 2-byte lengths).
    LittleEndian::write_i16(&mut rec[4..6], key1 as i16);
    LittleEndian::write_i16(&mut rec[6..8], key2 as i16);
    rec
}

/// Build a small variable-length fixture: `count` records, each with `i`
/// trailing bytes valued `0..i`, stored as a single-fragment overflow chain
/// on page `OVERFLOW_PAGE`.
fn build_variable_dat(count: u32) -> NamedTempFile {
    let mut header = header_page(2, count, 8, 20, true);
    write_key_def(&mut header, 0, 4, 2, KeyDataType::Integer as u8, attribute::DUPLICATES);
    write_key_def(&mut header, 1, 6, 2, KeyDataType::Integer as u8, attribute::DUPLICATES);

    let fragments: Vec<Vec<u8>> = (0..count).map(|i| (0..i as u8).collect()).collect();
    let overflow_page = build_overflow_page(&fragments);

    let mut data_page = [0u8; PAGE];
    data_page[PAGE_USAGE_COUNT] = 0x80;
    for i in 0..count {
        let offset = PAGE_RECORD_AREA_START + i as usize * 20;
        let rec = variable_record(0xDEADBEEF, (i % 64) as i32, i as i32);
        data_page[offset..offset + 8].copy_from_slice(&rec);
        // Fragment locator: page number is packed as (b0<<16)|b2<<8|b1,
        // fragment index is b3 (see Database::get_variable_length_data).
        let ptr = &mut data_page[offset + 8..offset + 12];
        ptr[0] = 0;
        ptr[1] = OVERFLOW_PAGE as u8;
        ptr[2] = 0;
        ptr[3] = i as u8;
    }

    let mut tmp = NamedTempFile::new().expect("create temp file");
    tmp.write_all(&header).unwrap();
    tmp.write_all(&data_page).unwrap();
    tmp.write_all(&overflow_page).unwrap();
    tmp.flush().unwrap();
    tmp
}

#[test]
fn s6_variable_length_records_round_trip_their_tail_bytes() {
    let count = 8u32;
    let dat = build_variable_dat(count);
    let mut driver = Driver::open(dat.path(), OpenMode::Normal).expect("open fixture");

    let first = record_data(driver.perform(OperationCode::StepFirst, None, &[], None, None).unwrap());
    assert_eq!(LittleEndian::read_u32(&first[0..4]), 0xDEADBEEF);
    assert_eq!(first.len(), 8); // record i=0 has zero trailing bytes

    for expected in 1..count {
        let record = record_data(driver.perform(OperationCode::StepNext, None, &[], None, None).unwrap());
        assert_eq!(LittleEndian::read_u32(&record[0..4]), 0xDEADBEEF);
        assert_eq!(record.len(), 8 + expected as usize);
        let tail = &record[8..];
        let want: Vec<u8> = (0..expected as u8).collect();
        assert_eq!(tail, want.as_slice());
    }
}

#[test]
fn s6_acquire_by_second_key_finds_record_by_index() {
    let dat = build_variable_dat(8);
    let mut driver = Driver::open(dat.path(), OpenMode::Normal).expect("open fixture");

    let record = record_data(
        driver
            .perform(OperationCode::AcquireEqual, Some(1), &5i16.to_le_bytes(), None, None)
            .unwrap(),
    );
    assert_eq!(record.len(), 8 + 5);
}

#[test]
fn create_converts_dat_to_sql_store_and_preserves_record_count() {
    let dat = build_mbbsemu_dat();
    let driver = Driver::open(dat.path(), OpenMode::Normal).unwrap();
    let store = driver.share();
    let store = store.lock().unwrap();
    assert_eq!(store.record_count().unwrap(), 4);
    assert_eq!(store.keys.len(), 4);
    assert_eq!(store.page_length, 512);
}

#[test]
fn typed_value_acquire_equal_on_string_key_matches_zstring_prefix() {
    let (_dat, mut driver) = open_mbbsemu();
    let mut key_buf = [0u8; 32];
    zstring_field(&mut key_buf, "StringValue");
    let record = record_data(
        driver
            .perform(OperationCode::AcquireEqual, Some(2), &key_buf, None, None)
            .unwrap(),
    );
    assert_eq!(LittleEndian::read_i32(&record[34..38]), 1052234073);
    let _ = TypedValue::Text(String::new()); // exercise the public TypedValue re-export
}

// A data buffer shorter than the 74-byte record body is rejected without
// advancing position, for every operation that acquires data.
#[test]
fn data_buffer_shorter_than_record_is_rejected_without_advancing_position() {
    let (_dat, mut driver) = open_mbbsemu();

    driver.perform(OperationCode::StepFirst, None, &[], None, None).unwrap();
    let pos = position(driver.perform(OperationCode::GetPosition, None, &[], None, None).unwrap());
    assert_eq!(pos, 1);

    let err = driver
        .perform(OperationCode::StepNext, None, &[], None, Some(10))
        .unwrap_err();
    assert!(matches!(
        err,
        BtrieveError::DataBufferLengthOverrun { need: 74, got: 10 }
    ));

    // the failed acquire must not have moved the handle's position
    let pos = position(driver.perform(OperationCode::GetPosition, None, &[], None, None).unwrap());
    assert_eq!(pos, 1);
}

#[test]
fn data_buffer_large_enough_for_record_succeeds() {
    let (_dat, mut driver) = open_mbbsemu();
    let record = record_data(
        driver
            .perform(OperationCode::StepFirst, None, &[], None, Some(74))
            .unwrap(),
    );
    assert_eq!(record.len(), 74);
}

#[test]
fn data_buffer_overrun_on_acquire_does_not_disturb_the_previous_query() {
    let (_dat, mut driver) = open_mbbsemu();

    // establish a keyed cursor on key 1, positioned at row 2 (int1 = 7776)
    driver
        .perform(OperationCode::AcquireGreater, Some(1), &4000i32.to_le_bytes(), None, None)
        .unwrap();

    // AcquireNext would land on row 3, whose record is too big for this buffer
    let err = driver
        .perform(OperationCode::AcquireNext, None, &[], None, Some(4))
        .unwrap_err();
    assert!(matches!(err, BtrieveError::DataBufferLengthOverrun { need: 74, .. }));

    // the cursor must still be usable afterward, continuing from row 2
    let record = record_data(
        driver
            .perform(OperationCode::AcquireNext, None, &[], None, None)
            .unwrap(),
    );
    assert_eq!(LittleEndian::read_i32(&record[34..38]), 1052234073);
}

// GetDirectChunkOrRecord with a key number supplied establishes a key cursor
// positioned at that row, ready for a following AcquireNext on the same key.
#[test]
fn get_direct_record_with_key_number_establishes_a_key_cursor() {
    let (_dat, mut driver) = open_mbbsemu();

    let record = record_data(
        driver
            .perform(OperationCode::GetDirectChunkOrRecord, Some(1), &2u32.to_le_bytes(), None, None)
            .unwrap(),
    );
    assert_eq!(LittleEndian::read_i32(&record[34..38]), 7776);

    let record = record_data(driver.perform(OperationCode::AcquireNext, None, &[], None, None).unwrap());
    assert_eq!(LittleEndian::read_i32(&record[34..38]), 1052234073);
}
