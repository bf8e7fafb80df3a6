//! The SQLite-backed indexed store: schema, record CRUD, and keyed lookups.
//!
//! A legacy file is decoded once by [`super::database::Database`] and
//! loaded into three tables (`metadata_t`, `keys_t`, `data_t`); afterward
//! every operation in this crate runs purely against SQLite.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::cache::{self, LruCache};
use super::database::Database;
use super::key::Key;
use super::key_segment::KeyDataType;
use super::query::{CursorDirection, Query};
use super::record::Record;
use super::value::TypedValue;
use crate::error::{BtrieveError, Result};

const CURRENT_VERSION: i64 = 2;

/// The SQL-backed store for one opened file.
pub struct SqlStore {
    conn: Connection,
    pub record_length: u16,
    pub physical_record_length: u16,
    pub page_length: u16,
    pub variable_length_records: bool,
    pub keys: Vec<Key>,
    pub acs_name: Option<String>,
    pub acs: Option<Box<[u8; 256]>>,
    pub position: u32,
    cache: LruCache<u32, Record>,
}

impl SqlStore {
    /// Decode `dat_path` and build a fresh SQLite store at `db_path`,
    /// overwriting it if it exists.
    pub fn create(dat_path: impl AsRef<Path>, db_path: impl AsRef<Path>) -> Result<Self> {
        let legacy = Database::open(dat_path.as_ref())?;
        if db_path.as_ref().exists() {
            std::fs::remove_file(db_path.as_ref())?;
        }
        let conn = Connection::open(db_path.as_ref())?;

        create_metadata_table(&conn, &legacy)?;
        create_keys_table(&conn, &legacy.keys)?;
        create_data_table(&conn, &legacy.keys)?;

        let mut store = SqlStore {
            conn,
            record_length: legacy.record_length,
            physical_record_length: legacy.physical_record_length,
            page_length: legacy.page_length,
            variable_length_records: legacy.variable_length_records,
            keys: legacy.keys,
            acs_name: legacy.acs_name.clone(),
            acs: legacy.acs.clone(),
            position: 0,
            cache: LruCache::new(cache::DEFAULT_CAPACITY),
        };

        store.populate(&legacy, dat_path.as_ref())?;
        Ok(store)
    }

    /// Open an already-converted store.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        if !db_path.as_ref().exists() {
            return Err(BtrieveError::FileNotFound(
                db_path.as_ref().display().to_string(),
            ));
        }
        let conn = Connection::open(db_path.as_ref())?;

        let (record_length, physical_record_length, page_length, variable_length_records, acs_name, acs): (
            u16,
            u16,
            u16,
            bool,
            Option<String>,
            Option<Vec<u8>>,
        ) = conn.query_row(
            "SELECT record_length, physical_record_length, page_length, variable_length_records, acs_name, acs FROM metadata_t",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )?;

        let keys = load_keys(&conn, acs_name.clone(), acs.clone())?;

        Ok(SqlStore {
            conn,
            record_length,
            physical_record_length,
            page_length,
            variable_length_records,
            keys,
            acs_name,
            acs: acs.map(|v| {
                let mut arr = Box::new([0u8; 256]);
                arr.copy_from_slice(&v);
                arr
            }),
            position: 0,
            cache: LruCache::new(cache::DEFAULT_CAPACITY),
        })
    }

    fn populate(&mut self, legacy: &Database, dat_path: impl AsRef<Path>) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut insert = build_insert_statement(&tx, &legacy.keys)?;
            legacy.for_each_record(dat_path, |_position, data| {
                let mut values: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(data.to_vec())];
                for key in &legacy.keys {
                    let v = key.extract_key_in_record_to_typed_value(data)?;
                    values.push(Box::new(v));
                }
                let refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|b| b.as_ref()).collect();
                insert.execute(refs.as_slice())?;
                Ok(true)
            })?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn key_by_number(&self, key_number: u16) -> Result<&Key> {
        self.keys
            .iter()
            .find(|k| k.number() == key_number)
            .ok_or(BtrieveError::InvalidKeyNumber(key_number))
    }

    pub fn record_count(&self) -> Result<u32> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM data_t", [], |r| r.get(0))?;
        Ok(count as u32)
    }

    fn select_record(&self, position: u32) -> Result<Option<Record>> {
        self.conn
            .query_row(
                "SELECT id, data FROM data_t WHERE id = ?1",
                params![position],
                |row| Ok(Record::new(row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Cache-then-select lookup for a specific record position.
    pub fn get_record(&mut self, position: u32) -> Result<Record> {
        if let Some(record) = self.cache.get(&position) {
            return Ok(record.clone());
        }
        let record = self
            .select_record(position)?
            .ok_or(BtrieveError::InvalidRecordAddress(position))?;
        self.cache.put(position, record.clone());
        Ok(record)
    }

    fn step(&mut self, order: &str, comparison: &str) -> Result<Record> {
        let sql = format!(
            "SELECT id, data FROM data_t WHERE id {comparison} ?1 ORDER BY id {order} LIMIT 1"
        );
        let record = self
            .conn
            .query_row(&sql, params![self.position], |row| {
                Ok(Record::new(row.get(0)?, row.get(1)?))
            })
            .optional()?
            .ok_or(BtrieveError::InvalidPositioning)?;
        self.position = record.position;
        self.cache.put(record.position, record.clone());
        Ok(record)
    }

    pub fn step_first(&mut self) -> Result<Record> {
        let record = self
            .conn
            .query_row("SELECT id, data FROM data_t ORDER BY id ASC LIMIT 1", [], |row| {
                Ok(Record::new(row.get(0)?, row.get(1)?))
            })
            .optional()?
            .ok_or(BtrieveError::InvalidPositioning)?;
        self.position = record.position;
        self.cache.put(record.position, record.clone());
        Ok(record)
    }

    pub fn step_last(&mut self) -> Result<Record> {
        let record = self
            .conn
            .query_row("SELECT id, data FROM data_t ORDER BY id DESC LIMIT 1", [], |row| {
                Ok(Record::new(row.get(0)?, row.get(1)?))
            })
            .optional()?
            .ok_or(BtrieveError::InvalidPositioning)?;
        self.position = record.position;
        self.cache.put(record.position, record.clone());
        Ok(record)
    }

    pub fn step_next(&mut self) -> Result<Record> {
        self.step("ASC", ">")
    }

    pub fn step_previous(&mut self) -> Result<Record> {
        self.step("DESC", "<")
    }

    pub fn delete_record(&mut self) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM data_t WHERE id = ?1", params![self.position])?;
        if changed == 0 {
            return Err(BtrieveError::InvalidRecordAddress(self.position));
        }
        self.cache.invalidate(&self.position);
        Ok(())
    }

    pub fn delete_all(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM data_t", [])?;
        self.cache.clear();
        Ok(())
    }

    /// Insert `record`, filling in any `AutoInc` key whose bytes are all
    /// zero with `max(existing) + 1`, computed and written inside one
    /// transaction.
    pub fn insert_record(&mut self, record: &[u8]) -> Result<u32> {
        let tx = self.conn.unchecked_transaction()?;
        let mut record = record.to_vec();

        for key in &self.keys {
            if key.primary_segment().data_type != KeyDataType::AutoInc {
                continue;
            }
            let seg = key.primary_segment();
            let start = seg.offset as usize;
            let end = start + seg.length as usize;
            let Some(field) = record.get(start..end) else {
                continue;
            };
            if !field.iter().all(|&b| b == 0) {
                continue;
            }
            let column = key.sql_key_name();
            let max: Option<i64> = tx
                .query_row(&format!("SELECT MAX({column}) FROM data_t"), [], |r| r.get(0))
                .optional()?
                .flatten();
            let next = max.unwrap_or(0) + 1;
            write_integer_field(&mut record, start, seg.length, next)?;
        }

        let values = {
            let mut values: Vec<TypedValue> = Vec::with_capacity(1 + self.keys.len());
            for key in &self.keys {
                values.push(key.extract_key_in_record_to_typed_value(&record)?);
            }
            values
        };

        let mut insert = build_insert_statement(&tx, &self.keys)?;
        let mut bind: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(record.clone())];
        for v in values {
            bind.push(Box::new(v));
        }
        let refs: Vec<&dyn rusqlite::ToSql> = bind.iter().map(|b| b.as_ref()).collect();
        insert.execute(refs.as_slice())?;
        let id = tx.last_insert_rowid();
        drop(insert);
        tx.commit()?;

        self.position = id as u32;
        Ok(self.position)
    }

    /// Replace the record at `position`, rejecting the update if it would
    /// change the value of a non-modifiable key.
    pub fn update_record(&mut self, position: u32, record: &[u8]) -> Result<()> {
        let existing = self
            .select_record(position)?
            .ok_or(BtrieveError::InvalidRecordAddress(position))?;

        for key in &self.keys {
            if key.is_modifiable() {
                continue;
            }
            let old = key.extract_key_data_from_record(&existing.data)?;
            let new = key.extract_key_data_from_record(record)?;
            if old != new {
                return Err(BtrieveError::NonModifiableKeyValue);
            }
        }

        let mut sql = "UPDATE data_t SET data = ?1".to_string();
        for (i, key) in self.keys.iter().enumerate() {
            sql.push_str(&format!(", {} = ?{}", key.sql_key_name(), i + 2));
        }
        sql.push_str(&format!(" WHERE id = ?{}", self.keys.len() + 2));

        let mut bind: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(record.to_vec())];
        for key in &self.keys {
            bind.push(Box::new(key.extract_key_in_record_to_typed_value(record)?));
        }
        bind.push(Box::new(position));
        let refs: Vec<&dyn rusqlite::ToSql> = bind.iter().map(|b| b.as_ref()).collect();
        self.conn.execute(&sql, refs.as_slice())?;

        self.cache.invalidate(&position);
        self.position = position;
        Ok(())
    }

    /// Build a fresh query against `key_number`, positioned nowhere yet.
    pub fn new_query(&self, key_number: u16) -> Result<Query> {
        self.key_by_number(key_number)?;
        Ok(Query::new(key_number))
    }

    fn scan_bound(
        &mut self,
        query: &mut Query,
        direction: CursorDirection,
        comparison: &str,
        value: Option<&TypedValue>,
        order: &str,
    ) -> Result<Record> {
        let column = self.key_by_number(query.key_number)?.sql_key_name();
        let sql = match value {
            Some(_) => format!(
                "SELECT id, {column}, data FROM data_t WHERE {column} {comparison} ?1 \
                 ORDER BY {column} {order}, id {order} LIMIT 1"
            ),
            None => format!("SELECT id, {column}, data FROM data_t ORDER BY {column} {order}, id {order} LIMIT 1"),
        };

        let row: Option<(u32, TypedValue, Vec<u8>)> = match value {
            Some(v) => self
                .conn
                .query_row(&sql, params![v], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
                .optional()?,
            None => self
                .conn
                .query_row(&sql, [], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
                .optional()?,
        };

        let (id, key_value, data) = row.ok_or(BtrieveError::KeyValueNotFound)?;
        query.record_served(direction, key_value, id);
        let record = Record::new(id, data);
        self.cache.put(id, record.clone());
        self.position = id;
        Ok(record)
    }

    pub fn get_by_key_first(&mut self, query: &mut Query) -> Result<Record> {
        self.scan_bound(query, CursorDirection::Forward, "", None, "ASC")
    }

    pub fn get_by_key_last(&mut self, query: &mut Query) -> Result<Record> {
        self.scan_bound(query, CursorDirection::Reverse, "", None, "DESC")
    }

    pub fn get_by_key_equal(&mut self, query: &mut Query, value: &TypedValue) -> Result<Record> {
        self.scan_bound(query, CursorDirection::Forward, "=", Some(value), "ASC")
    }

    pub fn get_by_key_greater(&mut self, query: &mut Query, value: &TypedValue) -> Result<Record> {
        self.scan_bound(query, CursorDirection::Forward, ">", Some(value), "ASC")
    }

    pub fn get_by_key_greater_or_equal(&mut self, query: &mut Query, value: &TypedValue) -> Result<Record> {
        self.scan_bound(query, CursorDirection::Forward, ">=", Some(value), "ASC")
    }

    pub fn get_by_key_less(&mut self, query: &mut Query, value: &TypedValue) -> Result<Record> {
        self.scan_bound(query, CursorDirection::Reverse, "<", Some(value), "DESC")
    }

    pub fn get_by_key_less_or_equal(&mut self, query: &mut Query, value: &TypedValue) -> Result<Record> {
        self.scan_bound(query, CursorDirection::Reverse, "<=", Some(value), "DESC")
    }

    /// Rebuild the scan in `direction` from `query`'s last served key value,
    /// then skip past the previously served row before returning the next
    /// one. This matches the original direction-reversal algorithm: because
    /// duplicate key values can share many rows, simply re-ordering is not
    /// enough to avoid re-serving a row already returned.
    fn advance(&mut self, query: &mut Query, direction: CursorDirection, comparison: &str, order: &str) -> Result<Record> {
        let last_key_value = query.last_key_value.clone().ok_or(BtrieveError::InvalidPositioning)?;
        let last_position = query.last_position.ok_or(BtrieveError::InvalidPositioning)?;
        let column = self.key_by_number(query.key_number)?.sql_key_name();

        let sql = format!(
            "SELECT id, {column}, data FROM data_t WHERE {column} {comparison} ?1 \
             ORDER BY {column} {order}, id {order}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![last_key_value])?;

        let mut found_previous = false;
        let mut next_row = None;
        while let Some(row) = rows.next()? {
            let id: u32 = row.get(0)?;
            if !found_previous {
                if id == last_position {
                    found_previous = true;
                }
                continue;
            }
            let key_value: TypedValue = row.get(1)?;
            let data: Vec<u8> = row.get(2)?;
            next_row = Some((id, key_value, data));
            break;
        }
        drop(rows);
        drop(stmt);

        let (id, key_value, data) = next_row.ok_or(BtrieveError::EndOfFile)?;
        query.record_served(direction, key_value, id);
        let record = Record::new(id, data);
        self.cache.put(id, record.clone());
        self.position = id;
        Ok(record)
    }

    pub fn get_by_key_next(&mut self, query: &mut Query) -> Result<Record> {
        self.advance(query, CursorDirection::Forward, ">=", "ASC")
    }

    pub fn get_by_key_previous(&mut self, query: &mut Query) -> Result<Record> {
        self.advance(query, CursorDirection::Reverse, "<=", "DESC")
    }

    /// Position a new query on `key_number` at the key value found in the
    /// record at `position`, ready for a subsequent `get_by_key_next`.
    pub fn logical_currency_seek(&mut self, key_number: u16, position: u32) -> Result<Query> {
        let key = self.key_by_number(key_number)?.clone();
        let record = self.get_record(position)?;
        let key_value = key.extract_key_in_record_to_typed_value(&record.data)?;
        let mut query = Query::new(key_number);
        query.record_served(CursorDirection::Forward, key_value, position);
        self.position = position;
        Ok(query)
    }
}

fn write_integer_field(record: &mut [u8], start: usize, length: u16, value: i64) -> Result<()> {
    use byteorder::{ByteOrder, LittleEndian};
    match length {
        2 => LittleEndian::write_u16(&mut record[start..start + 2], value as u16),
        4 => LittleEndian::write_u32(&mut record[start..start + 4], value as u32),
        8 => LittleEndian::write_u64(&mut record[start..start + 8], value as u64),
        other => {
            return Err(BtrieveError::BadKeyLength(format!(
                "autoinc key length {other} is not 2/4/8"
            )))
        }
    }
    Ok(())
}

fn build_insert_statement<'c>(
    conn: &'c Connection,
    keys: &[Key],
) -> Result<rusqlite::Statement<'c>> {
    let mut columns = vec!["data".to_string()];
    columns.extend(keys.iter().map(Key::sql_key_name));
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO data_t ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );
    conn.prepare(&sql).map_err(Into::into)
}

fn create_metadata_table(conn: &Connection, legacy: &Database) -> Result<()> {
    conn.execute(
        "CREATE TABLE metadata_t(record_length INTEGER NOT NULL, \
         physical_record_length INTEGER NOT NULL, page_length INTEGER NOT NULL, \
         variable_length_records INTEGER NOT NULL, version INTEGER NOT NULL, \
         acs_name TEXT, acs BLOB)",
        [],
    )?;
    conn.execute(
        "INSERT INTO metadata_t(record_length, physical_record_length, page_length, \
         variable_length_records, version, acs_name, acs) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            legacy.record_length,
            legacy.physical_record_length,
            legacy.page_length,
            legacy.variable_length_records,
            CURRENT_VERSION,
            legacy.acs_name,
            legacy.acs.as_ref().map(|a| a.to_vec()),
        ],
    )?;
    Ok(())
}

fn create_keys_table(conn: &Connection, keys: &[Key]) -> Result<()> {
    conn.execute(
        "CREATE TABLE keys_t(id INTEGER PRIMARY KEY, number INTEGER NOT NULL, \
         segment INTEGER NOT NULL, attributes INTEGER NOT NULL, data_type INTEGER NOT NULL, \
         offset INTEGER NOT NULL, length INTEGER NOT NULL, null_value INTEGER NOT NULL, \
         UNIQUE(number, segment))",
        [],
    )?;
    let mut insert = conn.prepare(
        "INSERT INTO keys_t(number, segment, attributes, data_type, offset, length, null_value) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for key in keys {
        for segment in key.segments() {
            insert.execute(params![
                segment.number,
                segment.segment_index,
                segment.attributes,
                segment.data_type as i64,
                segment.offset,
                segment.length,
                segment.null_value,
            ])?;
        }
    }
    Ok(())
}

fn create_data_table(conn: &Connection, keys: &[Key]) -> Result<()> {
    let mut sql = "CREATE TABLE data_t(id INTEGER PRIMARY KEY, data BLOB NOT NULL".to_string();
    for key in keys {
        sql.push_str(&format!(", {} {}", key.sql_key_name(), key.sql_column_type()));
    }
    sql.push(')');
    conn.execute(&sql, [])?;

    for key in keys {
        conn.execute(
            &format!(
                "CREATE INDEX idx_data_t_{} ON data_t({})",
                key.sql_key_name(),
                key.sql_key_name()
            ),
            [],
        )?;
    }
    Ok(())
}

fn load_keys(
    conn: &Connection,
    acs_name: Option<String>,
    acs: Option<Vec<u8>>,
) -> Result<Vec<Key>> {
    use super::key_segment::KeySegment;
    use std::collections::BTreeMap;

    let acs_table: Option<Box<[u8; 256]>> = acs.map(|v| {
        let mut arr = Box::new([0u8; 256]);
        arr.copy_from_slice(&v);
        arr
    });

    let mut stmt = conn.prepare(
        "SELECT number, segment, attributes, data_type, offset, length, null_value \
         FROM keys_t ORDER BY number, segment",
    )?;
    let mut per_key: BTreeMap<u16, Vec<KeySegment>> = BTreeMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, u16>(0)?,
            row.get::<_, u16>(1)?,
            row.get::<_, u16>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, u16>(4)?,
            row.get::<_, u16>(5)?,
            row.get::<_, u8>(6)?,
        ))
    })?;

    for row in rows {
        let (number, segment_index, attributes, data_type_raw, offset, length, null_value) = row?;
        let old_style_binary = attributes & super::constants::attribute::OLD_STYLE_BINARY != 0;
        let data_type = KeyDataType::from_raw(data_type_raw as u8, old_style_binary)?;
        let segment = KeySegment::new(
            number,
            length,
            offset,
            data_type,
            attributes,
            attributes & super::constants::attribute::SEGMENTED_KEY != 0,
            segment_index,
            null_value,
            acs_name.clone(),
            acs_table.clone(),
        )?;
        per_key.entry(number).or_default().push(segment);
    }

    per_key.into_values().map(Key::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btrieve::key_segment::KeySegment;

    fn single_int_key_store() -> SqlStore {
        let conn = Connection::open_in_memory().unwrap();
        let segment =
            KeySegment::new(0, 4, 0, KeyDataType::Integer, super::super::constants::attribute::MODIFIABLE, false, 0, 0, None, None)
                .unwrap();
        let key = Key::new(vec![segment]).unwrap();
        conn.execute(
            &format!("CREATE TABLE data_t(id INTEGER PRIMARY KEY, data BLOB NOT NULL, {} {})", key.sql_key_name(), key.sql_column_type()),
            [],
        )
        .unwrap();
        SqlStore {
            conn,
            record_length: 4,
            physical_record_length: 4,
            page_length: 512,
            variable_length_records: false,
            keys: vec![key],
            acs_name: None,
            acs: None,
            position: 0,
            cache: LruCache::new(cache::DEFAULT_CAPACITY),
        }
    }

    #[test]
    fn insert_then_step_first_and_next_round_trip() {
        let mut store = single_int_key_store();
        let id1 = store.insert_record(&1i32.to_le_bytes()).unwrap();
        let id2 = store.insert_record(&2i32.to_le_bytes()).unwrap();
        assert!(id2 > id1);

        let first = store.step_first().unwrap();
        assert_eq!(first.data, 1i32.to_le_bytes());
        let next = store.step_next().unwrap();
        assert_eq!(next.data, 2i32.to_le_bytes());
        assert!(matches!(store.step_next(), Err(BtrieveError::InvalidPositioning)));
    }

    #[test]
    fn delete_record_removes_it_and_invalidates_cache() {
        let mut store = single_int_key_store();
        store.insert_record(&1i32.to_le_bytes()).unwrap();
        store.step_first().unwrap();
        store.delete_record().unwrap();
        assert!(matches!(store.step_first(), Err(BtrieveError::InvalidPositioning)));
    }

    #[test]
    fn update_non_modifiable_key_change_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let segment = KeySegment::new(0, 4, 0, KeyDataType::Integer, 0, false, 0, 0, None, None).unwrap();
        let key = Key::new(vec![segment]).unwrap();
        conn.execute(
            &format!("CREATE TABLE data_t(id INTEGER PRIMARY KEY, data BLOB NOT NULL, {} {})", key.sql_key_name(), key.sql_column_type()),
            [],
        )
        .unwrap();
        let mut store = SqlStore {
            conn,
            record_length: 4,
            physical_record_length: 4,
            page_length: 512,
            variable_length_records: false,
            keys: vec![key],
            acs_name: None,
            acs: None,
            position: 0,
            cache: LruCache::new(cache::DEFAULT_CAPACITY),
        };
        let id = store.insert_record(&1i32.to_le_bytes()).unwrap();
        let err = store.update_record(id, &2i32.to_le_bytes()).unwrap_err();
        assert_eq!(err, BtrieveError::NonModifiableKeyValue);
    }

    #[test]
    fn autoinc_key_is_filled_in_on_insert() {
        let conn = Connection::open_in_memory().unwrap();
        let segment = KeySegment::new(0, 4, 0, KeyDataType::AutoInc, 0, false, 0, 0, None, None).unwrap();
        let key = Key::new(vec![segment]).unwrap();
        conn.execute(
            &format!("CREATE TABLE data_t(id INTEGER PRIMARY KEY, data BLOB NOT NULL, {} {})", key.sql_key_name(), key.sql_column_type()),
            [],
        )
        .unwrap();
        let mut store = SqlStore {
            conn,
            record_length: 4,
            physical_record_length: 4,
            page_length: 512,
            variable_length_records: false,
            keys: vec![key],
            acs_name: None,
            acs: None,
            position: 0,
            cache: LruCache::new(cache::DEFAULT_CAPACITY),
        };
        store.insert_record(&[0, 0, 0, 0]).unwrap();
        let second = store.insert_record(&[0, 0, 0, 0]).unwrap();
        let record = store.get_record(second).unwrap();
        assert_eq!(i32::from_le_bytes(record.data.try_into().unwrap()), 2);
    }
}
