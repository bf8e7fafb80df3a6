//! `recman query` — run a single keyed acquire and print the resulting
//! record.

use std::io::Write;

use crate::btrieve::{KeyDataType, SqlStore, TypedValue};
use crate::cli::app::QueryOp;
use crate::cli::wprintln;
use crate::error::{BtrieveError, Result};
use crate::util::hex::hex_dump;

/// Options for the `recman query` subcommand.
pub struct QueryOptions {
    /// Path to a converted store (`.db`).
    pub file: String,
    /// Key number to query.
    pub key: u16,
    /// Comparison to run.
    pub op: QueryOp,
    /// Key value to compare against (decimal integer or text); required for
    /// every comparison except `first`/`last`.
    pub value: Option<String>,
}

/// Parse `raw` into the [`TypedValue`] shape `key` stores, using the key's
/// primary segment data type to pick the right conversion.
fn parse_value(key: &crate::btrieve::Key, raw: &str) -> Result<TypedValue> {
    let data_type = key.primary_segment().data_type;
    Ok(match data_type {
        KeyDataType::String | KeyDataType::Lstring | KeyDataType::Zstring | KeyDataType::OldAscii => {
            TypedValue::Text(raw.to_string())
        }
        KeyDataType::Float => {
            let v: f64 = raw
                .parse()
                .map_err(|_| BtrieveError::BadKeyLength(format!("not a float: {raw}")))?;
            TypedValue::Double(v)
        }
        KeyDataType::Integer
        | KeyDataType::AutoInc
        | KeyDataType::Unsigned
        | KeyDataType::UnsignedBinary
        | KeyDataType::OldBinary => {
            let v: i64 = raw
                .parse()
                .map_err(|_| BtrieveError::BadKeyLength(format!("not an integer: {raw}")))?;
            TypedValue::Integer(v)
        }
        _ => TypedValue::Blob(raw.as_bytes().to_vec()),
    })
}

/// Open the already-converted store at `opts.file` and run a single keyed
/// acquire, printing the matched record.
pub fn execute(opts: &QueryOptions, writer: &mut dyn Write) -> Result<()> {
    let mut store = SqlStore::open(&opts.file)?;
    let key = store.key_by_number(opts.key)?.clone();
    let mut query = store.new_query(opts.key)?;

    let record = match opts.op {
        QueryOp::First => store.get_by_key_first(&mut query)?,
        QueryOp::Last => store.get_by_key_last(&mut query)?,
        QueryOp::Equal | QueryOp::Greater | QueryOp::GreaterOrEqual | QueryOp::Less | QueryOp::LessOrEqual => {
            let raw = opts
                .value
                .as_deref()
                .ok_or_else(|| BtrieveError::KeyBufferTooShort { need: key.length(), got: 0 })?;
            let value = parse_value(&key, raw)?;
            match opts.op {
                QueryOp::Equal => store.get_by_key_equal(&mut query, &value)?,
                QueryOp::Greater => store.get_by_key_greater(&mut query, &value)?,
                QueryOp::GreaterOrEqual => store.get_by_key_greater_or_equal(&mut query, &value)?,
                QueryOp::Less => store.get_by_key_less(&mut query, &value)?,
                _ => store.get_by_key_less_or_equal(&mut query, &value)?,
            }
        }
    };

    wprintln!(writer, "position: {}", record.position)?;
    wprintln!(writer, "length: {}", record.data.len())?;
    wprintln!(writer, "{}", hex_dump(&record.data, 0))?;
    Ok(())
}
