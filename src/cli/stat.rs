//! `recman stat` — print header, key, and record-count summary.

use std::io::Write;

use serde::Serialize;

use crate::btrieve::{Driver, OpenMode};
use crate::cli::wprintln;
use crate::error::Result;

/// Options for the `recman stat` subcommand.
pub struct StatOptions {
    /// Path to a converted store (`.db`), or a legacy file to convert first.
    pub file: String,
    /// Output in JSON format.
    pub json: bool,
}

#[derive(Serialize)]
struct KeySummary {
    number: u16,
    segments: usize,
    length: usize,
    composite: bool,
    unique: bool,
    nullable: bool,
    modifiable: bool,
}

#[derive(Serialize)]
struct StatSummary {
    record_length: u16,
    physical_record_length: u16,
    page_length: u16,
    variable_length_records: bool,
    record_count: u32,
    keys: Vec<KeySummary>,
}

/// Open `opts.file` (converting a legacy `.DAT` file into its SQL-backed
/// store first if no `.db` sibling exists yet) and print a `FILESPEC`-style
/// summary of its metadata and key definitions.
pub fn execute(opts: &StatOptions, writer: &mut dyn Write) -> Result<()> {
    let driver = Driver::open(&opts.file, OpenMode::Normal)?;
    let store = driver.share();
    let store = store.lock().unwrap_or_else(|p| p.into_inner());

    let summary = StatSummary {
        record_length: store.record_length,
        physical_record_length: store.physical_record_length,
        page_length: store.page_length,
        variable_length_records: store.variable_length_records,
        record_count: store.record_count()?,
        keys: store
            .keys
            .iter()
            .map(|k| KeySummary {
                number: k.number(),
                segments: k.segments().len(),
                length: k.length(),
                composite: k.is_composite(),
                unique: k.is_unique(),
                nullable: k.is_nullable(),
                modifiable: k.is_modifiable(),
            })
            .collect(),
    };

    if opts.json {
        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| crate::error::BtrieveError::IoError(e.to_string()))?;
        wprintln!(writer, "{text}")?;
        return Ok(());
    }

    wprintln!(writer, "file: {}", opts.file)?;
    wprintln!(writer, "record_length: {}", summary.record_length)?;
    wprintln!(writer, "physical_record_length: {}", summary.physical_record_length)?;
    wprintln!(writer, "page_length: {}", summary.page_length)?;
    wprintln!(writer, "variable_length_records: {}", summary.variable_length_records)?;
    wprintln!(writer, "record_count: {}", summary.record_count)?;
    wprintln!(writer, "keys:")?;
    for key in &summary.keys {
        wprintln!(
            writer,
            "  key {}: {} segment(s), length {}, composite={}, unique={}, nullable={}, modifiable={}",
            key.number,
            key.segments,
            key.length,
            key.composite,
            key.unique,
            key.nullable,
            key.modifiable,
        )?;
    }
    Ok(())
}
