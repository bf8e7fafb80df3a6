//! `recman dump` — print the raw record bytes at a given position.

use std::io::Write;

use crate::btrieve::SqlStore;
use crate::cli::wprintln;
use crate::error::Result;
use crate::util::hex::hex_dump;

/// Options for the `recman dump` subcommand.
pub struct DumpOptions {
    /// Path to a converted store (`.db`).
    pub file: String,
    /// Record position to dump.
    pub position: u32,
}

/// Open the already-converted store at `opts.file` and hex-dump the record
/// body at `opts.position`.
pub fn execute(opts: &DumpOptions, writer: &mut dyn Write) -> Result<()> {
    let mut store = SqlStore::open(&opts.file)?;
    let record = store.get_record(opts.position)?;
    wprintln!(writer, "position: {}", record.position)?;
    wprintln!(writer, "length: {}", record.data.len())?;
    wprintln!(writer, "{}", hex_dump(&record.data, 0))?;
    Ok(())
}
