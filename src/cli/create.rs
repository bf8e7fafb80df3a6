//! `recman create` — decode a legacy `.DAT` file and build its SQL-backed
//! store explicitly, rather than letting `stat`/`dump`/`query` do it lazily.

use std::io::Write;

use crate::btrieve::SqlStore;
use crate::cli::wprintln;
use crate::error::Result;

/// Options for the `recman create` subcommand.
pub struct CreateOptions {
    /// Path to the legacy `.DAT` file.
    pub file: String,
    /// Path to write the converted store.
    pub out: String,
}

/// Decode `opts.file` and build a fresh store at `opts.out`, reporting the
/// record and key counts on success. A failed run leaves no half-built
/// store: this command removes `opts.out` itself before returning the error.
pub fn execute(opts: &CreateOptions, writer: &mut dyn Write) -> Result<()> {
    match SqlStore::create(&opts.file, &opts.out) {
        Ok(store) => {
            wprintln!(writer, "created {}", opts.out)?;
            wprintln!(writer, "records: {}", store.record_count()?)?;
            wprintln!(writer, "keys: {}", store.keys.len())?;
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&opts.out);
            Err(e)
        }
    }
}
