//! Legacy paged record-manager file decoder and SQL-backed store.
//!
//! The `recman` crate (binary name `recman`) reads the paged `.DAT` files
//! written by Btrieve-family record managers, decodes their page-zero
//! header, key definitions, ACS table, and record pages, then loads the
//! decoded records into a SQLite-backed store that can be queried by key
//! the same way the original file format supported.
//!
//! # CLI Reference
//!
//! Install the `recman` binary and use its subcommands to work with these
//! files from the command line.
//!
//! ## Subcommands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | [`recman stat`](cli::app::Commands::Stat) | Print header, key, and record-count summary |
//! | [`recman create`](cli::app::Commands::Create) | Convert a `.DAT` file into its SQL-backed store |
//! | [`recman dump`](cli::app::Commands::Dump) | Hex dump of a record at a given position |
//! | [`recman query`](cli::app::Commands::Query) | Run a keyed lookup against a converted store |
//!
//! ## Library API
//!
//! ```no_run
//! use recman::btrieve::{Driver, OpenMode, OperationCode};
//!
//! let mut driver = Driver::open("CLIENTS.DAT", OpenMode::Normal).unwrap();
//! let outcome = driver
//!     .perform(OperationCode::StepFirst, None, &[], None, None)
//!     .unwrap();
//! println!("{outcome:?}");
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`btrieve::database`] | Page-zero header, ACS, key definitions, record-page walking |
//! | [`btrieve::key_segment`] | Per-segment attributes, data types, ACS requirements |
//! | [`btrieve::key`] | Composite keys: extraction, null detection, typed conversion |
//! | [`btrieve::value`] | The `TypedValue` SQL binding/extraction type |
//! | [`btrieve::store`] | The SQLite-backed indexed store: schema, CRUD, keyed scans |
//! | [`btrieve::query`] | The keyed cursor and its direction-reversal bookkeeping |
//! | [`btrieve::operation`] | Operation codes and lock-modifier synonym folding |
//! | [`btrieve::driver`] | The stateful per-handle facade dispatching operation codes |
//! | [`btrieve::cache`] | The bounded LRU record cache |
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | on | Builds the `recman` binary and its `clap`-based subcommands. |

pub mod btrieve;
#[cfg(feature = "cli")]
pub mod cli;
pub mod error;
pub mod util;

pub use error::{BtrieveError, Result};
