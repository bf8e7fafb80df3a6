//! Legacy record-manager file decoding, the key engine, the SQL-backed
//! store, and the stateful handle facade that dispatches operation codes
//! against it.

pub mod cache;
pub mod constants;
pub mod database;
pub mod driver;
pub mod key;
pub mod key_segment;
pub mod open_mode;
pub mod operation;
pub mod query;
pub mod record;
pub mod store;
pub mod value;

pub use database::Database;
pub use driver::{Driver, Outcome};
pub use key::Key;
pub use key_segment::{KeyDataType, KeySegment};
pub use open_mode::OpenMode;
pub use operation::OperationCode;
pub use query::{CursorDirection, Query};
pub use record::Record;
pub use store::SqlStore;
pub use value::TypedValue;
