//! The typed value a key's raw bytes decode into, and its SQLite binding.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};

/// A decoded key value, independent of which [`KeyDataType`](super::constants)
/// produced it.
///
/// This is the one pair of conversions (`ToSql`/`FromSql`) that stands in for
/// the bindable-value/reader abstraction a database-agnostic implementation
/// would need: with a single concrete SQL engine there is no abstraction left
/// to build, only the conversion itself.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Integer(i64),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl ToSql for TypedValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            TypedValue::Null => ToSqlOutput::Owned(Value::Null),
            TypedValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            TypedValue::Double(d) => ToSqlOutput::Owned(Value::Real(*d)),
            TypedValue::Text(s) => ToSqlOutput::Owned(Value::Text(s.clone())),
            TypedValue::Blob(b) => ToSqlOutput::Owned(Value::Blob(b.clone())),
        })
    }
}

impl FromSql for TypedValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => TypedValue::Null,
            ValueRef::Integer(i) => TypedValue::Integer(i),
            ValueRef::Real(d) => TypedValue::Double(d),
            ValueRef::Text(t) => TypedValue::Text(
                std::str::from_utf8(t)
                    .map_err(|e| FromSqlError::Other(Box::new(e)))?
                    .to_owned(),
            ),
            ValueRef::Blob(b) => TypedValue::Blob(b.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_to_sql_and_from_sql() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (v)", []).unwrap();
        for v in [
            TypedValue::Null,
            TypedValue::Integer(-7),
            TypedValue::Double(3.5),
            TypedValue::Text("hi".into()),
            TypedValue::Blob(vec![1, 2, 3]),
        ] {
            conn.execute("DELETE FROM t", []).unwrap();
            conn.execute("INSERT INTO t (v) VALUES (?1)", [&v]).unwrap();
            let got: TypedValue = conn
                .query_row("SELECT v FROM t", [], |r| r.get(0))
                .unwrap();
            assert_eq!(got, v);
        }
    }
}
