use crate::error::{Result, StrataError};

/// A single column value moving between a record and a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Integer(_) => "INTEGER",
            SqlValue::Real(_) => "REAL",
            SqlValue::Text(_) => "TEXT",
            SqlValue::Blob(_) => "BLOB",
        }
    }

    fn mismatch(self, expected: &str) -> StrataError {
        StrataError::Mapping(format!(
            "expected {}, got {}",
            expected,
            self.type_name()
        ))
    }
}

/// Conversion from a field into a column value.
pub trait ToSqlValue {
    fn to_sql_value(&self) -> SqlValue;
}

/// Conversion from a column value into a field.
pub trait FromSqlValue: Sized {
    fn from_sql_value(value: SqlValue) -> Result<Self>;
}

impl ToSqlValue for i64 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Integer(*self)
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Integer(v) => Ok(v),
            other => Err(other.mismatch("INTEGER")),
        }
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Integer(i64::from(*self))
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        let wide = i64::from_sql_value(value)?;
        i32::try_from(wide)
            .map_err(|_| StrataError::Mapping(format!("{} does not fit in i32", wide)))
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Integer(i64::from(*self))
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        Ok(i64::from_sql_value(value)? != 0)
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Real(*self)
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Real(v) => Ok(v),
            SqlValue::Integer(v) => Ok(v as f64),
            other => Err(other.mismatch("REAL")),
        }
    }
}

impl ToSqlValue for String {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Text(v) => Ok(v),
            other => Err(other.mismatch("TEXT")),
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Blob(self.clone())
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Blob(v) => Ok(v),
            SqlValue::Text(v) => Ok(v.into_bytes()),
            other => Err(other.mismatch("BLOB")),
        }
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(&self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_rejects_text() {
        let err = i64::from_sql_value(SqlValue::Text("12".into())).unwrap_err();
        assert!(matches!(err, StrataError::Mapping(ref m) if m.contains("INTEGER")));
    }

    #[test]
    fn test_option_maps_null() {
        assert_eq!(Option::<String>::from_sql_value(SqlValue::Null).unwrap(), None);
        assert_eq!(None::<i64>.to_sql_value(), SqlValue::Null);
        assert_eq!(
            Option::<i64>::from_sql_value(SqlValue::Integer(7)).unwrap(),
            Some(7)
        );
    }

    #[test]
    fn test_i32_overflow_is_mapping_error() {
        let err = i32::from_sql_value(SqlValue::Integer(i64::MAX)).unwrap_err();
        assert!(matches!(err, StrataError::Mapping(_)));
    }

    #[test]
    fn test_bool_stored_as_integer() {
        assert_eq!(true.to_sql_value(), SqlValue::Integer(1));
        assert!(!bool::from_sql_value(SqlValue::Integer(0)).unwrap());
    }

    #[test]
    fn test_real_accepts_integer_storage() {
        assert_eq!(f64::from_sql_value(SqlValue::Integer(3)).unwrap(), 3.0);
    }
}
