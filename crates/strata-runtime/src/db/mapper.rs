//! Generic row mapping over any SQLite executor (pool, connection, or transaction).

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column as _, Executor, Row, TypeInfo, ValueRef};

use strata_core::context::ExecContext;
use strata_core::entity::{Entity, HasId, SqlValue};
use strata_core::error::{Result, StrataError};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Run a query and map every row onto a fresh `T`.
///
/// Result columns are matched to fields by name through `T`'s descriptor. A column
/// with no field is an error. No rows is an empty `Vec`, not an error.
pub async fn select<'e, T, X>(
    ctx: &ExecContext,
    executor: X,
    sql: &'e str,
    params: &[SqlValue],
) -> Result<Vec<T>>
where
    T: Entity,
    X: Executor<'e, Database = Sqlite>,
{
    let query = bind_all(sqlx::query(sql), params.iter().cloned());
    let rows = ctx
        .run("select", async {
            query.fetch_all(executor).await.map_err(StrataError::from)
        })
        .await?;

    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };

    let names: Vec<&str> = first.columns().iter().map(|c| c.name()).collect();
    let columns = T::descriptor().resolve(names.as_slice())?;

    rows.iter()
        .map(|row| -> Result<T> {
            let mut entity = T::default();
            for (idx, column) in columns.iter().enumerate() {
                column.assign(&mut entity, decode_value(row, idx)?)?;
            }
            Ok(entity)
        })
        .collect()
}

/// Insert `entity` and store the generated row id on it.
///
/// Placeholders in `sql` must follow field declaration order with the identifier
/// left out.
pub async fn insert<'e, T, X>(
    ctx: &ExecContext,
    executor: X,
    sql: &'e str,
    entity: &mut T,
) -> Result<()>
where
    T: Entity + HasId,
    X: Executor<'e, Database = Sqlite>,
{
    let values = T::descriptor().insert_values(entity);
    let query = bind_all(sqlx::query(sql), values);

    let result = ctx
        .run("insert", async {
            query.execute(executor).await.map_err(StrataError::from)
        })
        .await?;

    entity.set_id(result.last_insert_rowid());
    Ok(())
}

/// Run raw SQL, which may hold several statements, and return the rows affected.
pub async fn execute<'e, X>(ctx: &ExecContext, executor: X, sql: &'e str) -> Result<u64>
where
    X: Executor<'e, Database = Sqlite>,
{
    let result = ctx
        .run("execute", async {
            sqlx::raw_sql(sql)
                .execute(executor)
                .await
                .map_err(StrataError::from)
        })
        .await?;

    Ok(result.rows_affected())
}

fn bind_all<'q>(
    mut query: SqliteQuery<'q>,
    values: impl IntoIterator<Item = SqlValue>,
) -> SqliteQuery<'q> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Integer(v) => query.bind(v),
            SqlValue::Real(v) => query.bind(v),
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Blob(v) => query.bind(v),
        };
    }
    query
}

/// Read one column using the storage class of the stored value.
fn decode_value(row: &SqliteRow, idx: usize) -> Result<SqlValue> {
    let type_name = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }
        raw.type_info().name().to_string()
    };

    let value = match type_name.as_str() {
        "REAL" => SqlValue::Real(row.try_get(idx)?),
        "TEXT" | "DATE" | "TIME" | "DATETIME" => SqlValue::Text(row.try_get(idx)?),
        "BLOB" => SqlValue::Blob(row.try_get(idx)?),
        _ => SqlValue::Integer(row.try_get(idx)?),
    };
    Ok(value)
}
