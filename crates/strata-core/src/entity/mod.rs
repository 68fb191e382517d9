//! Column-descriptor model for mapping typed records to rows.
//!
//! Each entity type owns one [`EntityDescriptor`]: an ordered table of
//! `(column name, accessor)` pairs built once, the first time the type is used.
//! The generic read and write paths work only against this table, so one mapper
//! serves every entity without runtime type introspection.
//!
//! Descriptors are usually produced by `#[derive(Entity)]`, but can be written by
//! hand:
//!
//! ```ignore
//! impl Entity for Tag {
//!     const ENTITY_NAME: &'static str = "Tag";
//!
//!     fn descriptor() -> &'static EntityDescriptor<Self> {
//!         static DESCRIPTOR: LazyLock<EntityDescriptor<Tag>> = LazyLock::new(|| {
//!             EntityDescriptor::new("Tag", vec![
//!                 Column::new("id", true, |t: &Tag| t.id.to_sql_value(), |t: &mut Tag, v| {
//!                     t.id = FromSqlValue::from_sql_value(v)?;
//!                     Ok(())
//!                 }),
//!                 // ...
//!             ])
//!         });
//!         &DESCRIPTOR
//!     }
//! }
//! ```

mod value;

pub use value::{FromSqlValue, SqlValue, ToSqlValue};

use crate::error::{Result, StrataError};

/// One mapped field of an entity.
pub struct Column<E> {
    name: &'static str,
    is_id: bool,
    get: fn(&E) -> SqlValue,
    set: fn(&mut E, SqlValue) -> Result<()>,
}

impl<E> Column<E> {
    pub const fn new(
        name: &'static str,
        is_id: bool,
        get: fn(&E) -> SqlValue,
        set: fn(&mut E, SqlValue) -> Result<()>,
    ) -> Self {
        Self {
            name,
            is_id,
            get,
            set,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this column holds the store-assigned identifier.
    pub fn is_id(&self) -> bool {
        self.is_id
    }

    /// Read the field's current value.
    pub fn value(&self, entity: &E) -> SqlValue {
        (self.get)(entity)
    }

    /// Copy a column value into the field.
    pub fn assign(&self, entity: &mut E, value: SqlValue) -> Result<()> {
        (self.set)(entity, value).map_err(|e| match e {
            StrataError::Mapping(msg) => {
                StrataError::Mapping(format!("column '{}': {}", self.name, msg))
            }
            other => other,
        })
    }
}

impl<E> std::fmt::Debug for Column<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("is_id", &self.is_id)
            .finish()
    }
}

/// Ordered column table for one entity type, in field declaration order.
#[derive(Debug)]
pub struct EntityDescriptor<E> {
    entity: &'static str,
    columns: Vec<Column<E>>,
}

impl<E> EntityDescriptor<E> {
    pub fn new(entity: &'static str, columns: Vec<Column<E>>) -> Self {
        Self { entity, columns }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn columns(&self) -> &[Column<E>] {
        &self.columns
    }

    /// Look up a column by name, ignoring ASCII case.
    pub fn column(&self, name: &str) -> Option<&Column<E>> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn id_column(&self) -> Option<&Column<E>> {
        self.columns.iter().find(|c| c.is_id)
    }

    /// Resolve result-set column names to fields, in result order.
    ///
    /// A column with no matching field is an error: it means the table has drifted
    /// from the record type.
    pub fn resolve<'a, S: AsRef<str>>(&'a self, names: &[S]) -> Result<Vec<&'a Column<E>>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.column(name).ok_or_else(|| StrataError::UnmappedColumn {
                    entity: self.entity,
                    column: name.to_string(),
                })
            })
            .collect()
    }

    /// Values for an INSERT, in declaration order, without the identifier.
    pub fn insert_values(&self, entity: &E) -> Vec<SqlValue> {
        self.columns
            .iter()
            .filter(|c| !c.is_id)
            .map(|c| c.value(entity))
            .collect()
    }
}

/// A record type that can be read from rows.
pub trait Entity: Default + Send + Sized + 'static {
    /// Type name used in diagnostics.
    const ENTITY_NAME: &'static str;

    fn descriptor() -> &'static EntityDescriptor<Self>;
}

/// A record whose identifier is assigned by the store on insert.
pub trait HasId {
    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);
}
