pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod migration;

pub use config::StrataConfig;
pub use context::ExecContext;
pub use entity::{Column, Entity, EntityDescriptor, FromSqlValue, HasId, SqlValue, ToSqlValue};
pub use error::{Result, StrataError};
pub use migration::{ChangeScript, MigrationPlan, MigrationSet, MigrationSource};
