//! STRATA - versioned SQLite schemas and signed binaries.

mod runtime;

pub use runtime::Strata;
