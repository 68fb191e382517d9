mod mapper;
mod pool;

pub use mapper::{execute, insert, select};
pub use pool::{Database, DatabasePool};

/// Current wall-clock time as Unix nanoseconds.
pub fn now_nanos() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
