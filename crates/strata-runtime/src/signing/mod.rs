//! Signed artifacts: SHA-256 digests of binaries recorded as trusted.
//!
//! Reads and writes go through the entity mapper, so every command here runs
//! behind the schema gate.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{Executor, Sqlite};
use strata_macros::Entity;
use tracing::{debug, info, warn};

use strata_core::context::ExecContext;
use strata_core::entity::SqlValue;
use strata_core::error::{Result, StrataError};

use crate::db::{self, now_nanos, Database};

const INSERT_SIGNED_BINARY: &str =
    "INSERT INTO signed_binaries (hash, created_at, updated_at) VALUES (?, ?, ?)";
const SELECT_BY_HASH: &str = "SELECT * FROM signed_binaries WHERE hash = ?";

/// A binary whose digest has been signed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Entity)]
pub struct SignedBinary {
    pub id: i64,
    pub hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SignedBinary {
    pub fn new(hash: impl Into<String>) -> Self {
        let now = now_nanos();
        Self {
            id: 0,
            hash: hash.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn signed_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.created_at)
    }
}

/// Lowercase hex SHA-256 of everything `reader` yields.
pub fn digest<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest a file on the blocking pool.
pub async fn digest_file(path: &Path) -> Result<String> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || digest(File::open(&path)?))
        .await
        .map_err(|e| StrataError::Internal(format!("digest task failed: {}", e)))?
        .map_err(StrataError::from)
}

/// Record a signed binary. A hash that is already signed is `AlreadyExists`.
pub async fn create<'e, X>(ctx: &ExecContext, executor: X, binary: &mut SignedBinary) -> Result<()>
where
    X: Executor<'e, Database = Sqlite>,
{
    match db::insert(ctx, executor, INSERT_SIGNED_BINARY, binary).await {
        Err(e) if e.is_duplicate_entry() => Err(StrataError::AlreadyExists(format!(
            "a signed binary with hash {} already exists",
            binary.hash
        ))),
        other => other,
    }
}

/// Look up a signed binary by digest.
pub async fn find_by_hash<'e, X>(
    ctx: &ExecContext,
    executor: X,
    hash: &str,
) -> Result<Option<SignedBinary>>
where
    X: Executor<'e, Database = Sqlite>,
{
    let mut found: Vec<SignedBinary> =
        db::select(ctx, executor, SELECT_BY_HASH, &[SqlValue::from(hash)]).await?;

    match found.len() {
        0 => {
            debug!(hash, "No signed binary with this hash");
            Ok(None)
        }
        1 => Ok(found.pop()),
        count => {
            warn!(hash, count, "Several signed binaries share one hash");
            Err(StrataError::InvalidState(format!(
                "{} signed binaries share hash {}",
                count, hash
            )))
        }
    }
}

/// Digest the file at `path` and record it as signed.
pub async fn sign_file(ctx: &ExecContext, db: &Database, path: &Path) -> Result<SignedBinary> {
    let hash = digest_file(path).await?;
    let mut binary = SignedBinary::new(hash);
    create(ctx, db.pool(), &mut binary).await?;

    info!(path = %path.display(), hash = %binary.hash, "Binary signed");
    Ok(binary)
}

/// Digest the file at `path` and look up its signature.
pub async fn check_file(ctx: &ExecContext, db: &Database, path: &Path) -> Result<Option<SignedBinary>> {
    let hash = digest_file(path).await?;
    let found = find_by_hash(ctx, db.pool(), &hash).await?;

    match &found {
        Some(binary) => info!(path = %path.display(), signed_at = %binary.signed_at(), "Binary is signed"),
        None => info!(path = %path.display(), "Binary is not signed"),
    }
    Ok(found)
}
