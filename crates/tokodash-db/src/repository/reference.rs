//! # Reference Checks
//!
//! Foreign keys in the schema are single-column, so SQLite alone would
//! accept an id belonging to another tenant. Every write that stores a
//! reference checks it here first.

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, DbResult};

/// Rows other rows may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Store,
    Platform,
    Supplier,
    Category,
    Bank,
}

impl ReferenceKind {
    fn table(self) -> &'static str {
        match self {
            ReferenceKind::Store => "stores",
            ReferenceKind::Platform => "platforms",
            ReferenceKind::Supplier => "suppliers",
            ReferenceKind::Category => "categories",
            ReferenceKind::Bank => "banks",
        }
    }

    fn entity(self) -> &'static str {
        match self {
            ReferenceKind::Store => "Store",
            ReferenceKind::Platform => "Platform",
            ReferenceKind::Supplier => "Supplier",
            ReferenceKind::Category => "Category",
            ReferenceKind::Bank => "Bank",
        }
    }
}

pub struct ReferenceRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl ReferenceRepository {
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        ReferenceRepository { pool, tenant_id }
    }

    fn exists_sql(kind: ReferenceKind) -> String {
        format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1 AND tenant_id = ?2)",
            kind.table()
        )
    }

    /// `NotFound` unless `id` is a row of this tenant.
    pub async fn ensure_owned(&self, kind: ReferenceKind, id: &str) -> DbResult<()> {
        let exists: bool = sqlx::query_scalar(&Self::exists_sql(kind))
            .bind(id)
            .bind(&*self.tenant_id)
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Ok(())
        } else {
            Err(DbError::not_found(kind.entity(), id))
        }
    }

    /// [`ensure_owned`](Self::ensure_owned) inside a caller's transaction.
    pub async fn ensure_owned_in(
        &self,
        conn: &mut SqliteConnection,
        kind: ReferenceKind,
        id: &str,
    ) -> DbResult<()> {
        let exists: bool = sqlx::query_scalar(&Self::exists_sql(kind))
            .bind(id)
            .bind(&*self.tenant_id)
            .fetch_one(&mut *conn)
            .await?;

        if exists {
            Ok(())
        } else {
            Err(DbError::not_found(kind.entity(), id))
        }
    }

    /// Checks each present id, stopping at the first foreign one.
    pub async fn ensure_all_owned(&self, refs: &[(ReferenceKind, Option<&str>)]) -> DbResult<()> {
        for (kind, id) in refs {
            if let Some(id) = id {
                self.ensure_owned(*kind, id).await?;
            }
        }
        Ok(())
    }
}
