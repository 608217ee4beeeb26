use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{NewScheme, Scheme, SchemePatch, SchemeRow};
use crate::error::AppError;

const COLUMNS: &str =
    "id, name, description, pools, original_pools, is_default, cycle_started_at, created_at, updated_at";

impl Scheme {
    pub async fn list(db: &PgPool) -> Result<Vec<Scheme>, AppError> {
        let rows = sqlx::query_as::<_, SchemeRow>(&format!(
            "SELECT {COLUMNS} FROM schemes ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(Scheme::from).collect())
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Scheme>, AppError> {
        let row = sqlx::query_as::<_, SchemeRow>(&format!(
            "SELECT {COLUMNS} FROM schemes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row.map(Scheme::from))
    }

    /// New schemes start a fresh cycle: working pools equal the original.
    pub async fn create(db: &PgPool, new: NewScheme) -> Result<Scheme, AppError> {
        let mut tx = db.begin().await?;
        if new.is_default {
            sqlx::query("UPDATE schemes SET is_default = FALSE WHERE is_default")
                .execute(&mut *tx)
                .await?;
        }
        let row = sqlx::query_as::<_, SchemeRow>(&format!(
            r#"
            INSERT INTO schemes (id, name, description, pools, original_pools, is_default)
            VALUES ($1, $2, $3, $4, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.description)
        .bind(Json(new.original_pools))
        .bind(new.is_default)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    pub async fn update(db: &PgPool, id: Uuid, patch: SchemePatch) -> Result<Scheme, AppError> {
        let mut tx = db.begin().await?;
        if patch.is_default == Some(true) {
            sqlx::query("UPDATE schemes SET is_default = FALSE WHERE is_default AND id <> $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        let row = sqlx::query_as::<_, SchemeRow>(&format!(
            r#"
            UPDATE schemes
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                pools = COALESCE($3, pools),
                original_pools = COALESCE($4, original_pools),
                is_default = COALESCE($5, is_default),
                cycle_started_at = CASE WHEN $6 THEN now() ELSE cycle_started_at END,
                updated_at = now()
            WHERE id = $7
            RETURNING {COLUMNS}
            "#
        ))
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.pools.map(Json))
        .bind(patch.original_pools.map(Json))
        .bind(patch.is_default)
        .bind(patch.restart_cycle)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Err(AppError::NotFound(format!("scheme {id}")));
        };
        tx.commit().await?;
        Ok(row.into())
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM schemes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("scheme {id}")));
        }
        Ok(())
    }
}
