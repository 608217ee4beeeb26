use sqlx::{types::Json, PgPool};
use time::Date;
use uuid::Uuid;

use super::repo_types::{NewRecord, Record, RecordPatch, RecordRow};
use crate::error::AppError;

const COLUMNS: &str = "id, date, scheme_id, scheme_name, meals, note, created_at, updated_at";

impl Record {
    /// All records, newest first, optionally limited to an inclusive date range.
    pub async fn list(db: &PgPool, range: Option<(Date, Date)>) -> Result<Vec<Record>, AppError> {
        let rows = match range {
            Some((start, end)) => {
                sqlx::query_as::<_, RecordRow>(&format!(
                    "SELECT {COLUMNS} FROM records WHERE date >= $1 AND date <= $2 ORDER BY date DESC"
                ))
                .bind(start)
                .bind(end)
                .fetch_all(db)
                .await?
            }
            None => {
                sqlx::query_as::<_, RecordRow>(&format!(
                    "SELECT {COLUMNS} FROM records ORDER BY date DESC"
                ))
                .fetch_all(db)
                .await?
            }
        };
        Ok(rows.into_iter().map(Record::from).collect())
    }

    pub async fn list_for_scheme(db: &PgPool, scheme_id: Uuid) -> Result<Vec<Record>, AppError> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {COLUMNS} FROM records WHERE scheme_id = $1 ORDER BY date ASC"
        ))
        .bind(scheme_id)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Record>, AppError> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {COLUMNS} FROM records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row.map(Record::from))
    }

    pub async fn find_by_date(db: &PgPool, date: Date) -> Result<Option<Record>, AppError> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {COLUMNS} FROM records WHERE date = $1"
        ))
        .bind(date)
        .fetch_optional(db)
        .await?;
        Ok(row.map(Record::from))
    }

    /// Plain insert; the UNIQUE(date) constraint turns a second record for
    /// the same day into `AppError::Conflict`.
    pub async fn create(db: &PgPool, new: NewRecord) -> Result<Record, AppError> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            INSERT INTO records (id, date, scheme_id, scheme_name, meals, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.date)
        .bind(new.scheme_id)
        .bind(new.scheme_name)
        .bind(Json(new.meals))
        .bind(new.note)
        .fetch_one(db)
        .await?;
        Ok(row.into())
    }

    pub async fn update(db: &PgPool, id: Uuid, patch: RecordPatch) -> Result<Record, AppError> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            UPDATE records
            SET date = COALESCE($1, date),
                scheme_id = COALESCE($2, scheme_id),
                scheme_name = COALESCE($3, scheme_name),
                meals = COALESCE($4, meals),
                note = COALESCE($5, note),
                updated_at = now()
            WHERE id = $6
            RETURNING {COLUMNS}
            "#
        ))
        .bind(patch.date)
        .bind(patch.scheme_id)
        .bind(patch.scheme_name)
        .bind(patch.meals.map(Json))
        .bind(patch.note)
        .bind(id)
        .fetch_optional(db)
        .await?;
        row.map(Record::from)
            .ok_or_else(|| AppError::NotFound(format!("record {id}")))
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM records WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("record {id}")));
        }
        Ok(())
    }
}
