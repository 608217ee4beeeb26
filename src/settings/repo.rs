use sqlx::PgPool;

use super::repo_types::{Settings, SettingsPatch};
use crate::error::AppError;

const COLUMNS: &str = "default_recommend_count, current_scheme_id, theme, language, \
                       date_format, chart_granularity, updated_at";

impl Settings {
    /// The singleton row, or the defaults when nothing was saved yet.
    pub async fn load(db: &PgPool) -> Result<Settings, AppError> {
        let row = sqlx::query_as::<_, Settings>(&format!(
            "SELECT {COLUMNS} FROM settings WHERE id = 1"
        ))
        .fetch_optional(db)
        .await?;
        Ok(row.unwrap_or_default())
    }

    pub async fn save(db: &PgPool, patch: SettingsPatch) -> Result<Settings, AppError> {
        let mut settings = Settings::load(db).await?;
        patch.apply(&mut settings);
        let row = sqlx::query_as::<_, Settings>(&format!(
            r#"
            INSERT INTO settings (id, default_recommend_count, current_scheme_id, theme,
                                  language, date_format, chart_granularity, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (id) DO UPDATE
            SET default_recommend_count = EXCLUDED.default_recommend_count,
                current_scheme_id = EXCLUDED.current_scheme_id,
                theme = EXCLUDED.theme,
                language = EXCLUDED.language,
                date_format = EXCLUDED.date_format,
                chart_granularity = EXCLUDED.chart_granularity,
                updated_at = now()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(settings.default_recommend_count)
        .bind(settings.current_scheme_id)
        .bind(settings.theme)
        .bind(settings.language)
        .bind(settings.date_format)
        .bind(settings.chart_granularity)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
