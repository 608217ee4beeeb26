use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

const DEFAULT_RECOMMEND_COUNT: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub default_recommend_count: i32,
    pub current_scheme_id: Option<Uuid>,
    pub theme: String,
    pub language: String,
    pub date_format: String,
    pub chart_granularity: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_recommend_count: DEFAULT_RECOMMEND_COUNT,
            current_scheme_id: None,
            theme: "auto".into(),
            language: "zh-CN".into(),
            date_format: "YYYY-MM-DD".into(),
            chart_granularity: "week".into(),
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub default_recommend_count: Option<i32>,
    pub current_scheme_id: Option<Uuid>,
    pub theme: Option<String>,
    pub language: Option<String>,
    pub date_format: Option<String>,
    pub chart_granularity: Option<String>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.default_recommend_count.is_none()
            && self.current_scheme_id.is_none()
            && self.theme.is_none()
            && self.language.is_none()
            && self.date_format.is_none()
            && self.chart_granularity.is_none()
    }

    pub fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.default_recommend_count {
            settings.default_recommend_count = v;
        }
        if let Some(v) = self.current_scheme_id {
            settings.current_scheme_id = Some(v);
        }
        if let Some(v) = self.theme {
            settings.theme = v;
        }
        if let Some(v) = self.language {
            settings.language = v;
        }
        if let Some(v) = self.date_format {
            settings.date_format = v;
        }
        if let Some(v) = self.chart_granularity {
            settings.chart_granularity = v;
        }
    }
}
