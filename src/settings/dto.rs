use serde::Deserialize;
use uuid::Uuid;

use super::repo_types::SettingsPatch;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub default_recommend_count: Option<i32>,
    pub current_scheme_id: Option<Uuid>,
    pub theme: Option<String>,
    pub language: Option<String>,
    pub date_format: Option<String>,
    pub chart_granularity: Option<String>,
}

impl From<UpdateSettingsRequest> for SettingsPatch {
    fn from(r: UpdateSettingsRequest) -> Self {
        Self {
            default_recommend_count: r.default_recommend_count,
            current_scheme_id: r.current_scheme_id,
            theme: r.theme,
            language: r.language,
            date_format: r.date_format,
            chart_granularity: r.chart_granularity,
        }
    }
}
