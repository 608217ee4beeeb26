use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub scheme_id: Option<uuid::Uuid>,
    pub granularity: Option<String>,
}
