use serde::Deserialize;
use uuid::Uuid;

use crate::rotation::MealSet;

/// Dates arrive as plain strings so a malformed one is reported as a
/// validation error rather than a body rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    pub date: String,
    /// Defaults to the active scheme.
    pub scheme_id: Option<Uuid>,
    pub scheme_name: Option<String>,
    pub meals: MealSet,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    pub date: Option<String>,
    pub scheme_id: Option<Uuid>,
    pub scheme_name: Option<String>,
    pub meals: Option<MealSet>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}
