use serde::{Deserialize, Serialize};

use crate::records::Record;
use crate::rotation::{MealSet, Recommendation};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Falls back to the saved `defaultRecommendCount`.
    pub count: Option<usize>,
    /// `YYYY-MM-DD`, today when absent.
    pub start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMealsRequest {
    pub meals: MealSet,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub recommendation: Recommendation,
    pub record: Record,
}
