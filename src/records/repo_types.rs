use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::rotation::MealSet;

/// One persisted day: the three dishes eaten and the scheme active at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Uuid,
    #[serde(with = "crate::dates::iso")]
    pub date: Date,
    pub scheme_id: Uuid,
    pub scheme_name: String,
    pub meals: MealSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct RecordRow {
    pub id: Uuid,
    pub date: Date,
    pub scheme_id: Uuid,
    pub scheme_name: String,
    pub meals: Json<MealSet>,
    pub note: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<RecordRow> for Record {
    fn from(r: RecordRow) -> Self {
        Self {
            id: r.id,
            date: r.date,
            scheme_id: r.scheme_id,
            scheme_name: r.scheme_name,
            meals: r.meals.0,
            note: r.note,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRecord {
    pub date: Date,
    pub scheme_id: Uuid,
    pub scheme_name: String,
    pub meals: MealSet,
    pub note: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub date: Option<Date>,
    pub scheme_id: Option<Uuid>,
    pub scheme_name: Option<String>,
    pub meals: Option<MealSet>,
    pub note: Option<String>,
}

impl RecordPatch {
    pub fn apply(self, record: &mut Record) {
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(scheme_id) = self.scheme_id {
            record.scheme_id = scheme_id;
        }
        if let Some(scheme_name) = self.scheme_name {
            record.scheme_name = scheme_name;
        }
        if let Some(meals) = self.meals {
            record.meals = meals;
        }
        if let Some(note) = self.note {
            record.note = Some(note);
        }
    }
}
