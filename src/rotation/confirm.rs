use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::generator::Recommendation;
use super::pool::{is_other, Category, MealSet, Pool, PoolSizes};
use super::remaining::compute_remaining_pool;
use crate::error::AppError;
use crate::records::{NewRecord, Record, RecordPatch};
use crate::schemes::{Scheme, SchemePatch};
use crate::storage::MealStore;

/// Rotation state of one scheme, passed explicitly into generate/confirm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub scheme_id: Uuid,
    pub original: Pool,
    pub working: Pool,
}

impl PoolState {
    /// Replays the records of the scheme's current cycle over its original pools.
    pub fn derive(scheme: &Scheme, records: &[Record]) -> Self {
        let records = scheme.current_cycle(records);
        Self {
            scheme_id: scheme.id,
            original: scheme.original_pools.clone(),
            working: compute_remaining_pool(&scheme.original_pools, &records, scheme.id),
        }
    }

    pub fn reset(&mut self, category: Category) {
        *self.working.get_mut(category) = self.original.get(category).to_vec();
    }

    /// Takes the confirmed dishes out of the working pool, then refills any
    /// category left empty. Ad-hoc dishes are skipped.
    pub fn consume(&mut self, meals: &MealSet) {
        for (category, dish) in meals.iter() {
            if is_other(dish) {
                continue;
            }
            self.working.remove_one(category, dish);
        }
        for category in Category::ALL {
            if self.working.get(category).is_empty() {
                debug!(%category, scheme_id = %self.scheme_id, "pool exhausted, resetting");
                self.reset(category);
            }
        }
    }

    pub fn sizes(&self) -> PoolSizes {
        self.working.sizes()
    }
}

/// Persists `rec` (updating the record already on its date, if any), then
/// applies it to `state` and saves the new working pool on the scheme.
/// When any write fails the record table is rolled back and `state` and
/// `rec` are left untouched.
pub async fn confirm(
    store: &dyn MealStore,
    state: &mut PoolState,
    rec: &mut Recommendation,
    scheme_name: &str,
) -> Result<Record, AppError> {
    rec.meals.validate()?;
    if rec.scheme_id != state.scheme_id {
        return Err(AppError::Conflict(format!(
            "recommendation belongs to scheme {}, active scheme is {}",
            rec.scheme_id, state.scheme_id
        )));
    }

    let previous = store.get_record_by_date(rec.date).await?;
    let record = match &previous {
        Some(existing) => {
            let patch = RecordPatch {
                scheme_id: Some(rec.scheme_id),
                scheme_name: Some(scheme_name.to_string()),
                meals: Some(rec.meals.clone()),
                ..RecordPatch::default()
            };
            store.update_record(existing.id, patch).await?
        }
        None => {
            store
                .create_record(NewRecord {
                    date: rec.date,
                    scheme_id: rec.scheme_id,
                    scheme_name: scheme_name.to_string(),
                    meals: rec.meals.clone(),
                    note: None,
                })
                .await?
        }
    };

    let mut next = state.clone();
    next.consume(&rec.meals);
    if let Err(e) = store
        .update_scheme(next.scheme_id, SchemePatch::working_pools(next.working.clone()))
        .await
    {
        undo_record_write(store, &record, previous).await;
        return Err(e);
    }
    *state = next;
    rec.is_confirmed = true;

    info!(record_id = %record.id, date = %record.date, scheme_id = %record.scheme_id, "recommendation confirmed");
    Ok(record)
}

async fn undo_record_write(store: &dyn MealStore, written: &Record, previous: Option<Record>) {
    let undone = match previous {
        Some(old) => {
            let patch = RecordPatch {
                scheme_id: Some(old.scheme_id),
                scheme_name: Some(old.scheme_name),
                meals: Some(old.meals),
                ..RecordPatch::default()
            };
            store.update_record(written.id, patch).await.map(|_| ())
        }
        None => store.delete_record(written.id).await,
    };
    match undone {
        Ok(()) => info!(record_id = %written.id, date = %written.date, "record write rolled back"),
        Err(e) => error!(error = %e, record_id = %written.id, "failed to roll back record write"),
    }
}
