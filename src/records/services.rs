use tracing::info;
use uuid::Uuid;

use super::dto::{CreateRecordRequest, DateRange, UpdateRecordRequest};
use super::repo_types::{NewRecord, Record, RecordPatch};
use crate::dates::parse_date;
use crate::error::AppError;
use crate::rotation::Session;
use crate::storage::MealStore;

pub async fn list_records(store: &dyn MealStore, range: DateRange) -> Result<Vec<Record>, AppError> {
    let range = match (range.start, range.end) {
        (Some(start), Some(end)) => Some((parse_date(&start)?, parse_date(&end)?)),
        (None, None) => None,
        _ => return Err(AppError::validation("start and end must be given together")),
    };
    store.list_records(range).await
}

pub async fn get_record(store: &dyn MealStore, id: Uuid) -> Result<Record, AppError> {
    store
        .get_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("record {id}")))
}

pub async fn get_record_by_date(store: &dyn MealStore, raw_date: &str) -> Result<Record, AppError> {
    let date = parse_date(raw_date)?;
    store
        .get_record_by_date(date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("record for {raw_date}")))
}

/// Logs a day by hand. An occupied date is a conflict, never an overwrite.
pub async fn create_record(
    store: &dyn MealStore,
    session: &mut Session,
    req: CreateRecordRequest,
) -> Result<Record, AppError> {
    let date = parse_date(&req.date)?;
    req.meals.validate()?;

    let (scheme_id, scheme_name) = match req.scheme_id {
        Some(id) => {
            let name = match req.scheme_name {
                Some(name) => name,
                None => store
                    .get_scheme(id)
                    .await?
                    .map(|s| s.name)
                    .ok_or_else(|| AppError::NotFound(format!("scheme {id}")))?,
            };
            (id, name)
        }
        None => {
            let active = session.active().ok_or(AppError::NoActiveScheme)?;
            (active.state.scheme_id, active.name.clone())
        }
    };

    let record = store
        .create_record(NewRecord {
            date,
            scheme_id,
            scheme_name,
            meals: req.meals,
            note: req.note,
        })
        .await?;
    info!(record_id = %record.id, date = %record.date, "record created");
    session.refresh_if_active(store, &[record.scheme_id]).await?;
    Ok(record)
}

pub async fn update_record(
    store: &dyn MealStore,
    session: &mut Session,
    id: Uuid,
    req: UpdateRecordRequest,
) -> Result<Record, AppError> {
    let before = get_record(store, id).await?;
    if let Some(meals) = &req.meals {
        meals.validate()?;
    }
    let patch = RecordPatch {
        date: req.date.as_deref().map(parse_date).transpose()?,
        scheme_id: req.scheme_id,
        scheme_name: req.scheme_name,
        meals: req.meals,
        note: req.note,
    };

    let record = store.update_record(id, patch).await?;
    info!(record_id = %id, "record updated");
    session
        .refresh_if_active(store, &[before.scheme_id, record.scheme_id])
        .await?;
    Ok(record)
}

pub async fn delete_record(store: &dyn MealStore, session: &mut Session, id: Uuid) -> Result<(), AppError> {
    let record = get_record(store, id).await?;
    store.delete_record(id).await?;
    info!(record_id = %id, date = %record.date, "record deleted");
    session.refresh_if_active(store, &[record.scheme_id]).await?;
    Ok(())
}
