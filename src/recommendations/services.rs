use rand::Rng;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::dto::{ConfirmResponse, GenerateRequest};
use crate::config::RecommendConfig;
use crate::dates::parse_date;
use crate::error::AppError;
use crate::rotation::{Recommendation, Session};
use crate::storage::MealStore;

fn resolve_count(requested: Option<usize>, saved_default: i32, cfg: &RecommendConfig) -> Result<usize, AppError> {
    let count = match requested {
        Some(count) => count,
        None => usize::try_from(saved_default).unwrap_or(cfg.default_count),
    };
    if count == 0 || count > cfg.max_count {
        return Err(AppError::validation(format!(
            "count must be between 1 and {}",
            cfg.max_count
        )));
    }
    Ok(count)
}

pub async fn generate<R: Rng + ?Sized>(
    store: &dyn MealStore,
    session: &mut Session,
    cfg: &RecommendConfig,
    req: GenerateRequest,
    rng: &mut R,
) -> Result<Vec<Recommendation>, AppError> {
    let settings = store.get_settings().await?;
    let count = resolve_count(req.count, settings.default_recommend_count, cfg)?;
    let start: Date = match req.start_date {
        Some(raw) => parse_date(&raw)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let recs = session.generate(store, count, start, rng).await?;
    Ok(recs.to_vec())
}

pub async fn confirm(store: &dyn MealStore, session: &mut Session, id: Uuid) -> Result<ConfirmResponse, AppError> {
    let record = session.confirm(store, id).await?;
    let recommendation = session
        .pending()
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("recommendation {id}")))?;
    Ok(ConfirmResponse {
        recommendation,
        record,
    })
}
