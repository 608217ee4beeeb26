use rand::Rng;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::pool::{Category, MealSet, Pool};
use super::remaining::exhausted;
use crate::dates::add_days;
use crate::error::AppError;
use crate::storage::MealStore;

/// Occupied dates probed before giving up and taking the next one anyway.
const DATE_PROBE_LIMIT: u32 = 30;

/// A candidate day that only becomes a record once confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: Uuid,
    #[serde(with = "crate::dates::iso")]
    pub date: Date,
    pub scheme_id: Uuid,
    pub meals: MealSet,
    pub is_confirmed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Generated {
    pub recommendations: Vec<Recommendation>,
    /// Working pool after every draw, for edits of still-pending days.
    pub remaining: Pool,
}

/// First date at or after `start` without a record. After
/// `DATE_PROBE_LIMIT` occupied days the next date is returned regardless.
pub async fn resolve_start_date(store: &dyn MealStore, start: Date) -> Result<Date, AppError> {
    let mut date = start;
    for _ in 0..DATE_PROBE_LIMIT {
        if store.get_record_by_date(date).await?.is_none() {
            return Ok(date);
        }
        date = add_days(date, 1)?;
    }
    debug!(%start, %date, "no free date within probe limit");
    Ok(date)
}

/// Draws `count` consecutive days from a private copy of `working`, one dish
/// per category without replacement. A category that runs dry is refilled
/// from `original` before the next draw.
pub fn generate<R: Rng + ?Sized>(
    working: &Pool,
    original: &Pool,
    count: usize,
    start: Date,
    scheme_id: Uuid,
    rng: &mut R,
) -> Result<Generated, AppError> {
    if count == 0 {
        return Err(AppError::validation("count must be at least 1"));
    }
    if let Some(category) = exhausted(original).next() {
        return Err(AppError::EmptyOriginalPool(category));
    }

    let mut pool = working.clone();
    let mut recommendations = Vec::with_capacity(count);
    for offset in 0..count {
        let date = add_days(start, offset as i64)?;
        let meals = MealSet {
            a: draw(&mut pool, original, Category::A, rng),
            b: draw(&mut pool, original, Category::B, rng),
            c: draw(&mut pool, original, Category::C, rng),
        };
        debug!(%date, a = %meals.a, b = %meals.b, c = %meals.c, "drew meals");
        recommendations.push(Recommendation {
            id: Uuid::new_v4(),
            date,
            scheme_id,
            meals,
            is_confirmed: false,
            created_at: OffsetDateTime::now_utc(),
        });
    }

    Ok(Generated {
        recommendations,
        remaining: pool,
    })
}

fn draw<R: Rng + ?Sized>(
    pool: &mut Pool,
    original: &Pool,
    category: Category,
    rng: &mut R,
) -> String {
    let list = pool.get_mut(category);
    if list.is_empty() {
        debug!(%category, "pool exhausted, resetting from original");
        *list = original.get(category).to_vec();
    }
    // original is non-empty, checked by the caller
    let idx = rng.gen_range(0..list.len());
    list.remove(idx)
}
