use rand::Rng;
use serde::Serialize;
use time::Date;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::confirm::{confirm, PoolState};
use super::generator::{generate, resolve_start_date, Recommendation};
use super::pool::{MealSet, Pool, PoolSizes};
use crate::error::AppError;
use crate::records::Record;
use crate::schemes::SchemePatch;
use crate::storage::MealStore;

#[derive(Debug, Clone)]
pub struct ActiveScheme {
    pub name: String,
    pub state: PoolState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    pub scheme_id: Uuid,
    pub scheme_name: String,
    pub remaining: PoolSizes,
    pub original: PoolSizes,
    /// Remaining sizes once every pending recommendation is served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_pending: Option<PoolSizes>,
}

/// Single-user coordinator: the active scheme's pool state, the pending
/// recommendations and the pool left over after generating them.
#[derive(Debug, Default)]
pub struct Session {
    active: Option<ActiveScheme>,
    pending: Vec<Recommendation>,
    preview: Option<Pool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveScheme> {
        self.active.as_ref()
    }

    pub fn active_scheme_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|a| a.state.scheme_id)
    }

    pub fn pending(&self) -> &[Recommendation] {
        &self.pending
    }

    /// Derives the scheme's working pool from its history and makes it current.
    /// Pending recommendations of the previous scheme are dropped.
    pub async fn activate(&mut self, store: &dyn MealStore, scheme_id: Uuid) -> Result<&PoolState, AppError> {
        let active = Self::load(store, scheme_id).await?;
        info!(%scheme_id, name = %active.name, "scheme activated");
        self.pending.clear();
        self.preview = None;
        Ok(&self.active.insert(active).state)
    }

    /// Re-derives the active pool after the record set changed underneath it.
    /// Pending recommendations survive; the post-generation preview does not.
    pub async fn refresh(&mut self, store: &dyn MealStore) -> Result<(), AppError> {
        let Some(scheme_id) = self.active_scheme_id() else {
            return Ok(());
        };
        if store.get_scheme(scheme_id).await?.is_none() {
            warn!(%scheme_id, "active scheme disappeared, deactivating");
            self.deactivate();
            return Ok(());
        }
        let active = Self::load(store, scheme_id).await?;
        debug!(%scheme_id, sizes = ?active.state.sizes(), "pool state refreshed");
        self.active = Some(active);
        self.preview = None;
        Ok(())
    }

    async fn load(store: &dyn MealStore, scheme_id: Uuid) -> Result<ActiveScheme, AppError> {
        let scheme = store
            .get_scheme(scheme_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("scheme {scheme_id}")))?;
        let records = store.list_records_for_scheme(scheme_id).await?;
        let state = PoolState::derive(&scheme, &records);
        store
            .update_scheme(scheme_id, SchemePatch::working_pools(state.working.clone()))
            .await?;
        Ok(ActiveScheme {
            name: scheme.name,
            state,
        })
    }

    /// Refreshes only when the change touched the active scheme's history.
    pub async fn refresh_if_active(&mut self, store: &dyn MealStore, scheme_ids: &[Uuid]) -> Result<(), AppError> {
        match self.active_scheme_id() {
            Some(id) if scheme_ids.contains(&id) => self.refresh(store).await,
            _ => Ok(()),
        }
    }

    /// Starts a new cycle for the active scheme without consulting history.
    pub fn reset_to_original(&mut self, scheme_id: Uuid) {
        if let Some(active) = self.active.as_mut().filter(|a| a.state.scheme_id == scheme_id) {
            active.state.working = active.state.original.clone();
            self.preview = None;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = None;
        self.pending.clear();
        self.preview = None;
    }

    /// Replaces the pending list with `count` fresh days starting at the first
    /// unrecorded date on or after `start`.
    pub async fn generate<R: Rng + ?Sized>(
        &mut self,
        store: &dyn MealStore,
        count: usize,
        start: Date,
        rng: &mut R,
    ) -> Result<&[Recommendation], AppError> {
        let active = self.active.as_ref().ok_or(AppError::NoActiveScheme)?;
        let first = resolve_start_date(store, start).await?;
        let generated = generate(
            &active.state.working,
            &active.state.original,
            count,
            first,
            active.state.scheme_id,
            rng,
        )?;
        info!(scheme_id = %active.state.scheme_id, %first, count, "recommendations generated");
        self.pending = generated.recommendations;
        self.preview = Some(generated.remaining);
        Ok(&self.pending)
    }

    pub fn update_meals(&mut self, id: Uuid, meals: MealSet) -> Result<&Recommendation, AppError> {
        meals.validate()?;
        let rec = self.find_pending(id)?;
        if rec.is_confirmed {
            return Err(AppError::Conflict(format!("recommendation {id} is already confirmed")));
        }
        rec.meals = meals;
        Ok(&*rec)
    }

    pub async fn confirm(&mut self, store: &dyn MealStore, id: Uuid) -> Result<Record, AppError> {
        let active = self.active.as_mut().ok_or(AppError::NoActiveScheme)?;
        let rec = self
            .pending
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("recommendation {id}")))?;
        if rec.is_confirmed {
            return Err(AppError::Conflict(format!("recommendation {id} is already confirmed")));
        }
        confirm(store, &mut active.state, rec, &active.name).await
    }

    pub fn discard(&mut self, id: Uuid) -> Result<(), AppError> {
        let before = self.pending.len();
        self.pending.retain(|r| r.id != id);
        if self.pending.len() == before {
            return Err(AppError::NotFound(format!("recommendation {id}")));
        }
        Ok(())
    }

    pub fn pool_status(&self) -> Option<PoolStatus> {
        let active = self.active.as_ref()?;
        Some(PoolStatus {
            scheme_id: active.state.scheme_id,
            scheme_name: active.name.clone(),
            remaining: active.state.sizes(),
            original: active.state.original.sizes(),
            after_pending: self.preview.as_ref().map(|p| p.sizes()),
        })
    }

    fn find_pending(&mut self, id: Uuid) -> Result<&mut Recommendation, AppError> {
        self.pending
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("recommendation {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NewRecord;
    use crate::schemes::NewScheme;
    use crate::storage::MemoryStore;
    use rand::{rngs::StdRng, SeedableRng};
    use time::macros::date;

    async fn store_with_scheme(original: Pool) -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let scheme = store
            .create_scheme(NewScheme {
                name: "home".into(),
                description: None,
                original_pools: original,
                is_default: true,
            })
            .await
            .unwrap();
        (store, scheme.id)
    }

    #[tokio::test]
    async fn activation_derives_pool_from_history() {
        let (store, scheme_id) = store_with_scheme(Pool::new(["a1", "a2"], ["b1", "b2"], ["c1", "c2"])).await;
        store
            .create_record(NewRecord {
                date: date!(2024 - 01 - 01),
                scheme_id,
                scheme_name: "home".into(),
                meals: MealSet::new("a1", "b1", "other"),
                note: None,
            })
            .await
            .unwrap();

        let mut session = Session::new();
        let state = session.activate(&store, scheme_id).await.unwrap();

        assert_eq!(state.working, Pool::new(["a2"], ["b2"], ["c1", "c2"]));
        let saved = store.get_scheme(scheme_id).await.unwrap().unwrap();
        assert_eq!(saved.pools, Pool::new(["a2"], ["b2"], ["c1", "c2"]));
    }

    #[tokio::test]
    async fn generate_requires_an_active_scheme() {
        let store = MemoryStore::new();
        let mut session = Session::new();
        let mut rng = StdRng::seed_from_u64(3);
        let err = session
            .generate(&store, 3, date!(2024 - 01 - 01), &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoActiveScheme));
    }

    #[tokio::test]
    async fn generate_then_confirm_shrinks_live_pool() {
        let (store, scheme_id) = store_with_scheme(Pool::new(["a1", "a2", "a3"], ["b1", "b2"], ["c1", "c2"])).await;
        let mut session = Session::new();
        session.activate(&store, scheme_id).await.unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let ids: Vec<Uuid> = session
            .generate(&store, 2, date!(2024 - 03 - 01), &mut rng)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        let status = session.pool_status().unwrap();
        assert_eq!(status.remaining.a, 3);
        assert_eq!(status.after_pending.unwrap().a, 1);

        let record = session.confirm(&store, ids[0]).await.unwrap();
        assert_eq!(record.date, date!(2024 - 03 - 01));
        assert_eq!(session.pool_status().unwrap().remaining.a, 2);
        assert!(session.pending()[0].is_confirmed);

        assert!(matches!(
            session.confirm(&store, ids[0]).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn manual_edit_replaces_pending_meals() {
        let (store, scheme_id) = store_with_scheme(Pool::new(["a1"], ["b1"], ["c1"])).await;
        let mut session = Session::new();
        session.activate(&store, scheme_id).await.unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let id = session
            .generate(&store, 1, date!(2024 - 03 - 01), &mut rng)
            .await
            .unwrap()[0]
            .id;

        let edited = session
            .update_meals(id, MealSet::new("a1", "other:dumplings", "c1"))
            .unwrap();
        assert_eq!(edited.meals.b, "other:dumplings");
        assert!(session.update_meals(id, MealSet::new("a1", " ", "c1")).is_err());

        session.discard(id).unwrap();
        assert!(session.pending().is_empty());
        assert!(matches!(session.discard(id), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn refresh_deactivates_when_scheme_is_gone() {
        let (store, scheme_id) = store_with_scheme(Pool::new(["a1"], ["b1"], ["c1"])).await;
        let mut session = Session::new();
        session.activate(&store, scheme_id).await.unwrap();
        store.delete_scheme(scheme_id).await.unwrap();

        session.refresh(&store).await.unwrap();

        assert!(session.active().is_none());
    }
}
