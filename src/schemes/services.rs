use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CreateSchemeRequest, UpdateSchemeRequest};
use super::repo_types::{NewScheme, Scheme, SchemePatch};
use crate::error::AppError;
use crate::rotation::{compute_remaining_pool, Pool, PoolState, Session};
use crate::settings::SettingsPatch;
use crate::storage::MealStore;

pub const DEFAULT_SCHEME_NAME: &str = "Default";

fn default_pools() -> Pool {
    Pool::new(
        ["braised pork", "kung pao chicken", "steamed fish", "beef stew", "tomato eggs"],
        ["stir-fried greens", "mapo tofu", "garlic broccoli", "dry-fried beans"],
        ["seaweed soup", "hot and sour soup", "winter melon soup"],
    )
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("scheme name is required"));
    }
    Ok(name.to_string())
}

pub async fn get_scheme(store: &dyn MealStore, id: Uuid) -> Result<Scheme, AppError> {
    store
        .get_scheme(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("scheme {id}")))
}

pub async fn create_scheme(store: &dyn MealStore, req: CreateSchemeRequest) -> Result<Scheme, AppError> {
    let name = validate_name(&req.name)?;
    req.original_pools.validate()?;
    let scheme = store
        .create_scheme(NewScheme {
            name,
            description: req.description,
            original_pools: req.original_pools,
            is_default: req.is_default,
        })
        .await?;
    info!(scheme_id = %scheme.id, name = %scheme.name, "scheme created");
    Ok(scheme)
}

/// Applies an edit. New original pools re-derive the working pool from the
/// scheme's history; the session follows when this scheme is active.
pub async fn update_scheme(
    store: &dyn MealStore,
    session: &mut Session,
    id: Uuid,
    req: UpdateSchemeRequest,
) -> Result<Scheme, AppError> {
    if req.is_empty() {
        return Err(AppError::validation("nothing to update"));
    }
    let current = get_scheme(store, id).await?;

    let mut patch = SchemePatch {
        name: req.name.as_deref().map(validate_name).transpose()?,
        description: req.description,
        is_default: req.is_default,
        ..SchemePatch::default()
    };
    if let Some(original) = req.original_pools {
        original.validate()?;
        let records = current.current_cycle(&store.list_records_for_scheme(id).await?);
        patch.pools = Some(compute_remaining_pool(&original, &records, id));
        patch.original_pools = Some(original);
    }

    let scheme = store.update_scheme(id, patch).await?;
    session.refresh_if_active(store, &[id]).await?;
    info!(scheme_id = %id, "scheme updated");
    Ok(scheme)
}

pub async fn delete_scheme(store: &dyn MealStore, session: &mut Session, id: Uuid) -> Result<(), AppError> {
    let scheme = get_scheme(store, id).await?;
    if scheme.is_default {
        warn!(scheme_id = %id, "refusing to delete default scheme");
        return Err(AppError::DefaultSchemeProtected);
    }
    store.delete_scheme(id).await?;
    if session.active_scheme_id() == Some(id) {
        session.deactivate();
    }
    info!(scheme_id = %id, "scheme deleted");
    Ok(())
}

/// Makes `id` the current scheme and remembers the choice in settings.
pub async fn activate_scheme(store: &dyn MealStore, session: &mut Session, id: Uuid) -> Result<PoolState, AppError> {
    let state = session.activate(store, id).await?.clone();
    store
        .update_settings(SettingsPatch {
            current_scheme_id: Some(id),
            ..SettingsPatch::default()
        })
        .await?;
    Ok(state)
}

/// Refills every category of the working pool from the original pools and
/// starts a new cycle, so earlier records stop counting after a restart too.
pub async fn reset_pools(store: &dyn MealStore, session: &mut Session, id: Uuid) -> Result<Scheme, AppError> {
    let scheme = get_scheme(store, id).await?;
    let scheme = store
        .update_scheme(id, SchemePatch::restart(scheme.original_pools.clone()))
        .await?;
    session.reset_to_original(id);
    info!(scheme_id = %id, "working pools reset");
    Ok(scheme)
}

/// Seeds the default scheme into an empty store.
pub async fn ensure_default_scheme(store: &dyn MealStore) -> Result<Scheme, AppError> {
    let mut existing = store.list_schemes().await?;
    if let Some(pos) = existing.iter().position(|s| s.is_default) {
        return Ok(existing.swap_remove(pos));
    }
    if let Some(first) = existing.pop() {
        return Ok(first);
    }
    info!("no schemes found, seeding default scheme");
    store
        .create_scheme(NewScheme {
            name: DEFAULT_SCHEME_NAME.into(),
            description: Some("Starter dishes, edit freely".into()),
            original_pools: default_pools(),
            is_default: true,
        })
        .await
}

/// Picks the scheme to start with: the one saved in settings, else the
/// default one, else any. Seeds a default scheme when there is none.
pub async fn restore_session(store: &dyn MealStore, session: &mut Session) -> Result<(), AppError> {
    let settings = store.get_settings().await?;
    if let Some(id) = settings.current_scheme_id {
        if store.get_scheme(id).await?.is_some() {
            session.activate(store, id).await?;
            return Ok(());
        }
        warn!(scheme_id = %id, "saved current scheme no longer exists");
    }
    let fallback = ensure_default_scheme(store).await?;
    activate_scheme(store, session, fallback.id).await?;
    Ok(())
}
