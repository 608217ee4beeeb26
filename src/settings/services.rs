use tracing::{error, info};
use uuid::Uuid;

use super::dto::UpdateSettingsRequest;
use super::repo_types::{Settings, SettingsPatch};
use crate::config::RecommendConfig;
use crate::error::AppError;
use crate::rotation::Session;
use crate::storage::MealStore;

const THEMES: &[&str] = &["light", "dark", "auto"];
const LANGUAGES: &[&str] = &["zh-CN", "en-US"];
const DATE_FORMATS: &[&str] = &["YYYY-MM-DD", "MM/DD/YYYY"];
const GRANULARITIES: &[&str] = &["day", "week", "month"];

fn one_of(field: &str, value: Option<&str>, allowed: &[&str]) -> Result<(), AppError> {
    match value {
        Some(v) if !allowed.contains(&v) => Err(AppError::validation(format!(
            "{field} must be one of {}",
            allowed.join(", ")
        ))),
        _ => Ok(()),
    }
}

fn validate(patch: &SettingsPatch, cfg: &RecommendConfig) -> Result<(), AppError> {
    if patch.is_empty() {
        return Err(AppError::validation("nothing to update"));
    }
    if let Some(count) = patch.default_recommend_count {
        if count < 1 || count as usize > cfg.max_count {
            return Err(AppError::validation(format!(
                "defaultRecommendCount must be between 1 and {}",
                cfg.max_count
            )));
        }
    }
    one_of("theme", patch.theme.as_deref(), THEMES)?;
    one_of("language", patch.language.as_deref(), LANGUAGES)?;
    one_of("dateFormat", patch.date_format.as_deref(), DATE_FORMATS)?;
    one_of("chartGranularity", patch.chart_granularity.as_deref(), GRANULARITIES)?;
    Ok(())
}

/// Saves the changed fields. A new `currentSchemeId` activates that scheme
/// first, so an unknown id leaves the settings untouched; a failed save
/// switches the session back to the scheme it had before.
pub async fn update_settings(
    store: &dyn MealStore,
    session: &mut Session,
    cfg: &RecommendConfig,
    req: UpdateSettingsRequest,
) -> Result<Settings, AppError> {
    let patch = SettingsPatch::from(req);
    validate(&patch, cfg)?;
    let previous = session.active_scheme_id();
    let switching = patch.current_scheme_id.filter(|id| previous != Some(*id));
    if let Some(id) = switching {
        session.activate(store, id).await?;
    }
    let settings = match store.update_settings(patch).await {
        Ok(settings) => settings,
        Err(e) => {
            if switching.is_some() {
                restore_previous(store, session, previous).await;
            }
            return Err(e);
        }
    };
    info!(current_scheme_id = ?settings.current_scheme_id, "settings updated");
    Ok(settings)
}

async fn restore_previous(store: &dyn MealStore, session: &mut Session, previous: Option<Uuid>) {
    let Some(id) = previous else {
        session.deactivate();
        return;
    };
    if let Err(e) = session.activate(store, id).await {
        error!(error = %e, scheme_id = %id, "failed to switch back to previous scheme");
        session.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::Pool;
    use crate::schemes::NewScheme;
    use crate::records::{NewRecord, Record, RecordPatch};
    use crate::schemes::{Scheme, SchemePatch};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use time::Date;

    /// Memory store whose settings table rejects writes.
    struct ReadOnlySettings(MemoryStore);

    #[async_trait]
    impl MealStore for ReadOnlySettings {
        async fn list_schemes(&self) -> Result<Vec<Scheme>, AppError> {
            self.0.list_schemes().await
        }
        async fn get_scheme(&self, id: Uuid) -> Result<Option<Scheme>, AppError> {
            self.0.get_scheme(id).await
        }
        async fn create_scheme(&self, new: NewScheme) -> Result<Scheme, AppError> {
            self.0.create_scheme(new).await
        }
        async fn update_scheme(&self, id: Uuid, patch: SchemePatch) -> Result<Scheme, AppError> {
            self.0.update_scheme(id, patch).await
        }
        async fn delete_scheme(&self, id: Uuid) -> Result<(), AppError> {
            self.0.delete_scheme(id).await
        }
        async fn list_records(&self, range: Option<(Date, Date)>) -> Result<Vec<Record>, AppError> {
            self.0.list_records(range).await
        }
        async fn list_records_for_scheme(&self, scheme_id: Uuid) -> Result<Vec<Record>, AppError> {
            self.0.list_records_for_scheme(scheme_id).await
        }
        async fn get_record(&self, id: Uuid) -> Result<Option<Record>, AppError> {
            self.0.get_record(id).await
        }
        async fn get_record_by_date(&self, date: Date) -> Result<Option<Record>, AppError> {
            self.0.get_record_by_date(date).await
        }
        async fn create_record(&self, new: NewRecord) -> Result<Record, AppError> {
            self.0.create_record(new).await
        }
        async fn update_record(&self, id: Uuid, patch: RecordPatch) -> Result<Record, AppError> {
            self.0.update_record(id, patch).await
        }
        async fn delete_record(&self, id: Uuid) -> Result<(), AppError> {
            self.0.delete_record(id).await
        }
        async fn get_settings(&self) -> Result<Settings, AppError> {
            self.0.get_settings().await
        }
        async fn update_settings(&self, _patch: SettingsPatch) -> Result<Settings, AppError> {
            Err(AppError::Storage(anyhow::anyhow!("settings table is read-only")))
        }
    }

    async fn scheme(store: &dyn MealStore, name: &str) -> Scheme {
        store
            .create_scheme(NewScheme {
                name: name.into(),
                description: None,
                original_pools: Pool::new(["a"], ["b"], ["c"]),
                is_default: false,
            })
            .await
            .unwrap()
    }

    fn cfg() -> RecommendConfig {
        RecommendConfig {
            default_count: 3,
            max_count: 31,
        }
    }

    #[tokio::test]
    async fn rejects_unknown_values() {
        let store = MemoryStore::new();
        let mut session = Session::new();
        for req in [
            UpdateSettingsRequest::default(),
            UpdateSettingsRequest {
                theme: Some("neon".into()),
                ..UpdateSettingsRequest::default()
            },
            UpdateSettingsRequest {
                default_recommend_count: Some(0),
                ..UpdateSettingsRequest::default()
            },
        ] {
            assert!(matches!(
                update_settings(&store, &mut session, &cfg(), req).await,
                Err(AppError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn switching_current_scheme_activates_it() {
        let store = MemoryStore::new();
        let mut session = Session::new();
        let scheme = store
            .create_scheme(NewScheme {
                name: "weekend".into(),
                description: None,
                original_pools: Pool::new(["a"], ["b"], ["c"]),
                is_default: false,
            })
            .await
            .unwrap();

        let saved = update_settings(
            &store,
            &mut session,
            &cfg(),
            UpdateSettingsRequest {
                current_scheme_id: Some(scheme.id),
                theme: Some("dark".into()),
                ..UpdateSettingsRequest::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(saved.current_scheme_id, Some(scheme.id));
        assert_eq!(saved.theme, "dark");
        assert_eq!(session.active_scheme_id(), Some(scheme.id));
    }

    #[tokio::test]
    async fn failed_save_switches_back_to_previous_scheme() {
        let store = ReadOnlySettings(MemoryStore::new());
        let mut session = Session::new();
        let weekday = scheme(&store, "weekday").await;
        let weekend = scheme(&store, "weekend").await;
        session.activate(&store, weekday.id).await.unwrap();

        let err = update_settings(
            &store,
            &mut session,
            &cfg(),
            UpdateSettingsRequest {
                current_scheme_id: Some(weekend.id),
                ..UpdateSettingsRequest::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(session.active_scheme_id(), Some(weekday.id));
        assert_eq!(store.get_settings().await.unwrap().current_scheme_id, None);
    }

    #[tokio::test]
    async fn unknown_scheme_leaves_settings_untouched() {
        let store = MemoryStore::new();
        let mut session = Session::new();
        let err = update_settings(
            &store,
            &mut session,
            &cfg(),
            UpdateSettingsRequest {
                current_scheme_id: Some(Uuid::new_v4()),
                ..UpdateSettingsRequest::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.get_settings().await.unwrap().current_scheme_id, None);
    }
}
