use std::collections::BTreeMap;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::MealStore;
use crate::error::AppError;
use crate::records::{NewRecord, Record, RecordPatch};
use crate::schemes::{NewScheme, Scheme, SchemePatch};
use crate::settings::{Settings, SettingsPatch};

#[derive(Default)]
struct Tables {
    schemes: Vec<Scheme>,
    records: BTreeMap<Date, Record>,
    settings: Option<Settings>,
}

/// Process-local store used for `STORAGE_MODE=memory` and in tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MealStore for MemoryStore {
    async fn list_schemes(&self) -> Result<Vec<Scheme>, AppError> {
        let t = self.tables.read().await;
        let mut schemes = t.schemes.clone();
        schemes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(schemes)
    }

    async fn get_scheme(&self, id: Uuid) -> Result<Option<Scheme>, AppError> {
        let t = self.tables.read().await;
        Ok(t.schemes.iter().find(|s| s.id == id).cloned())
    }

    async fn create_scheme(&self, new: NewScheme) -> Result<Scheme, AppError> {
        let mut t = self.tables.write().await;
        if new.is_default {
            t.schemes.iter_mut().for_each(|s| s.is_default = false);
        }
        let now = OffsetDateTime::now_utc();
        let scheme = Scheme {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            pools: new.original_pools.clone(),
            original_pools: new.original_pools,
            is_default: new.is_default,
            cycle_started_at: None,
            created_at: now,
            updated_at: now,
        };
        t.schemes.push(scheme.clone());
        Ok(scheme)
    }

    async fn update_scheme(&self, id: Uuid, patch: SchemePatch) -> Result<Scheme, AppError> {
        let mut t = self.tables.write().await;
        if !t.schemes.iter().any(|s| s.id == id) {
            return Err(AppError::NotFound(format!("scheme {id}")));
        }
        if patch.is_default == Some(true) {
            t.schemes
                .iter_mut()
                .filter(|s| s.id != id)
                .for_each(|s| s.is_default = false);
        }
        let scheme = t
            .schemes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("scheme {id}")))?;
        let now = OffsetDateTime::now_utc();
        patch.apply(scheme, now);
        scheme.updated_at = now;
        Ok(scheme.clone())
    }

    async fn delete_scheme(&self, id: Uuid) -> Result<(), AppError> {
        let mut t = self.tables.write().await;
        let before = t.schemes.len();
        t.schemes.retain(|s| s.id != id);
        if t.schemes.len() == before {
            return Err(AppError::NotFound(format!("scheme {id}")));
        }
        Ok(())
    }

    async fn list_records(&self, range: Option<(Date, Date)>) -> Result<Vec<Record>, AppError> {
        let t = self.tables.read().await;
        let records = match range {
            Some((start, end)) if start <= end => {
                t.records.range(start..=end).rev().map(|(_, r)| r.clone()).collect()
            }
            Some(_) => Vec::new(),
            None => t.records.values().rev().cloned().collect(),
        };
        Ok(records)
    }

    async fn list_records_for_scheme(&self, scheme_id: Uuid) -> Result<Vec<Record>, AppError> {
        let t = self.tables.read().await;
        Ok(t.records
            .values()
            .filter(|r| r.scheme_id == scheme_id)
            .cloned()
            .collect())
    }

    async fn get_record(&self, id: Uuid) -> Result<Option<Record>, AppError> {
        let t = self.tables.read().await;
        Ok(t.records.values().find(|r| r.id == id).cloned())
    }

    async fn get_record_by_date(&self, date: Date) -> Result<Option<Record>, AppError> {
        let t = self.tables.read().await;
        Ok(t.records.get(&date).cloned())
    }

    async fn create_record(&self, new: NewRecord) -> Result<Record, AppError> {
        let mut t = self.tables.write().await;
        if t.records.contains_key(&new.date) {
            return Err(AppError::Conflict(
                "a record already exists for this date".into(),
            ));
        }
        let now = OffsetDateTime::now_utc();
        let record = Record {
            id: Uuid::new_v4(),
            date: new.date,
            scheme_id: new.scheme_id,
            scheme_name: new.scheme_name,
            meals: new.meals,
            note: new.note,
            created_at: now,
            updated_at: now,
        };
        t.records.insert(record.date, record.clone());
        Ok(record)
    }

    async fn update_record(&self, id: Uuid, patch: RecordPatch) -> Result<Record, AppError> {
        let mut t = self.tables.write().await;
        let Some(old_date) = t.records.values().find(|r| r.id == id).map(|r| r.date) else {
            return Err(AppError::NotFound(format!("record {id}")));
        };
        if let Some(new_date) = patch.date {
            if new_date != old_date && t.records.contains_key(&new_date) {
                return Err(AppError::Conflict(
                    "a record already exists for this date".into(),
                ));
            }
        }
        let mut record = t
            .records
            .remove(&old_date)
            .ok_or_else(|| AppError::NotFound(format!("record {id}")))?;
        patch.apply(&mut record);
        record.updated_at = OffsetDateTime::now_utc();
        t.records.insert(record.date, record.clone());
        Ok(record)
    }

    async fn delete_record(&self, id: Uuid) -> Result<(), AppError> {
        let mut t = self.tables.write().await;
        let before = t.records.len();
        t.records.retain(|_, r| r.id != id);
        if t.records.len() == before {
            return Err(AppError::NotFound(format!("record {id}")));
        }
        Ok(())
    }

    async fn get_settings(&self) -> Result<Settings, AppError> {
        let t = self.tables.read().await;
        Ok(t.settings.clone().unwrap_or_default())
    }

    async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, AppError> {
        let mut t = self.tables.write().await;
        let mut settings = t.settings.clone().unwrap_or_default();
        patch.apply(&mut settings);
        settings.updated_at = OffsetDateTime::now_utc();
        t.settings = Some(settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::MealSet;
    use time::macros::date;

    fn new_record(date: Date) -> NewRecord {
        NewRecord {
            date,
            scheme_id: Uuid::new_v4(),
            scheme_name: "weekday".into(),
            meals: MealSet::new("a", "b", "c"),
            note: None,
        }
    }

    #[tokio::test]
    async fn second_record_on_same_date_conflicts() {
        let store = MemoryStore::new();
        store.create_record(new_record(date!(2024 - 01 - 01))).await.unwrap();
        let err = store
            .create_record(new_record(date!(2024 - 01 - 01)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.list_records(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn records_list_newest_first_within_range() {
        let store = MemoryStore::new();
        for d in [date!(2024 - 01 - 01), date!(2024 - 01 - 05), date!(2024 - 01 - 03)] {
            store.create_record(new_record(d)).await.unwrap();
        }
        let dates: Vec<_> = store
            .list_records(Some((date!(2024 - 01 - 02), date!(2024 - 01 - 05))))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![date!(2024 - 01 - 05), date!(2024 - 01 - 03)]);
    }

    #[tokio::test]
    async fn moving_record_onto_occupied_date_conflicts() {
        let store = MemoryStore::new();
        let first = store.create_record(new_record(date!(2024 - 01 - 01))).await.unwrap();
        store.create_record(new_record(date!(2024 - 01 - 02))).await.unwrap();
        let patch = RecordPatch {
            date: Some(date!(2024 - 01 - 02)),
            ..RecordPatch::default()
        };
        assert!(matches!(
            store.update_record(first.id, patch).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn settings_default_until_saved() {
        let store = MemoryStore::new();
        assert_eq!(store.get_settings().await.unwrap().default_recommend_count, 3);
        let saved = store
            .update_settings(SettingsPatch {
                default_recommend_count: Some(5),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        assert_eq!(saved.default_recommend_count, 5);
        assert_eq!(store.get_settings().await.unwrap().theme, "auto");
    }
}
