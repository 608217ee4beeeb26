use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::error::AppError;
use crate::records::{NewRecord, Record, RecordPatch};
use crate::schemes::{NewScheme, Scheme, SchemePatch};
use crate::settings::{Settings, SettingsPatch};

pub mod memory;

pub use memory::MemoryStore;

/// Everything the engine and the routes need from persistence.
#[async_trait]
pub trait MealStore: Send + Sync {
    async fn list_schemes(&self) -> Result<Vec<Scheme>, AppError>;
    async fn get_scheme(&self, id: Uuid) -> Result<Option<Scheme>, AppError>;
    async fn create_scheme(&self, new: NewScheme) -> Result<Scheme, AppError>;
    async fn update_scheme(&self, id: Uuid, patch: SchemePatch) -> Result<Scheme, AppError>;
    async fn delete_scheme(&self, id: Uuid) -> Result<(), AppError>;

    async fn list_records(&self, range: Option<(Date, Date)>) -> Result<Vec<Record>, AppError>;
    async fn list_records_for_scheme(&self, scheme_id: Uuid) -> Result<Vec<Record>, AppError>;
    async fn get_record(&self, id: Uuid) -> Result<Option<Record>, AppError>;
    async fn get_record_by_date(&self, date: Date) -> Result<Option<Record>, AppError>;
    /// Fails with `AppError::Conflict` when the date already has a record.
    async fn create_record(&self, new: NewRecord) -> Result<Record, AppError>;
    async fn update_record(&self, id: Uuid, patch: RecordPatch) -> Result<Record, AppError>;
    async fn delete_record(&self, id: Uuid) -> Result<(), AppError>;

    async fn get_settings(&self) -> Result<Settings, AppError>;
    async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, AppError>;
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealStore for PgStore {
    async fn list_schemes(&self) -> Result<Vec<Scheme>, AppError> {
        Scheme::list(&self.db).await
    }

    async fn get_scheme(&self, id: Uuid) -> Result<Option<Scheme>, AppError> {
        Scheme::find_by_id(&self.db, id).await
    }

    async fn create_scheme(&self, new: NewScheme) -> Result<Scheme, AppError> {
        Scheme::create(&self.db, new).await
    }

    async fn update_scheme(&self, id: Uuid, patch: SchemePatch) -> Result<Scheme, AppError> {
        Scheme::update(&self.db, id, patch).await
    }

    async fn delete_scheme(&self, id: Uuid) -> Result<(), AppError> {
        Scheme::delete(&self.db, id).await
    }

    async fn list_records(&self, range: Option<(Date, Date)>) -> Result<Vec<Record>, AppError> {
        Record::list(&self.db, range).await
    }

    async fn list_records_for_scheme(&self, scheme_id: Uuid) -> Result<Vec<Record>, AppError> {
        Record::list_for_scheme(&self.db, scheme_id).await
    }

    async fn get_record(&self, id: Uuid) -> Result<Option<Record>, AppError> {
        Record::find_by_id(&self.db, id).await
    }

    async fn get_record_by_date(&self, date: Date) -> Result<Option<Record>, AppError> {
        Record::find_by_date(&self.db, date).await
    }

    async fn create_record(&self, new: NewRecord) -> Result<Record, AppError> {
        Record::create(&self.db, new).await
    }

    async fn update_record(&self, id: Uuid, patch: RecordPatch) -> Result<Record, AppError> {
        Record::update(&self.db, id, patch).await
    }

    async fn delete_record(&self, id: Uuid) -> Result<(), AppError> {
        Record::delete(&self.db, id).await
    }

    async fn get_settings(&self) -> Result<Settings, AppError> {
        Settings::load(&self.db).await
    }

    async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, AppError> {
        Settings::save(&self.db, patch).await
    }
}
