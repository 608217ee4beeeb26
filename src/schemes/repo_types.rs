use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::records::Record;
use crate::rotation::Pool;

/// A named dish configuration: the user-edited `original_pools` and the
/// depleting `pools` of the current rotation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheme {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pools: Pool,
    pub original_pools: Pool,
    pub is_default: bool,
    /// Set by a manual pool reset; records last written before it no longer
    /// count against the working pool.
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub cycle_started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct SchemeRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub pools: Json<Pool>,
    pub original_pools: Json<Pool>,
    pub is_default: bool,
    pub cycle_started_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<SchemeRow> for Scheme {
    fn from(r: SchemeRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            pools: r.pools.0,
            original_pools: r.original_pools.0,
            is_default: r.is_default,
            cycle_started_at: r.cycle_started_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Scheme {
    pub fn in_current_cycle(&self, record: &Record) -> bool {
        self.cycle_started_at
            .map_or(true, |started| record.updated_at >= started)
    }

    /// This scheme's records that still count against its working pool.
    pub fn current_cycle(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|r| r.scheme_id == self.id && self.in_current_cycle(r))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct NewScheme {
    pub name: String,
    pub description: Option<String>,
    pub original_pools: Pool,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SchemePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub pools: Option<Pool>,
    pub original_pools: Option<Pool>,
    pub is_default: Option<bool>,
    /// Stamps `cycle_started_at` with the store's clock.
    pub restart_cycle: bool,
}

impl SchemePatch {
    pub fn working_pools(pools: Pool) -> Self {
        Self {
            pools: Some(pools),
            ..Self::default()
        }
    }

    /// Refills the working pools and starts a new cycle.
    pub fn restart(original: Pool) -> Self {
        Self {
            pools: Some(original),
            restart_cycle: true,
            ..Self::default()
        }
    }

    pub fn apply(self, scheme: &mut Scheme, now: OffsetDateTime) {
        if let Some(name) = self.name {
            scheme.name = name;
        }
        if let Some(description) = self.description {
            scheme.description = Some(description);
        }
        if let Some(pools) = self.pools {
            scheme.pools = pools;
        }
        if let Some(original_pools) = self.original_pools {
            scheme.original_pools = original_pools;
        }
        if let Some(is_default) = self.is_default {
            scheme.is_default = is_default;
        }
        if self.restart_cycle {
            scheme.cycle_started_at = Some(now);
        }
    }
}
