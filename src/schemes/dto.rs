use serde::Deserialize;

use crate::rotation::Pool;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchemeRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(alias = "pools")]
    pub original_pools: Pool,
    #[serde(default)]
    pub is_default: bool,
}

/// Only the fields present are changed. The working pool is never set
/// directly; it follows from `original_pools` and the record history.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSchemeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "pools")]
    pub original_pools: Option<Pool>,
    pub is_default: Option<bool>,
}

impl UpdateSchemeRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.original_pools.is_none()
            && self.is_default.is_none()
    }
}
