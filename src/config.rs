use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendConfig {
    /// Used when neither the request nor the saved settings give a count.
    pub default_count: usize,
    pub max_count: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            default_count: 3,
            max_count: 31,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub storage_mode: StorageMode,
    pub db_max_connections: u32,
    pub recommend: RecommendConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok();
        let storage_mode = match std::env::var("STORAGE_MODE").ok().as_deref() {
            Some("memory") => StorageMode::Memory,
            Some("postgres") => StorageMode::Postgres,
            Some(other) => anyhow::bail!("unknown STORAGE_MODE: {other}"),
            None => StorageMode::Postgres,
        };
        if storage_mode == StorageMode::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORAGE_MODE=postgres");
        }

        let recommend = RecommendConfig {
            default_count: env_or("DEFAULT_RECOMMEND_COUNT", 3),
            max_count: env_or("MAX_RECOMMEND_COUNT", 31),
        };
        if recommend.default_count == 0 || recommend.default_count > recommend.max_count {
            anyhow::bail!(
                "DEFAULT_RECOMMEND_COUNT must be between 1 and {}",
                recommend.max_count
            );
        }

        Ok(Self {
            database_url,
            storage_mode,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            recommend,
        })
    }

    #[cfg(test)]
    pub fn memory() -> Self {
        Self {
            database_url: None,
            storage_mode: StorageMode::Memory,
            db_max_connections: 1,
            recommend: RecommendConfig::default(),
        }
    }
}
