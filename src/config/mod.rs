use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub metadata: MetadataConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub booking: BookingConfig,
    pub cache: CacheConfig,
    pub admin: AdminConfig,
    pub features: FeatureFlags,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub json_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StorageBackend::Postgres),
            "memory" | "mem" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

// Настройки базы данных (url обязателен только для postgres)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Внешний каталог фильмов (OMDb-совместимый API)
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub max_seats_per_booking: usize,
    pub checkout_hold_seconds: i64,
    pub session_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub search_ttl_seconds: u64,
    pub seats_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub emails: Vec<String>,
}

impl AdminConfig {
    pub fn is_admin(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e.eq_ignore_ascii_case(email))
    }
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub seed_theaters: bool,
}

fn var(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    var(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn list(key: &'static str) -> Vec<String> {
    var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match var("STORAGE_BACKEND") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "STORAGE_BACKEND", value })?,
            None => StorageBackend::Postgres,
        };

        let database_url = var("DATABASE_URL");
        if backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Config {
            app: AppConfig {
                host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed("PORT", 8000)?,
                environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
                rust_log: var("RUST_LOG")
                    .unwrap_or_else(|| "cinema_booking=debug,tower_http=debug".to_string()),
                json_logs: var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            },
            storage: StorageConfig { backend },
            database: DatabaseConfig {
                url: database_url,
                pool_size: parsed("DB_POOL_SIZE", 20)?,
            },
            redis: RedisConfig {
                url: required("REDIS_URL")?,
            },
            metadata: MetadataConfig {
                api_key: required("OMDB_API_KEY")?,
                base_url: var("OMDB_BASE_URL")
                    .unwrap_or_else(|| "https://www.omdbapi.com".to_string()),
                timeout_seconds: parsed("OMDB_TIMEOUT_SECONDS", 10)?,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: parsed("CIRCUIT_BREAKER_FAILURE_THRESHOLD", 5)?,
                timeout_seconds: parsed("CIRCUIT_BREAKER_TIMEOUT_SECONDS", 60)?,
            },
            booking: BookingConfig {
                max_seats_per_booking: parsed("MAX_SEATS_PER_BOOKING", 6)?,
                checkout_hold_seconds: parsed("CHECKOUT_HOLD_SECONDS", 600)?,
                session_ttl_seconds: parsed("SESSION_TTL_SECONDS", 86_400)?,
            },
            cache: CacheConfig {
                search_ttl_seconds: parsed("SEARCH_CACHE_SECONDS", 3600)?,
                seats_ttl_seconds: parsed("SEAT_CACHE_SECONDS", 30)?,
            },
            admin: AdminConfig {
                emails: list("ADMIN_EMAILS"),
            },
            features: FeatureFlags {
                seed_theaters: parsed("SEED_THEATERS", true)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_aliases() {
        assert_eq!("postgres".parse(), Ok(StorageBackend::Postgres));
        assert_eq!("MEMORY".parse(), Ok(StorageBackend::Memory));
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn admin_emails_match_case_insensitively() {
        let admin = AdminConfig {
            emails: vec!["admin@quickshow.com".to_string()],
        };
        assert!(admin.is_admin("Admin@QuickShow.com"));
        assert!(!admin.is_admin("guest@quickshow.com"));
    }
}
