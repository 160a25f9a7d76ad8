//! Persistence configuration.

use common::{env_parse, env_var, AuditConfig, DatabaseConfig, RetryConfig};

/// Persistence configuration.
#[derive(Debug, Clone, Default)]
pub struct PersistenceConfig {
    pub database: DatabaseConfig,
    pub retry: RetryConfig,
    pub audit: AuditConfig,
}

impl PersistenceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database_defaults = DatabaseConfig::default();
        let retry_defaults = RetryConfig::default();
        let audit_defaults = AuditConfig::default();

        Self {
            database: DatabaseConfig {
                url: env_var(&["DATABASE_URL"]).unwrap_or(database_defaults.url),
                max_connections: env_parse(&["DATABASE_MAX_CONNECTIONS"], database_defaults.max_connections),
                min_connections: env_parse(&["DATABASE_MIN_CONNECTIONS"], database_defaults.min_connections),
                connect_timeout_secs: env_parse(
                    &["DATABASE_CONNECT_TIMEOUT_SECS"],
                    database_defaults.connect_timeout_secs,
                ),
                acquire_timeout_secs: env_parse(
                    &["DATABASE_ACQUIRE_TIMEOUT_SECS"],
                    database_defaults.acquire_timeout_secs,
                ),
                sql_logging: env_parse(&["DATABASE_SQL_LOGGING"], database_defaults.sql_logging),
            },
            retry: RetryConfig {
                max_attempts: env_parse(&["DATABASE_MAX_RETRY_ATTEMPTS"], retry_defaults.max_attempts),
                base_delay_ms: env_parse(&["DATABASE_RETRY_BASE_DELAY_MS"], retry_defaults.base_delay_ms),
                max_delay_secs: env_parse(&["DATABASE_MAX_RETRY_DELAY_SECS"], retry_defaults.max_delay_secs),
            },
            audit: AuditConfig {
                fallback_actor: env_var(&["AUDIT_FALLBACK_ACTOR"]).unwrap_or(audit_defaults.fallback_actor),
                utc_offset_hours: env_parse(&["AUDIT_UTC_OFFSET_HOURS"], audit_defaults.utc_offset_hours),
                require_actor_on_delete: env_parse(
                    &["AUDIT_REQUIRE_ACTOR_ON_DELETE"],
                    audit_defaults.require_actor_on_delete,
                ),
            },
        }
    }
}
