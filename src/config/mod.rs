use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub listing: ListingConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub collector: CollectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Defaults for list endpoints (`limit` caps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub jwt_refresh_expiry_hours: u64,
}

/// Identity of the sentinel account that inherits tickets and messages when
/// their owner is deleted. Resolved to a row id once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub username: String,
    pub email: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Listing overrides
        if let Ok(v) = env::var("LISTING_DEFAULT_LIMIT") {
            self.listing.default_limit = v.parse().unwrap_or(self.listing.default_limit);
        }
        if let Ok(v) = env::var("LISTING_MAX_LIMIT") {
            self.listing.max_limit = v.parse().unwrap_or(self.listing.max_limit);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRY_HOURS") {
            self.security.jwt_refresh_expiry_hours =
                v.parse().unwrap_or(self.security.jwt_refresh_expiry_hours);
        }

        // Collector overrides
        if let Ok(v) = env::var("COLLECTOR_USERNAME") {
            self.collector.username = v;
        }
        if let Ok(v) = env::var("COLLECTOR_EMAIL") {
            self.collector.email = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            listing: ListingConfig {
                default_limit: 300,
                max_limit: 1000,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                jwt_refresh_expiry_hours: 24 * 30,
            },
            collector: CollectorConfig {
                username: "tickets_collector".to_string(),
                email: "tickets_collector@localhost".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            listing: ListingConfig {
                default_limit: 300,
                max_limit: 500,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 24,
                jwt_refresh_expiry_hours: 24 * 7,
            },
            collector: CollectorConfig {
                username: "tickets_collector".to_string(),
                email: "tickets_collector@localhost".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            listing: ListingConfig {
                default_limit: 100,
                max_limit: 300,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 4,
                jwt_refresh_expiry_hours: 24,
            },
            collector: CollectorConfig {
                username: "tickets_collector".to_string(),
                email: "tickets_collector@localhost".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.listing.default_limit, 300);
        assert_eq!(config.collector.username, "tickets_collector");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.listing.default_limit, 100);
        assert!(config.security.jwt_secret.is_empty());
    }
}
