use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Sort column used when a list request names none (or an invalid one).
    pub default_sort: String,
    /// Sort direction used when a list request names none (or an invalid one).
    pub default_order: String,
    pub max_limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    /// Login attempts allowed per login name within the window.
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Base64-encoded PEM keys. Access and refresh tokens use distinct keypairs.
    pub access_token_private_key: String,
    pub access_token_public_key: String,
    pub refresh_token_private_key: String,
    pub refresh_token_public_key: String,
    /// Token lifetimes in minutes. Zero means the token never expires.
    pub access_token_minutes: u64,
    pub refresh_token_minutes: u64,
    /// Permits the per-request auth bypass header. Never enabled outside tests.
    pub allow_test_bypass: bool,
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
        // Filter overrides
        if let Ok(v) = env::var("FILTER_DEFAULT_SORT") {
            if !v.trim().is_empty() {
                self.filter.default_sort = v;
            }
        }
        if let Ok(v) = env::var("FILTER_DEFAULT_ORDER") {
            if !v.trim().is_empty() {
                self.filter.default_order = v;
            }
        }
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("ACCESS_TOKEN_PRIVATE_KEY") {
            self.security.access_token_private_key = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_PUBLIC_KEY") {
            self.security.access_token_public_key = v;
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_PRIVATE_KEY") {
            self.security.refresh_token_private_key = v;
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_PUBLIC_KEY") {
            self.security.refresh_token_public_key = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_MINUTES") {
            self.security.access_token_minutes = v.parse().unwrap_or(self.security.access_token_minutes);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_MINUTES") {
            self.security.refresh_token_minutes = v.parse().unwrap_or(self.security.refresh_token_minutes);
        }
        if let Ok(v) = env::var("SECURITY_ALLOW_TEST_BYPASS") {
            self.security.allow_test_bypass = v.parse().unwrap_or(self.security.allow_test_bypass);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            filter: FilterConfig {
                default_sort: "created_at".to_string(),
                default_order: "desc".to_string(),
                max_limit: Some(1000),
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
            },
            security: SecurityConfig {
                access_token_private_key: String::new(),
                access_token_public_key: String::new(),
                refresh_token_private_key: String::new(),
                refresh_token_public_key: String::new(),
                access_token_minutes: 60,
                refresh_token_minutes: 60 * 24 * 7, // 1 week
                allow_test_bypass: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            filter: FilterConfig {
                default_sort: "created_at".to_string(),
                default_order: "desc".to_string(),
                max_limit: Some(500),
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 10,
                rate_limit_window_secs: 60,
            },
            security: SecurityConfig {
                access_token_private_key: String::new(),
                access_token_public_key: String::new(),
                refresh_token_private_key: String::new(),
                refresh_token_public_key: String::new(),
                access_token_minutes: 30,
                refresh_token_minutes: 60 * 24,
                allow_test_bypass: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            filter: FilterConfig {
                default_sort: "created_at".to_string(),
                default_order: "desc".to_string(),
                max_limit: Some(100),
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 5,
                rate_limit_window_secs: 60,
            },
            security: SecurityConfig {
                access_token_private_key: String::new(),
                access_token_public_key: String::new(),
                refresh_token_private_key: String::new(),
                refresh_token_public_key: String::new(),
                access_token_minutes: 15,
                refresh_token_minutes: 60 * 24,
                allow_test_bypass: false,
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
        assert_eq!(config.filter.max_limit, Some(1000));
        assert_eq!(config.filter.default_sort, "created_at");
        assert!(!config.api.enable_rate_limiting);
        assert!(!config.security.allow_test_bypass);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.filter.max_limit, Some(100));
        assert!(config.api.enable_rate_limiting);
        assert_eq!(config.security.access_token_minutes, 15);
    }
}
