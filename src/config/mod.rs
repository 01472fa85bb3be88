use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub default_limit: i64,
    pub max_limit: Option<i64>,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

/// Outbound side-channels. Unset URLs disable the matching client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub storage_api_url: Option<String>,
    pub storage_api_key: Option<String>,
    pub sap_companies_file: Option<String>,
    pub sap_accept_invalid_certs: bool,
    pub http_timeout_secs: u64,
    pub notifications_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        let filter = &mut self.filter;
        override_parsed("FILTER_DEFAULT_LIMIT", &mut filter.default_limit);
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            filter.max_limit = v.parse().ok();
        }
        override_parsed("FILTER_DEBUG_LOGGING", &mut filter.debug_logging);

        let database = &mut self.database;
        override_optional("DATABASE_URL", &mut database.url);
        override_parsed("DATABASE_MAX_CONNECTIONS", &mut database.max_connections);
        override_parsed("DATABASE_CONNECTION_TIMEOUT", &mut database.connection_timeout);
        override_parsed("DATABASE_ENABLE_QUERY_LOGGING", &mut database.enable_query_logging);

        let api = &mut self.api;
        override_parsed("PORT", &mut api.port);
        override_parsed("SC_API_PORT", &mut api.port);
        override_parsed("API_ENABLE_REQUEST_LOGGING", &mut api.enable_request_logging);
        override_parsed("API_MAX_REQUEST_SIZE_BYTES", &mut api.max_request_size_bytes);

        let security = &mut self.security;
        override_parsed("SECURITY_ENABLE_CORS", &mut security.enable_cors);
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        override_parsed("JWT_SECRET", &mut security.jwt_secret);
        override_parsed("SECURITY_JWT_EXPIRY_HOURS", &mut security.jwt_expiry_hours);

        let integrations = &mut self.integrations;
        override_optional("EMAIL_API_URL", &mut integrations.email_api_url);
        override_optional("EMAIL_API_KEY", &mut integrations.email_api_key);
        override_parsed("EMAIL_FROM", &mut integrations.email_from);
        override_optional("STORAGE_API_URL", &mut integrations.storage_api_url);
        override_optional("STORAGE_API_KEY", &mut integrations.storage_api_key);
        override_optional("SAP_COMPANIES_FILE", &mut integrations.sap_companies_file);
        override_parsed("SAP_ACCEPT_INVALID_CERTS", &mut integrations.sap_accept_invalid_certs);
        override_parsed("INTEGRATIONS_HTTP_TIMEOUT_SECS", &mut integrations.http_timeout_secs);
        override_parsed("NOTIFICATIONS_ENABLED", &mut integrations.notifications_enabled);

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            filter: FilterConfig {
                default_limit: 100,
                max_limit: Some(1000),
                debug_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 25 * 1024 * 1024, // 25MB, uploads included
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "servicios-compartidos-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            integrations: IntegrationsConfig {
                email_api_url: None,
                email_api_key: None,
                email_from: "servicios.compartidos@localhost".to_string(),
                storage_api_url: None,
                storage_api_key: None,
                sap_companies_file: Some("deploy/sap_companies.yaml".to_string()),
                sap_accept_invalid_certs: true,
                http_timeout_secs: 30,
                notifications_enabled: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            filter: FilterConfig {
                default_limit: 100,
                max_limit: Some(500),
                debug_logging: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 15 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.servicios-compartidos.local".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            integrations: IntegrationsConfig {
                email_api_url: None,
                email_api_key: None,
                email_from: "servicios.compartidos@localhost".to_string(),
                storage_api_url: None,
                storage_api_key: None,
                sap_companies_file: None,
                sap_accept_invalid_certs: false,
                http_timeout_secs: 20,
                notifications_enabled: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            filter: FilterConfig {
                default_limit: 50,
                max_limit: Some(200),
                debug_logging: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 10 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://servicios-compartidos.local".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
            },
            integrations: IntegrationsConfig {
                email_api_url: None,
                email_api_key: None,
                email_from: "servicios.compartidos@localhost".to_string(),
                storage_api_url: None,
                storage_api_key: None,
                sap_companies_file: None,
                sap_accept_invalid_certs: false,
                http_timeout_secs: 15,
                notifications_enabled: true,
            },
        }
    }
}

/// Replace `target` when the variable is set and parses; otherwise keep the profile value
fn override_parsed<T: FromStr>(key: &str, target: &mut T) {
    if let Some(value) = env::var(key).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}

/// Blank values count as unset
fn override_optional(key: &str, target: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        if !v.trim().is_empty() {
            *target = Some(v);
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.filter.max_limit, Some(1000));
        assert!(!config.security.jwt_secret.is_empty());
        assert!(!config.integrations.notifications_enabled);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.filter.max_limit, Some(200));
        // production must be given a secret through JWT_SECRET
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.integrations.notifications_enabled);
        assert!(!config.integrations.sap_accept_invalid_certs);
    }

    #[test]
    fn unparsable_override_keeps_profile_value() {
        let mut timeout = 15u64;
        env::set_var("SC_TEST_TIMEOUT_SECS", "quince");
        override_parsed("SC_TEST_TIMEOUT_SECS", &mut timeout);
        assert_eq!(timeout, 15);

        env::set_var("SC_TEST_TIMEOUT_SECS", "45");
        override_parsed("SC_TEST_TIMEOUT_SECS", &mut timeout);
        assert_eq!(timeout, 45);
    }

    #[test]
    fn blank_optional_override_is_ignored() {
        let mut url = Some("https://correo.interno".to_string());
        env::set_var("SC_TEST_EMAIL_URL", "  ");
        override_optional("SC_TEST_EMAIL_URL", &mut url);
        assert_eq!(url.as_deref(), Some("https://correo.interno"));
    }
}
