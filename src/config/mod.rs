use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub webhooks: WebhookConfig,
    pub email: EmailConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// Bounded size of the access-profile cache
    pub profile_cache_capacity: usize,
    /// Freshness window for cached access profiles, in seconds
    pub profile_cache_ttl_secs: u64,
}

/// Shared secrets for the inbound webhook surface. The billing secret signs
/// payloads (HMAC); the three trigger secrets are compared as plain headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub billing_signing_secret: String,
    pub listing_created_secret: String,
    pub listing_updated_secret: String,
    pub message_created_secret: String,
    /// Maximum accepted age of a signed billing event, in seconds
    pub billing_tolerance_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub endpoint: String,
    pub api_key: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub api_key: String,
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
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging =
                v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes =
                v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_PROFILE_CACHE_CAPACITY") {
            self.security.profile_cache_capacity =
                v.parse().unwrap_or(self.security.profile_cache_capacity);
        }
        if let Ok(v) = env::var("SECURITY_PROFILE_CACHE_TTL_SECS") {
            self.security.profile_cache_ttl_secs =
                v.parse().unwrap_or(self.security.profile_cache_ttl_secs);
        }

        // Webhook secrets
        if let Ok(v) = env::var("BILLING_WEBHOOK_SECRET") {
            self.webhooks.billing_signing_secret = v;
        }
        if let Ok(v) = env::var("LISTING_CREATED_WEBHOOK_SECRET") {
            self.webhooks.listing_created_secret = v;
        }
        if let Ok(v) = env::var("LISTING_UPDATED_WEBHOOK_SECRET") {
            self.webhooks.listing_updated_secret = v;
        }
        if let Ok(v) = env::var("MESSAGE_CREATED_WEBHOOK_SECRET") {
            self.webhooks.message_created_secret = v;
        }
        if let Ok(v) = env::var("BILLING_WEBHOOK_TOLERANCE_SECS") {
            self.webhooks.billing_tolerance_secs =
                v.parse().unwrap_or(self.webhooks.billing_tolerance_secs);
        }

        // Email provider
        if let Ok(v) = env::var("EMAIL_API_ENDPOINT") {
            self.email.endpoint = v;
        }
        if let Ok(v) = env::var("EMAIL_API_KEY") {
            self.email.api_key = v;
        }
        if let Ok(v) = env::var("EMAIL_FROM_ADDRESS") {
            self.email.from_address = v;
        }

        // Object storage
        if let Ok(v) = env::var("STORAGE_API_ENDPOINT") {
            self.storage.endpoint = v;
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.storage.bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_API_KEY") {
            self.storage.api_key = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                default_page_size: 24,
                max_page_size: 100,
                max_request_size_bytes: 25 * 1024 * 1024, // multipart registration uploads
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                profile_cache_capacity: 1024,
                profile_cache_ttl_secs: 60,
            },
            webhooks: WebhookConfig {
                billing_signing_secret: String::new(),
                listing_created_secret: String::new(),
                listing_updated_secret: String::new(),
                message_created_secret: String::new(),
                billing_tolerance_secs: 300,
            },
            email: EmailConfig {
                endpoint: "https://api.email.localhost/send".to_string(),
                api_key: String::new(),
                from_address: "noreply@watchpros.test".to_string(),
            },
            storage: StorageConfig {
                endpoint: "http://localhost:9000".to_string(),
                bucket: "seller-documents".to_string(),
                api_key: String::new(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                default_page_size: 24,
                max_page_size: 100,
                max_request_size_bytes: 25 * 1024 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 24,
                profile_cache_capacity: 2048,
                profile_cache_ttl_secs: 60,
            },
            webhooks: WebhookConfig {
                billing_signing_secret: String::new(),
                listing_created_secret: String::new(),
                listing_updated_secret: String::new(),
                message_created_secret: String::new(),
                billing_tolerance_secs: 300,
            },
            email: EmailConfig {
                endpoint: String::new(),
                api_key: String::new(),
                from_address: "noreply@staging.watchpros.example".to_string(),
            },
            storage: StorageConfig {
                endpoint: String::new(),
                bucket: "seller-documents".to_string(),
                api_key: String::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                default_page_size: 24,
                max_page_size: 100,
                max_request_size_bytes: 25 * 1024 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 4,
                profile_cache_capacity: 4096,
                profile_cache_ttl_secs: 60,
            },
            webhooks: WebhookConfig {
                billing_signing_secret: String::new(),
                listing_created_secret: String::new(),
                listing_updated_secret: String::new(),
                message_created_secret: String::new(),
                billing_tolerance_secs: 300,
            },
            email: EmailConfig {
                endpoint: String::new(),
                api_key: String::new(),
                from_address: "noreply@watchpros.example".to_string(),
            },
            storage: StorageConfig {
                endpoint: String::new(),
                bucket: "seller-documents".to_string(),
                api_key: String::new(),
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
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.api.default_page_size, 24);
        assert_eq!(config.api.max_page_size, 100);
        assert_eq!(config.security.profile_cache_capacity, 1024);
        assert_eq!(config.webhooks.billing_tolerance_secs, 300);
    }

    #[test]
    fn production_requires_env_secrets() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 4);
        assert!(!config.database.enable_query_logging);
    }
}
