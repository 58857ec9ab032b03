use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres DSN; `DATABASE_URL` or `--db-dsn`
    pub url: String,
    pub max_connections: u32,
    /// Upper bound for any single storage call
    pub statement_timeout_ms: u64,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl CatalogConfig {
    /// Keeps the default page size inside `1..=max_page_size` so a request
    /// without `page_size` always validates.
    pub fn clamped(mut self) -> Self {
        self.max_page_size = self.max_page_size.max(1);
        self.default_page_size = self.default_page_size.clamp(1, self.max_page_size);
        self
    }
}

/// Permission codes required per route. Kept in config so a deployment can
/// tighten e.g. the purchase route without a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePermissions {
    pub purchase: String,
    pub purchase_list: String,
    pub catalog_write: String,
}

impl Default for RoutePermissions {
    fn default() -> Self {
        Self {
            purchase: "books:read".to_string(),
            purchase_list: "books:read".to_string(),
            catalog_write: "books:write".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub auth_token_ttl_hours: u64,
    /// Bcrypt cost of stored password hashes
    pub password_hash_cost: u32,
    pub permissions: RoutePermissions,
}

impl SecurityConfig {
    pub fn auth_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.auth_token_ttl_hours as i64)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::load(None)
    }

    /// Preset for `environment` (falling back to `APP_ENV`), then per-variable overrides
    pub fn load(environment: Option<&str>) -> Self {
        let name = environment
            .map(str::to_string)
            .or_else(|| env::var("APP_ENV").ok())
            .unwrap_or_default();
        Self::for_environment(Environment::parse(&name)).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("SERVER_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_STATEMENT_TIMEOUT_MS") {
            self.database.statement_timeout_ms = v.parse().unwrap_or(self.database.statement_timeout_ms);
        }

        // Catalog overrides
        if let Ok(v) = env::var("CATALOG_DEFAULT_PAGE_SIZE") {
            self.catalog.default_page_size = v.parse().unwrap_or(self.catalog.default_page_size);
        }
        if let Ok(v) = env::var("CATALOG_MAX_PAGE_SIZE") {
            self.catalog.max_page_size = v.parse().unwrap_or(self.catalog.max_page_size);
        }
        self.catalog = self.catalog.clamped();

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_AUTH_TOKEN_TTL_HOURS") {
            self.security.auth_token_ttl_hours = v.parse().unwrap_or(self.security.auth_token_ttl_hours);
        }
        if let Ok(v) = env::var("SECURITY_PASSWORD_HASH_COST") {
            self.security.password_hash_cost = v.parse().unwrap_or(self.security.password_hash_cost);
        }
        if let Ok(v) = env::var("SECURITY_PERMISSION_PURCHASE") {
            self.security.permissions.purchase = v;
        }
        if let Ok(v) = env::var("SECURITY_PERMISSION_PURCHASE_LIST") {
            self.security.permissions.purchase_list = v;
        }
        if let Ok(v) = env::var("SECURITY_PERMISSION_CATALOG_WRITE") {
            self.security.permissions.catalog_write = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 8081 },
            database: DatabaseConfig {
                url: "postgres://postgres@localhost:5432/bookstore?sslmode=disable".to_string(),
                max_connections: 10,
                statement_timeout_ms: 3_000,
                run_migrations: false,
            },
            catalog: CatalogConfig {
                default_page_size: 20,
                max_page_size: 100,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                auth_token_ttl_hours: 24,
                password_hash_cost: bcrypt::DEFAULT_COST,
                permissions: RoutePermissions::default(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 8081 },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                statement_timeout_ms: 3_000,
                run_migrations: false,
            },
            catalog: CatalogConfig {
                default_page_size: 20,
                max_page_size: 100,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                auth_token_ttl_hours: 24,
                password_hash_cost: bcrypt::DEFAULT_COST,
                permissions: RoutePermissions::default(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 8081 },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 50,
                statement_timeout_ms: 2_000,
                run_migrations: false,
            },
            catalog: CatalogConfig {
                default_page_size: 20,
                max_page_size: 50,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                auth_token_ttl_hours: 12,
                password_hash_cost: bcrypt::DEFAULT_COST,
                permissions: RoutePermissions::default(),
            },
        }
    }
}

// Global singleton config - read once by the binary, then passed down explicitly
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
