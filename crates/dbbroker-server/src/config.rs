use dbbroker_core::ResolverDefaults;
use dbbroker_gateway::ClientConfig;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Credentials the platform uses to call the broker
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Provider API access and provisioning defaults
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Broker credentials
        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            return Err("auth.username and auth.password must be set".into());
        }
        if self.catalog.path.is_empty() {
            return Err("catalog.path must not be empty".into());
        }
        // Provider API
        if self.api.url.is_empty() {
            return Err("api.url must not be empty".into());
        }
        if let Err(e) = url::Url::parse(&self.api.url) {
            return Err(format!("api.url is not a valid URL: {e}"));
        }
        if self.api.token.is_empty() {
            return Err("api.token must be set".into());
        }
        if self.api.retries == 0 {
            return Err("api.retries must be > 0".into());
        }
        if self.api.timeout_ms == 0 {
            return Err("api.timeout_ms must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Settings for the provider API client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.api.url, &self.api.token)
            .with_retries(self.api.retries)
            .with_retry_interval(Duration::from_millis(self.api.retry_interval_ms))
            .with_timeout(Duration::from_millis(self.api.timeout_ms))
            .with_skip_ssl_validation(self.api.skip_ssl_validation)
    }

    /// Process-wide provisioning defaults.
    pub fn resolver_defaults(&self) -> ResolverDefaults {
        ResolverDefaults {
            datacenter: self.api.default_datacenter.clone(),
            account_id: self
                .api
                .default_account_id
                .clone()
                .filter(|id| !id.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub username: String,
    /// Prefer DBBROKER__AUTH__PASSWORD over writing it into the file
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// YAML or JSON file with the service offerings
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

fn default_catalog_path() -> String {
    "catalog.yml".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default)]
    pub token: String,
    /// Datacenter used when neither the request nor the plan names one
    #[serde(default = "default_datacenter")]
    pub default_datacenter: String,
    /// Account used when the request does not name one.
    /// If unset, the first account of the provider listing is used.
    #[serde(default)]
    pub default_account_id: Option<String>,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub skip_ssl_validation: bool,
}

fn default_api_url() -> String {
    dbbroker_gateway::DEFAULT_API_URL.to_string()
}
fn default_datacenter() -> String {
    "aws:eu-central-1".to_string()
}
fn default_retries() -> u32 {
    3
}
fn default_retry_interval_ms() -> u64 {
    3_000
}
fn default_timeout_ms() -> u64 {
    33_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            token: String::new(),
            default_datacenter: default_datacenter(),
            default_account_id: None,
            retries: default_retries(),
            retry_interval_ms: default_retry_interval_ms(),
            timeout_ms: default_timeout_ms(),
            skip_ssl_validation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default configuration file, looked up in the working directory.
    pub const DEFAULT_CONFIG_FILE: &str = "dbbroker.toml";

    /// Configuration file path and where it was taken from.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ConfigLocation {
        pub path: String,
        pub source: &'static str,
    }

    impl ConfigLocation {
        /// `--config <path>` (or `--config=<path>`), then `DBBROKER_CONFIG`,
        /// then [`DEFAULT_CONFIG_FILE`].
        pub fn resolve(args: impl IntoIterator<Item = String>, env_path: Option<String>) -> Self {
            let mut args = args.into_iter();
            while let Some(arg) = args.next() {
                let path = match arg.strip_prefix("--config=") {
                    Some(path) => Some(path.to_string()),
                    None if arg == "--config" => args.next(),
                    None => None,
                };
                if let Some(path) = path.filter(|p| !p.is_empty()) {
                    return Self {
                        path,
                        source: "--config",
                    };
                }
            }
            match env_path.filter(|p| !p.is_empty()) {
                Some(path) => Self {
                    path,
                    source: "DBBROKER_CONFIG",
                },
                None => Self {
                    path: DEFAULT_CONFIG_FILE.to_string(),
                    source: "default",
                },
            }
        }
    }

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., DBBROKER__API__TOKEN=secret
        builder = builder.add_source(
            Environment::with_prefix("DBBROKER")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let mut merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.api.url = merged.api.url.trim_end_matches('/').to_string();
        merged.validate()?;
        Ok(merged)
    }
}
