use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Return error text on 500 responses. Keep off in production.
    #[serde(default)]
    pub expose_error_detail: bool,
    /// Browser origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// Transactional mail HTTP API. An empty `api_url` disables sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersConfig {
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: f64,
    #[serde(default = "default_platform_admin_chef_name")]
    pub platform_admin_chef_name: String,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_from_name() -> String {
    "HOMEZaika".to_string()
}

fn default_delivery_fee() -> f64 {
    150.0
}

fn default_platform_admin_chef_name() -> String {
    "Home Zaika Admin".to_string()
}

fn default_upload_dir() -> String {
    "uploads/payments".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_event_channel_capacity() -> usize {
    256
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            from_address: String::new(),
            from_name: default_from_name(),
        }
    }
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            delivery_fee: default_delivery_fee(),
            platform_admin_chef_name: default_platform_admin_chef_name(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("Failed to parse config file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 5020u16),
                        expose_error_detail: get_env_parse("EXPOSE_ERROR_DETAIL", false),
                        cors_allowed_origins: Vec::new(),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    mail: MailConfig::default(),
                    orders: OrdersConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    // 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) {
        if let Some(v) = get_env("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = get_env("SERVER_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = p;
        }
        if let Some(b) = get_env("EXPOSE_ERROR_DETAIL").and_then(|v| v.parse().ok()) {
            self.server.expose_error_detail = b;
        }
        if let Some(v) = get_env("CORS_ALLOWED_ORIGINS") {
            self.server.cors_allowed_origins = split_list(&v);
        }
        if let Some(v) = get_env("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(mc) = get_env("DB_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            self.database.max_connections = mc;
        }
        if let Some(v) = get_env("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Some(n) = get_env("JWT_ACCESS_EXPIRES_IN").and_then(|v| v.parse().ok()) {
            self.jwt.access_token_expires_in = n;
        }
        if let Some(v) = get_env("MAIL_API_URL") {
            self.mail.api_url = v;
        }
        if let Some(v) = get_env("MAIL_API_KEY") {
            self.mail.api_key = v;
        }
        if let Some(v) = get_env("MAIL_FROM_ADDRESS") {
            self.mail.from_address = v;
        }
        if let Some(v) = get_env("MAIL_FROM_NAME") {
            self.mail.from_name = v;
        }
        if let Some(fee) = get_env("ORDER_DELIVERY_FEE").and_then(|v| v.parse().ok()) {
            self.orders.delivery_fee = fee;
        }
        if let Some(v) = get_env("PLATFORM_ADMIN_CHEF_NAME") {
            self.orders.platform_admin_chef_name = v;
        }
        if let Some(v) = get_env("UPLOAD_DIR") {
            self.orders.upload_dir = v;
        }
        if let Some(n) = get_env("MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
            self.orders.max_upload_bytes = n;
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
