use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub access: AccessConfig,
    pub storage: StorageConfig,
    pub request_log: RequestLogConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

/// Static IP access rules, evaluated per request and immutable at runtime.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// CIDR ranges permitted to reach the service
    pub allowed_networks: Vec<String>,
    /// Individual addresses denied regardless of allow-list membership
    pub blocked_addresses: Vec<String>,
}

/// Filesystem layout for static assets and stored photos
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory served under /static
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RequestLogConfig {
    /// Append-only NDJSON destination for per-request records
    pub file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            // Only error if it's not "file not found" - that's acceptable
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            access: AccessConfig::from_env(),
            storage: StorageConfig::from_env(),
            request_log: RequestLogConfig::from_env(),
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_UPLOAD_BYTES must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_upload_bytes,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AccessConfig {
    /// Private ranges plus loopback; overridden via ALLOWED_NETWORKS
    const DEFAULT_ALLOWED_NETWORKS: &'static str =
        "127.0.0.0/8,10.0.0.0/8,172.16.0.0/12,192.168.0.0/16";

    pub fn from_env() -> Self {
        let allowed_networks = env::var("ALLOWED_NETWORKS")
            .unwrap_or_else(|_| Self::DEFAULT_ALLOWED_NETWORKS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let blocked_addresses = env::var("BLOCKED_IPS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            allowed_networks,
            blocked_addresses,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

        Self {
            static_dir: PathBuf::from(static_dir),
        }
    }

    /// Uploaded and listed photos live in a fixed subdirectory of the static root
    pub fn photos_dir(&self) -> PathBuf {
        self.static_dir.join("photos")
    }
}

impl RequestLogConfig {
    pub fn from_env() -> Self {
        let file = env::var("REQUEST_LOG_FILE").unwrap_or_else(|_| "logs/requests.log".to_string());

        Self {
            file: PathBuf::from(file),
        }
    }
}
