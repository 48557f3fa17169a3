use std::env;
use std::path::PathBuf;

/// Runtime configuration for the merge service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address (default: 127.0.0.1)
    pub host: String,

    /// Listen port (default: 5000)
    pub port: u16,

    /// Maximum multipart body size in bytes (default: 64 MB)
    pub max_upload_size: usize,

    /// Root directory for per-request workspaces
    /// (default: the system temp directory)
    pub staging_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_size: 64 * 1024 * 1024, // 64 MB
            staging_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: env::var("SERVER_HOST").unwrap_or(default.host),

            port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            staging_dir: env::var("STAGING_DIR").ok().map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_upload_size, 64 * 1024 * 1024);
        assert!(config.staging_dir.is_none());
    }
}
