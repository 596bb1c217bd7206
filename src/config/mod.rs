// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::env;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::cli::Cli;

// Re-export public types
pub use state::{AppState, DataPaths};
pub use types::Config;

/// Environment variables honored for the data locations, mapped to config keys
const DATA_ENV_OVERRIDES: [(&str, &str); 3] = [
    ("CSV_FILE", "data.csv_file"),
    ("PDF_DIR", "data.pdf_dir"),
    ("STATIC_DIR", "data.static_dir"),
];

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with(config_path, |key| env::var(key).ok())
    }

    /// Same as [`Config::load_from`], with the data overrides read through `lookup`
    pub fn load_with(
        config_path: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("VIEWER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.debug", false)?
            .set_default("data.csv_file", "extracted_data.csv")?
            .set_default("data.pdf_dir", "pdfs")?
            .set_default("data.static_dir", "frontend/dist")?
            .set_default("data.index_file", "index.html")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "title_viewer")?
            .set_default("http.enable_cors", true)?
            .set_default("http.cache_max_age", 0)?;

        for (var, key) in DATA_ENV_OVERRIDES {
            builder = builder.set_override_option(key, lookup(var))?;
        }

        builder.build()?.try_deserialize()
    }

    /// Apply command-line flags on top of the loaded configuration
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref host) = cli.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(workers) = cli.workers {
            self.server.workers = Some(workers);
        }
        if cli.debug {
            self.server.debug = true;
        }
    }

    /// Listen address; `server.host` may be an IP address or a host name
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        let host = self.server.host.as_str();
        (host, self.server.port)
            .to_socket_addrs()
            .map_err(|e| format!("Invalid address {host}:{}: {e}", self.server.port))?
            .next()
            .ok_or_else(|| format!("No address found for host {host}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_CONFIG: &str = "does-not-exist/title_viewer";

    #[test]
    fn test_defaults() {
        let cfg = Config::load_with(MISSING_CONFIG, |_| None).unwrap();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.data.csv_file, "extracted_data.csv");
        assert_eq!(cfg.data.index_file, "index.html");
        assert!(cfg.http.enable_cors);
        assert_eq!(cfg.http.cache_max_age, 0);
        assert_eq!(cfg.logging.access_log_format, "combined");
    }

    #[test]
    fn test_data_env_overrides() {
        let cfg = Config::load_with(MISSING_CONFIG, |key| match key {
            "CSV_FILE" => Some("/srv/data/titles.csv".to_string()),
            "PDF_DIR" => Some("/srv/data/pdfs".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.data.csv_file, "/srv/data/titles.csv");
        assert_eq!(cfg.data.pdf_dir, "/srv/data/pdfs");
        assert_eq!(cfg.data.static_dir, "frontend/dist");
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[data]\npdf_dir = \"/mnt/specs\"\n",
        )
        .unwrap();

        let stem = dir.path().join("viewer");
        let cfg = Config::load_with(stem.to_str().unwrap(), |_| None).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.data.pdf_dir, "/mnt/specs");
        assert_eq!(cfg.server.host, "127.0.0.1");
    }

    #[test]
    fn test_apply_cli() {
        let mut cfg = Config::load_with(MISSING_CONFIG, |_| None).unwrap();
        let cli = Cli {
            config: MISSING_CONFIG.to_string(),
            host: Some("0.0.0.0".to_string()),
            port: Some(8081),
            workers: None,
            debug: true,
        };
        cfg.apply_cli(&cli);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8081);
        assert!(cfg.server.debug);
        assert_eq!(cfg.socket_addr().unwrap().to_string(), "0.0.0.0:8081");
    }

    #[test]
    fn test_socket_addr_resolves_host_name() {
        let mut cfg = Config::load_with(MISSING_CONFIG, |_| None).unwrap();
        cfg.server.host = "localhost".to_string();
        cfg.server.port = 5001;
        let addr = cfg.socket_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 5001);
    }

    #[test]
    fn test_invalid_socket_addr() {
        let mut cfg = Config::load_with(MISSING_CONFIG, |_| None).unwrap();
        cfg.server.host = "not a host".to_string();
        assert!(cfg.socket_addr().is_err());
    }
}
