// Application state module
// Holds the configuration and data locations shared by every request

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::logger;

/// Filesystem locations resolved once at startup
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub csv_file: PathBuf,
    pub pdf_dir: PathBuf,
    pub static_dir: PathBuf,
    pub index_file: PathBuf,
}

impl DataPaths {
    pub fn from_config(config: &Config) -> Self {
        let static_dir = PathBuf::from(&config.data.static_dir);
        let index_file = static_dir.join(&config.data.index_file);
        Self {
            csv_file: PathBuf::from(&config.data.csv_file),
            pdf_dir: PathBuf::from(&config.data.pdf_dir),
            static_dir,
            index_file,
        }
    }

    /// Warn about locations that do not exist yet.
    ///
    /// Missing inputs are a deployment problem; requests still report them
    /// individually (500 for the dataset, 404 for files).
    pub fn warn_missing(&self) -> usize {
        let checks: [(&str, &Path, bool); 4] = [
            ("Dataset file", &self.csv_file, self.csv_file.is_file()),
            ("PDF directory", &self.pdf_dir, self.pdf_dir.is_dir()),
            ("Frontend directory", &self.static_dir, self.static_dir.is_dir()),
            ("Entry HTML document", &self.index_file, self.index_file.is_file()),
        ];

        let mut missing = 0;
        for (label, path, present) in checks {
            if !present {
                missing += 1;
                logger::log_warning(&format!(
                    "{label} not found at '{}'; set it in config.toml or the environment",
                    path.display()
                ));
            }
        }
        missing
    }
}

/// Application state
pub struct AppState {
    pub config: Config,
    pub paths: DataPaths,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let paths = DataPaths::from_config(&config);
        Self { config, paths }
    }
}
