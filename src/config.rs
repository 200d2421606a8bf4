// Configuration management

use crate::error::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from `settings.yaml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dns_servers: Vec<String>,
    pub ping_host: String,
    pub resolv_conf: PathBuf,
    pub timezone: String,
    pub ntp_servers: Vec<String>,
    pub last_sync_file: PathBuf,

    pub unit_prefix: String,
    pub unit_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub use_sudo: bool,

    pub ping_attempts: u32,
    pub host_threshold: f64,
    pub aggregate_threshold: f64,

    pub lock_files: Vec<PathBuf>,
    pub apt_patterns: Vec<String>,
    pub self_markers: Vec<String>,

    /// Binary the date-sync service executes; defaults to the running executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_path: Option<PathBuf>,

    /// File these settings were loaded from, if any
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("/var/cache"));
        let data_dir = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);

        Self {
            dns_servers: vec![
                "8.8.8.8".to_string(),
                "8.8.4.4".to_string(),
                "1.1.1.1".to_string(),
            ],
            ping_host: "www.google.com".to_string(),
            resolv_conf: PathBuf::from("/etc/resolv.conf"),
            timezone: "America/Sao_Paulo".to_string(),
            ntp_servers: vec!["pool.ntp.org".to_string()],
            last_sync_file: cache_dir.join("hostprov").join("last_sync_file.log"),
            unit_prefix: "system".to_string(),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            staging_dir: data_dir.join("hostprov").join("units"),
            use_sudo: true,
            ping_attempts: 5,
            host_threshold: 80.0,
            aggregate_threshold: 60.0,
            lock_files: vec![PathBuf::from("/var/lib/apt/lists/lock")],
            apt_patterns: vec![
                "apt-get".to_string(),
                "apt-cache".to_string(),
                "apt install".to_string(),
                "/usr/lib/apt".to_string(),
            ],
            self_markers: vec![
                "hostprov".to_string(),
                "code".to_string(),
                "debugpy".to_string(),
            ],
            exec_path: None,
            source_path: None,
        }
    }
}

impl Settings {
    /// Get default config path: ~/.config/hostprov/settings.yaml
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("hostprov").join("settings.yaml"))
    }

    /// Load settings from path, falling back to defaults if not found
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| Self::default_path().unwrap_or_default());

        if !config_path.exists() {
            tracing::debug!("No settings at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let mut settings: Settings = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        };

        let config_path = std::fs::canonicalize(&config_path).unwrap_or(config_path);
        if let Some(base) = config_path.parent() {
            settings.resolve_relative_paths(base);
        }
        settings.source_path = Some(config_path);

        Ok(settings)
    }

    /// Save settings to path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Relative file paths in the document are relative to the document itself
    fn resolve_relative_paths(&mut self, base: &Path) {
        if self.last_sync_file.is_relative() {
            self.last_sync_file = base.join(&self.last_sync_file);
        }
        if self.staging_dir.is_relative() {
            self.staging_dir = base.join(&self.staging_dir);
        }
    }
}
