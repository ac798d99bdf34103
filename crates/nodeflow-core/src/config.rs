use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NodeflowError, Result};

/// Top-level nodeflow configuration, loadable from a TOML file. Every
/// field has a default so an absent file or empty table is a valid
/// configuration; CLI flags override whatever was loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub nodepacks: NodepacksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodepacksConfig {
    /// Root directory scanned for nodepacks.
    #[serde(default = "default_nodepacks_dir")]
    pub dir: PathBuf,
    /// Rebuild the registry from the nodepack tree on each request.
    #[serde(default)]
    pub reload: bool,
}

impl Default for NodepacksConfig {
    fn default() -> Self {
        Self {
            dir: default_nodepacks_dir(),
            reload: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_nodepacks_dir() -> PathBuf {
    PathBuf::from("nodepacks")
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| NodeflowError::ConfigNotFound(path.display().to_string()))?;
        toml::from_str(&content)
            .map_err(|e| NodeflowError::Config(format!("{}: {}", path.display(), e)))
    }
}
