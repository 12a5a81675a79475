//! Application configuration, loaded from a YAML file. Every field has a
//! default so a missing file or a partial document both yield a usable
//! config.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::script::SCRIPT_MEMORY_LIMIT_BYTES;
use kitbash_dom::ParseLimits;

/// Resource ceilings applied to every preview instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviewLimits {
    /// Maximum element nesting depth the markup parser accepts.
    pub max_depth: usize,
    /// Maximum number of nodes a parsed surface may hold.
    pub max_nodes: usize,
    /// Script VM memory ceiling in bytes.
    pub memory_limit_bytes: usize,
    /// Optional cap on script execution steps per entry into the VM.
    /// Unset means scripts run until they return or hit the memory limit.
    pub instruction_budget: Option<u64>,
}

impl Default for PreviewLimits {
    fn default() -> Self {
        PreviewLimits {
            max_depth: ParseLimits::default().max_depth,
            max_nodes: ParseLimits::default().max_nodes,
            memory_limit_bytes: SCRIPT_MEMORY_LIMIT_BYTES,
            instruction_budget: None,
        }
    }
}

impl PreviewLimits {
    pub fn parse_limits(&self) -> ParseLimits {
        ParseLimits {
            max_depth: self.max_depth,
            max_nodes: self.max_nodes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory the file-backed snippet store keeps its payloads in.
    pub data_dir: PathBuf,
    pub limits: PreviewLimits,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: PathBuf::from("data"),
            limits: PreviewLimits::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file. A file that does not exist is
    /// not an error; defaults apply. A file that exists but cannot be read
    /// or parsed is.
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
