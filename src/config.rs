use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

pub const DEFAULT_SERVICE: &str = "WpcMonSvc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_service")]
    pub service_name: String,
    #[serde(default)]
    pub hotkey: KeyChord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChord {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    #[serde(default)]
    pub win: bool,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct Paths {
    pub cfg_file: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service(),
            hotkey: KeyChord::default(),
        }
    }
}

impl Default for KeyChord {
    fn default() -> Self {
        KeyChord {
            ctrl: true,
            alt: false,
            shift: true,
            win: false,
            key: "K".into(),
        }
    }
}

fn default_service() -> String {
    DEFAULT_SERVICE.into()
}

pub fn project_paths() -> Result<Paths> {
    let dirs = ProjectDirs::from("com", "Acme", "ServiceToggler")
        .context("Failed to determine project directories")?;
    let cfg_file = dirs.config_dir().join("svctoggle.json");
    let log_dir = dirs.data_local_dir().join("logs");
    Ok(Paths {
        cfg_file,
        log_dir,
    })
}

pub fn load_or_default() -> Result<(Config, Paths)> {
    let paths = project_paths()?;
    if let Err(e) = fs::create_dir_all(&paths.log_dir) {
        tracing::warn!("Failed to create log directory: {}", e);
    }
    let cfg = load_from(&paths.cfg_file);
    Ok((cfg, paths))
}

/// Read a config file, falling back to defaults when it is absent or broken.
pub fn load_from(path: &Path) -> Config {
    let mut cfg = match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Config>(&s) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("Failed to parse config JSON: {}, using defaults", e);
                Config::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}, using defaults", path.display(), e);
            Config::default()
        }
    };
    if cfg.service_name.trim().is_empty() {
        tracing::warn!("Empty service_name in config, using {}", DEFAULT_SERVICE);
        cfg.service_name = default_service();
    } else {
        cfg.service_name = cfg.service_name.trim().to_string();
    }
    cfg
}
