/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// ```toml
/// [general]
/// level_pack = "levels.skp"   # optional; built-in levels when unset
/// save_dir = ""               # empty = auto
///
/// [log]
/// level = "info"
/// file = "sokoterm.log"
/// ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".local/share/sokoterm";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Level pack to play instead of the built-in levels.
    pub level_pack: Option<PathBuf>,
    /// Where per-user progress files go. `None` = auto-detect.
    pub save_dir: Option<PathBuf>,
    pub log: LogConfig,
    /// Problems found while loading; logged once the logger is up.
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    pub file: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            level_pack: None,
            save_dir: None,
            log: LogConfig {
                level: default_log_level(),
                file: PathBuf::from(default_log_file()),
            },
            warnings: vec![],
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    level_pack: String,
    #[serde(default)]
    save_dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_level")]
    level: String,
    #[serde(default = "default_log_file")]
    file: String,
}

// ── Defaults ──

fn default_log_level() -> String { "info".into() }
fn default_log_file() -> String { "sokoterm.log".into() }

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory, (3) XDG data home.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = vec![];
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        let mut config = GameConfig::from_toml(toml_cfg, &search_dirs);
        config.warnings = warnings;
        config
    }

    /// Parse a config document directly. Relative paths resolve against the CWD.
    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let level_pack = non_empty(&cfg.general.level_pack)
            .map(|p| resolve_existing(p, search_dirs));
        let save_dir = non_empty(&cfg.general.save_dir).map(PathBuf::from);

        GameConfig {
            level_pack,
            save_dir,
            log: LogConfig {
                level: cfg.log.level,
                file: PathBuf::from(cfg.log.file),
            },
            warnings: vec![],
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

/// Absolute paths are taken as-is; relative ones are looked up in the
/// candidate dirs and default to the CWD-relative path.
fn resolve_existing(path: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        return p.to_path_buf();
    }
    search_dirs
        .iter()
        .map(|d| d.join(p))
        .find(|c| c.exists())
        .unwrap_or_else(|| p.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/sokoterm)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(APP_DIR);
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!("config.toml parse error: {e}; using default settings"));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

/// Directory for per-user progress files.
///
/// Configured dir if set, else the exe directory when writable,
/// else `~/.local/share/sokoterm`, else the CWD.
pub fn save_dir(config: &GameConfig) -> PathBuf {
    if let Some(dir) = &config.save_dir {
        return dir.clone();
    }

    // 1. Exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs won't be writable
            let test_path = parent.join(".write_test_sokoterm");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(APP_DIR);
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
