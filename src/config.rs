//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `SETKA_WORK_DIR` and `SETKA_LOG_LEVEL` env overrides.
//! The bot token is never read from TOML — only from `TELEGRAM_BOT_TOKEN`.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::AppError;

/// Network probe configuration.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Per-command deadline. OS queries are killed past this and the
    /// result degrades to "unknown".
    pub timeout: Duration,
}

/// Fully-resolved bot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    /// Working directory for all persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    pub probe: ProbeConfig,
}

impl Config {
    /// Path of the record table file inside the work dir.
    pub fn table_path(&self) -> PathBuf {
        self.work_dir.join("table.jsonl")
    }
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    bot: RawBot,
    #[serde(default)]
    probe: RawProbe,
}

#[derive(Deserialize)]
struct RawBot {
    bot_name: String,
    work_dir: String,
    log_level: String,
}

#[derive(Deserialize)]
struct RawProbe {
    #[serde(default = "default_probe_timeout_ms")]
    timeout_ms: u64,
}

impl Default for RawProbe {
    fn default() -> Self {
        Self { timeout_ms: default_probe_timeout_ms() }
    }
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

/// Load config from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let work_dir_override = env::var("SETKA_WORK_DIR").ok();
    let log_level_override = env::var("SETKA_LOG_LEVEL").ok();
    load_from(
        Path::new("config/default.toml"),
        work_dir_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let work_dir_str = work_dir_override.unwrap_or(&parsed.bot.work_dir).to_string();
    let log_level = log_level_override.unwrap_or(&parsed.bot.log_level).to_string();

    Ok(Config {
        bot_name: parsed.bot.bot_name,
        work_dir: expand_home(&work_dir_str),
        log_level,
        probe: ProbeConfig {
            timeout: Duration::from_millis(parsed.probe.timeout_ms),
        },
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[bot]
bot_name = "test-bot"
work_dir = "~/.setka"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.bot_name, "test-bot");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.probe.timeout, Duration::from_millis(3000));
    }

    #[test]
    fn probe_timeout_from_toml() {
        let f = write_toml(
            r#"
[bot]
bot_name = "t"
work_dir = "/tmp/t"
log_level = "debug"

[probe]
timeout_ms = 500
"#,
        );
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.probe.timeout, Duration::from_millis(500));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.setka");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".setka"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), None, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("config error"));
    }

    #[test]
    fn env_style_overrides_apply() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("/tmp/test-override"), Some("debug")).unwrap();
        assert_eq!(cfg.work_dir, PathBuf::from("/tmp/test-override"));
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn table_path_under_work_dir() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("/tmp/wd"), None).unwrap();
        assert_eq!(cfg.table_path(), PathBuf::from("/tmp/wd/table.jsonl"));
    }
}
