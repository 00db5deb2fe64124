//! Process configuration: optional TOML file with environment overrides.
//!
//! Built once at startup and passed explicitly to the scheduler and
//! dispatcher — no ambient global state. Environment variables win over
//! file values; the variable names match the original deployment
//! (`BOT_TOKEN`, `TIMES`, `TIMEZONE`, `MESSAGES_FILE`, `MENTION`, `CHAT_ID`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NudgeError, Result};

fn default_times() -> Vec<String> {
    ["09:00", "12:00", "15:00", "18:00", "21:00"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_timezone() -> String {
    "Europe/Paris".to_string()
}

fn default_mention() -> String {
    "@nudgebot".to_string()
}

/// Immutable process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Telegram bot token. Required — the process refuses to start without it.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Daily send times, "HH:MM" local to `timezone`.
    #[serde(default = "default_times")]
    pub times: Vec<String>,

    /// IANA timezone identifier the times are interpreted in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Message pool file. Defaults to `<data_dir>/messages.json`.
    #[serde(default)]
    pub messages_file: Option<PathBuf>,

    /// Footer appended to every message after a blank line.
    #[serde(default = "default_mention")]
    pub mention: String,

    /// Fixed recipient override. When set, both scheduled and immediate
    /// sends target only this chat and the subscriber store is bypassed.
    #[serde(default)]
    pub chat_id: Option<i64>,

    /// State directory for subscribers.json and the default message pool.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: None,
            times: default_times(),
            timezone: default_timezone(),
            messages_file: None,
            mention: default_mention(),
            chat_id: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Default config file location (`~/.nudge/config.toml`).
    pub fn default_path() -> PathBuf {
        Self::default_home().join("config.toml")
    }

    fn default_home() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nudge")
    }

    /// Load from the default path (if present), then apply env overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path (if present), then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)
                .map_err(|e| NudgeError::config(format!("{}: {e}", path.display())))?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment-style overrides from an arbitrary lookup.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(token) = get("BOT_TOKEN") {
            self.bot_token = Some(token);
        }
        if let Some(times) = get("TIMES") {
            let parsed: Vec<String> = times
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            if !parsed.is_empty() {
                self.times = parsed;
            }
        }
        if let Some(tz) = get("TIMEZONE") {
            self.timezone = tz;
        }
        if let Some(path) = get("MESSAGES_FILE") {
            self.messages_file = Some(PathBuf::from(path));
        }
        if let Some(mention) = get("MENTION") {
            self.mention = mention;
        }
        if let Some(raw) = get("CHAT_ID") {
            match raw.trim().parse::<i64>() {
                Ok(id) => self.chat_id = Some(id),
                Err(_) => tracing::warn!("Invalid CHAT_ID {raw:?}, ignoring override"),
            }
        }
        if let Some(dir) = get("NUDGE_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Resolved state directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(Self::default_home)
    }

    /// Where the subscriber set is persisted.
    pub fn subscribers_path(&self) -> PathBuf {
        self.data_dir().join("subscribers.json")
    }

    /// Where the message pool is read from.
    pub fn messages_path(&self) -> PathBuf {
        self.messages_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join("messages.json"))
    }

    /// The bot token, or a clean startup error when absent.
    pub fn require_token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(NudgeError::TokenMissing)
    }
}
