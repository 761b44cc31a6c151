// Player configuration
// Loaded from a JSON file (explicit path or <config_dir>/video-queue-player/config.json),
// then overridden by VQP_* environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PlayerError, Result};
use crate::player::queue::OrderingKey;

const CONFIG_DIR_NAME: &str = "video-queue-player";
const CONFIG_FILE_NAME: &str = "config.json";

// How further pages are requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    // ?after=<tail key> / ?before=<head key>, both directions
    #[default]
    OrderingKey,
    // Follow the server's `next` link, forward only
    NextUrl,
}

impl std::str::FromStr for Pagination {
    type Err = PlayerError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "ordering_key" => Ok(Pagination::OrderingKey),
            "next_url" => Ok(Pagination::NextUrl),
            other => Err(PlayerError::InvalidSetting {
                name: "pagination",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub api_url: Option<String>,
    pub viewed_api_url: Option<String>,
    // Anti-forgery token, passed through untouched
    pub csrf_token: String,
    pub pagination: Pagination,
    pub resume_from: Option<String>,
    pub request_timeout_secs: u64,
    pub no_video_title: String,
    pub no_video_description: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            api_url: None,
            viewed_api_url: None,
            csrf_token: String::new(),
            pagination: Pagination::OrderingKey,
            resume_from: None,
            request_timeout_secs: 30,
            no_video_title: "No more videos".to_string(),
            no_video_description: "Sorry, looks like you've watched everything!".to_string(),
        }
    }
}

impl PlayerConfig {
    // Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    // Load from `path`, or from the default location when it exists.
    // A missing default file is fine (everything can come from the env),
    // a missing explicit file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => PlayerConfig::default(),
            },
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| PlayerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&data).map_err(|source| PlayerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    // Apply VQP_* overrides. `lookup` is std::env::var in practice.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("VQP_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(url) = lookup("VQP_VIEWED_API_URL") {
            self.viewed_api_url = Some(url);
        }
        if let Some(token) = lookup("VQP_CSRF_TOKEN") {
            self.csrf_token = token;
        }
        if let Some(key) = lookup("VQP_RESUME_FROM") {
            self.resume_from = Some(key);
        }
        if let Some(mode) = lookup("VQP_PAGINATION") {
            self.pagination = mode.parse()?;
        }
        Ok(())
    }

    pub fn api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .ok_or(PlayerError::MissingSetting("api_url"))
    }

    pub fn viewed_api_url(&self) -> Result<&str> {
        self.viewed_api_url
            .as_deref()
            .ok_or(PlayerError::MissingSetting("viewed_api_url"))
    }

    pub fn resume_key(&self) -> Option<OrderingKey> {
        self.resume_from.clone().map(OrderingKey::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn reads_partial_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api_url": "https://example.com/videos", "csrf_token": "a1b2c3",
                "pagination": "next_url"}}"#
        )
        .unwrap();

        let config = PlayerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_url().unwrap(), "https://example.com/videos");
        assert_eq!(config.csrf_token, "a1b2c3");
        assert_eq!(config.pagination, Pagination::NextUrl);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.no_video_title, "No more videos");
        assert!(matches!(
            config.viewed_api_url(),
            Err(PlayerError::MissingSetting("viewed_api_url"))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let result = PlayerConfig::load(Some(missing.as_path()));
        assert!(matches!(result, Err(PlayerError::ConfigIo { .. })));
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let result = PlayerConfig::from_file(file.path());
        assert!(matches!(result, Err(PlayerError::ConfigParse { .. })));
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("VQP_API_URL", "https://override.example.com/videos"),
            ("VQP_CSRF_TOKEN", "zzz"),
            ("VQP_RESUME_FROM", "k42"),
            ("VQP_PAGINATION", "ordering_key"),
        ]
        .into_iter()
        .collect();

        let mut config = PlayerConfig {
            api_url: Some("https://example.com/videos".to_string()),
            pagination: Pagination::NextUrl,
            ..PlayerConfig::default()
        };
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_url().unwrap(), "https://override.example.com/videos");
        assert_eq!(config.csrf_token, "zzz");
        assert_eq!(config.resume_key(), Some(OrderingKey::new("k42")));
        assert_eq!(config.pagination, Pagination::OrderingKey);
    }

    #[test]
    fn unknown_pagination_mode_is_rejected() {
        let mut config = PlayerConfig::default();
        let result = config.apply_overrides(|name| {
            (name == "VQP_PAGINATION").then(|| "sideways".to_string())
        });
        assert!(matches!(
            result,
            Err(PlayerError::InvalidSetting { name: "pagination", .. })
        ));
    }
}
