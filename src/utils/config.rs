//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::utils::error::TubescriptError;

/// Application settings, loaded once at startup and shared read-only
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Languages advertised to callers
    pub supported_languages: Vec<String>,

    /// Preference list used when a request names no languages
    pub default_languages: Vec<String>,

    /// Ceiling on the rendered document, in characters
    pub max_document_chars: usize,

    /// Bound on each yt-dlp subtitle attempt
    pub subtitle_timeout_secs: u64,

    /// Bound on the yt-dlp info dump
    pub metadata_timeout_secs: u64,

    /// Bound on watch page requests
    pub page_timeout_secs: u64,

    /// User agent for watch page requests
    pub user_agent: String,

    /// Explicit yt-dlp binary, skips auto-detection
    pub ytdlp_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            supported_languages: ["ja", "en", "ko", "zh", "de", "fr", "es", "pt", "ru"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_languages: ["ja", "en", "ko"].iter().map(|s| s.to_string()).collect(),
            max_document_chars: 200_000,
            subtitle_timeout_secs: 30,
            metadata_timeout_secs: 15,
            page_timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
            ytdlp_path: None,
        }
    }
}

impl AppSettings {
    /// Default config file location
    /// - Linux: ~/.config/tubescript/config.json
    /// - macOS: ~/Library/Application Support/tubescript/config.json
    /// - Windows: %APPDATA%\tubescript\config.json
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubescript")
            .join("config.json")
    }

    /// Load settings from an explicit file, or from the default location if present.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, TubescriptError> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("No config at {:?}, using defaults", default_path);
                    Self::default()
                }
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self, TubescriptError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            TubescriptError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings: AppSettings = serde_json::from_str(&json).map_err(|e| {
            TubescriptError::ConfigError(format!("cannot parse {}: {}", path.display(), e))
        })?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), TubescriptError> {
        if normalize_languages(&self.default_languages).is_empty() {
            return Err(TubescriptError::ConfigError(
                "default_languages must name at least one language".to_string(),
            ));
        }
        if self.max_document_chars == 0 {
            return Err(TubescriptError::ConfigError(
                "max_document_chars must be greater than zero".to_string(),
            ));
        }
        for (name, secs) in [
            ("subtitle_timeout_secs", self.subtitle_timeout_secs),
            ("metadata_timeout_secs", self.metadata_timeout_secs),
            ("page_timeout_secs", self.page_timeout_secs),
        ] {
            if secs == 0 {
                return Err(TubescriptError::ConfigError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Turn a caller's language list into the ordered preference list to search.
    ///
    /// Codes are trimmed, blanks and repeats dropped; the defaults get the same
    /// treatment when nothing usable was requested.
    pub fn resolve_languages(&self, requested: Option<&[String]>) -> Vec<String> {
        let languages = normalize_languages(requested.unwrap_or_default());
        for lang in &languages {
            if !self.supported_languages.iter().any(|l| l == lang) {
                debug!("Language {} is not in the supported list, trying it anyway", lang);
            }
        }

        if languages.is_empty() {
            return normalize_languages(&self.default_languages);
        }
        languages
    }

    pub fn subtitle_timeout(&self) -> Duration {
        Duration::from_secs(self.subtitle_timeout_secs)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

/// Trim codes, drop blanks and keep the first occurrence of each
fn normalize_languages(codes: &[String]) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    for code in codes {
        let code = code.trim();
        if code.is_empty() || languages.iter().any(|l| l == code) {
            continue;
        }
        languages.push(code.to_string());
    }
    languages
}
