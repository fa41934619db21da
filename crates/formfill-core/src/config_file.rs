//! On-disk and environment configuration.
//!
//! TOML file cascade: CWD `.formfill.toml` over the platform config file,
//! with environment variables taking precedence over both. All file fields
//! are optional so partial configs work.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ExtractionMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_keys: Option<ApiKeysConfig>,
    pub model: Option<ModelConfig>,
    pub ocr: Option<OcrConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrConfig {
    pub tesseract_path: Option<String>,
    pub structured_cmd: Option<String>,
    pub default_mode: Option<String>,
}

/// Platform config path: `<config_dir>/formfill/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("formfill").join("config.toml"))
}

/// Load config by cascading CWD `.formfill.toml` over the platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".formfill.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        api_keys: Some(ApiKeysConfig {
            openai_api_key: overlay
                .api_keys
                .as_ref()
                .and_then(|a| a.openai_api_key.clone())
                .or_else(|| base.api_keys.as_ref().and_then(|a| a.openai_api_key.clone())),
        }),
        model: Some(ModelConfig {
            name: overlay
                .model
                .as_ref()
                .and_then(|m| m.name.clone())
                .or_else(|| base.model.as_ref().and_then(|m| m.name.clone())),
            temperature: overlay
                .model
                .as_ref()
                .and_then(|m| m.temperature)
                .or_else(|| base.model.as_ref().and_then(|m| m.temperature)),
            max_tokens: overlay
                .model
                .as_ref()
                .and_then(|m| m.max_tokens)
                .or_else(|| base.model.as_ref().and_then(|m| m.max_tokens)),
        }),
        ocr: Some(OcrConfig {
            tesseract_path: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.tesseract_path.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.tesseract_path.clone())),
            structured_cmd: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.structured_cmd.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.structured_cmd.clone())),
            default_mode: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.default_mode.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.default_mode.clone())),
        }),
    }
}

/// Fully resolved runtime settings.
#[derive(Clone)]
pub struct Settings {
    /// Process-level default API key; a caller-supplied key still wins.
    pub openai_api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub tesseract_path: Option<PathBuf>,
    pub structured_cmd: Option<String>,
    pub default_mode: ExtractionMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            max_tokens: 2000,
            tesseract_path: None,
            structured_cmd: None,
            default_mode: ExtractionMode::Fast,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("tesseract_path", &self.tesseract_path)
            .field("structured_cmd", &self.structured_cmd)
            .field("default_mode", &self.default_mode)
            .finish()
    }
}

impl Settings {
    /// Resolve settings from the config file cascade plus the environment.
    /// Environment variables win over file values.
    pub fn load() -> Self {
        Self::from_config(load_config())
    }

    pub fn from_config(file: ConfigFile) -> Self {
        let defaults = Settings::default();
        let api_keys = file.api_keys.unwrap_or_default();
        let model = file.model.unwrap_or_default();
        let ocr = file.ocr.unwrap_or_default();

        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let default_mode = env("FORMFILL_DEFAULT_MODE")
            .or(ocr.default_mode)
            .and_then(|m| match m.trim().to_ascii_lowercase().as_str() {
                "fast" => Some(ExtractionMode::Fast),
                "structured" => Some(ExtractionMode::Structured),
                _ => None,
            })
            .unwrap_or(defaults.default_mode);

        Self {
            openai_api_key: env("OPENAI_API_KEY").or(api_keys.openai_api_key),
            model: env("FORMFILL_MODEL").or(model.name).unwrap_or(defaults.model),
            temperature: model.temperature.unwrap_or(defaults.temperature),
            max_tokens: model.max_tokens.unwrap_or(defaults.max_tokens),
            tesseract_path: env("FORMFILL_TESSERACT_PATH")
                .or(ocr.tesseract_path)
                .map(PathBuf::from),
            structured_cmd: env("FORMFILL_STRUCTURED_CMD").or(ocr.structured_cmd),
            default_mode,
        }
    }
}
