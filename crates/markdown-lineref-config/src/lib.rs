use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_KATEX_SCRIPT: &str =
    "https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/katex.min.js";
pub const DEFAULT_KATEX_STYLESHEET: &str =
    "https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/katex.min.css";
pub const DEFAULT_MERMAID_SCRIPT: &str =
    "https://cdn.jsdelivr.net/npm/mermaid@10.9.1/dist/mermaid.min.js";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Which markdown extensions are enabled and how diagrams are recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    /// Fenced code blocks with this info string are rendered as diagrams.
    pub diagram_language: String,
    pub math: bool,
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    /// GitHub-style `> [!NOTE]` alert containers.
    pub alerts: bool,
    pub heading_attributes: bool,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            diagram_language: "mermaid".to_string(),
            math: true,
            tables: true,
            footnotes: true,
            strikethrough: true,
            tasklists: true,
            alerts: true,
            heading_attributes: true,
        }
    }
}

/// Pinned third-party libraries allowed by the content security policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsSection {
    pub katex_script: String,
    pub katex_stylesheet: String,
    pub mermaid_script: String,
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            katex_script: DEFAULT_KATEX_SCRIPT.to_string(),
            katex_stylesheet: DEFAULT_KATEX_STYLESHEET.to_string(),
            mermaid_script: DEFAULT_MERMAID_SCRIPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoSection {
    /// Total attempts when reading a markdown file, including the first.
    pub read_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for IoSection {
    fn default() -> Self {
        Self {
            read_attempts: 3,
            retry_delay_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSection {
    pub pointing_by_default: bool,
    /// Theme name handed to the diagram library.
    pub diagram_theme: String,
}

impl Default for ViewSection {
    fn default() -> Self {
        Self {
            pointing_by_default: false,
            diagram_theme: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extra CSS appended after the built-in preview stylesheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_stylesheet: Option<PathBuf>,
    pub render: RenderSection,
    pub assets: AssetsSection,
    pub io: IoSection,
    pub view: ViewSection,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the stylesheet path
        config.user_stylesheet = config
            .user_stylesheet
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        config.validate()?;
        Ok(Some(config))
    }

    /// Load the user's config, falling back to defaults when there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        Ok(Self::load_from_path(&config_path)?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdown-lineref");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.diagram_language.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "render.diagram_language",
                reason: "must not be empty".to_string(),
            });
        }
        if self.io.read_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "io.read_attempts",
                reason: "at least one attempt is required".to_string(),
            });
        }
        for (field, url) in [
            ("assets.katex_script", &self.assets.katex_script),
            ("assets.katex_stylesheet", &self.assets.katex_stylesheet),
            ("assets.mermaid_script", &self.assets.mermaid_script),
        ] {
            if !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("expected an https:// URL, got {url:?}"),
                });
            }
        }
        Ok(())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/markdown-lineref/config.toml"));
    }

    #[test]
    fn test_defaults_enable_every_extension() {
        let config = Config::default();

        assert_eq!(config.render.diagram_language, "mermaid");
        assert!(config.render.math && config.render.tables && config.render.alerts);
        assert_eq!(config.io.read_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
[render]
math = false

[io]
read_attempts = 5
"#,
        )
        .unwrap();

        assert!(!config.render.math);
        assert!(config.render.tables);
        assert_eq!(config.io.read_attempts, 5);
        assert_eq!(config.io.retry_delay_ms, 50);
        assert_eq!(config.assets, AssetsSection::default());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut original = Config::default();
        original.render.diagram_language = "diagram".to_string();
        original.user_stylesheet = Some(PathBuf::from("/tmp/preview.css"));

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/preview.css");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/preview.css"));
    }

    #[test]
    fn test_stylesheet_env_var_expanded_on_load() {
        unsafe {
            env::set_var("LINEREF_STYLE_ROOT", "/custom/styles");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "user_stylesheet = \"$LINEREF_STYLE_ROOT/preview.css\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(
            config.user_stylesheet,
            Some(PathBuf::from("/custom/styles/preview.css"))
        );
        unsafe {
            env::remove_var("LINEREF_STYLE_ROOT");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[render\nmath = ").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_zero_read_attempts_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[io]\nread_attempts = 0\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "io.read_attempts",
                ..
            }
        ));
    }

    #[test]
    fn test_plain_http_asset_rejected() {
        let mut config = Config::default();
        config.assets.mermaid_script = "http://example.com/mermaid.js".to_string();

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("assets.mermaid_script"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut test_config = Config::default();
        test_config.view.pointing_by_default = true;

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
