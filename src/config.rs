//! Component configuration loaded from TOML.
//!
//! Defaults that depend on secure mode are resolved per instance from
//! [`EngineFlags`], never from process-wide state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// How the `value` reference is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Inline array of rows inside the task data
    Json,
    /// URL string pointing at a JSON array of rows
    Url,
}

/// Whether the selected text is stored with each region result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveTextResult {
    None,
    No,
    Yes,
}

/// Visual layout of the rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    None,
    Dialogue,
}

/// Switches that select alternate behaviors
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineFlags {
    /// Secure deployments default to URL data and no stored text
    pub secure_mode: bool,
    /// Enable author filtering of visible rows
    pub author_filter: bool,
    /// New regions are marked dynamic for later auto-revision
    pub auto_annotation: bool,
}

/// Per-instance options as declared by the labeling config
#[derive(Debug, Clone, Deserialize)]
pub struct ParagraphsConfig {
    /// Data reference, usually `$name`
    pub value: String,
    #[serde(default, rename = "valuetype", alias = "value_type")]
    pub value_type: Option<ValueType>,
    #[serde(default, rename = "audiourl", alias = "audio_url")]
    pub audio_url: Option<String>,
    /// Name of the peer object to synchronize with
    #[serde(default)]
    pub sync: Option<String>,
    #[serde(default, rename = "showplayer", alias = "show_player")]
    pub show_player: bool,
    #[serde(default, rename = "savetextresult", alias = "save_text_result")]
    pub save_text_result: Option<SaveTextResult>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default = "default_name_key", rename = "namekey", alias = "name_key")]
    pub name_key: String,
    #[serde(default = "default_text_key", rename = "textkey", alias = "text_key")]
    pub text_key: String,
}

fn default_name_key() -> String {
    "author".to_string()
}

fn default_text_key() -> String {
    "text".to_string()
}

impl ParagraphsConfig {
    /// Config with defaults for a data reference
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            value_type: None,
            audio_url: None,
            sync: None,
            show_player: false,
            save_text_result: None,
            layout: Layout::None,
            name_key: default_name_key(),
            text_key: default_text_key(),
        }
    }

    #[must_use]
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    #[must_use]
    pub fn with_keys(mut self, name_key: &str, text_key: &str) -> Self {
        self.name_key = name_key.to_string();
        self.text_key = text_key.to_string();
        self
    }

    #[must_use]
    pub fn with_sync(mut self, peer: &str) -> Self {
        self.sync = Some(peer.to_string());
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid paragraphs config")
    }

    /// Read a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    /// Fill in flag-dependent defaults for this instance
    #[must_use]
    pub fn resolved(&self, flags: &EngineFlags) -> ResolvedConfig {
        let value_type = self.value_type.unwrap_or(if flags.secure_mode {
            ValueType::Url
        } else {
            ValueType::Json
        });
        let save_text_result = self.save_text_result.unwrap_or(if flags.secure_mode {
            SaveTextResult::No
        } else {
            SaveTextResult::Yes
        });

        ResolvedConfig {
            value: self.value.clone(),
            value_type,
            audio_url: self.audio_url.clone(),
            sync: self.sync.clone(),
            show_player: self.show_player,
            save_text_result,
            layout: self.layout,
            name_key: self.name_key.clone(),
            text_key: self.text_key.clone(),
        }
    }
}

/// Config with every default decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub value: String,
    pub value_type: ValueType,
    pub audio_url: Option<String>,
    pub sync: Option<String>,
    pub show_player: bool,
    pub save_text_result: SaveTextResult,
    pub layout: Layout,
    pub name_key: String,
    pub text_key: String,
}

/// Return the path to the default config file.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paralabel")
        .join("paragraphs.toml")
}
