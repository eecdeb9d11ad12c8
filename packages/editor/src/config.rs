use crate::errors::EditorError;
use crate::geometry::{BreakpointTable, GeometryResolver};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "freeform.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Reference widths of the responsive viewports
    #[serde(default)]
    pub breakpoints: BreakpointTable,

    /// Maximum number of undo levels
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Quiet period after the last change before the autosave cache is written
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,

    /// Prefix of the per-session autosave cache key
    #[serde(default = "default_autosave_key_prefix")]
    pub autosave_key_prefix: String,

    /// Space kept below the lowest element of a blank section
    #[serde(default = "default_section_bottom_padding")]
    pub section_bottom_padding: f64,

    /// Vertical gap between stacked new elements
    #[serde(default = "default_stack_gap")]
    pub stack_gap: f64,
}

fn default_max_history() -> usize {
    50
}

fn default_autosave_debounce_ms() -> u64 {
    1500
}

fn default_autosave_key_prefix() -> String {
    "freeform-autosave".to_string()
}

fn default_section_bottom_padding() -> f64 {
    30.0
}

fn default_stack_gap() -> f64 {
    20.0
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EditorError> {
        let table = &self.breakpoints;
        if !(table.desktop > table.tablet && table.tablet > table.mobile && table.mobile > 0.0) {
            return Err(EditorError::Config(format!(
                "breakpoints must be strictly decreasing and positive (got {}/{}/{})",
                table.desktop, table.tablet, table.mobile
            )));
        }
        if self.max_history == 0 {
            return Err(EditorError::Config("maxHistory must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn resolver(&self) -> GeometryResolver {
        GeometryResolver::new(self.breakpoints)
    }

    /// Autosave cache key for an editor session
    pub fn autosave_key(&self, session_id: &str) -> String {
        format!("{}:{}", self.autosave_key_prefix, session_id)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            breakpoints: BreakpointTable::default(),
            max_history: default_max_history(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            autosave_key_prefix: default_autosave_key_prefix(),
            section_bottom_padding: default_section_bottom_padding(),
            stack_gap: default_stack_gap(),
        }
    }
}
