//! Prompt Panel Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_scroll_restore_delay_ms() -> u64 {
    50
}

fn default_restore_list_position() -> bool {
    true
}

fn default_locale() -> String {
    "en".to_string()
}

/// Prompt panel configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptPanelConfig {
    /// Delay before the scroll offset is restored after a refresh
    #[serde(default = "default_scroll_restore_delay_ms")]
    pub scroll_restore_delay_ms: u64,

    /// Restore the top visible row of multi-select lists
    #[serde(default = "default_restore_list_position")]
    pub restore_list_position: bool,

    /// Locale handed to the number parser
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for PromptPanelConfig {
    fn default() -> Self {
        PromptPanelConfig {
            scroll_restore_delay_ms: default_scroll_restore_delay_ms(),
            restore_list_position: default_restore_list_position(),
            locale: default_locale(),
        }
    }
}

impl PromptPanelConfig {
    /// Parse a configuration, filling in defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn scroll_restore_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_restore_delay_ms)
    }
}
