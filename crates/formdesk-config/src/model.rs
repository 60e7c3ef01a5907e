use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const SORT_KEYS: [&str; 3] = ["created_at", "updated_at", "name"];
pub const SORT_ORDERS: [&str; 2] = ["asc", "desc"];

/// Stores user-configurable preferences for the command line and shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for the template/record store. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
    #[serde(default = "Config::default_sort_value")]
    pub default_sort: String,
    #[serde(default = "Config::default_sort_order_value")]
    pub default_sort_order: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_template_id: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_sort: Self::default_sort_value(),
            default_sort_order: Self::default_sort_order_value(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            log_filter: None,
            last_template_id: None,
        }
    }
}

impl Config {
    pub fn default_sort_value() -> String {
        "created_at".into()
    }

    pub fn default_sort_order_value() -> String {
        "desc".into()
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("formdesk")
    }

    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        if !SORT_KEYS.contains(&self.default_sort.as_str()) {
            return Err(crate::ConfigError::Invalid {
                key: "default_sort".into(),
                message: format!("expected one of {}", SORT_KEYS.join(", ")),
            });
        }
        if !SORT_ORDERS.contains(&self.default_sort_order.as_str()) {
            return Err(crate::ConfigError::Invalid {
                key: "default_sort_order".into(),
                message: format!("expected one of {}", SORT_ORDERS.join(", ")),
            });
        }
        Ok(())
    }
}
