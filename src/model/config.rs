use serde::{Deserialize, Serialize};

use crate::model::task::DEFAULT_CATEGORY;

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Category used by `add` when none is given
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Categories offered to the user. Tasks may still carry others.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

impl Default for TasksConfig {
    fn default() -> Self {
        TasksConfig {
            default_category: default_category(),
            categories: default_categories(),
        }
    }
}

/// Default: see CONFIG_TOML_TEMPLATE in cli/handlers/init.rs
fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Default: see CONFIG_TOML_TEMPLATE in cli/handlers/init.rs
fn default_categories() -> Vec<String> {
    ["General", "Work", "Personal", "Home"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
