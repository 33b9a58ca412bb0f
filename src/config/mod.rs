// Configuration management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::theme::Palette;
use crate::widget::{WidgetInstance, WidgetRegistry};

/// Network selection shared by the network widgets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Interface for netspeed; picked at startup when unset
    #[serde(default)]
    pub interface: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bar colors
    #[serde(default)]
    pub palette: Palette,

    #[serde(default)]
    pub network: NetworkConfig,

    /// Widgets, left to right
    #[serde(default = "default_widgets")]
    pub widgets: Vec<WidgetInstance>,
}

/// Module order of the stock bar
pub const DEFAULT_WIDGETS: [&str; 8] = [
    "netspeed", "netinfo", "wlan", "volume", "memory", "github", "battery", "clock",
];

fn default_widgets() -> Vec<WidgetInstance> {
    DEFAULT_WIDGETS
        .iter()
        .map(|widget_type| WidgetInstance::new(widget_type))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            network: NetworkConfig::default(),
            widgets: default_widgets(),
        }
    }
}

impl Config {
    /// Load configuration from `path` (or the default location), writing
    /// the defaults there first when the file does not exist
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content)?;
            debug!(path = %config_path.display(), widgets = config.widgets.len(), "Configuration loaded");
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            info!(path = %config_path.display(), "Wrote default configuration");
            Ok(config)
        }
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("i3-statusline").join("config.toml"))
    }

    /// Instances that should appear on the bar
    pub fn enabled_widgets(&self) -> impl Iterator<Item = &WidgetInstance> {
        self.widgets.iter().filter(|w| w.enabled)
    }

    /// Check every enabled instance against its factory
    pub fn validate(&self, registry: &WidgetRegistry) -> ConfigResult<()> {
        for instance in self.enabled_widgets() {
            registry
                .validate(&instance.widget_type, &instance.config)
                .map_err(|e| {
                    ConfigError::InvalidValue(format!("widget '{}': {:#}", instance.instance_id(), e))
                })?;
        }
        Ok(())
    }
}
