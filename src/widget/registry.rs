//! Widget registry for dynamic widget creation
//!
//! This module provides the infrastructure for registering and creating widgets
//! based on configuration. It supports:
//!
//! - Type-erased widget factories
//! - Registration of the built-in widgets
//! - Creation of widgets from TOML configuration

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use super::battery::BatteryWidgetFactory;
use super::clock::ClockWidgetFactory;
use super::gate::LinkGate;
use super::github::GithubWidgetFactory;
use super::memory::MemoryWidgetFactory;
use super::netinfo::NetInfoWidgetFactory;
use super::netspeed::NetSpeedWidgetFactory;
use super::traits::Widget;
use super::volume::VolumeWidgetFactory;
use super::wlan::WlanWidgetFactory;
use crate::github::GithubCredentials;
use crate::net;
use crate::theme::Palette;

/// Everything the GitHub widget needs to poll the API
#[derive(Clone)]
pub struct GithubAccess {
    pub credentials: GithubCredentials,
    pub token: String,
}

impl std::fmt::Debug for GithubAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubAccess")
            .field("client_id", &self.credentials.client_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Shared state handed to every factory
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub palette: Palette,
    /// Links the wlan and netinfo widgets
    pub gate: LinkGate,
    /// Interface picked at startup for the netspeed widget
    pub interface: Option<String>,
    /// sysfs network directory
    pub sys_class_net: PathBuf,
    /// `None` disables the GitHub widget
    pub github: Option<GithubAccess>,
}

impl BuildContext {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            gate: LinkGate::new(),
            interface: None,
            sys_class_net: net::sys_class_net(),
            github: None,
        }
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(Palette::default())
    }
}

/// Type-erased widget factory trait
///
/// This trait allows storing different widget factories in a single collection
/// without knowing the concrete types at compile time.
pub trait DynWidgetFactory: Send + Sync {
    /// The widget type identifier (e.g., "clock", "battery")
    fn widget_type(&self) -> &'static str;

    /// Create a new widget instance from TOML configuration
    fn create(&self, config: &toml::Table, ctx: &BuildContext) -> Result<Box<dyn Widget>>;

    /// Get default configuration for this widget type
    fn default_config(&self) -> toml::Table;

    /// Validate configuration before creating widget
    fn validate_config(&self, config: &toml::Table) -> Result<()>;
}

/// Check the common `update_interval` key (seconds, at least 1)
pub fn validate_interval(config: &toml::Table) -> Result<()> {
    if let Some(interval) = config.get("update_interval") {
        let interval_val = interval
            .as_integer()
            .context("'update_interval' must be an integer")?;

        if interval_val < 1 {
            bail!("'update_interval' must be at least 1 second");
        }
    }
    Ok(())
}

/// Registry for widget factories
///
/// The registry holds all available widget factories and creates widget
/// instances based on configuration.
pub struct WidgetRegistry {
    factories: HashMap<&'static str, Arc<dyn DynWidgetFactory>>,
}

impl WidgetRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with all built-in widgets registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(BatteryWidgetFactory);
        registry.register(ClockWidgetFactory);
        registry.register(GithubWidgetFactory);
        registry.register(MemoryWidgetFactory);
        registry.register(NetInfoWidgetFactory);
        registry.register(NetSpeedWidgetFactory);
        registry.register(VolumeWidgetFactory);
        registry.register(WlanWidgetFactory);

        info!(
            widget_types = ?registry.factories.keys().collect::<Vec<_>>(),
            "Widget registry initialized with built-in widgets"
        );

        registry
    }

    /// Register a widget factory
    pub fn register<F: DynWidgetFactory + 'static>(&mut self, factory: F) {
        let widget_type = factory.widget_type();
        debug!(widget_type = %widget_type, "Registering widget factory");
        self.factories.insert(widget_type, Arc::new(factory));
    }

    /// Check if a widget type is registered
    pub fn has_widget(&self, widget_type: &str) -> bool {
        self.factories.contains_key(widget_type)
    }

    /// Get all registered widget types
    pub fn widget_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.factories.keys().copied().collect();
        types.sort_unstable();
        types
    }

    fn factory(&self, widget_type: &str) -> Result<&Arc<dyn DynWidgetFactory>> {
        self.factories.get(widget_type).with_context(|| {
            format!(
                "Unknown widget type: '{}'. Available types: {:?}",
                widget_type,
                self.widget_types()
            )
        })
    }

    /// Validate configuration without creating a widget
    pub fn validate(&self, widget_type: &str, config: &toml::Table) -> Result<()> {
        self.factory(widget_type)?
            .validate_config(config)
            .with_context(|| format!("Invalid configuration for widget type '{}'", widget_type))
    }

    /// Create a widget from configuration
    pub fn create(
        &self,
        widget_type: &str,
        config: &toml::Table,
        ctx: &BuildContext,
    ) -> Result<Box<dyn Widget>> {
        let factory = self.factory(widget_type)?;

        // Validate configuration first
        factory
            .validate_config(config)
            .with_context(|| format!("Invalid configuration for widget type '{}'", widget_type))?;

        factory
            .create(config, ctx)
            .with_context(|| format!("Failed to create widget of type '{}'", widget_type))
    }

    /// Get default configuration for a widget type
    pub fn default_config(&self, widget_type: &str) -> Result<toml::Table> {
        Ok(self.factory(widget_type)?.default_config())
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ============================================================================
// Widget Instance Configuration
// ============================================================================

/// Configuration for a single widget instance
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WidgetInstance {
    /// Widget type identifier (e.g., "clock", "battery")
    #[serde(rename = "type")]
    pub widget_type: String,

    /// Whether this widget is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Optional unique identifier for this instance
    #[serde(default)]
    pub id: Option<String>,

    /// Widget-specific configuration
    #[serde(default)]
    pub config: toml::Table,
}

fn default_true() -> bool {
    true
}

impl WidgetInstance {
    /// Create a new widget instance configuration
    pub fn new(widget_type: &str) -> Self {
        Self {
            widget_type: widget_type.to_string(),
            enabled: true,
            id: None,
            config: toml::Table::new(),
        }
    }

    /// Create with specific configuration
    pub fn with_config(widget_type: &str, config: toml::Table) -> Self {
        Self {
            config,
            ..Self::new(widget_type)
        }
    }

    /// Get a unique identifier for this instance (used to route clicks)
    pub fn instance_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.widget_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_builtins() {
        let registry = WidgetRegistry::with_builtins();
        for widget_type in [
            "battery", "clock", "github", "memory", "netinfo", "netspeed", "volume", "wlan",
        ] {
            assert!(registry.has_widget(widget_type), "{}", widget_type);
        }
        assert!(!registry.has_widget("weather"));
    }

    #[test]
    fn test_create_clock_widget() {
        let registry = WidgetRegistry::with_builtins();
        let config = registry.default_config("clock").unwrap();
        let widget = registry
            .create("clock", &config, &BuildContext::default())
            .unwrap();
        assert_eq!(widget.info().id, "clock");
    }

    #[test]
    fn test_create_github_without_access_is_hidden() {
        let registry = WidgetRegistry::with_builtins();
        let mut widget = registry
            .create("github", &toml::Table::new(), &BuildContext::default())
            .unwrap();
        widget.update();
        assert!(widget.output().is_none());
    }

    #[test]
    fn test_invalid_widget_type() {
        let registry = WidgetRegistry::with_builtins();
        let result = registry.create("invalid_type", &toml::Table::new(), &BuildContext::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_widget_types_sorted() {
        let registry = WidgetRegistry::with_builtins();
        let types = registry.widget_types();
        assert_eq!(types.first(), Some(&"battery"));
        assert_eq!(types.last(), Some(&"wlan"));
    }

    #[test]
    fn test_widget_instance() {
        let instance = WidgetInstance::new("clock");
        assert_eq!(instance.widget_type, "clock");
        assert!(instance.enabled);
        assert_eq!(instance.instance_id(), "clock");

        let named = WidgetInstance {
            id: Some("work-clock".to_string()),
            ..WidgetInstance::new("clock")
        };
        assert_eq!(named.instance_id(), "work-clock");
    }

    #[test]
    fn test_interval_validation() {
        let mut config = toml::Table::new();
        assert!(validate_interval(&config).is_ok());

        config.insert("update_interval".to_string(), toml::Value::Integer(0));
        assert!(validate_interval(&config).is_err());

        config.insert(
            "update_interval".to_string(),
            toml::Value::String("fast".to_string()),
        );
        assert!(validate_interval(&config).is_err());
    }
}
