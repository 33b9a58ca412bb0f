//! Clock widget showing local date and time

use std::time::Duration;

use anyhow::bail;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone};
use tracing::debug;

use super::registry::{BuildContext, DynWidgetFactory};
use super::traits::{Widget, WidgetInfo};
use crate::protocol::Output;

/// `Mon 2 Jan 15.04`
pub const DEFAULT_FORMAT: &str = "%a %-d %b %H.%M";

pub struct ClockWidget {
    format: String,
    current_time: String,
    update_interval: Duration,
}

impl ClockWidget {
    /// `format` must have passed [`validate_format`]
    pub fn new(format: &str, update_interval: u64) -> Self {
        Self {
            format: format.to_string(),
            current_time: format_time(&Local::now(), format),
            update_interval: Duration::from_secs(update_interval),
        }
    }

    pub fn time_string(&self) -> &str {
        &self.current_time
    }
}

impl Default for ClockWidget {
    fn default() -> Self {
        Self::new(DEFAULT_FORMAT, 1)
    }
}

/// Format `now` with a strftime pattern
pub fn format_time<Tz: TimeZone>(now: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(format).to_string()
}

/// Reject patterns chrono cannot render (rendering them would panic)
pub fn validate_format(format: &str) -> anyhow::Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        bail!("'format' is not a valid strftime pattern: '{}'", format);
    }
    Ok(())
}

impl Widget for ClockWidget {
    fn info(&self) -> WidgetInfo {
        WidgetInfo {
            id: "clock",
            name: "Clock",
        }
    }

    fn update(&mut self) {
        self.current_time = format_time(&Local::now(), &self.format);
    }

    fn output(&self) -> Option<Output> {
        Some(Output::text(self.current_time.clone()))
    }

    fn update_interval(&self) -> Duration {
        self.update_interval
    }
}

/// Factory for ClockWidget
pub struct ClockWidgetFactory;

impl DynWidgetFactory for ClockWidgetFactory {
    fn widget_type(&self) -> &'static str {
        "clock"
    }

    fn create(&self, config: &toml::Table, _ctx: &BuildContext) -> anyhow::Result<Box<dyn Widget>> {
        let format = config
            .get("format")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_FORMAT);

        let update_interval = config
            .get("update_interval")
            .and_then(|v| v.as_integer())
            .unwrap_or(1) as u64;

        debug!(format = %format, update_interval = %update_interval, "Creating ClockWidget");

        Ok(Box::new(ClockWidget::new(format, update_interval)))
    }

    fn default_config(&self) -> toml::Table {
        let mut config = toml::Table::new();
        config.insert(
            "format".to_string(),
            toml::Value::String(DEFAULT_FORMAT.to_string()),
        );
        config.insert("update_interval".to_string(), toml::Value::Integer(1));
        config
    }

    fn validate_config(&self, config: &toml::Table) -> anyhow::Result<()> {
        if let Some(format) = config.get("format") {
            let format = format
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("'format' must be a string"))?;
            validate_format(format)?;
        }
        super::registry::validate_interval(config)
    }
}
