//! Free memory widget
//!
//! Shows available memory using the sysinfo crate, turning red and then
//! urgent as it runs low.

use std::time::Duration;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

use super::registry::{BuildContext, DynWidgetFactory};
use super::traits::{Widget, WidgetInfo};
use crate::format::ibytesize;
use crate::protocol::Output;
use crate::theme::Palette;

const GIGABYTE: f64 = 1e9;

/// Memory reading in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemInfo {
    pub available: u64,
    pub total: u64,
}

impl MemInfo {
    /// Available memory in decimal gigabytes
    pub fn available_gigabytes(&self) -> f64 {
        self.available as f64 / GIGABYTE
    }
}

pub fn format_memory(info: &MemInfo, palette: &Palette) -> Output {
    let out = Output::text(ibytesize(info.available));

    let free_gigs = info.available_gigabytes();
    if free_gigs < 0.5 {
        out.urgent(true)
    } else if free_gigs < 2.0 {
        out.color(palette.red)
    } else {
        out
    }
}

pub struct MemoryWidget {
    system: System,
    info: MemInfo,
    palette: Palette,
    update_interval: Duration,
}

impl MemoryWidget {
    pub fn new(palette: Palette, update_interval: u64) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new().with_memory(MemoryRefreshKind::everything()),
        );

        let mut widget = Self {
            system,
            info: MemInfo {
                available: 0,
                total: 0,
            },
            palette,
            update_interval: Duration::from_secs(update_interval),
        };

        widget.update();

        widget
    }

    pub fn mem_info(&self) -> &MemInfo {
        &self.info
    }
}

impl Widget for MemoryWidget {
    fn info(&self) -> WidgetInfo {
        WidgetInfo {
            id: "memory",
            name: "Free memory",
        }
    }

    fn update(&mut self) {
        self.system.refresh_memory();

        self.info = MemInfo {
            available: self.system.available_memory(),
            total: self.system.total_memory(),
        };

        debug!(
            available = %ibytesize(self.info.available),
            total = %ibytesize(self.info.total),
            "Memory updated"
        );
    }

    fn output(&self) -> Option<Output> {
        Some(format_memory(&self.info, &self.palette))
    }

    fn update_interval(&self) -> Duration {
        self.update_interval
    }
}

/// Factory for MemoryWidget
pub struct MemoryWidgetFactory;

impl DynWidgetFactory for MemoryWidgetFactory {
    fn widget_type(&self) -> &'static str {
        "memory"
    }

    fn create(&self, config: &toml::Table, ctx: &BuildContext) -> anyhow::Result<Box<dyn Widget>> {
        let update_interval = config
            .get("update_interval")
            .and_then(|v| v.as_integer())
            .unwrap_or(3) as u64;

        debug!(update_interval = %update_interval, "Creating MemoryWidget");

        Ok(Box::new(MemoryWidget::new(
            ctx.palette.clone(),
            update_interval,
        )))
    }

    fn default_config(&self) -> toml::Table {
        let mut config = toml::Table::new();
        config.insert("update_interval".to_string(), toml::Value::Integer(3));
        config
    }

    fn validate_config(&self, config: &toml::Table) -> anyhow::Result<()> {
        super::registry::validate_interval(config)
    }
}
