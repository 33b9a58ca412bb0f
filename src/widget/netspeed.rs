//! Network speed widget: receive and transmit rates of one interface

use std::time::{Duration, Instant};

use sysinfo::Networks;
use tracing::{debug, warn};

use super::registry::{BuildContext, DynWidgetFactory};
use super::traits::{Widget, WidgetInfo};
use crate::format::byterate;
use crate::protocol::Output;

/// Transfer rates in bytes per second
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Speeds {
    pub rx: f64,
    pub tx: f64,
}

impl Speeds {
    /// Rates from byte counts accumulated over `elapsed`
    pub fn from_counts(rx_bytes: u64, tx_bytes: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return Self::default();
        }
        Self {
            rx: rx_bytes as f64 / secs,
            tx: tx_bytes as f64 / secs,
        }
    }
}

pub fn format_speeds(speeds: &Speeds) -> Output {
    Output::text(format!("{}↓ {}↑", byterate(speeds.rx), byterate(speeds.tx)))
}

pub struct NetSpeedWidget {
    interface: Option<String>,
    networks: Networks,
    last_refresh: Instant,
    speeds: Option<Speeds>,
    update_interval: Duration,
    error_message: Option<String>,
}

impl NetSpeedWidget {
    pub fn new(interface: Option<String>, update_interval: u64) -> Self {
        if interface.is_none() {
            warn!("No network interface found, netspeed will stay hidden");
        }

        Self {
            interface,
            networks: Networks::new_with_refreshed_list(),
            last_refresh: Instant::now(),
            speeds: None,
            update_interval: Duration::from_secs(update_interval),
            error_message: None,
        }
    }
}

impl Widget for NetSpeedWidget {
    fn info(&self) -> WidgetInfo {
        WidgetInfo {
            id: "netspeed",
            name: "Network speed",
        }
    }

    fn update(&mut self) {
        let Some(interface) = self.interface.as_deref() else {
            return;
        };

        self.networks.refresh();
        let elapsed = self.last_refresh.elapsed();
        self.last_refresh = Instant::now();

        match self.networks.list().get(interface) {
            Some(data) => {
                let speeds = Speeds::from_counts(data.received(), data.transmitted(), elapsed);
                debug!(interface = %interface, rx = speeds.rx, tx = speeds.tx, "Network speed updated");
                self.speeds = Some(speeds);
                self.error_message = None;
            }
            None => {
                // The interface may appear later (USB tethering, VPN)
                self.networks.refresh_list();
                self.speeds = None;
                self.error_message = Some(format!("Interface '{}' not found", interface));
            }
        }
    }

    fn output(&self) -> Option<Output> {
        self.speeds.as_ref().map(format_speeds)
    }

    fn update_interval(&self) -> Duration {
        self.update_interval
    }

    fn error(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Factory for NetSpeedWidget
pub struct NetSpeedWidgetFactory;

impl DynWidgetFactory for NetSpeedWidgetFactory {
    fn widget_type(&self) -> &'static str {
        "netspeed"
    }

    fn create(&self, config: &toml::Table, ctx: &BuildContext) -> anyhow::Result<Box<dyn Widget>> {
        let interface = config
            .get("interface")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| ctx.interface.clone());

        let update_interval = config
            .get("update_interval")
            .and_then(|v| v.as_integer())
            .unwrap_or(1) as u64;

        debug!(interface = ?interface, update_interval = %update_interval, "Creating NetSpeedWidget");

        Ok(Box::new(NetSpeedWidget::new(interface, update_interval)))
    }

    fn default_config(&self) -> toml::Table {
        let mut config = toml::Table::new();
        config.insert("update_interval".to_string(), toml::Value::Integer(1));
        config
    }

    fn validate_config(&self, config: &toml::Table) -> anyhow::Result<()> {
        if let Some(interface) = config.get("interface") {
            interface
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("'interface' must be a string"))?;
        }
        super::registry::validate_interval(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speeds_from_counts() {
        let speeds = Speeds::from_counts(2000, 500, Duration::from_secs(2));
        assert_eq!(speeds.rx, 1000.0);
        assert_eq!(speeds.tx, 250.0);
    }

    #[test]
    fn test_zero_elapsed() {
        assert_eq!(Speeds::from_counts(10, 10, Duration::ZERO), Speeds::default());
    }

    #[test]
    fn test_format_speeds() {
        let out = format_speeds(&Speeds {
            rx: 1_200_000.0,
            tx: 512.0,
        });
        assert_eq!(out.segments()[0].full_text, "1.20 MB/s↓ 512 B/s↑");
    }

    #[test]
    fn test_missing_interface_is_hidden() {
        let mut widget = NetSpeedWidget::new(Some("no-such-if0".to_string()), 1);
        widget.update();
        assert!(widget.output().is_none());
        assert!(widget.error().is_some());

        let mut none = NetSpeedWidget::new(None, 1);
        none.update();
        assert!(none.output().is_none());
    }
}
