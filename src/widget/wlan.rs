//! Wireless widget: shows the SSID of the connected network
//!
//! Also tells the netinfo widget whether it should be shown: when wireless
//! is connected its SSID already says where we are.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::gate::LinkGate;
use super::registry::{BuildContext, DynWidgetFactory};
use super::traits::{Widget, WidgetInfo};
use crate::format::truncate;
use crate::net;
use crate::protocol::{Output, Segment};
use crate::theme::Palette;

const ICON_WIFI: &str = "\u{f1eb}";

/// Wireless connection state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WlanInfo {
    pub interface: Option<String>,
    pub ssid: Option<String>,
}

impl WlanInfo {
    pub fn connected(&self) -> bool {
        self.ssid.is_some()
    }
}

/// Accent-colored wifi icon glued to the (truncated) SSID
pub fn format_wlan(info: &WlanInfo, palette: &Palette, max_ssid_len: usize) -> Option<Output> {
    let ssid = info.ssid.as_deref()?;

    let icon = Segment::text(format!("{} ", ICON_WIFI)).color(palette.accent);
    let mut out = Output::from(icon);
    out.append(Segment::text(truncate(ssid, max_ssid_len)));
    Some(out.glue())
}

pub struct WlanWidget {
    sys_class_net: PathBuf,
    info: WlanInfo,
    gate: LinkGate,
    palette: Palette,
    max_ssid_len: usize,
    update_interval: Duration,
}

impl WlanWidget {
    pub fn new(
        sys_class_net: PathBuf,
        gate: LinkGate,
        palette: Palette,
        max_ssid_len: usize,
        update_interval: u64,
    ) -> Self {
        Self {
            sys_class_net,
            info: WlanInfo::default(),
            gate,
            palette,
            max_ssid_len,
            update_interval: Duration::from_secs(update_interval),
        }
    }

    /// Record a new reading and publish it to the netinfo gate
    pub fn set_info(&mut self, info: WlanInfo) {
        self.gate.set_show_netinfo(!info.connected());
        self.info = info;
    }
}

impl Widget for WlanWidget {
    fn info(&self) -> WidgetInfo {
        WidgetInfo {
            id: "wlan",
            name: "Wireless",
        }
    }

    fn update(&mut self) {
        let links = net::list_links(&self.sys_class_net);
        let info = match net::wireless_link(&links) {
            Some(link) => WlanInfo {
                interface: Some(link.name.clone()),
                ssid: if link.is_up() {
                    net::query_ssid(&link.name)
                } else {
                    None
                },
            },
            None => WlanInfo::default(),
        };

        debug!(interface = ?info.interface, ssid = ?info.ssid, "Wireless state updated");
        self.set_info(info);
    }

    fn output(&self) -> Option<Output> {
        format_wlan(&self.info, &self.palette, self.max_ssid_len)
    }

    fn update_interval(&self) -> Duration {
        self.update_interval
    }
}

/// Factory for WlanWidget
pub struct WlanWidgetFactory;

impl DynWidgetFactory for WlanWidgetFactory {
    fn widget_type(&self) -> &'static str {
        "wlan"
    }

    fn create(&self, config: &toml::Table, ctx: &BuildContext) -> anyhow::Result<Box<dyn Widget>> {
        let max_ssid_len = config
            .get("max_ssid_len")
            .and_then(|v| v.as_integer())
            .unwrap_or(24) as usize;

        let update_interval = config
            .get("update_interval")
            .and_then(|v| v.as_integer())
            .unwrap_or(5) as u64;

        debug!(max_ssid_len = %max_ssid_len, update_interval = %update_interval, "Creating WlanWidget");

        Ok(Box::new(WlanWidget::new(
            ctx.sys_class_net.clone(),
            ctx.gate.clone(),
            ctx.palette.clone(),
            max_ssid_len,
            update_interval,
        )))
    }

    fn default_config(&self) -> toml::Table {
        let mut config = toml::Table::new();
        config.insert("max_ssid_len".to_string(), toml::Value::Integer(24));
        config.insert("update_interval".to_string(), toml::Value::Integer(5));
        config
    }

    fn validate_config(&self, config: &toml::Table) -> anyhow::Result<()> {
        if let Some(len) = config.get("max_ssid_len") {
            let len = len
                .as_integer()
                .ok_or_else(|| anyhow::anyhow!("'max_ssid_len' must be an integer"))?;
            if len < 2 {
                anyhow::bail!("'max_ssid_len' must be at least 2, got {}", len);
            }
        }
        super::registry::validate_interval(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(ssid: &str) -> WlanInfo {
        WlanInfo {
            interface: Some("wlp2s0".to_string()),
            ssid: Some(ssid.to_string()),
        }
    }

    fn widget(gate: &LinkGate) -> WlanWidget {
        WlanWidget::new(
            PathBuf::from("/non/existent"),
            gate.clone(),
            Palette::default(),
            24,
            5,
        )
    }

    #[test]
    fn test_connected_output() {
        let palette = Palette::default();
        let out = format_wlan(&connected("Home"), &palette, 24).unwrap();
        let segments = out.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].color, Some(palette.accent));
        assert_eq!(segments[0].separator, Some(false));
        assert_eq!(segments[1].full_text, "Home");
        assert!(segments[1].color.is_none());
    }

    #[test]
    fn test_long_ssid_truncated() {
        let out = format_wlan(&connected("A Really Long Coffee Shop Network"), &Palette::default(), 10)
            .unwrap();
        assert_eq!(out.segments()[1].full_text, "A Really ⋯");
    }

    #[test]
    fn test_disconnected_is_hidden() {
        assert!(format_wlan(&WlanInfo::default(), &Palette::default(), 24).is_none());
    }

    #[test]
    fn test_publishes_to_gate() {
        let gate = LinkGate::new();
        let mut wlan = widget(&gate);

        wlan.set_info(connected("Home"));
        assert!(!gate.show_netinfo());

        wlan.set_info(WlanInfo::default());
        assert!(gate.show_netinfo());
    }

    #[test]
    fn test_no_wireless_interface() {
        let gate = LinkGate::new();
        gate.set_show_netinfo(false);
        let mut wlan = widget(&gate);

        wlan.update();
        assert!(wlan.output().is_none());
        assert!(gate.show_netinfo());
    }
}
