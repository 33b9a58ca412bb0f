//! Network info widget: interface name and address
//!
//! Hidden while the wlan widget shows a connected network.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::gate::LinkGate;
use super::registry::{BuildContext, DynWidgetFactory};
use super::traits::{Widget, WidgetInfo};
use crate::net;
use crate::protocol::Output;
use crate::theme::Palette;

/// Primary interface and its addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetState {
    pub name: String,
    pub ips: Vec<IpAddr>,
}

pub fn format_netinfo(state: &NetState, palette: &Palette) -> Output {
    match state.ips.first() {
        None => Output::text("No network").color(palette.bad),
        Some(ip) => Output::text(format!("{}: {}", state.name, ip)),
    }
}

pub struct NetInfoWidget {
    sys_class_net: PathBuf,
    interface: Option<String>,
    state: NetState,
    gate: LinkGate,
    palette: Palette,
    update_interval: Duration,
}

impl NetInfoWidget {
    /// Watch `interface`, or whichever interface is up when `None`
    pub fn new(
        sys_class_net: PathBuf,
        interface: Option<String>,
        gate: LinkGate,
        palette: Palette,
        update_interval: u64,
    ) -> Self {
        Self {
            sys_class_net,
            interface,
            state: NetState::default(),
            gate,
            palette,
            update_interval: Duration::from_secs(update_interval),
        }
    }

    pub fn set_state(&mut self, state: NetState) {
        self.state = state;
    }
}

impl Widget for NetInfoWidget {
    fn info(&self) -> WidgetInfo {
        WidgetInfo {
            id: "netinfo",
            name: "Network info",
        }
    }

    fn update(&mut self) {
        let name = match &self.interface {
            Some(name) => Some(name.clone()),
            None => {
                let links = net::list_links(&self.sys_class_net);
                net::default_link(&links)
                    .filter(|link| link.is_up())
                    .map(|link| link.name.clone())
            }
        };

        let state = match name {
            Some(name) => NetState {
                ips: net::interface_addrs(&name),
                name,
            },
            None => NetState::default(),
        };

        debug!(interface = %state.name, ips = ?state.ips, "Network info updated");
        self.state = state;
    }

    fn output(&self) -> Option<Output> {
        if !self.gate.show_netinfo() {
            return None;
        }
        Some(format_netinfo(&self.state, &self.palette))
    }

    fn update_interval(&self) -> Duration {
        self.update_interval
    }
}

/// Factory for NetInfoWidget
pub struct NetInfoWidgetFactory;

impl DynWidgetFactory for NetInfoWidgetFactory {
    fn widget_type(&self) -> &'static str {
        "netinfo"
    }

    fn create(&self, config: &toml::Table, ctx: &BuildContext) -> anyhow::Result<Box<dyn Widget>> {
        let interface = config
            .get("interface")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let update_interval = config
            .get("update_interval")
            .and_then(|v| v.as_integer())
            .unwrap_or(5) as u64;

        debug!(interface = ?interface, update_interval = %update_interval, "Creating NetInfoWidget");

        Ok(Box::new(NetInfoWidget::new(
            ctx.sys_class_net.clone(),
            interface,
            ctx.gate.clone(),
            ctx.palette.clone(),
            update_interval,
        )))
    }

    fn default_config(&self) -> toml::Table {
        let mut config = toml::Table::new();
        config.insert("update_interval".to_string(), toml::Value::Integer(5));
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
