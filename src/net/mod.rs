//! Network interface discovery from sysfs, `getifaddrs` and `iw`

use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

/// Default location of the kernel's network interface directory
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// A network interface as seen in sysfs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    /// Contents of `operstate` ("up", "down", "dormant", "unknown", ...)
    pub operstate: String,
    /// Interface has a `wireless` or `phy80211` entry
    pub wireless: bool,
}

impl Link {
    pub fn is_up(&self) -> bool {
        self.operstate == "up"
    }

    pub fn is_loopback(&self) -> bool {
        self.name == "lo"
    }
}

/// Interfaces under `root`, sorted by name
pub fn list_links(root: &Path) -> Vec<Link> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, path = %root.display(), "Failed to list network interfaces");
            return Vec::new();
        }
    };

    let mut links: Vec<Link> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let path = entry.path();
            let operstate = fs::read_to_string(path.join("operstate"))
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            let wireless = path.join("wireless").exists() || path.join("phy80211").exists();
            Some(Link {
                name,
                operstate,
                wireless,
            })
        })
        .collect();

    links.sort_by(|a, b| a.name.cmp(&b.name));
    links
}

/// First non-loopback interface that is up, falling back to any non-loopback one
pub fn default_link(links: &[Link]) -> Option<&Link> {
    links
        .iter()
        .find(|l| !l.is_loopback() && l.is_up())
        .or_else(|| links.iter().find(|l| !l.is_loopback()))
}

/// First wireless interface
pub fn wireless_link(links: &[Link]) -> Option<&Link> {
    links.iter().find(|l| l.wireless)
}

/// Name of the interface to watch, unless `configured` overrides it
pub fn pick_interface(configured: Option<&str>, root: &Path) -> Option<String> {
    if let Some(name) = configured {
        return Some(name.to_string());
    }
    let links = list_links(root);
    let picked = default_link(&links).map(|l| l.name.clone());
    debug!(interface = ?picked, "Picked default network interface");
    picked
}

/// Addresses assigned to `interface`, IPv4 first
pub fn interface_addrs(interface: &str) -> Vec<IpAddr> {
    let mut addrs: Vec<IpAddr> = match get_if_addrs::get_if_addrs() {
        Ok(all) => all
            .into_iter()
            .filter(|iface| iface.name == interface)
            .map(|iface| iface.ip())
            .collect(),
        Err(e) => {
            warn!(error = %e, "Failed to read interface addresses");
            Vec::new()
        }
    };
    addrs.sort_by_key(|ip| ip.is_ipv6());
    addrs
}

/// SSID from the output of `iw dev <iface> link`, `None` when not connected
pub fn parse_iw_link(output: &str) -> Option<String> {
    if !output.trim_start().starts_with("Connected to") {
        return None;
    }

    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("SSID:"))
        .map(|ssid| ssid.trim().to_string())
        .next()
}

/// Ask `iw` which network `interface` is associated with
pub fn query_ssid(interface: &str) -> Option<String> {
    let output = match Command::new("iw").args(["dev", interface, "link"]).output() {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, interface = %interface, "Failed to run iw");
            return None;
        }
    };

    if !output.status.success() {
        debug!(status = %output.status, interface = %interface, "iw reported an error");
        return None;
    }

    parse_iw_link(&String::from_utf8_lossy(&output.stdout))
}

/// Path of the sysfs network directory
pub fn sys_class_net() -> PathBuf {
    PathBuf::from(SYS_CLASS_NET)
}
