//! Battery widget showing the combined charge of all system batteries
//!
//! This widget reads battery information from /sys/class/power_supply/:
//! - Energy (or charge) now and full, summed across batteries
//! - Charging/discharging status
//! - Hidden on systems without batteries

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use super::registry::{BuildContext, DynWidgetFactory};
use super::traits::{Widget, WidgetInfo};
use crate::protocol::Output;

/// Default sysfs power supply directory
pub const POWER_SUPPLY_PATH: &str = "/sys/class/power_supply";

const ICON_CHARGING: &str = "\u{f0e7}";
const ICON_EMPTY: &str = "\u{f244}";
const ICON_QUARTER: &str = "\u{f243}";
const ICON_HALF: &str = "\u{f242}";
const ICON_THREE_QUARTERS: &str = "\u{f241}";
const ICON_FULL: &str = "\u{f240}";

/// Battery charging status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryStatus {
    /// No battery present
    Disconnected,
    /// Battery is charging
    Charging,
    /// Battery is discharging
    Discharging,
    /// Battery is not charging (plugged in but not charging)
    NotCharging,
    /// Battery is full
    Full,
    /// Unknown status
    Unknown,
}

impl BatteryStatus {
    /// Parse status from the sysfs `status` file
    fn from_str(s: &str) -> Self {
        match s.trim() {
            "Charging" => Self::Charging,
            "Discharging" => Self::Discharging,
            "Full" => Self::Full,
            "Not charging" => Self::NotCharging,
            _ => Self::Unknown,
        }
    }

    /// Rank used to combine the statuses of several batteries
    fn priority(self) -> u8 {
        match self {
            Self::Charging => 5,
            Self::Discharging => 4,
            Self::NotCharging => 3,
            Self::Full => 2,
            Self::Unknown => 1,
            Self::Disconnected => 0,
        }
    }
}

/// Battery state, possibly aggregated over several batteries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryInfo {
    pub status: BatteryStatus,
    /// Current energy (µWh, µAh, or percent for capacity-only batteries)
    pub energy_now: u64,
    /// Energy when full, in the same unit as `energy_now`
    pub energy_full: u64,
}

impl BatteryInfo {
    pub fn disconnected() -> Self {
        Self {
            status: BatteryStatus::Disconnected,
            energy_now: 0,
            energy_full: 0,
        }
    }

    /// Remaining charge in percent (0-100)
    pub fn remaining_pct(&self) -> u8 {
        if self.energy_full == 0 {
            return 0;
        }
        (self.energy_now.saturating_mul(100) / self.energy_full).min(100) as u8
    }

    /// Combine several batteries into one
    pub fn combine(batteries: &[BatteryInfo]) -> Self {
        batteries.iter().fold(Self::disconnected(), |acc, b| Self {
            status: if b.status.priority() > acc.status.priority() {
                b.status
            } else {
                acc.status
            },
            energy_now: acc.energy_now + b.energy_now,
            energy_full: acc.energy_full + b.energy_full,
        })
    }
}

/// Icon for a discharging battery at `pct` percent
pub fn battery_icon(pct: u8) -> &'static str {
    match pct {
        p if p < 15 => ICON_EMPTY,
        p if p < 35 => ICON_QUARTER,
        p if p < 65 => ICON_HALF,
        p if p < 85 => ICON_THREE_QUARTERS,
        _ => ICON_FULL,
    }
}

/// Status text for a battery, `None` when there is nothing to show
pub fn format_battery(info: &BatteryInfo) -> Option<Output> {
    if matches!(
        info.status,
        BatteryStatus::Disconnected | BatteryStatus::Unknown
    ) {
        return None;
    }

    let pct = info.remaining_pct();
    let icon = if info.status == BatteryStatus::Charging {
        ICON_CHARGING
    } else {
        battery_icon(pct)
    };

    Some(Output::text(format!("{} {:2}%", icon, pct)))
}

/// Battery widget displaying the combined battery status
pub struct BatteryWidget {
    power_supply: PathBuf,
    info: BatteryInfo,
    update_interval: Duration,
    error_message: Option<String>,
}

impl BatteryWidget {
    pub fn new(power_supply: impl Into<PathBuf>, update_interval: u64) -> Self {
        let mut widget = Self {
            power_supply: power_supply.into(),
            info: BatteryInfo::disconnected(),
            update_interval: Duration::from_secs(update_interval),
            error_message: None,
        };

        // Initial update
        widget.update();

        widget
    }

    pub fn battery_info(&self) -> &BatteryInfo {
        &self.info
    }

    /// Directories of all system batteries (peripheral batteries excluded)
    fn find_batteries(power_supply: &Path) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(power_supply) else {
            debug!(path = ?power_supply, "Power supply directory not readable");
            return Vec::new();
        };

        let mut batteries: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                let kind = read_trimmed(path, "type");
                let is_battery = match kind.as_deref() {
                    Some(kind) => kind == "Battery",
                    None => path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map_or(false, |n| n.starts_with("BAT")),
                };
                is_battery && read_trimmed(path, "scope").as_deref() != Some("Device")
            })
            .collect();

        batteries.sort();
        batteries
    }

    /// Read one battery from sysfs
    fn read_battery(path: &Path) -> Result<BatteryInfo, String> {
        let status = read_trimmed(path, "status")
            .map(|s| BatteryStatus::from_str(&s))
            .ok_or_else(|| format!("Failed to read status of {}", path.display()))?;

        let pair = |now: &str, full: &str| Some((read_u64(path, now)?, read_u64(path, full)?));

        let (energy_now, energy_full) = pair("energy_now", "energy_full")
            .or_else(|| pair("charge_now", "charge_full"))
            .or_else(|| read_u64(path, "capacity").map(|c| (c.min(100), 100)))
            .ok_or_else(|| format!("No energy or capacity reading in {}", path.display()))?;

        Ok(BatteryInfo {
            status,
            energy_now,
            energy_full,
        })
    }
}

fn read_trimmed(base: &Path, file: &str) -> Option<String> {
    fs::read_to_string(base.join(file))
        .ok()
        .map(|s| s.trim().to_string())
}

fn read_u64(base: &Path, file: &str) -> Option<u64> {
    read_trimmed(base, file)?.parse().ok()
}

impl Widget for BatteryWidget {
    fn info(&self) -> WidgetInfo {
        WidgetInfo {
            id: "battery",
            name: "Battery",
        }
    }

    fn update(&mut self) {
        let mut readings = Vec::new();
        let mut last_error = None;

        for path in Self::find_batteries(&self.power_supply) {
            match Self::read_battery(&path) {
                Ok(info) => readings.push(info),
                Err(e) => {
                    warn!(error = %e, "Failed to read battery info");
                    last_error = Some(e);
                }
            }
        }

        // Keep old info if every battery failed to read
        if readings.is_empty() && last_error.is_some() {
            self.error_message = last_error;
            return;
        }

        self.info = BatteryInfo::combine(&readings);
        self.error_message = last_error;

        debug!(
            percentage = %self.info.remaining_pct(),
            status = ?self.info.status,
            batteries = readings.len(),
            "Battery info updated"
        );
    }

    fn output(&self) -> Option<Output> {
        format_battery(&self.info)
    }

    fn update_interval(&self) -> Duration {
        self.update_interval
    }

    fn error(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

impl Default for BatteryWidget {
    fn default() -> Self {
        Self::new(POWER_SUPPLY_PATH, 5)
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Factory for BatteryWidget
pub struct BatteryWidgetFactory;

impl DynWidgetFactory for BatteryWidgetFactory {
    fn widget_type(&self) -> &'static str {
        "battery"
    }

    fn create(&self, config: &toml::Table, _ctx: &BuildContext) -> anyhow::Result<Box<dyn Widget>> {
        let power_supply = config
            .get("power_supply_path")
            .and_then(|v| v.as_str())
            .unwrap_or(POWER_SUPPLY_PATH);

        let update_interval = config
            .get("update_interval")
            .and_then(|v| v.as_integer())
            .unwrap_or(5) as u64;

        debug!(
            power_supply = %power_supply,
            update_interval = %update_interval,
            "Creating BatteryWidget"
        );

        Ok(Box::new(BatteryWidget::new(power_supply, update_interval)))
    }

    fn default_config(&self) -> toml::Table {
        let mut config = toml::Table::new();
        config.insert("update_interval".to_string(), toml::Value::Integer(5));
        config
    }

    fn validate_config(&self, config: &toml::Table) -> anyhow::Result<()> {
        if let Some(path) = config.get("power_supply_path") {
            path.as_str()
                .ok_or_else(|| anyhow::anyhow!("'power_supply_path' must be a string"))?;
        }
        super::registry::validate_interval(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn discharging(pct: u64) -> BatteryInfo {
        BatteryInfo {
            status: BatteryStatus::Discharging,
            energy_now: pct,
            energy_full: 100,
        }
    }

    fn text(output: Option<Output>) -> String {
        output.unwrap().segments()[0].full_text.clone()
    }

    fn fake_battery(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), format!("{}\n", content)).unwrap();
        }
    }

    #[test]
    fn test_battery_status_parsing() {
        assert_eq!(BatteryStatus::from_str("Charging"), BatteryStatus::Charging);
        assert_eq!(
            BatteryStatus::from_str("Discharging\n"),
            BatteryStatus::Discharging
        );
        assert_eq!(BatteryStatus::from_str("Full"), BatteryStatus::Full);
        assert_eq!(
            BatteryStatus::from_str("Not charging"),
            BatteryStatus::NotCharging
        );
        assert_eq!(BatteryStatus::from_str("Bogus"), BatteryStatus::Unknown);
    }

    #[test]
    fn test_icon_boundaries() {
        assert_eq!(battery_icon(0), ICON_EMPTY);
        assert_eq!(battery_icon(14), ICON_EMPTY);
        assert_eq!(battery_icon(15), ICON_QUARTER);
        assert_eq!(battery_icon(34), ICON_QUARTER);
        assert_eq!(battery_icon(35), ICON_HALF);
        assert_eq!(battery_icon(64), ICON_HALF);
        assert_eq!(battery_icon(65), ICON_THREE_QUARTERS);
        assert_eq!(battery_icon(84), ICON_THREE_QUARTERS);
        assert_eq!(battery_icon(85), ICON_FULL);
        assert_eq!(battery_icon(100), ICON_FULL);
    }

    #[test]
    fn test_format_discharging() {
        assert_eq!(text(format_battery(&discharging(50))), format!("{} 50%", ICON_HALF));
        assert_eq!(text(format_battery(&discharging(7))), format!("{}  7%", ICON_EMPTY));
    }

    #[test]
    fn test_format_charging_uses_bolt() {
        let info = BatteryInfo {
            status: BatteryStatus::Charging,
            energy_now: 10,
            energy_full: 100,
        };
        assert_eq!(text(format_battery(&info)), format!("{} 10%", ICON_CHARGING));
    }

    #[test]
    fn test_hidden_when_disconnected_or_unknown() {
        assert!(format_battery(&BatteryInfo::disconnected()).is_none());
        let unknown = BatteryInfo {
            status: BatteryStatus::Unknown,
            ..discharging(50)
        };
        assert!(format_battery(&unknown).is_none());
    }

    #[test]
    fn test_remaining_pct_is_clamped() {
        let overfull = BatteryInfo {
            status: BatteryStatus::Full,
            energy_now: 120,
            energy_full: 100,
        };
        assert_eq!(overfull.remaining_pct(), 100);
        assert_eq!(BatteryInfo::disconnected().remaining_pct(), 0);
    }

    #[test]
    fn test_combine_batteries() {
        let a = BatteryInfo {
            status: BatteryStatus::Full,
            energy_now: 50_000_000,
            energy_full: 50_000_000,
        };
        let b = BatteryInfo {
            status: BatteryStatus::Discharging,
            energy_now: 0,
            energy_full: 50_000_000,
        };
        let combined = BatteryInfo::combine(&[a, b]);
        assert_eq!(combined.status, BatteryStatus::Discharging);
        assert_eq!(combined.remaining_pct(), 50);

        assert_eq!(BatteryInfo::combine(&[]).status, BatteryStatus::Disconnected);
    }

    #[test]
    fn test_reads_sysfs() {
        let root = TempDir::new().unwrap();
        fake_battery(
            root.path(),
            "BAT0",
            &[
                ("type", "Battery"),
                ("status", "Discharging"),
                ("energy_now", "30000000"),
                ("energy_full", "40000000"),
            ],
        );
        fake_battery(
            root.path(),
            "BAT1",
            &[("status", "Charging"), ("charge_now", "1000"), ("charge_full", "4000")],
        );
        fake_battery(root.path(), "AC", &[("type", "Mains"), ("online", "1")]);
        fake_battery(
            root.path(),
            "hidpp_battery_0",
            &[("type", "Battery"), ("scope", "Device"), ("status", "Discharging"), ("capacity", "5")],
        );

        let widget = BatteryWidget::new(root.path(), 5);
        let info = widget.battery_info();
        assert_eq!(info.status, BatteryStatus::Charging);
        assert_eq!(info.energy_now, 30_001_000);
        assert!(widget.error().is_none());
    }

    #[test]
    fn test_capacity_only_battery() {
        let root = TempDir::new().unwrap();
        fake_battery(
            root.path(),
            "BAT0",
            &[("type", "Battery"), ("status", "Discharging"), ("capacity", "42")],
        );

        let widget = BatteryWidget::new(root.path(), 5);
        assert_eq!(widget.battery_info().remaining_pct(), 42);
    }

    #[test]
    fn test_no_battery_hides_widget() {
        let widget = BatteryWidget::new("/non/existent/path", 5);
        assert_eq!(widget.battery_info().status, BatteryStatus::Disconnected);
        assert!(widget.output().is_none());
    }

    #[test]
    fn test_factory_validation() {
        let factory = BatteryWidgetFactory;
        assert!(factory.validate_config(&factory.default_config()).is_ok());

        let mut invalid = toml::Table::new();
        invalid.insert("update_interval".to_string(), toml::Value::Integer(0));
        assert!(factory.validate_config(&invalid).is_err());
    }
}
