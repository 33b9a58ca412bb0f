//! Volume widget backed by an ALSA mixer control
//!
//! Left click toggles mute, scrolling changes the volume.

use std::time::Duration;

use alsa::mixer::{Mixer, Selem, SelemChannelId, SelemId};
use tracing::{debug, warn};

use super::registry::{BuildContext, DynWidgetFactory};
use super::traits::{MouseButton, ScrollDirection, Widget, WidgetAction, WidgetInfo};
use crate::protocol::Output;

const ICON_MUTED: &str = "\u{f6a9}";
const ICON_OFF: &str = "\u{f026}";
const ICON_DOWN: &str = "\u{f027}";
const ICON_UP: &str = "\u{f028}";

/// Mixer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    pub min: i64,
    pub max: i64,
    pub vol: i64,
    pub mute: bool,
}

impl Volume {
    /// Volume as a rounded percentage of the control's range
    pub fn pct(&self) -> u8 {
        if self.max <= self.min {
            return 0;
        }
        let pct = (self.vol - self.min) as f64 * 100.0 / (self.max - self.min) as f64;
        pct.round().clamp(0.0, 100.0) as u8
    }

    /// Raw value after moving by `pct` percent of the range, clamped to it
    pub fn stepped(&self, pct: i64) -> i64 {
        let step = (self.max - self.min) * pct / 100;
        (self.vol + step).clamp(self.min, self.max)
    }
}

/// Icon for an unmuted volume at `pct` percent
pub fn volume_icon(pct: u8) -> &'static str {
    if pct > 66 {
        ICON_UP
    } else if pct > 33 {
        ICON_DOWN
    } else {
        ICON_OFF
    }
}

pub fn format_volume(volume: &Volume) -> Output {
    if volume.mute {
        return Output::text(ICON_MUTED);
    }
    let pct = volume.pct();
    Output::text(format!("{} {:2}%", volume_icon(pct), pct))
}

/// Volume widget for one mixer control
pub struct VolumeWidget {
    card: String,
    control: String,
    scroll_step: i64,
    volume: Option<Volume>,
    update_interval: Duration,
    error_message: Option<String>,
}

impl VolumeWidget {
    pub fn new(card: &str, control: &str, scroll_step: i64, update_interval: u64) -> Self {
        let mut widget = Self {
            card: card.to_string(),
            control: control.to_string(),
            scroll_step,
            volume: None,
            update_interval: Duration::from_secs(update_interval),
            error_message: None,
        };

        widget.update();

        widget
    }

    /// Open the mixer and run `f` on the control.
    ///
    /// The mixer is reopened each time so the widget stays `Send` and always
    /// sees current values.
    fn with_selem<T>(&self, f: impl FnOnce(&Selem) -> Result<T, String>) -> Result<T, String> {
        let mixer = Mixer::new(&self.card, false)
            .map_err(|e| format!("Failed to open mixer '{}': {}", self.card, e))?;
        let selem = mixer
            .find_selem(&SelemId::new(&self.control, 0))
            .ok_or_else(|| format!("Mixer control '{}' not found", self.control))?;
        f(&selem)
    }

    fn read_volume(selem: &Selem) -> Result<Volume, String> {
        let (min, max) = selem.get_playback_volume_range();
        let vol = selem
            .get_playback_volume(SelemChannelId::FrontLeft)
            .map_err(|e| format!("Failed to read volume: {}", e))?;
        let mute = selem.has_playback_switch()
            && selem
                .get_playback_switch(SelemChannelId::FrontLeft)
                .map_err(|e| format!("Failed to read mute switch: {}", e))?
                == 0;

        Ok(Volume { min, max, vol, mute })
    }

    fn toggle_mute(&self) -> Result<(), String> {
        self.with_selem(|selem| {
            let volume = Self::read_volume(selem)?;
            selem
                .set_playback_switch_all(if volume.mute { 1 } else { 0 })
                .map_err(|e| format!("Failed to toggle mute: {}", e))
        })
    }

    fn step_volume(&self, pct: i64) -> Result<(), String> {
        self.with_selem(|selem| {
            let volume = Self::read_volume(selem)?;
            selem
                .set_playback_volume_all(volume.stepped(pct))
                .map_err(|e| format!("Failed to set volume: {}", e))
        })
    }

    fn apply(&mut self, result: Result<(), String>) -> Option<WidgetAction> {
        match result {
            Ok(()) => Some(WidgetAction::Refresh),
            Err(e) => {
                warn!(error = %e, control = %self.control, "Volume change failed");
                self.error_message = Some(e);
                None
            }
        }
    }
}

impl Widget for VolumeWidget {
    fn info(&self) -> WidgetInfo {
        WidgetInfo {
            id: "volume",
            name: "Volume",
        }
    }

    fn update(&mut self) {
        match self.with_selem(Self::read_volume) {
            Ok(volume) => {
                debug!(pct = volume.pct(), mute = volume.mute, "Volume updated");
                self.volume = Some(volume);
                self.error_message = None;
            }
            Err(e) => {
                // Only log transitions, the mixer is polled every second
                if self.error_message.as_deref() != Some(e.as_str()) {
                    warn!(error = %e, "Failed to read volume");
                }
                self.error_message = Some(e);
            }
        }
    }

    fn output(&self) -> Option<Output> {
        self.volume.as_ref().map(format_volume)
    }

    fn update_interval(&self) -> Duration {
        self.update_interval
    }

    fn error(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn on_click(&mut self, button: MouseButton) -> Option<WidgetAction> {
        if button != MouseButton::Left {
            return None;
        }
        let result = self.toggle_mute();
        self.apply(result)
    }

    fn on_scroll(&mut self, direction: ScrollDirection) -> Option<WidgetAction> {
        let step = match direction {
            ScrollDirection::Up => self.scroll_step,
            ScrollDirection::Down => -self.scroll_step,
            _ => return None,
        };
        let result = self.step_volume(step);
        self.apply(result)
    }
}

/// Factory for VolumeWidget
pub struct VolumeWidgetFactory;

impl DynWidgetFactory for VolumeWidgetFactory {
    fn widget_type(&self) -> &'static str {
        "volume"
    }

    fn create(&self, config: &toml::Table, _ctx: &BuildContext) -> anyhow::Result<Box<dyn Widget>> {
        let card = config
            .get("card")
            .and_then(|v| v.as_str())
            .unwrap_or("default");

        let control = config
            .get("control")
            .and_then(|v| v.as_str())
            .unwrap_or("Master");

        let scroll_step = config
            .get("scroll_step")
            .and_then(|v| v.as_integer())
            .unwrap_or(2);

        let update_interval = config
            .get("update_interval")
            .and_then(|v| v.as_integer())
            .unwrap_or(1) as u64;

        debug!(card = %card, control = %control, "Creating VolumeWidget");

        Ok(Box::new(VolumeWidget::new(
            card,
            control,
            scroll_step,
            update_interval,
        )))
    }

    fn default_config(&self) -> toml::Table {
        let mut config = toml::Table::new();
        config.insert("card".to_string(), toml::Value::String("default".to_string()));
        config.insert(
            "control".to_string(),
            toml::Value::String("Master".to_string()),
        );
        config.insert("scroll_step".to_string(), toml::Value::Integer(2));
        config.insert("update_interval".to_string(), toml::Value::Integer(1));
        config
    }

    fn validate_config(&self, config: &toml::Table) -> anyhow::Result<()> {
        for key in ["card", "control"] {
            if let Some(value) = config.get(key) {
                value
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("'{}' must be a string", key))?;
            }
        }

        if let Some(step) = config.get("scroll_step") {
            let step = step
                .as_integer()
                .ok_or_else(|| anyhow::anyhow!("'scroll_step' must be an integer"))?;
            if !(1..=100).contains(&step) {
                anyhow::bail!("'scroll_step' must be between 1 and 100, got {}", step);
            }
        }

        super::registry::validate_interval(config)
    }
}
