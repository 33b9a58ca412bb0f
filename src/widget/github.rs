//! GitHub notifications widget
//!
//! Shows the unread notification count and, separately, the number of
//! mentions. Clicking opens the notifications page.

use std::time::Duration;

use calloop::channel::Channel;
use tracing::{debug, warn};

use super::registry::{BuildContext, DynWidgetFactory};
use super::traits::{MouseButton, UpdateSource, Widget, WidgetAction, WidgetInfo, WidgetUpdate};
use crate::error::GithubResult;
use crate::github::{GithubService, Notifications, NOTIFICATIONS_API, NOTIFICATIONS_PAGE};
use crate::protocol::{Output, Segment};

const ICON_GITHUB: &str = "\u{f09b}";
const ICON_BELL: &str = "\u{f0f3}";

/// `<github> N`, followed by `<bell> M` when there are mentions
pub fn format_notifications(n: &Notifications) -> Option<Output> {
    if n.total() == 0 {
        return None;
    }

    let mut out = Output::group([
        Segment::text(ICON_GITHUB),
        Segment::spacer(),
        Segment::text(n.total().to_string()),
    ]);

    let mentions = n.mentions();
    if mentions > 0 {
        out.append(Segment::spacer());
        out.append(Segment::text(ICON_BELL));
        out.append(Segment::text(mentions.to_string()).urgent(true));
    }

    Some(out.glue())
}

pub struct GithubWidget {
    source: Option<Channel<GithubResult<Notifications>>>,
    notifications: Notifications,
    error_message: Option<String>,
}

impl GithubWidget {
    /// Widget fed by a running [`GithubService`]; `None` leaves it permanently hidden
    pub fn new(source: Option<Channel<GithubResult<Notifications>>>) -> Self {
        Self {
            source,
            notifications: Notifications::default(),
            error_message: None,
        }
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    fn set_result(&mut self, result: GithubResult<Notifications>) {
        match result {
            Ok(notifications) => {
                self.notifications = notifications;
                self.error_message = None;
            }
            // Keep the last good counts
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }
}

impl Widget for GithubWidget {
    fn info(&self) -> WidgetInfo {
        WidgetInfo {
            id: "github",
            name: "GitHub notifications",
        }
    }

    // Results are pushed by the poller
    fn update(&mut self) {}

    fn output(&self) -> Option<Output> {
        format_notifications(&self.notifications)
    }

    fn update_interval(&self) -> Duration {
        Duration::from_secs(3600)
    }

    fn error(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn on_click(&mut self, button: MouseButton) -> Option<WidgetAction> {
        match button {
            MouseButton::Left => Some(WidgetAction::OpenUrl(NOTIFICATIONS_PAGE.to_string())),
            _ => None,
        }
    }

    fn take_update_source(&mut self) -> Option<UpdateSource> {
        self.source.take().map(UpdateSource::Github)
    }

    fn apply_update(&mut self, update: WidgetUpdate) {
        match update {
            WidgetUpdate::Github(result) => self.set_result(result),
        }
    }
}

/// Factory for GithubWidget
pub struct GithubWidgetFactory;

impl DynWidgetFactory for GithubWidgetFactory {
    fn widget_type(&self) -> &'static str {
        "github"
    }

    fn create(&self, config: &toml::Table, ctx: &BuildContext) -> anyhow::Result<Box<dyn Widget>> {
        let api_url = config
            .get("api_url")
            .and_then(|v| v.as_str())
            .unwrap_or(NOTIFICATIONS_API);

        let poll_interval = config
            .get("poll_interval")
            .and_then(|v| v.as_integer())
            .unwrap_or(60);
        let poll_interval = u64::try_from(poll_interval)
            .ok()
            .filter(|&secs| secs >= 1)
            .ok_or_else(|| anyhow::anyhow!("'poll_interval' must be at least 1 second"))?;

        let source = match &ctx.github {
            Some(access) => Some(GithubService::new().start_polling(
                access.token.clone(),
                api_url.to_string(),
                Duration::from_secs(poll_interval),
            )),
            None => {
                warn!("GitHub credentials or token missing, notifications disabled");
                None
            }
        };

        debug!(api_url = %api_url, poll_interval = %poll_interval, enabled = source.is_some(), "Creating GithubWidget");

        Ok(Box::new(GithubWidget::new(source)))
    }

    fn default_config(&self) -> toml::Table {
        let mut config = toml::Table::new();
        config.insert(
            "api_url".to_string(),
            toml::Value::String(NOTIFICATIONS_API.to_string()),
        );
        config.insert("poll_interval".to_string(), toml::Value::Integer(60));
        config
    }

    fn validate_config(&self, config: &toml::Table) -> anyhow::Result<()> {
        if let Some(url) = config.get("api_url") {
            let url = url
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("'api_url' must be a string"))?;
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!("'api_url' must be an http(s) URL, got '{}'", url);
            }
        }

        if let Some(interval) = config.get("poll_interval") {
            let interval = interval
                .as_integer()
                .ok_or_else(|| anyhow::anyhow!("'poll_interval' must be an integer"))?;
            if interval < 1 {
                anyhow::bail!("'poll_interval' must be at least 1 second");
            }
            if interval < 10 {
                warn!("GitHub poll interval ({} seconds) is very short, may exceed API rate limits", interval);
            }
        }

        Ok(())
    }
}
