//! Widget trait system
//!
//! This module defines the core trait that all status widgets implement.
//! New widgets can be added by implementing it and registering a factory.

use std::time::Duration;

use calloop::channel::Channel;

use crate::error::GithubResult;
use crate::github::Notifications;
use crate::protocol::Output;

/// Mouse button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
    /// Other buttons
    Other(u8),
}

/// Scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Actions that a widget can request in response to interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetAction {
    /// Open a URL in the default browser
    OpenUrl(String),
    /// Re-poll the widget and redraw the bar
    Refresh,
}

/// A result pushed by a background service
#[derive(Debug)]
pub enum WidgetUpdate {
    Github(GithubResult<Notifications>),
}

/// Channel a widget hands over to the bar, which inserts it into the event
/// loop and feeds every message back through [`Widget::apply_update`]
pub enum UpdateSource {
    Github(Channel<GithubResult<Notifications>>),
}

/// Static description of a widget
#[derive(Debug, Clone)]
pub struct WidgetInfo {
    /// Unique identifier for this widget type
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
}

/// Core trait that all widgets must implement
pub trait Widget: Send {
    /// Get widget metadata
    fn info(&self) -> WidgetInfo;

    /// Poll the data source (called every [`Widget::update_interval`])
    fn update(&mut self);

    /// Blocks to show, or `None` to hide the widget
    fn output(&self) -> Option<Output>;

    /// How often this widget needs updates
    fn update_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    /// Get error message if widget is in error state
    fn error(&self) -> Option<&str> {
        None
    }

    /// Handle a mouse button click on one of the widget's blocks
    fn on_click(&mut self, _button: MouseButton) -> Option<WidgetAction> {
        None
    }

    /// Handle scroll wheel input over one of the widget's blocks
    fn on_scroll(&mut self, _direction: ScrollDirection) -> Option<WidgetAction> {
        None
    }

    /// Hand over the channel of a background service, at most once
    fn take_update_source(&mut self) -> Option<UpdateSource> {
        None
    }

    /// Apply a result received from the update source
    fn apply_update(&mut self, _update: WidgetUpdate) {}
}
