//! i3 status line library
//!
//! Widgets, the i3bar protocol, and the bar runtime that drives them. The
//! binary only wires configuration, secrets and logging around [`bar::Bar`].

pub mod bar;
pub mod config;
pub mod error;
pub mod format;
pub mod github;
pub mod input;
pub mod net;
pub mod protocol;
pub mod secret;
pub mod theme;
pub mod update;
pub mod widget;

// Re-export commonly used types
pub use bar::Bar;
pub use config::{Config, NetworkConfig};
pub use error::{BarError, ConfigError, GithubError, SecretError};
pub use input::{button_to_input, execute_action, Input};
pub use protocol::{ClickEvent, Header, Output, Segment, StatusWriter};
pub use secret::{bootstrap_key, EncryptionKey, KeyringStore, SecretStore, TokenStore};
pub use theme::{Color, Palette};
pub use update::UpdateScheduler;
pub use widget::{
    BuildContext, DynWidgetFactory, GithubAccess, LinkGate, MouseButton, ScrollDirection,
    UpdateSource, Widget, WidgetAction, WidgetInfo, WidgetInstance, WidgetRegistry, WidgetUpdate,
};
