// Status widgets and their registry

pub mod battery;
pub mod clock;
pub mod gate;
pub mod github;
pub mod memory;
pub mod netinfo;
pub mod netspeed;
pub mod registry;
pub mod traits;
pub mod volume;
pub mod wlan;

pub use battery::{BatteryInfo, BatteryStatus, BatteryWidget};
pub use clock::ClockWidget;
pub use gate::LinkGate;
pub use github::GithubWidget;
pub use memory::{MemInfo, MemoryWidget};
pub use netinfo::{NetInfoWidget, NetState};
pub use netspeed::{NetSpeedWidget, Speeds};
pub use registry::{BuildContext, DynWidgetFactory, GithubAccess, WidgetInstance, WidgetRegistry};
pub use traits::{
    MouseButton, ScrollDirection, UpdateSource, Widget, WidgetAction, WidgetInfo, WidgetUpdate,
};
pub use volume::{Volume, VolumeWidget};
pub use wlan::{WlanInfo, WlanWidget};
