//! Shared flag letting the wlan widget suppress the generic netinfo widget

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether the netinfo widget should be shown.
///
/// The wlan widget publishes its connection state on every update; netinfo
/// reads the latest value whenever it renders, so the two may update in any
/// order.
#[derive(Debug, Clone)]
pub struct LinkGate {
    show_netinfo: Arc<AtomicBool>,
}

impl LinkGate {
    /// Netinfo is shown until the wlan widget says otherwise
    pub fn new() -> Self {
        Self {
            show_netinfo: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_show_netinfo(&self, show: bool) {
        self.show_netinfo.store(show, Ordering::Release);
    }

    pub fn show_netinfo(&self) -> bool {
        self.show_netinfo.load(Ordering::Acquire)
    }
}

impl Default for LinkGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let gate = LinkGate::new();
        let reader = gate.clone();
        assert!(reader.show_netinfo());

        gate.set_show_netinfo(false);
        assert!(!reader.show_netinfo());

        gate.set_show_netinfo(true);
        assert!(reader.show_netinfo());
    }
}
