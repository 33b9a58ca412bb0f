//! Update coordination for widgets with independent refresh intervals

use std::time::{Duration, Instant};

/// Tracks when each widget was last refreshed
pub struct UpdateScheduler {
    /// Refresh interval per widget, indexed like the widget list
    intervals: Vec<Duration>,

    /// Last refresh per widget
    last_update: Vec<Instant>,

    /// Widgets flagged for refresh regardless of their interval
    pending: Vec<bool>,
}

impl UpdateScheduler {
    pub fn new(intervals: Vec<Duration>) -> Self {
        let now = Instant::now();
        let count = intervals.len();
        Self {
            intervals,
            last_update: vec![now; count],
            pending: vec![false; count],
        }
    }

    /// Indices of the widgets that are due, marking them as refreshed now
    pub fn check_updates(&mut self) -> Vec<usize> {
        let now = Instant::now();
        let mut due = Vec::new();

        for i in 0..self.intervals.len() {
            if self.pending[i] || now.duration_since(self.last_update[i]) >= self.intervals[i] {
                due.push(i);
                self.last_update[i] = now;
                self.pending[i] = false;
            }
        }

        due
    }

    /// Force an immediate update of all widgets
    pub fn force_update_all(&mut self) {
        self.pending.iter_mut().for_each(|p| *p = true);
    }

    /// Force an immediate update of one widget
    pub fn force_update(&mut self, index: usize) {
        if let Some(p) = self.pending.get_mut(index) {
            *p = true;
        }
    }

    /// Get time until the next widget is due
    pub fn time_until_next_update(&self) -> Duration {
        if self.pending.iter().any(|p| *p) {
            return Duration::ZERO;
        }

        let now = Instant::now();
        self.intervals
            .iter()
            .zip(&self.last_update)
            .map(|(interval, last)| {
                interval
                    .checked_sub(now.duration_since(*last))
                    .unwrap_or(Duration::ZERO)
            })
            .min()
            .unwrap_or(Duration::from_secs(1))
    }
}
