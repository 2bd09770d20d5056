//! View layer tunables.

use std::time::Duration;

use crate::reports::DEFAULT_POLL_INTERVAL;

/// Behaviour of the interactive view.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Quiet period after the last keystroke before searching.
    pub debounce: Duration,

    /// Shortest input, in characters, that triggers a search.
    pub min_query_chars: usize,

    /// Period of the disruption and equipment report refresh.
    pub poll_interval: Duration,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_chars: 2,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ViewConfig {
    /// Set the debounce delay.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// Set the report refresh period.
    pub fn with_poll_interval(mut self, period: Duration) -> Self {
        self.poll_interval = period;
        self
    }
}
