//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Settings applied to every match actor a registry spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Capacity of each actor's command channel. When it fills up,
    /// callers wait (bounded channel backpressure).
    pub channel_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { channel_size: 64 }
    }
}

impl RegistryConfig {
    pub fn with_channel_size(mut self, channel_size: usize) -> Self {
        // mpsc::channel panics on zero capacity.
        self.channel_size = channel_size.max(1);
        self
    }
}
