//! Runtime settings for the broker and the stage workers.

use std::time::Duration;

/// Broker redelivery settings.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// How long a received message stays locked to its consumer.
    pub lock_duration: Duration,
    /// Deliveries after which an unsettled message is dead-lettered.
    pub max_delivery_count: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            lock_duration: Duration::from_secs(30),
            max_delivery_count: 10,
        }
    }
}

/// Stage worker settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Messages a single stage handles concurrently.
    pub concurrency: usize,
    /// Back-off when the input queue is empty.
    pub poll_interval: Duration,
    /// Read-modify-write attempts before a stage gives up on a conflict.
    pub replace_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            poll_interval: Duration::from_millis(25),
            replace_attempts: 3,
        }
    }
}
