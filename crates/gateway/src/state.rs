//! Shared application state for the gateway

use huddle_realtime::{Hub, UserChannels};

#[derive(Clone)]
pub struct GatewayState {
    pub hub: Hub,
    /// Live per-user notification streams.
    pub channels: UserChannels,
}

impl GatewayState {
    pub fn new(hub: Hub, channels: UserChannels) -> Self {
        Self { hub, channels }
    }
}
