//! Read-only status for the operator-facing layer.
//!
//! The host publishes a [`Status`] after every event; the LED and the
//! periodic report poll it.  Nothing here is pushed.

use heapless::String;

use crate::config::NAME_CAPACITY;
use crate::hid_host::session::SessionState;
use crate::radio::bounded_name;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// Connected mouse name, or the "no mouse" sentinel.
    pub device_name: String<NAME_CAPACITY>,
    pub scanning: bool,
    pub state: SessionState,
}

impl Status {
    pub fn new(device_name: &str, scanning: bool, state: SessionState) -> Self {
        Self {
            device_name: bounded_name(device_name),
            scanning,
            state,
        }
    }

    /// Status before the host has processed anything.
    pub fn initial() -> Self {
        Self::new(crate::config::NO_DEVICE_NAME, false, SessionState::Idle)
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }
}

/// What the status LED should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedPattern {
    /// No mouse - blink.
    Blink,
    /// Mouse connected - steady on.
    Solid,
}

/// Blink until a mouse is connected, then stay on.
pub fn led_pattern(status: &Status) -> LedPattern {
    if status.is_connected() {
        LedPattern::Solid
    } else {
        LedPattern::Blink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NO_DEVICE_NAME;

    #[test]
    fn initial_status_has_no_device() {
        let status = Status::initial();
        assert_eq!(status.device_name.as_str(), NO_DEVICE_NAME);
        assert!(!status.scanning);
        assert!(!status.is_connected());
    }

    #[test]
    fn led_blinks_until_connected() {
        let mut status = Status::initial();
        assert_eq!(led_pattern(&status), LedPattern::Blink);

        status.state = SessionState::Connecting;
        assert_eq!(led_pattern(&status), LedPattern::Blink);

        status.state = SessionState::Connected;
        assert_eq!(led_pattern(&status), LedPattern::Solid);
    }
}
