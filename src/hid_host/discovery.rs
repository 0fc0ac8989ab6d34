//! Discovery listener - forwards sightings and marks window boundaries.
//!
//! No filtering happens here.  `Started` opens a fresh window,
//! `Stopped` closes it and hands the pick back to the caller.

use crate::hid_host::selector::{CandidateSelector, DiscoveredDevice};
use crate::radio::{DiscoveryState, RadioError, RadioStack};

/// Discovery notifications, already split out of [`crate::radio::RadioEvent`].
#[derive(Clone, Debug, PartialEq)]
pub enum DiscoveryNotification {
    DeviceFound(DiscoveredDevice),
    StateChanged(DiscoveryState),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiscoveryListener {
    scanning: bool,
    /// Discovery asked for, `Started` not seen yet.
    start_requested: bool,
    stop_requested: bool,
}

impl DiscoveryListener {
    pub const fn new() -> Self {
        Self {
            scanning: false,
            start_requested: false,
            stop_requested: false,
        }
    }

    /// Read by the status layer.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Feed one notification.  Returns the selected candidate when a
    /// window closes with at least one device in it.
    pub fn handle(
        &mut self,
        notification: DiscoveryNotification,
        selector: &mut CandidateSelector,
    ) -> Option<DiscoveredDevice> {
        match notification {
            DiscoveryNotification::DeviceFound(device) => {
                selector.record(device);
                None
            }
            DiscoveryNotification::StateChanged(DiscoveryState::Started) => {
                info!("Discovery started");
                self.scanning = true;
                self.start_requested = false;
                self.stop_requested = false;
                selector.open();
                None
            }
            DiscoveryNotification::StateChanged(DiscoveryState::Stopped) => {
                info!("Discovery stopped");
                self.scanning = false;
                self.start_requested = false;
                self.stop_requested = false;
                selector.close()
            }
        }
    }

    /// Ask the radio for a discovery window.  Returns `Ok(false)` when a
    /// window is already running or requested; a second request would
    /// end the first window early.
    pub fn request_start<R: RadioStack>(&mut self, radio: &mut R) -> Result<bool, RadioError> {
        if self.scanning || self.start_requested {
            return Ok(false);
        }
        radio.start_discovery()?;
        self.start_requested = true;
        Ok(true)
    }

    /// Ask the radio to stop scanning.  Does nothing when no scan is
    /// running or a stop is already on its way.
    pub fn request_stop<R: RadioStack>(&mut self, radio: &mut R) -> Result<(), RadioError> {
        if !self.scanning || self.stop_requested {
            return Ok(());
        }
        radio.stop_discovery()?;
        self.stop_requested = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::BdAddr;
    use heapless::String;

    #[derive(Default)]
    struct CountingRadio {
        starts: usize,
        stops: usize,
        refuse: bool,
    }

    impl RadioStack for CountingRadio {
        fn start_discovery(&mut self) -> Result<(), RadioError> {
            if self.refuse {
                return Err(RadioError::Busy);
            }
            self.starts += 1;
            Ok(())
        }
        fn stop_discovery(&mut self) -> Result<(), RadioError> {
            self.stops += 1;
            Ok(())
        }
        fn connect(&mut self, _address: BdAddr) -> Result<(), RadioError> {
            Ok(())
        }
        fn disconnect(&mut self) -> Result<(), RadioError> {
            Ok(())
        }
    }

    fn found(last: u8, rssi: i8) -> DiscoveryNotification {
        DiscoveryNotification::DeviceFound(DiscoveredDevice::new(
            BdAddr::new([0, 0, 0, 0, 0, last]),
            String::new(),
            rssi,
            0,
        ))
    }

    #[test]
    fn started_and_stopped_flip_scanning_flag() {
        let mut listener = DiscoveryListener::new();
        let mut selector = CandidateSelector::new();

        listener.handle(
            DiscoveryNotification::StateChanged(DiscoveryState::Started),
            &mut selector,
        );
        assert!(listener.is_scanning());

        listener.handle(found(1, -40), &mut selector);
        let pick = listener.handle(
            DiscoveryNotification::StateChanged(DiscoveryState::Stopped),
            &mut selector,
        );
        assert!(!listener.is_scanning());
        assert_eq!(pick.unwrap().address, BdAddr::new([0, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn restart_discards_previous_sightings() {
        let mut listener = DiscoveryListener::new();
        let mut selector = CandidateSelector::new();
        let started = DiscoveryNotification::StateChanged(DiscoveryState::Started);

        listener.handle(started.clone(), &mut selector);
        listener.handle(found(1, -40), &mut selector);
        listener.handle(started, &mut selector);

        assert!(selector.is_empty());
    }

    #[test]
    fn stop_request_is_idempotent() {
        let mut listener = DiscoveryListener::new();
        let mut selector = CandidateSelector::new();
        let mut radio = CountingRadio::default();

        // Not scanning: nothing reaches the radio.
        listener.request_stop(&mut radio).unwrap();
        assert_eq!(radio.stops, 0);

        listener.handle(
            DiscoveryNotification::StateChanged(DiscoveryState::Started),
            &mut selector,
        );
        listener.request_stop(&mut radio).unwrap();
        listener.request_stop(&mut radio).unwrap();
        assert_eq!(radio.stops, 1);

        listener.handle(
            DiscoveryNotification::StateChanged(DiscoveryState::Stopped),
            &mut selector,
        );
        listener.request_stop(&mut radio).unwrap();
        assert_eq!(radio.stops, 1);
    }

    #[test]
    fn start_request_waits_for_the_window_to_open_and_close() {
        let mut listener = DiscoveryListener::new();
        let mut selector = CandidateSelector::new();
        let mut radio = CountingRadio::default();

        assert!(listener.request_start(&mut radio).unwrap());
        // Still in flight: a second request must not reach the radio.
        assert!(!listener.request_start(&mut radio).unwrap());
        assert_eq!(radio.starts, 1);

        listener.handle(
            DiscoveryNotification::StateChanged(DiscoveryState::Started),
            &mut selector,
        );
        assert!(!listener.request_start(&mut radio).unwrap());

        listener.handle(
            DiscoveryNotification::StateChanged(DiscoveryState::Stopped),
            &mut selector,
        );
        assert!(listener.request_start(&mut radio).unwrap());
        assert_eq!(radio.starts, 2);
    }

    #[test]
    fn refused_start_can_be_retried() {
        let mut listener = DiscoveryListener::new();
        let mut radio = CountingRadio {
            refuse: true,
            ..Default::default()
        };

        assert_eq!(listener.request_start(&mut radio), Err(RadioError::Busy));
        radio.refuse = false;
        assert!(listener.request_start(&mut radio).unwrap());
        assert_eq!(radio.starts, 1);
    }
}
