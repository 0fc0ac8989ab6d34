//! The single HID connection slot and its state machine.
//!
//! ```text
//!   Idle ──begin_connect──► Connecting ──opened──► Connected
//!    ▲                          │                      │
//!    └──── open failed/closed ──┘◄──────── closed ─────┘
//! ```
//!
//! Only one session exists.  It is reset, never dropped, and a second
//! connect while the slot is taken is refused rather than queued.

use heapless::String;

use crate::config::{NAME_CAPACITY, NO_DEVICE_NAME, UNKNOWN_DEVICE_NAME};
use crate::error::Error;
use crate::hid_host::selector::DiscoveredDevice;
use crate::radio::{bounded_name, BdAddr, RadioStack};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// No device, no attempt in progress.
    Idle,
    /// Connect request issued for the bound address.
    Connecting,
    /// HID channel open, reports flowing.
    Connected,
}

/// Transitions the dispatcher needs to hear about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// `Connecting`/`Idle` → `Connected`.
    Opened,
    /// `Connected` → `Idle`.
    Closed,
    /// `Connecting` → `Idle` without ever opening.
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HidSession {
    state: SessionState,
    address: Option<BdAddr>,
    name: String<NAME_CAPACITY>,
    disconnect_requested: bool,
}

impl HidSession {
    fn unbound() -> Self {
        Self {
            state: SessionState::Idle,
            address: None,
            name: bounded_name(NO_DEVICE_NAME),
            disconnect_requested: false,
        }
    }

    fn bound_to(&self, address: &BdAddr) -> bool {
        self.address.as_ref() == Some(address)
    }
}

pub struct SessionManager {
    session: HidSession,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            session: HidSession::unbound(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn address(&self) -> Option<BdAddr> {
        self.session.address
    }

    /// Connected device name, or the "no device" sentinel.
    pub fn display_name(&self) -> &str {
        self.session.name.as_str()
    }

    pub fn is_active(&self) -> bool {
        self.session.state != SessionState::Idle
    }

    /// Input is only forwarded while the channel is open.
    pub fn accepts_input(&self, address: &BdAddr) -> bool {
        self.session.state == SessionState::Connected && self.session.bound_to(address)
    }

    fn reset(&mut self) {
        self.session = HidSession::unbound();
    }

    /// Bind the slot to `device` and ask the radio to connect.
    pub fn begin_connect<R: RadioStack>(
        &mut self,
        device: &DiscoveredDevice,
        radio: &mut R,
    ) -> Result<(), Error> {
        if self.is_active() {
            return Err(Error::AlreadyConnected);
        }

        self.session.state = SessionState::Connecting;
        self.session.address = Some(device.address);
        if !device.name.is_empty() {
            self.session.name = device.name.clone();
        }

        info!("Connecting to {} ({})", device.address, self.display_name());

        if let Err(e) = radio.connect(device.address) {
            warn!("Connect request for {} refused: {:?}", device.address, e);
            self.reset();
            return Err(Error::ConnectionRejected);
        }
        Ok(())
    }

    /// The radio reports an open HID channel.
    pub fn on_opened(&mut self, address: BdAddr, name: &str) -> Option<Transition> {
        match self.session.state {
            SessionState::Connecting if self.session.bound_to(&address) => {}
            SessionState::Idle => {
                info!("Accepting incoming connection from {}", address);
                self.session.address = Some(address);
            }
            _ => {
                debug!("Ignoring open from {}: {:?}", address, Error::AlreadyConnected);
                return None;
            }
        }

        self.session.state = SessionState::Connected;
        self.session.name = if name.is_empty() {
            bounded_name(UNKNOWN_DEVICE_NAME)
        } else {
            bounded_name(name)
        };
        info!("HID device connected: {}", self.display_name());
        Some(Transition::Opened)
    }

    /// The radio gave up on the connect attempt.
    pub fn on_open_failed(&mut self, address: BdAddr) -> Option<Transition> {
        if self.session.state != SessionState::Connecting || !self.session.bound_to(&address) {
            debug!("Ignoring open failure for {}", address);
            return None;
        }

        warn!(
            "Connection to {} failed: {:?}",
            address,
            Error::ConnectionRejected
        );
        self.reset();
        Some(Transition::Failed)
    }

    /// The radio reports the link is gone.
    pub fn on_closed(&mut self, address: BdAddr) -> Option<Transition> {
        if !self.session.bound_to(&address) {
            debug!("Ignoring close for unbound {}", address);
            return None;
        }

        match self.session.state {
            SessionState::Connecting => self.on_open_failed(address),
            SessionState::Connected => {
                info!("HID device disconnected: {}", self.display_name());
                self.reset();
                Some(Transition::Closed)
            }
            SessionState::Idle => None,
        }
    }

    /// Ask the radio to drop the link.  The state changes only when the
    /// close notification arrives.
    pub fn disconnect<R: RadioStack>(&mut self, radio: &mut R) -> Result<(), Error> {
        if !self.is_active() || self.session.disconnect_requested {
            return Ok(());
        }

        info!("Disconnecting {}", self.display_name());
        radio.disconnect()?;
        self.session.disconnect_requested = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::RadioError;

    const A: BdAddr = BdAddr::new([0, 0, 0, 0, 0, 0xA]);
    const B: BdAddr = BdAddr::new([0, 0, 0, 0, 0, 0xB]);

    #[derive(Default)]
    struct StubRadio {
        connects: usize,
        disconnects: usize,
        refuse_connect: bool,
    }

    impl RadioStack for StubRadio {
        fn start_discovery(&mut self) -> Result<(), RadioError> {
            Ok(())
        }
        fn stop_discovery(&mut self) -> Result<(), RadioError> {
            Ok(())
        }
        fn connect(&mut self, _address: BdAddr) -> Result<(), RadioError> {
            self.connects += 1;
            if self.refuse_connect {
                Err(RadioError::Rejected)
            } else {
                Ok(())
            }
        }
        fn disconnect(&mut self) -> Result<(), RadioError> {
            self.disconnects += 1;
            Ok(())
        }
    }

    fn candidate(address: BdAddr) -> DiscoveredDevice {
        DiscoveredDevice::new(address, bounded_name("Adv name"), -40, 0)
    }

    #[test]
    fn starts_idle_with_sentinel_name() {
        let session = SessionManager::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.display_name(), NO_DEVICE_NAME);
        assert!(session.address().is_none());
    }

    #[test]
    fn connect_then_open_then_close() {
        let mut session = SessionManager::new();
        let mut radio = StubRadio::default();

        session.begin_connect(&candidate(A), &mut radio).unwrap();
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(session.address(), Some(A));
        assert_eq!(radio.connects, 1);

        assert_eq!(session.on_opened(A, "Mouse A"), Some(Transition::Opened));
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.display_name(), "Mouse A");
        assert!(session.accepts_input(&A));

        assert_eq!(session.on_closed(A), Some(Transition::Closed));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.display_name(), NO_DEVICE_NAME);
    }

    #[test]
    fn second_connect_is_refused_while_active() {
        let mut session = SessionManager::new();
        let mut radio = StubRadio::default();

        session.begin_connect(&candidate(A), &mut radio).unwrap();
        assert_eq!(
            session.begin_connect(&candidate(B), &mut radio),
            Err(Error::AlreadyConnected)
        );
        assert_eq!(session.address(), Some(A));

        session.on_opened(A, "Mouse A");
        assert_eq!(
            session.begin_connect(&candidate(B), &mut radio),
            Err(Error::AlreadyConnected)
        );
        assert_eq!(radio.connects, 1);
    }

    #[test]
    fn refused_connect_request_returns_to_idle() {
        let mut session = SessionManager::new();
        let mut radio = StubRadio {
            refuse_connect: true,
            ..Default::default()
        };

        assert_eq!(
            session.begin_connect(&candidate(A), &mut radio),
            Err(Error::ConnectionRejected)
        );
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.display_name(), NO_DEVICE_NAME);
    }

    #[test]
    fn failed_attempt_clears_binding() {
        let mut session = SessionManager::new();
        let mut radio = StubRadio::default();

        session.begin_connect(&candidate(A), &mut radio).unwrap();
        assert_eq!(session.on_open_failed(A), Some(Transition::Failed));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.address().is_none());
    }

    #[test]
    fn close_while_connecting_counts_as_failure() {
        let mut session = SessionManager::new();
        let mut radio = StubRadio::default();

        session.begin_connect(&candidate(A), &mut radio).unwrap();
        assert_eq!(session.on_closed(A), Some(Transition::Failed));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn open_from_other_address_is_ignored_while_connecting() {
        let mut session = SessionManager::new();
        let mut radio = StubRadio::default();

        session.begin_connect(&candidate(A), &mut radio).unwrap();
        assert_eq!(session.on_opened(B, "Mouse B"), None);
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(session.address(), Some(A));
    }

    #[test]
    fn incoming_open_binds_idle_slot() {
        let mut session = SessionManager::new();

        assert_eq!(session.on_opened(B, ""), Some(Transition::Opened));
        assert_eq!(session.address(), Some(B));
        assert_eq!(session.display_name(), UNKNOWN_DEVICE_NAME);

        // Slot is now taken.
        assert_eq!(session.on_opened(A, "Mouse A"), None);
        assert_eq!(session.address(), Some(B));
    }

    #[test]
    fn close_for_other_address_is_ignored() {
        let mut session = SessionManager::new();
        session.on_opened(A, "Mouse A");

        assert_eq!(session.on_closed(B), None);
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut session = SessionManager::new();
        let mut radio = StubRadio::default();

        session.disconnect(&mut radio).unwrap();
        assert_eq!(radio.disconnects, 0);

        session.on_opened(A, "Mouse A");
        session.disconnect(&mut radio).unwrap();
        session.disconnect(&mut radio).unwrap();
        assert_eq!(radio.disconnects, 1);
        assert_eq!(session.state(), SessionState::Connected);

        session.on_closed(A);
        session.disconnect(&mut radio).unwrap();
        assert_eq!(radio.disconnects, 1);
    }

    #[test]
    fn input_only_accepted_when_connected_to_sender() {
        let mut session = SessionManager::new();
        let mut radio = StubRadio::default();

        session.begin_connect(&candidate(A), &mut radio).unwrap();
        assert!(!session.accepts_input(&A));

        session.on_opened(A, "Mouse A");
        assert!(session.accepts_input(&A));
        assert!(!session.accepts_input(&B));
    }
}
