//! HID host - picks the strongest mouse and keeps one HID link to it.
//!
//! Four pieces, leaves first:
//!
//! 1. **Discovery listener** - turns discovery notifications into window
//!    boundaries for the selector.
//! 2. **Candidate selector** - remembers every sighting in the current
//!    window and picks the best RSSI when it closes.
//! 3. **Session manager** - owns the single connection slot.
//! 4. **Event dispatcher** - tells the input consumer `Opened` / `Closed`
//!    / `Input`, nothing else.
//!
//! [`HidHost`] glues them together.  It is a plain `&mut self` state
//! machine: the caller feeds it every radio event and operator command
//! from one context, so there is nothing to lock inside.

pub mod discovery;
pub mod dispatcher;
pub mod selector;
pub mod session;


pub use dispatcher::{HidEvent, InputConsumer, InputReport};
pub use selector::DiscoveredDevice;
pub use session::SessionState;

use crate::error::Error;
use crate::radio::{DiscoveryState, RadioError, RadioEvent, RadioStack};
use crate::status::Status;
use discovery::{DiscoveryListener, DiscoveryNotification};
use dispatcher::EventDispatcher;
use selector::CandidateSelector;
use session::{SessionManager, Transition};

/// Operator commands (buttons, console, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    Scan,
    StopScan,
    Disconnect,
}

pub struct HidHost<'c, R: RadioStack> {
    radio: R,
    listener: DiscoveryListener,
    selector: CandidateSelector,
    session: SessionManager,
    dispatcher: EventDispatcher<'c>,
}

impl<'c, R: RadioStack> HidHost<'c, R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            listener: DiscoveryListener::new(),
            selector: CandidateSelector::new(),
            session: SessionManager::new(),
            dispatcher: EventDispatcher::new(),
        }
    }

    /// Install the input consumer, returning the one it replaces.
    pub fn register(
        &mut self,
        consumer: &'c mut dyn InputConsumer,
    ) -> Option<&'c mut dyn InputConsumer> {
        self.dispatcher.register(consumer)
    }

    pub fn unregister(&mut self) -> Option<&'c mut dyn InputConsumer> {
        self.dispatcher.unregister()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn selector(&self) -> &CandidateSelector {
        &self.selector
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_scanning(&self) -> bool {
        self.listener.is_scanning()
    }

    /// Snapshot for the status layer.
    pub fn status(&self) -> Status {
        Status::new(
            self.session.display_name(),
            self.listener.is_scanning(),
            self.session.state(),
        )
    }

    /// Start a discovery window.  No-op while one is already running.
    pub fn scan(&mut self) -> Result<(), Error> {
        match self.listener.request_start(&mut self.radio) {
            Ok(true) => {
                info!("Discovery requested");
                Ok(())
            }
            Ok(false) => {
                debug!("Scan already running");
                Ok(())
            }
            Err(RadioError::NotReady) => {
                error!("Radio not ready - cannot scan");
                Err(Error::DiscoveryUnavailable)
            }
            Err(e) => {
                warn!("Discovery request refused: {:?}", e);
                Err(Error::Radio(e))
            }
        }
    }

    /// Stop the running discovery window.  Safe to call at any time.
    pub fn stop_scan(&mut self) -> Result<(), Error> {
        self.listener.request_stop(&mut self.radio)?;
        Ok(())
    }

    /// Drop the current link, if any.  Safe to call at any time.
    pub fn disconnect(&mut self) -> Result<(), Error> {
        self.session.disconnect(&mut self.radio)
    }

    /// Run an operator command, logging instead of returning failures.
    pub fn command(&mut self, command: HostCommand) {
        let result = match command {
            HostCommand::Scan => self.scan(),
            HostCommand::StopScan => self.stop_scan(),
            HostCommand::Disconnect => self.disconnect(),
        };
        if let Err(e) = result {
            warn!("Command {:?} failed: {:?}", command, e);
        }
    }

    /// Feed one radio event.  Never fails: every problem ends in a state
    /// transition or a dropped event.
    pub fn handle(&mut self, event: RadioEvent, now_ms: u64) {
        match event {
            RadioEvent::DeviceFound {
                address,
                name,
                rssi,
            } => {
                let device = DiscoveredDevice::new(address, name, rssi, now_ms);
                self.listener
                    .handle(DiscoveryNotification::DeviceFound(device), &mut self.selector);
            }
            RadioEvent::DiscoveryStateChanged(state) => {
                let pick = self
                    .listener
                    .handle(DiscoveryNotification::StateChanged(state), &mut self.selector);
                match (state, pick) {
                    (_, Some(candidate)) => self.connect_to(candidate),
                    (DiscoveryState::Stopped, None) => info!("No mouse found"),
                    _ => {}
                }
            }
            RadioEvent::HidOpened { address, name } => {
                if let Some(Transition::Opened) = self.session.on_opened(address, name.as_str()) {
                    self.dispatcher.opened(self.session.display_name());
                }
            }
            RadioEvent::HidOpenFailed { address } => {
                self.session.on_open_failed(address);
            }
            RadioEvent::HidClosed { address } => {
                if let Some(Transition::Closed) = self.session.on_closed(address) {
                    self.dispatcher.closed();
                }
            }
            RadioEvent::HidInput {
                address,
                data,
                length,
            } => {
                if !self.session.accepts_input(&address) {
                    warn!("Input from {} outside the active session - dropped", address);
                    return;
                }
                match InputReport::new(&data, usize::from(length), now_ms) {
                    Ok(report) => self.dispatcher.input(report),
                    Err(e) => warn!(
                        "Dropping report ({} of {} bytes): {:?}",
                        length,
                        data.len(),
                        e
                    ),
                }
            }
        }
    }

    fn connect_to(&mut self, candidate: DiscoveredDevice) {
        match self.session.begin_connect(&candidate, &mut self.radio) {
            Ok(()) => {}
            // A late pick while a link already exists is expected.
            Err(Error::AlreadyConnected) => {
                debug!("Session busy - ignoring pick {}", candidate.address)
            }
            Err(e) => warn!("Cannot connect to {}: {:?}", candidate.address, e),
        }
    }
}
