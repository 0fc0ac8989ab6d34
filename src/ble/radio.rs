//! SoftDevice behind the [`RadioStack`] boundary.
//!
//! The host never touches the SoftDevice.  [`SoftdeviceRadio`] queues
//! requests for the radio task, and the radio task answers with
//! [`RadioEvent`]s on the event channel.  Both channels are bounded; a
//! full request queue is reported as [`RadioError::Busy`].

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
use nrf_softdevice::Softdevice;

use crate::ble::link::{self, Bonder};
use crate::ble::scanner::{self, Sightings};
use crate::config::{RADIO_EVENT_QUEUE, RADIO_REQUEST_QUEUE};
use crate::radio::{BdAddr, DiscoveryState, RadioError, RadioEvent, RadioStack};

/// Work queued for the radio task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioRequest {
    StartDiscovery,
    StopDiscovery,
    Connect(BdAddr),
    Disconnect,
}

pub type EventChannel = Channel<CriticalSectionRawMutex, RadioEvent, RADIO_EVENT_QUEUE>;
pub type EventSender = Sender<'static, CriticalSectionRawMutex, RadioEvent, RADIO_EVENT_QUEUE>;
pub type EventReceiver = Receiver<'static, CriticalSectionRawMutex, RadioEvent, RADIO_EVENT_QUEUE>;

pub type RequestChannel = Channel<CriticalSectionRawMutex, RadioRequest, RADIO_REQUEST_QUEUE>;
pub type RequestSender =
    Sender<'static, CriticalSectionRawMutex, RadioRequest, RADIO_REQUEST_QUEUE>;
pub type RequestReceiver =
    Receiver<'static, CriticalSectionRawMutex, RadioRequest, RADIO_REQUEST_QUEUE>;

static RADIO_READY: AtomicBool = AtomicBool::new(false);

/// Flag the SoftDevice as enabled.  Requests before this fail with
/// [`RadioError::NotReady`].
pub fn mark_ready() {
    RADIO_READY.store(true, Ordering::Release);
}

fn is_ready() -> bool {
    RADIO_READY.load(Ordering::Acquire)
}

/// Host-side handle to the radio task.
pub struct SoftdeviceRadio {
    requests: RequestSender,
}

impl SoftdeviceRadio {
    pub fn new(requests: RequestSender) -> Self {
        Self { requests }
    }

    fn submit(&self, request: RadioRequest) -> Result<(), RadioError> {
        if !is_ready() {
            return Err(RadioError::NotReady);
        }
        self.requests.try_send(request).map_err(|TrySendError::Full(r)| {
            warn!("Radio request queue full - {:?} refused", r);
            RadioError::Busy
        })
    }
}

impl RadioStack for SoftdeviceRadio {
    fn start_discovery(&mut self) -> Result<(), RadioError> {
        self.submit(RadioRequest::StartDiscovery)
    }

    fn stop_discovery(&mut self) -> Result<(), RadioError> {
        self.submit(RadioRequest::StopDiscovery)
    }

    fn connect(&mut self, address: BdAddr) -> Result<(), RadioError> {
        self.submit(RadioRequest::Connect(address))
    }

    fn disconnect(&mut self) -> Result<(), RadioError> {
        self.submit(RadioRequest::Disconnect)
    }
}

/// Serve radio requests forever.
///
/// One thing at a time: a discovery window or a link.  A request that
/// arrives mid-scan ends the window early; a discovery request during a
/// link is answered with an empty window.
pub async fn run(
    sd: &'static Softdevice,
    bonder: &'static Bonder,
    requests: RequestReceiver,
    events: EventSender,
) -> ! {
    let mut seen = Sightings::new();
    let mut pending: Option<RadioRequest> = None;

    loop {
        let request = match pending.take() {
            Some(r) => r,
            None => requests.receive().await,
        };
        debug!("Radio request: {:?}", request);

        match request {
            RadioRequest::StartDiscovery => {
                events
                    .send(RadioEvent::DiscoveryStateChanged(DiscoveryState::Started))
                    .await;

                let window = scanner::scan(sd, &events, &mut seen);
                match select(window, requests.receive()).await {
                    Either::First(Ok(())) => {}
                    Either::First(Err(e)) => warn!("Discovery failed: {:?}", e),
                    Either::Second(RadioRequest::StopDiscovery) => info!("Discovery stopped"),
                    Either::Second(other) => pending = Some(other),
                }

                events
                    .send(RadioEvent::DiscoveryStateChanged(DiscoveryState::Stopped))
                    .await;
            }
            RadioRequest::Connect(address) => {
                let linked = link::run(sd, bonder, address, &seen, &events);
                let serve = async {
                    loop {
                        match requests.receive().await {
                            RadioRequest::Disconnect => link::request_disconnect(),
                            RadioRequest::StartDiscovery => {
                                info!("Link active - discovery skipped");
                                events
                                    .send(RadioEvent::DiscoveryStateChanged(DiscoveryState::Started))
                                    .await;
                                events
                                    .send(RadioEvent::DiscoveryStateChanged(DiscoveryState::Stopped))
                                    .await;
                            }
                            RadioRequest::StopDiscovery => {}
                            RadioRequest::Connect(other) => {
                                warn!("Link active - connect to {} ignored", other)
                            }
                        }
                    }
                };
                select(linked, serve).await;
            }
            RadioRequest::StopDiscovery => debug!("No discovery running"),
            RadioRequest::Disconnect => debug!("No link to drop"),
        }
    }
}
