//! The one BLE HID link.
//!
//! Connects to a single peripheral, secures the link (bonding keys are
//! kept in RAM only and forgotten at power-off), subscribes to HID
//! reports and reports the outcome to the host as radio events.

use core::cell::RefCell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{
    central, Address, Connection, EncryptError, EncryptionInfo, IdentityKey, MasterId, SecurityMode,
};
use nrf_softdevice::raw;
use nrf_softdevice::Softdevice;

use crate::ble::bonds::BondTable;
use crate::ble::hid_client;
use crate::ble::radio::EventSender;
use crate::ble::scanner::Sighting;
use crate::config;
use crate::radio::{BdAddr, RadioError, RadioEvent};

/// Bond slots kept in RAM.
const MAX_BONDS: usize = 4;

/// Raised by the radio task to abort the current attempt or drop the link.
static DISCONNECT: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Ask the running link (or connect attempt) to end.
pub fn request_disconnect() {
    DISCONNECT.signal(());
}

/// What the SoftDevice hands back after bonding, minus the master ID
/// it is looked up by.
#[derive(Clone, Copy)]
struct PeerKeys {
    key: EncryptionInfo,
    identity: IdentityKey,
}

/// Security handler for the central role: Just Works pairing, every
/// peer may bond.
///
/// Keys live in a [`BondTable`] in RAM, so a mouse bonded before the
/// last power cycle pairs again from scratch.  The SoftDevice only calls
/// in from the executor thread, which is what makes the `RefCell` sound.
pub struct Bonder {
    bonds: RefCell<BondTable<MasterId, PeerKeys, MAX_BONDS>>,
}

impl Bonder {
    pub fn new() -> Self {
        Self {
            bonds: RefCell::new(BondTable::new()),
        }
    }
}

impl Default for Bonder {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityHandler for Bonder {
    fn io_capabilities(&self) -> IoCapabilities {
        IoCapabilities::None
    }

    fn can_bond(&self, _conn: &Connection) -> bool {
        true
    }

    fn on_bonded(
        &self,
        conn: &Connection,
        master_id: MasterId,
        key: EncryptionInfo,
        identity: IdentityKey,
    ) {
        let peer = BdAddr::from_le_bytes(conn.peer_address().bytes());
        let evicted = self
            .bonds
            .borrow_mut()
            .store(master_id, PeerKeys { key, identity });
        if evicted {
            debug!("Bond table full - oldest bond forgotten");
        }
        info!("Bonded with {}", peer);
    }

    fn get_key(&self, _conn: &Connection, master_id: MasterId) -> Option<EncryptionInfo> {
        self.bonds.borrow().get(&master_id).map(|p| p.key)
    }

    fn get_peripheral_key(&self, conn: &Connection) -> Option<(MasterId, EncryptionInfo)> {
        let peer = conn.peer_address();
        self.bonds
            .borrow()
            .find(|p| p.identity.is_match(peer))
            .map(|(id, p)| (*id, p.key))
    }

    fn on_security_update(&self, _conn: &Connection, mode: SecurityMode) {
        debug!("Link security now {:?}", mode);
    }
}

async fn wait_for_secure_link(conn: &Connection) -> bool {
    for _ in 0..25 {
        match conn.security_mode() {
            SecurityMode::NoAccess | SecurityMode::Open => {
                Timer::after(Duration::from_millis(200)).await
            }
            _ => return true,
        }
    }
    false
}

/// SoftDevice address for `address`, using the type seen while scanning.
fn softdevice_address(address: BdAddr, seen: &[Sighting]) -> Address {
    let le = address.to_le_bytes();
    seen.iter()
        .find(|s| s.address.bytes() == le)
        .map(|s| s.address)
        .unwrap_or_else(|| Address::new(nrf_softdevice::ble::AddressType::RandomStatic, le))
}

async fn connect_secure(
    sd: &'static Softdevice,
    address: Address,
    bonder: &'static Bonder,
) -> Result<Connection, RadioError> {
    let whitelist = [&address];
    let conn_cfg = central::ConnectConfig {
        scan_config: central::ScanConfig {
            whitelist: Some(&whitelist),
            ..Default::default()
        },
        conn_params: raw::ble_gap_conn_params_t {
            min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
            max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
            slave_latency: config::BLE_SLAVE_LATENCY,
            conn_sup_timeout: config::BLE_SUP_TIMEOUT,
        },
        ..Default::default()
    };

    let conn = central::connect_with_security(sd, &conn_cfg, bonder)
        .await
        .map_err(|_| RadioError::Rejected)?;

    let secure_ok = match conn.encrypt() {
        Ok(()) => wait_for_secure_link(&conn).await,
        Err(EncryptError::PeerKeysNotFound) => {
            if conn.request_pairing().is_ok() {
                wait_for_secure_link(&conn).await
            } else {
                false
            }
        }
        Err(_) => false,
    };

    if !secure_ok {
        warn!("Failed to secure BLE link");
        let _ = conn.disconnect();
        return Err(RadioError::Rejected);
    }

    Ok(conn)
}

/// Connect to `address` and keep the link until it drops or a
/// disconnect is requested.
///
/// Emits `HidOpenFailed` if the link never opens, otherwise `HidOpened`
/// followed by `HidInput`s and a final `HidClosed`.
pub async fn run(
    sd: &'static Softdevice,
    bonder: &'static Bonder,
    address: BdAddr,
    seen: &[Sighting],
    events: &EventSender,
) {
    DISCONNECT.reset();
    let target = softdevice_address(address, seen);
    info!("Connecting to {}", address);

    let setup = async {
        let conn = connect_secure(sd, target, bonder).await?;
        match hid_client::discover_and_subscribe(&conn).await {
            Ok(client) => Ok((conn, client)),
            Err(e) => {
                let _ = conn.disconnect();
                Err(e)
            }
        }
    };

    let (conn, client) = match select(setup, DISCONNECT.wait()).await {
        Either::First(Ok(link)) => link,
        Either::First(Err(e)) => {
            warn!("Connection to {} failed: {:?}", address, e);
            events.send(RadioEvent::HidOpenFailed { address }).await;
            return;
        }
        Either::Second(()) => {
            info!("Connection attempt to {} cancelled", address);
            events.send(RadioEvent::HidOpenFailed { address }).await;
            return;
        }
    };

    // Empty when the mouse never advertised a name; the host substitutes one.
    let name = seen
        .iter()
        .find(|s| s.address == target)
        .map(|s| s.name.clone())
        .unwrap_or_default();
    events.send(RadioEvent::HidOpened { address, name }).await;

    let notifications = hid_client::run_notification_loop(&conn, &client, address, events);
    if let Either::Second(()) = select(notifications, DISCONNECT.wait()).await {
        info!("Disconnect requested");
        let _ = conn.disconnect();
    }

    events.send(RadioEvent::HidClosed { address }).await;
}
