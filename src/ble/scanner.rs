//! BLE GAP scanner - one discovery window.
//!
//! Uses the SoftDevice Central-role scanning API.  Advertisers are
//! filtered by the HID Service UUID (and a mouse appearance, when one is
//! advertised) and each sighting is pushed to the host as it arrives.
//! Repeats are forwarded too: the host keeps the latest RSSI.

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use heapless::{String, Vec};
use nrf_softdevice::ble::{central, Address};
use nrf_softdevice::Softdevice;

use crate::ble::adv_parser::{extract_device_name, is_candidate_mouse};
use crate::ble::radio::EventSender;
use crate::config::{MAX_DISCOVERED, NAME_CAPACITY, SCAN_DURATION_SECS};
use crate::radio::{BdAddr, RadioError, RadioEvent};

/// SoftDevice address (with its address type) behind a sighting.
#[derive(Clone)]
pub struct Sighting {
    pub address: Address,
    pub name: String<NAME_CAPACITY>,
    /// Latest reading, used to pick what to forget when full.
    pub rssi: i8,
}

pub type Sightings = Vec<Sighting, MAX_DISCOVERED>;

/// Keep `seen` in step with the host's discovery window: the latest
/// reading wins, and a full list makes room for a stronger newcomer by
/// dropping the weakest entry (the later one on a tie).
fn remember(seen: &mut Sightings, address: Address, name: &String<NAME_CAPACITY>, rssi: i8) {
    if let Some(s) = seen.iter_mut().find(|s| s.address == address) {
        s.rssi = rssi;
        if !name.is_empty() {
            s.name = name.clone();
        }
        return;
    }

    if seen.is_full() {
        let weakest = seen
            .iter()
            .enumerate()
            .fold(None, |w: Option<usize>, (i, s)| match w {
                Some(w) if s.rssi > seen[w].rssi => Some(w),
                _ => Some(i),
            });
        match weakest {
            Some(i) if rssi > seen[i].rssi => {
                seen.remove(i);
            }
            _ => return,
        }
    }

    let _ = seen.push(Sighting {
        address,
        name: name.clone(),
        rssi,
    });
}

/// Run a scan for `SCAN_DURATION_SECS` seconds.
///
/// Sightings are sent to `events` in real time; `seen` collects the full
/// SoftDevice addresses so a later connect can use the right address
/// type.  Window boundaries (`Started`/`Stopped`) are the caller's job.
pub async fn scan(
    sd: &Softdevice,
    events: &EventSender,
    seen: &mut Sightings,
) -> Result<(), RadioError> {
    info!("BLE scan starting ({} s window)", SCAN_DURATION_SECS);
    seen.clear();

    let config = central::ScanConfig {
        // Active scan to retrieve scan-response data (device names).
        active: true,
        ..Default::default()
    };

    let scan = central::scan(sd, &config, |params| {
        let data =
            unsafe { core::slice::from_raw_parts(params.data.p_data, params.data.len as usize) };
        let address = Address::from_raw(params.peer_addr);

        // Scan responses carry the name but usually not the service list.
        let known = seen.iter().any(|s| s.address == address);
        if !known && !is_candidate_mouse(data) {
            return None;
        }

        let name = extract_device_name(data);
        remember(seen, address, &name, params.rssi);

        let sighting = RadioEvent::DeviceFound {
            address: BdAddr::from_le_bytes(address.bytes()),
            name,
            rssi: params.rssi,
        };
        if events.try_send(sighting).is_err() {
            warn!("Radio event queue full - dropping sighting");
        }

        // Keep scanning until the window closes.
        None::<()>
    });

    let outcome = select(scan, Timer::after(Duration::from_secs(SCAN_DURATION_SECS))).await;
    match outcome {
        Either::First(Err(e)) => {
            warn!("BLE scan ended with error: {:?}", e);
            Err(RadioError::Rejected)
        }
        Either::First(Ok(())) | Either::Second(()) => {
            info!("BLE scan complete - {} candidates", seen.len());
            Ok(())
        }
    }
}
