//! BLE GATT HID Client - discovers and subscribes to HID Report
//! characteristics on a connected peripheral.
//!
//! After GAP connection is established, this module:
//! 1. Discovers the HID Service (UUID 0x1812).
//! 2. Asks for Boot Protocol so reports use the fixed mouse layout.
//! 3. Enables CCCD notifications on the HID Report characteristic.
//! 4. Forwards every notification, untouched, to the host.

use heapless::Vec;
use nrf_softdevice::ble::{gatt_client, Connection};

use crate::ble::radio::EventSender;
use crate::config::MAX_INPUT_REPORT_LEN;
use crate::radio::{BdAddr, RadioError, RadioEvent};

/// nrf-softdevice GATT client struct for the HID-over-GATT service.
///
/// The `#[nrf_softdevice::gatt_client]` macro generates discovery and
/// read/write/notify helpers for the listed characteristics.
#[nrf_softdevice::gatt_client(uuid = "1812")]
pub struct HidServiceClient {
    /// HID Report (Input) - notifications carry live mouse data.
    #[characteristic(uuid = "2a4d", read, notify)]
    pub hid_report: Vec<u8, 20>,

    /// Protocol Mode - 0 = Boot Protocol, 1 = Report Protocol.
    #[characteristic(uuid = "2a4e", read, write)]
    pub protocol_mode: u8,
}

/// Discover the HID service on the connected peripheral and subscribe
/// to HID Report notifications.
pub async fn discover_and_subscribe(conn: &Connection) -> Result<HidServiceClient, RadioError> {
    info!("Discovering HID service...");

    let client: HidServiceClient = gatt_client::discover(conn)
        .await
        .map_err(|_| RadioError::Rejected)?;

    info!("HID service discovered");

    match client.protocol_mode_write(&0u8).await {
        Ok(_) => info!("Set HID protocol to Boot mode"),
        Err(_) => warn!("Could not set boot protocol (device may not support it)"),
    }

    client
        .hid_report_cccd_write(true)
        .await
        .map_err(|_| RadioError::Rejected)?;

    info!("Subscribed to HID report notifications");
    Ok(client)
}

/// Run the notification listener loop.
///
/// Returns when the connection drops.  Reports are handed over with
/// `try_send`: if the host is behind, the report is dropped rather than
/// queued.
pub async fn run_notification_loop(
    conn: &Connection,
    client: &HidServiceClient,
    address: BdAddr,
    events: &EventSender,
) {
    info!("HID notification loop started");

    let _ = gatt_client::run(conn, client, |event| match event {
        HidServiceClientEvent::HidReportNotification(data) => {
            let length = data.len() as u16;
            let mut payload: Vec<u8, MAX_INPUT_REPORT_LEN> = Vec::new();
            let _ = payload.extend_from_slice(&data);

            let input = RadioEvent::HidInput {
                address,
                data: payload,
                length,
            };
            if events.try_send(input).is_err() {
                warn!("Radio event queue full - dropping report");
            }
        }
    })
    .await;

    info!("HID notification loop ended (connection closed)");
}
