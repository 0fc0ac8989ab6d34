//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.  There is no
//! runtime or persisted configuration: every power cycle starts fresh.

/// GAP device name of the bridge itself.
pub const DEVICE_NAME: &str = "BT Mouse Bridge";

// Discovery

/// Duration of a discovery window (seconds).
pub const SCAN_DURATION_SECS: u64 = 8;

/// Maximum number of distinct devices tracked in one discovery window.
pub const MAX_DISCOVERED: usize = 8;

/// Capacity of device names (advertised names and the session display name).
pub const NAME_CAPACITY: usize = 64;

// HID session

/// Display name reported while no mouse is bound to the session.
pub const NO_DEVICE_NAME: &str = "No mouse";

/// Display name used when the open notification carries no name.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown";

/// Largest input report accepted from the radio stack (bytes).
pub const MAX_INPUT_REPORT_LEN: usize = 64;

/// Connection interval range (in 1.25 ms units).
/// 6 = 7.5 ms (lowest latency for HID).
pub const BLE_CONN_INTERVAL_MIN: u16 = 6;
pub const BLE_CONN_INTERVAL_MAX: u16 = 12;

/// Slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// Supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

// Task plumbing

/// Depth of the radio → host event channel.
pub const RADIO_EVENT_QUEUE: usize = 16;

/// Depth of the host → radio request channel.
pub const RADIO_REQUEST_QUEUE: usize = 4;

/// Depth of the button → host command channel.
pub const HOST_COMMAND_QUEUE: usize = 4;

// Status

/// Interval between periodic status reports (seconds).
pub const STATUS_REPORT_INTERVAL_SECS: u64 = 5;

/// Status LED half-period while no mouse is connected (ms).
pub const LED_BLINK_MS: u64 = 500;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Button SCAN        → P0.11
//   Button DISCONNECT  → P0.12
//   Status LED         → P0.13 (active-low)

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;
