//! btmouse-bridge - Bluetooth HID mouse host for nRF52840.
//!
//! Scans for nearby HID mice, connects to the one with the strongest
//! signal and hands its input reports to a single consumer.
//!
//! The HID host logic ([`hid_host`]) is plain `no_std` code driven
//! through the [`radio::RadioStack`] boundary, so it is tested on the
//! host with a mock radio:
//!
//! Usage: `cargo test --lib` or `cargo test`
//!
//! The firmware binary (`src/main.rs`) needs the `embedded` feature,
//! which pulls in Embassy and the SoftDevice adapters in [`ble`] and
//! [`ui`].

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible in every module.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Host-testable logic
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod hid;
pub mod hid_host;
pub mod radio;
pub mod status;

// ═══════════════════════════════════════════════════════════════════════════
// Hardware adapters
// ═══════════════════════════════════════════════════════════════════════════

pub mod ble;
#[cfg(feature = "embedded")]
pub mod ui;

pub use error::Error;
pub use hid_host::{HidEvent, HidHost, HostCommand, InputConsumer, InputReport, SessionState};
pub use radio::{BdAddr, DiscoveryState, RadioError, RadioEvent, RadioStack};
pub use status::{LedPattern, Status};
