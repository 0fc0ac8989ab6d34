//! Bluetooth Low Energy radio adapter.
//!
//! This module drives the Nordic SoftDevice S140 in **Central** role and
//! presents it to the HID host as a [`crate::radio::RadioStack`]:
//!
//! 1. **Scanner** - one time-bounded discovery window, reporting every
//!    advertiser that looks like a HID mouse.
//! 2. **Link** - connects to the chosen address, secures the link and
//!    keeps it until either side drops it.
//! 3. **HID Client** - GATT discovery of the HID service and
//!    subscription to input report notifications.
//! 4. **Radio task** - serialises requests from the host and turns
//!    everything above into [`crate::radio::RadioEvent`]s.
//!
//! The advertisement parser and the bond table are hardware
//! independent; the rest needs
//! the `embedded` feature.

pub mod adv_parser;
pub mod bonds;

#[cfg(feature = "embedded")]
pub mod hid_client;
#[cfg(feature = "embedded")]
pub mod link;
#[cfg(feature = "embedded")]
pub mod radio;
#[cfg(feature = "embedded")]
pub mod scanner;
