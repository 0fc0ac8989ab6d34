//! Boundary with the Bluetooth radio stack.
//!
//! Inbound notifications arrive as one tagged [`RadioEvent`]; outbound
//! requests go through the [`RadioStack`] trait.  Everything behind this
//! module (SoftDevice on target, a mock in tests) is interchangeable.

use core::fmt;

use heapless::{String, Vec};

use crate::config::{MAX_INPUT_REPORT_LEN, NAME_CAPACITY};

/// 6-byte Bluetooth device address, stored most significant byte first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Build from the little-endian byte order used on the air and by the SoftDevice.
    pub fn from_le_bytes(mut bytes: [u8; 6]) -> Self {
        bytes.reverse();
        Self(bytes)
    }

    pub fn to_le_bytes(self) -> [u8; 6] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BdAddr {
    fn format(&self, f: defmt::Formatter) {
        let b = &self.0;
        defmt::write!(
            f,
            "{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}",
            b[0],
            b[1],
            b[2],
            b[3],
            b[4],
            b[5]
        )
    }
}

/// Discovery state reported by the radio stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoveryState {
    Started,
    Stopped,
}

/// Notifications delivered by the radio stack.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioEvent {
    /// A device answered discovery.
    DeviceFound {
        address: BdAddr,
        /// Advertised name, empty when the device did not send one.
        name: String<NAME_CAPACITY>,
        /// Received Signal Strength Indicator (dBm).
        rssi: i8,
    },
    /// Discovery started or stopped.
    DiscoveryStateChanged(DiscoveryState),
    /// HID channel open.
    HidOpened {
        address: BdAddr,
        name: String<NAME_CAPACITY>,
    },
    /// Connection attempt refused or timed out before the channel opened.
    HidOpenFailed { address: BdAddr },
    /// HID channel closed (remote disconnect, radio error or local request).
    HidClosed { address: BdAddr },
    /// Input report from the connected device.
    ///
    /// `length` is what the stack claims; it is checked against `data`.
    HidInput {
        address: BdAddr,
        data: Vec<u8, MAX_INPUT_REPORT_LEN>,
        length: u16,
    },
}

/// Reasons the radio stack can refuse an outbound request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Controller or host stack not initialised.
    NotReady,
    /// Request queue full or another operation is in flight.
    Busy,
    /// Request refused outright.
    Rejected,
}

/// Outbound requests to the radio stack.
///
/// Every method is a non-blocking hand-off; outcomes come back later as
/// [`RadioEvent`]s.
pub trait RadioStack {
    fn start_discovery(&mut self) -> Result<(), RadioError>;
    fn stop_discovery(&mut self) -> Result<(), RadioError>;
    fn connect(&mut self, address: BdAddr) -> Result<(), RadioError>;
    fn disconnect(&mut self) -> Result<(), RadioError>;
}

impl<R: RadioStack + ?Sized> RadioStack for &mut R {
    fn start_discovery(&mut self) -> Result<(), RadioError> {
        (**self).start_discovery()
    }

    fn stop_discovery(&mut self) -> Result<(), RadioError> {
        (**self).stop_discovery()
    }

    fn connect(&mut self, address: BdAddr) -> Result<(), RadioError> {
        (**self).connect(address)
    }

    fn disconnect(&mut self) -> Result<(), RadioError> {
        (**self).disconnect()
    }
}

/// Copy `name` into a bounded name string, truncating on a char boundary.
pub fn bounded_name(name: &str) -> String<NAME_CAPACITY> {
    let mut out = String::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_prints_msb_first() {
        let addr = BdAddr::new([0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x03]);
        assert_eq!(format!("{}", addr), "AA:BB:CC:01:02:03");
    }

    #[test]
    fn address_le_conversion_reverses_bytes() {
        let addr = BdAddr::from_le_bytes([1, 2, 3, 4, 5, 6]);
        assert_eq!(addr.0, [6, 5, 4, 3, 2, 1]);
        assert_eq!(addr.to_le_bytes(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn bounded_name_truncates_to_capacity() {
        let long = "M".repeat(NAME_CAPACITY + 10);
        assert_eq!(bounded_name(&long).len(), NAME_CAPACITY);
        assert_eq!(bounded_name("Mouse").as_str(), "Mouse");
    }
}
