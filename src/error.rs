//! Unified error type for the HID host.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.
//!
//! None of these are fatal: the host absorbs every one of them into a
//! state transition or a drop decision, and at worst the status drops
//! back to "no mouse".

use crate::radio::RadioError;

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Discovery was requested while the radio stack was not ready.
    DiscoveryUnavailable,

    /// The remote refused the connection or the attempt timed out.
    ConnectionRejected,

    /// A connect attempt arrived while the session slot is taken.
    AlreadyConnected,

    /// An input notification whose length does not match its payload.
    MalformedReport,

    /// The radio stack refused an outbound request.
    Radio(RadioError),
}

// Convenience conversions

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Error::Radio(e)
    }
}
