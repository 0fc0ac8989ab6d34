//! Input report decoding for the downstream consumer.
//!
//! The HID host forwards reports untouched; whoever consumes them and
//! drives the legacy mouse port decodes them here.

pub mod mouse;

#[cfg(test)]
mod tests;

pub use mouse::MouseReport;

/// Decode a mouse input report.
///
/// Boot-protocol payloads (3 or 4 bytes) are parsed directly.  Longer
/// payloads are assumed to carry a leading Report ID byte.
pub fn decode_mouse(data: &[u8]) -> Option<MouseReport> {
    match data.len() {
        3..=4 => MouseReport::from_bytes(data),
        n if n > 4 => MouseReport::from_bytes(&data[1..]),
        n => {
            warn!("Mouse report too short: {} bytes", n);
            None
        }
    }
}
