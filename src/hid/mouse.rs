//! Boot-protocol mouse input report.
//!
//! Layout (3 or 4 bytes):
//! ```text
//! Byte 0: Button bitfield
//!         Bit 0 = Left, Bit 1 = Right, Bit 2 = Middle
//! Byte 1: X displacement (signed, -127..127)
//! Byte 2: Y displacement (signed, -127..127)
//! Byte 3: Scroll wheel  (signed, optional)
//! ```

/// Smallest boot mouse report (no wheel).
pub const MOUSE_REPORT_MIN: usize = 3;

/// Boot mouse report with wheel byte.
pub const MOUSE_REPORT_SIZE: usize = 4;

pub const BUTTON_LEFT: u8 = 0x01;
pub const BUTTON_RIGHT: u8 = 0x02;
pub const BUTTON_MIDDLE: u8 = 0x04;

/// Decoded boot-protocol mouse report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// Button bitfield (bit 0 = left, bit 1 = right, bit 2 = middle).
    pub buttons: u8,
    /// Relative X movement (signed).
    pub x: i8,
    /// Relative Y movement (signed).
    pub y: i8,
    /// Scroll wheel delta (signed).
    pub wheel: i8,
}

impl MouseReport {
    /// Parse raw report bytes.
    ///
    /// Accepts 3-byte (no wheel) or longer reports; bytes past the wheel
    /// are ignored.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < MOUSE_REPORT_MIN {
            return None;
        }
        Some(Self {
            buttons: data[0],
            x: data[1] as i8,
            y: data[2] as i8,
            wheel: if data.len() >= MOUSE_REPORT_SIZE {
                data[3] as i8
            } else {
                0
            },
        })
    }

    pub fn left(&self) -> bool {
        self.buttons & BUTTON_LEFT != 0
    }

    pub fn right(&self) -> bool {
        self.buttons & BUTTON_RIGHT != 0
    }

    pub fn middle(&self) -> bool {
        self.buttons & BUTTON_MIDDLE != 0
    }

    /// Returns `true` when no buttons are pressed and there is no movement.
    pub fn is_idle(&self) -> bool {
        self.buttons == 0 && self.x == 0 && self.y == 0 && self.wheel == 0
    }
}
