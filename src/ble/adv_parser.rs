//! Advertisement data parsing for the scanner.
//!
//! Advertising payloads are a sequence of `[len][type][data...]`
//! structures; a zero length or a structure running past the end stops
//! parsing.

use heapless::String;

use crate::config::NAME_CAPACITY;
use crate::radio::bounded_name;

const AD_INCOMPLETE_UUID16: u8 = 0x02;
const AD_COMPLETE_UUID16: u8 = 0x03;
const AD_SHORTENED_NAME: u8 = 0x08;
const AD_COMPLETE_NAME: u8 = 0x09;
const AD_APPEARANCE: u8 = 0x19;

/// HID Service UUID (0x1812), little-endian.
const HID_SERVICE_UUID_LE: [u8; 2] = [0x12, 0x18];

/// Generic HID appearance and the mouse sub-category.
const APPEARANCE_HID_GENERIC: u16 = 0x03C0;
const APPEARANCE_HID_MOUSE: u16 = 0x03C2;

/// Iterate over `(ad_type, payload)` pairs.
fn ad_structures(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut i = 0;
    core::iter::from_fn(move || {
        let len = *data.get(i)? as usize;
        if len == 0 || i + len >= data.len() {
            return None;
        }
        let ad_type = data[i + 1];
        let payload = &data[i + 2..i + 1 + len];
        i += len + 1;
        Some((ad_type, payload))
    })
}

/// Check if raw advertisement data contains the HID Service UUID (0x1812).
pub fn contains_hid_service_uuid(data: &[u8]) -> bool {
    ad_structures(data)
        .filter(|(t, _)| *t == AD_INCOMPLETE_UUID16 || *t == AD_COMPLETE_UUID16)
        .any(|(_, uuids)| uuids.chunks_exact(2).any(|c| c == HID_SERVICE_UUID_LE))
}

/// Appearance value, if the advertiser sent one.
pub fn appearance(data: &[u8]) -> Option<u16> {
    ad_structures(data)
        .find(|(t, p)| *t == AD_APPEARANCE && p.len() >= 2)
        .map(|(_, p)| u16::from_le_bytes([p[0], p[1]]))
}

/// `true` for HID advertisers that could be a mouse.
///
/// Advertisers without an Appearance field get the benefit of the doubt;
/// keyboards, gamepads and the like are skipped.
pub fn is_candidate_mouse(data: &[u8]) -> bool {
    if !contains_hid_service_uuid(data) {
        return false;
    }
    match appearance(data) {
        None => true,
        Some(a) => a == APPEARANCE_HID_MOUSE || a == APPEARANCE_HID_GENERIC,
    }
}

/// Extract complete/shortened local name.  Empty if none is present.
///
/// Local names are UTF-8.  Invalid bytes end the name; whatever decoded
/// before them is kept, truncated on a char boundary to fit.
pub fn extract_device_name(data: &[u8]) -> String<NAME_CAPACITY> {
    let Some((_, bytes)) =
        ad_structures(data).find(|(t, _)| *t == AD_SHORTENED_NAME || *t == AD_COMPLETE_NAME)
    else {
        return String::new();
    };

    let text = match core::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    };
    bounded_name(text)
}
