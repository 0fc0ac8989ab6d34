//! Unit tests for mouse report decoding.
//!
//! These tests run on the host (not embedded) and verify the pure
//! logic of report parsing.

use super::decode_mouse;
use super::mouse::MouseReport;

// ═══════════════════════════════════════════════════════════════════════════
// Mouse Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn mouse_report_default_is_idle() {
    let report = MouseReport::default();
    assert!(report.is_idle());
    assert!(!report.left());
}

#[test]
fn mouse_report_from_3_byte_data() {
    // Left button pressed, X=10, Y=-5
    let data = [0x01, 0x0A, 0xFB]; // 0xFB = -5 as i8
    let report = MouseReport::from_bytes(&data).unwrap();

    assert!(report.left());
    assert_eq!(report.x, 10);
    assert_eq!(report.y, -5);
    assert_eq!(report.wheel, 0); // Not provided, defaults to 0
}

#[test]
fn mouse_report_from_4_byte_data() {
    // Right button, wheel scroll down
    let data = [0x02, 0x00, 0x00, 0xFF];
    let report = MouseReport::from_bytes(&data).unwrap();

    assert!(report.right());
    assert!(!report.middle());
    assert_eq!(report.wheel, -1);
    assert!(!report.is_idle());
}

#[test]
fn mouse_report_from_short_bytes_fails() {
    assert!(MouseReport::from_bytes(&[]).is_none());
    assert!(MouseReport::from_bytes(&[0x01, 0x0A]).is_none());
}

#[test]
fn mouse_report_extremes() {
    let report = MouseReport::from_bytes(&[0x07, 0x80, 0x7F]).unwrap();
    assert_eq!(report.x, -128);
    assert_eq!(report.y, 127);
    assert!(report.left() && report.right() && report.middle());
}

// ═══════════════════════════════════════════════════════════════════════════
// Decoding Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn decode_boot_payload_directly() {
    let report = decode_mouse(&[0x01, 0x05, 0xFB, 0x01]).unwrap();
    assert_eq!(report.buttons, 0x01);
    assert_eq!(report.x, 5);
    assert_eq!(report.y, -5);
    assert_eq!(report.wheel, 1);
}

#[test]
fn decode_strips_report_id_prefix() {
    // Report ID 2 + 4-byte mouse payload.
    let report = decode_mouse(&[0x02, 0x01, 0x05, 0xFB, 0x01]).unwrap();
    assert_eq!(report.buttons, 0x01);
    assert_eq!(report.x, 5);
    assert_eq!(report.wheel, 1);
}

#[test]
fn decode_rejects_short_payload() {
    assert!(decode_mouse(&[0x01]).is_none());
}
