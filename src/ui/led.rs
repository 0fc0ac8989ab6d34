//! Status LED (active-low).

use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive};
use embassy_time::{Duration, Timer};

use crate::config::LED_BLINK_MS;
use crate::status::{led_pattern, LedPattern};
use crate::ui::{snapshot, SharedStatus};

pub async fn led_task(pin: AnyPin, status: &'static SharedStatus) -> ! {
    let mut led = Output::new(pin, Level::High, OutputDrive::Standard);

    loop {
        match led_pattern(&snapshot(status)) {
            LedPattern::Solid => led.set_low(),
            LedPattern::Blink => led.toggle(),
        }
        Timer::after(Duration::from_millis(LED_BLINK_MS)).await;
    }
}
