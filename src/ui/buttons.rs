//! GPIO button input with async debouncing.
//!
//! Two physical buttons (active-low with internal pull-up):
//!   - SCAN       - open a discovery window
//!   - DISCONNECT - drop the current mouse
//!
//! Each button is handled by its own task that waits for a GPIO edge,
//! debounces it, and sends its `HostCommand` to the host task.

use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_time::{Duration, Timer};

use crate::config::BUTTON_DEBOUNCE_MS;
use crate::hid_host::HostCommand;
use crate::ui::CommandSender;

/// Run a single button loop.
///
/// Waits for the pin to go low (pressed), debounces, sends the command,
/// then waits for release before repeating.
pub async fn button_task(pin: AnyPin, command: HostCommand, tx: CommandSender) -> ! {
    let mut btn = Input::new(pin, Pull::Up);

    loop {
        btn.wait_for_falling_edge().await;

        // Debounce: wait and re-check.
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low() {
            info!("Button: {:?}", command);
            tx.send(command).await;

            // Wait for release to avoid repeat triggers.
            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        }
    }
}
