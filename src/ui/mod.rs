//! Operator surface - two buttons and a status LED.
//!
//! ## Components
//!
//! - **Buttons**: SCAN and DISCONNECT tactile switches with debouncing,
//!   turned into [`HostCommand`]s for the host task.
//! - **LED**: blinks until a mouse is connected, then stays on.
//!
//! The host task publishes its [`Status`] into [`SharedStatus`] after
//! every event; the LED and the periodic status report only read it.

pub mod buttons;
pub mod led;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use crate::config::HOST_COMMAND_QUEUE;
use crate::hid_host::HostCommand;
use crate::status::Status;

pub type CommandChannel = Channel<CriticalSectionRawMutex, HostCommand, HOST_COMMAND_QUEUE>;
pub type CommandSender = Sender<'static, CriticalSectionRawMutex, HostCommand, HOST_COMMAND_QUEUE>;
pub type CommandReceiver =
    Receiver<'static, CriticalSectionRawMutex, HostCommand, HOST_COMMAND_QUEUE>;

/// Latest host status; `None` until the host publishes one.
pub type SharedStatus = Mutex<CriticalSectionRawMutex, RefCell<Option<Status>>>;

pub fn publish(shared: &SharedStatus, status: Status) {
    shared.lock(|cell| *cell.borrow_mut() = Some(status));
}

/// Current status, or the boot status if nothing was published yet.
pub fn snapshot(shared: &SharedStatus) -> Status {
    shared.lock(|cell| cell.borrow().clone().unwrap_or_else(Status::initial))
}
