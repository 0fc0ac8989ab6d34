//! btmouse-bridge firmware entry point.
//!
//! Task layout:
//!
//! ```text
//!  buttons ──HostCommand──┐
//!                         ▼
//!  radio task ──RadioEvent──► host task ──Status──► LED / status report
//!       ▲                      │
//!       └─────RadioRequest─────┘
//! ```
//!
//! The host task owns the [`HidHost`] and is the only place its state
//! changes.  One discovery window runs at boot; after that the SCAN
//! button opens another.

#![no_std]
#![no_main]

use core::cell::RefCell;
use core::mem;

use defmt::{debug, info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::{AnyPin, Pin};
use embassy_nrf::interrupt::Priority;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant, Ticker};
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use btmouse_bridge::ble::link::Bonder;
use btmouse_bridge::ble::radio::{
    self, EventChannel, EventReceiver, EventSender, RequestChannel, RequestReceiver,
    SoftdeviceRadio,
};
use btmouse_bridge::config;
use btmouse_bridge::hid::decode_mouse;
use btmouse_bridge::hid_host::{HidEvent, HidHost, HostCommand};
use btmouse_bridge::ui::{self, buttons, led, CommandChannel, CommandReceiver, CommandSender, SharedStatus};

static RADIO_EVENTS: EventChannel = EventChannel::new();
static RADIO_REQUESTS: RequestChannel = RequestChannel::new();
static HOST_COMMANDS: CommandChannel = CommandChannel::new();
static STATUS: SharedStatus = Mutex::new(RefCell::new(None));

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn radio_task(
    sd: &'static Softdevice,
    bonder: &'static Bonder,
    requests: RequestReceiver,
    events: EventSender,
) -> ! {
    radio::run(sd, bonder, requests, events).await
}

/// Downstream consumer: decodes mouse reports for the legacy port.
fn forward(event: HidEvent<'_>) {
    match event {
        HidEvent::Opened { name } => info!("Mouse connected: {}", name),
        HidEvent::Closed => info!("Mouse disconnected"),
        HidEvent::Input(report) => {
            if let Some(mouse) = decode_mouse(report.data()) {
                debug!("Mouse @{=u64}ms: {}", report.timestamp_ms(), mouse);
            }
        }
    }
}

#[embassy_executor::task]
async fn host_task(
    radio: SoftdeviceRadio,
    events: EventReceiver,
    commands: CommandReceiver,
    status: &'static SharedStatus,
) -> ! {
    let mut consumer = forward;
    let mut host = HidHost::new(radio);
    host.register(&mut consumer);

    if let Err(e) = host.scan() {
        warn!("Boot scan not started: {}", e);
    }
    ui::publish(status, host.status());

    loop {
        match select(events.receive(), commands.receive()).await {
            Either::First(event) => host.handle(event, Instant::now().as_millis()),
            Either::Second(command) => host.command(command),
        }
        ui::publish(status, host.status());
    }
}

#[embassy_executor::task(pool_size = 2)]
async fn button_task(pin: AnyPin, command: HostCommand, tx: CommandSender) -> ! {
    buttons::button_task(pin, command, tx).await
}

#[embassy_executor::task]
async fn led_task(pin: AnyPin, status: &'static SharedStatus) -> ! {
    led::led_task(pin, status).await
}

#[embassy_executor::task]
async fn status_task(status: &'static SharedStatus) -> ! {
    let mut ticker = Ticker::every(Duration::from_secs(config::STATUS_REPORT_INTERVAL_SECS));
    loop {
        ticker.next().await;
        let s = ui::snapshot(status);
        info!(
            "Status: {} ({}){}",
            s.device_name.as_str(),
            s.state,
            if s.scanning { " scanning" } else { "" }
        );
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("btmouse-bridge starting");

    // SoftDevice reserves interrupt priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let sd_config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 128 }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 0,
            central_role_count: 1,
            central_sec_count: 1,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::DEVICE_NAME.as_ptr() as _,
            current_len: config::DEVICE_NAME.len() as u16,
            max_len: config::DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    };

    let sd = Softdevice::enable(&sd_config);
    unwrap!(spawner.spawn(softdevice_task(sd)));
    radio::mark_ready();
    info!("SoftDevice enabled");

    static BONDER: StaticCell<Bonder> = StaticCell::new();
    let bonder = BONDER.init(Bonder::new());

    unwrap!(spawner.spawn(radio_task(
        sd,
        bonder,
        RADIO_REQUESTS.receiver(),
        RADIO_EVENTS.sender(),
    )));
    unwrap!(spawner.spawn(host_task(
        SoftdeviceRadio::new(RADIO_REQUESTS.sender()),
        RADIO_EVENTS.receiver(),
        HOST_COMMANDS.receiver(),
        &STATUS,
    )));

    unwrap!(spawner.spawn(button_task(
        p.P0_11.degrade(),
        HostCommand::Scan,
        HOST_COMMANDS.sender(),
    )));
    unwrap!(spawner.spawn(button_task(
        p.P0_12.degrade(),
        HostCommand::Disconnect,
        HOST_COMMANDS.sender(),
    )));
    unwrap!(spawner.spawn(led_task(p.P0_13.degrade(), &STATUS)));
    unwrap!(spawner.spawn(status_task(&STATUS)));

    info!("All tasks spawned");
}
