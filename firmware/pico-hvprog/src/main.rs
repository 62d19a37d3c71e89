//! Standalone AVR high-voltage parallel programmer for Raspberry Pi Pico
//!
//! The Pico drives the programming socket directly and exposes the
//! hvprog command console as a USB CDC-ACM serial port: open it with any
//! terminal and type `enter`, `fuse`, `fuse reset`, `run` or `exit`.
//!
//! ## Pin Assignments
//!
//! | Pin       | Function                       |
//! |-----------|--------------------------------|
//! | GP0-GP7   | DATA0-DATA7                    |
//! | GP8       | XA0                            |
//! | GP9       | XA1                            |
//! | GP10      | BS1                            |
//! | GP11      | BS2                            |
//! | GP12      | PAGEL                          |
//! | GP13      | XTAL1                          |
//! | GP14      | WR                             |
//! | GP15      | OE                             |
//! | GP16      | RDY/BSY                        |
//! | GP17      | 5V enable                      |
//! | GP18      | 12V enable                     |
//! | GP19      | RESET pull to 0V               |
//!
//! The target runs at 5V, so the data and control lines need level
//! shifting between the Pico and the socket.

#![no_std]
#![no_main]

mod console;
mod socket;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Flex;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver, InterruptHandler as UsbInterruptHandler};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::UsbDevice;
use heapless::{String, Vec};
use hvprog_core::programmer::Timing;
use hvprog_core::session::Session;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::console::{AppDriver, Disconnected, LineEditor, PacketWriter, MAX_PACKET};
use crate::socket::PicoHvpp;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => UsbInterruptHandler<USB>;
});

/// pid.codes test VID/PID
const USB_VID: u16 = 0x1209;
const USB_PID: u16 = 0x0001;

/// Room for the longest response (`fuse reset` lists the bytes twice)
const RESPONSE_CAPACITY: usize = 4096;

static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();
static RESPONSE: StaticCell<String<RESPONSE_CAPACITY>> = StaticCell::new();

fn usb_config() -> embassy_usb::Config<'static> {
    let mut config = embassy_usb::Config::new(USB_VID, USB_PID);
    config.manufacturer = Some("hvprog");
    config.product = Some("pico-hvprog");
    config.serial_number = Some("00000001");
    config.max_packet_size_0 = 64;

    // Required for composite devices with IADs (Interface Association Descriptors)
    config.device_class = 0xEF; // Miscellaneous
    config.device_sub_class = 0x02; // Common Class
    config.device_protocol = 0x01; // IAD

    config
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("pico-hvprog starting...");

    let p = embassy_rp::init(Default::default());

    let data = [
        Flex::new(p.PIN_0),
        Flex::new(p.PIN_1),
        Flex::new(p.PIN_2),
        Flex::new(p.PIN_3),
        Flex::new(p.PIN_4),
        Flex::new(p.PIN_5),
        Flex::new(p.PIN_6),
        Flex::new(p.PIN_7),
    ];
    // Same order as Line::ALL
    let lines = [
        Flex::new(p.PIN_8),  // XA0
        Flex::new(p.PIN_9),  // XA1
        Flex::new(p.PIN_10), // BS1
        Flex::new(p.PIN_11), // BS2
        Flex::new(p.PIN_12), // PAGEL
        Flex::new(p.PIN_13), // XTAL1
        Flex::new(p.PIN_14), // WR
        Flex::new(p.PIN_15), // OE
        Flex::new(p.PIN_16), // RDY/BSY
        Flex::new(p.PIN_17), // 5V enable
        Flex::new(p.PIN_18), // 12V enable
        Flex::new(p.PIN_19), // RESET pull
    ];
    let socket = PicoHvpp::new(data, lines, Timing::default());
    let mut session = Session::new(socket);

    info!("Socket released");

    // Initialize USB
    let driver = Driver::new(p.USB, Irqs);
    let mut builder = embassy_usb::Builder::new(
        driver,
        usb_config(),
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUF.init([0; 64]),
    );
    let mut class = CdcAcmClass::new(
        &mut builder,
        CDC_STATE.init(State::new()),
        MAX_PACKET as u16,
    );
    let device = builder.build();

    spawner.must_spawn(usb_task(device));

    let response = RESPONSE.init(String::new());
    loop {
        class.wait_connection().await;
        info!("Console connected ({=str} mode)", session.mode().as_str());
        let _ = console(&mut class, &mut session, response).await;
        warn!("Console disconnected, waiting for reconnect...");
    }
}

/// Serve one console connection until the host goes away
async fn console(
    class: &mut CdcAcmClass<'static, AppDriver>,
    session: &mut Session<PicoHvpp>,
    response: &mut String<RESPONSE_CAPACITY>,
) -> Result<(), Disconnected> {
    let mut editor = LineEditor::new();
    let mut packet = [0u8; MAX_PACKET];

    loop {
        let n = class.read_packet(&mut packet).await?;
        let mut echo: Vec<u8, { 3 * MAX_PACKET }> = Vec::new();

        for &byte in &packet[..n] {
            if !editor.feed(byte, &mut echo) {
                continue;
            }

            // Echo up to the line break before the command output
            let mut out = PacketWriter::new(class);
            out.write(&echo).await?;
            echo.clear();

            response.clear();
            // Only a full response buffer makes execute fail
            if session.execute(editor.line(), response).is_err() {
                warn!("Response truncated");
            }
            editor.clear();

            out.write(response.as_bytes()).await?;
            out.finish().await?;
        }

        if !echo.is_empty() {
            let mut out = PacketWriter::new(class);
            out.write(&echo).await?;
            out.finish().await?;
        }
    }
}

/// USB device task
#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, AppDriver>) {
    usb.run().await;
}
