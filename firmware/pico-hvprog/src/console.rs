//! Serial console over USB CDC-ACM
//!
//! A terminal sends characters one at a time and expects them echoed. The
//! [`LineEditor`] keeps the current line, accepts letters, digits and
//! spaces, handles backspace and completes the line on CR or LF. Output
//! goes through [`PacketWriter`], which turns `\n` into `\r\n` and splits
//! the text into full-speed USB packets.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::EndpointError;
use heapless::{String, Vec};

/// Full-speed bulk endpoint size
pub const MAX_PACKET: usize = 64;

/// Longest accepted command line
pub const LINE_CAPACITY: usize = 254;

/// USB driver of the console
pub type AppDriver = Driver<'static, USB>;

/// Console connection went away
pub struct Disconnected;

impl From<EndpointError> for Disconnected {
    fn from(e: EndpointError) -> Self {
        if let EndpointError::BufferOverflow = e {
            defmt::warn!("USB buffer overflow");
        }
        Disconnected
    }
}

/// Line buffer with terminal echo
pub struct LineEditor {
    line: String<LINE_CAPACITY>,
}

impl LineEditor {
    /// Create an empty editor
    pub const fn new() -> Self {
        Self {
            line: String::new(),
        }
    }

    /// Process one received byte, appending its echo to `echo`
    ///
    /// Returns `true` once a line is complete; it stays available through
    /// [`line`](Self::line) until [`clear`](Self::clear) is called.
    pub fn feed<const N: usize>(&mut self, byte: u8, echo: &mut Vec<u8, N>) -> bool {
        match byte {
            b'\r' | b'\n' => {
                let _ = echo.extend_from_slice(b"\n");
                true
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b' ' => {
                if self.line.push(char::from(byte)).is_ok() {
                    let _ = echo.push(byte);
                }
                false
            }
            // Backspace, or DEL as sent by most terminals
            0x08 | 0x7F => {
                if self.line.pop().is_some() {
                    let _ = echo.extend_from_slice(b"\x08 \x08");
                }
                false
            }
            _ => false,
        }
    }

    /// The line collected so far
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Start a new line
    pub fn clear(&mut self) {
        self.line.clear();
    }
}

/// Packetizing writer with newline translation
pub struct PacketWriter<'a> {
    class: &'a mut CdcAcmClass<'static, AppDriver>,
    packet: Vec<u8, MAX_PACKET>,
    /// Last packet sent was full, so the host needs a zero-length one
    zlp: bool,
}

impl<'a> PacketWriter<'a> {
    /// Start writing to `class`
    pub fn new(class: &'a mut CdcAcmClass<'static, AppDriver>) -> Self {
        Self {
            class,
            packet: Vec::new(),
            zlp: false,
        }
    }

    async fn put(&mut self, byte: u8) -> Result<(), Disconnected> {
        // Never full here: a packet is sent as soon as it fills up
        let _ = self.packet.push(byte);
        if self.packet.is_full() {
            self.class.write_packet(&self.packet).await?;
            self.packet.clear();
            self.zlp = true;
        } else {
            self.zlp = false;
        }
        Ok(())
    }

    /// Queue `text`, translating `\n` to `\r\n`
    pub async fn write(&mut self, text: &[u8]) -> Result<(), Disconnected> {
        for &byte in text {
            if byte == b'\n' {
                self.put(b'\r').await?;
            }
            self.put(byte).await?;
        }
        Ok(())
    }

    /// Send whatever is still buffered
    pub async fn finish(self) -> Result<(), Disconnected> {
        if !self.packet.is_empty() {
            self.class.write_packet(&self.packet).await?;
        } else if self.zlp {
            self.class.write_packet(&[]).await?;
        }
        Ok(())
    }
}
