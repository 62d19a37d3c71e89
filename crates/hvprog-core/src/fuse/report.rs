//! Rendering fuse and lock bytes against factory defaults

use core::fmt::{self, Write};

use super::palette::Palette;
use crate::chip::{BitNames, DeviceDescriptor, FuseByte, FuseLockSnapshot};
use crate::session::response::{respond, write_status, Status};

/// What the caller intends to do with the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Plain `fuse` command: suggest a reset on differences
    Inspect,
    /// Before a reset: differences are expected, say nothing
    PreReset,
    /// After a reset: differences mean the reset failed
    PostReset,
}

/// Result of comparing a snapshot with the factory defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Every byte equals its default
    Default,
    /// At least one byte differs
    Differs,
    /// The record has no defaults to compare against
    Unknown,
}

fn status_of(byte: FuseByte) -> Status {
    match byte {
        FuseByte::Low => Status::Low,
        FuseByte::High => Status::High,
        FuseByte::Extended => Status::Extended,
        FuseByte::Lock => Status::Lock,
    }
}

/// One byte: hex, binary MSB first, then every named bit from bit 0 up
fn write_compared<W: Write + ?Sized>(
    out: &mut W,
    value: u8,
    default: u8,
    names: Option<&BitNames>,
    palette: Palette,
) -> fmt::Result {
    let diff = value ^ default;
    let nibble_color = |mask: u8| {
        if diff & mask == 0 {
            palette.reset()
        } else {
            palette.deviation()
        }
    };

    write!(
        out,
        "{}{:X}{}{:X}{}\t",
        nibble_color(0xF0),
        value >> 4,
        nibble_color(0x0F),
        value & 0x0F,
        palette.reset()
    )?;

    for bit in (0..8).rev() {
        let color = if diff & (1 << bit) != 0 {
            palette.deviation()
        } else {
            palette.reset()
        };
        write!(out, "{}{}", color, (value >> bit) & 1)?;
    }

    if let Some(names) = names {
        let named = names
            .iter()
            .enumerate()
            .filter_map(|(bit, name)| name.map(|name| (bit, name)));
        for (bit, name) in named {
            let set = (value >> bit) & 1;
            let color = if diff & (1 << bit) != 0 {
                palette.deviation()
            } else if set == 1 {
                palette.reset()
            } else {
                palette.programmed()
            };
            write!(out, "\t{}{:<9} = {}", color, name, set)?;
        }
    }

    writeln!(out, "{}", palette.reset())
}

/// Render a snapshot taken from `device`
///
/// Supported records get a per-bit comparison and a closing verdict line.
/// Other records only get the raw bytes and a warning, and always compare
/// as [`Comparison::Unknown`].
pub fn render<W: Write + ?Sized>(
    out: &mut W,
    device: &DeviceDescriptor,
    snapshot: &FuseLockSnapshot,
    verdict: Verdict,
    palette: Palette,
) -> Result<Comparison, fmt::Error> {
    if !device.is_supported() {
        for byte in FuseByte::ALL {
            let value = snapshot[byte];
            write_status(out, status_of(byte))?;
            writeln!(out, "{:02X}\t{:08b}", value, value)?;
        }
        respond(
            out,
            Status::Warning,
            format_args!(
                "Database record incomplete for this device, cannot compare to factory defaults"
            ),
        )?;
        return Ok(Comparison::Unknown);
    }

    for byte in FuseByte::ALL {
        if byte == FuseByte::Extended && !device.has_extended_fuse() {
            continue;
        }
        write_status(out, status_of(byte))?;
        write_compared(
            out,
            snapshot[byte],
            device.default_of(byte),
            device.bit_names(byte),
            palette,
        )?;
    }

    // All four bytes, a missing extended fuse reads as 0xFF like its default
    if *snapshot == device.defaults() {
        respond(
            out,
            Status::Ok,
            format_args!("All fuse/lock bits are equal to factory defaults"),
        )?;
        return Ok(Comparison::Default);
    }

    match verdict {
        Verdict::Inspect => respond(
            out,
            Status::Warning,
            format_args!("Found differences to factory defaults, use 'fuse reset' to restore"),
        )?,
        Verdict::PreReset => {}
        Verdict::PostReset => respond(
            out,
            Status::Error,
            format_args!("Found differences to factory defaults, reset failed"),
        )?,
    }
    Ok(Comparison::Differs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::lookup;
    use std::string::String;
    use std::vec::Vec;

    fn rendered(
        signature: u32,
        snapshot: FuseLockSnapshot,
        verdict: Verdict,
        palette: Palette,
    ) -> (String, Comparison) {
        let device = lookup(signature).unwrap();
        let mut out = String::new();
        let cmp = render(&mut out, device, &snapshot, verdict, palette).unwrap();
        (out, cmp)
    }

    #[test]
    fn test_defaults_plain() {
        let (out, cmp) = rendered(
            0x1E9307,
            FuseLockSnapshot::new(0xE1, 0xD9, 0xFF, 0xFF),
            Verdict::Inspect,
            Palette::PLAIN,
        );
        assert_eq!(cmp, Comparison::Default);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "low       \tE1\t11100001\tCKSEL0    = 1\tCKSEL1    = 0\tCKSEL2    = 0\t\
             CKSEL3    = 0\tSUT0      = 0\tSUT1      = 1\tBODEN     = 1\tBODLEVEL  = 1"
        );
        assert!(lines[1].starts_with("high      \tD9\t11011001\tBOOTRST   = 1"));
        assert!(lines[2].starts_with("lock      \tFF\t11111111\tLB1       = 1"));
        assert_eq!(
            lines[3],
            "ok        \tAll fuse/lock bits are equal to factory defaults"
        );
    }

    #[test]
    fn test_extended_only_when_present() {
        let (out, _) = rendered(
            0x1E9514,
            FuseLockSnapshot::new(0x62, 0xD9, 0xFF, 0xFF),
            Verdict::Inspect,
            Palette::PLAIN,
        );
        assert!(out.contains("\nextended  \tFF\t11111111\tBODLEVEL0 = 1"));

        let (out, _) = rendered(
            0x1E9502,
            FuseLockSnapshot::new(0xE1, 0x99, 0xFF, 0xFF),
            Verdict::Inspect,
            Palette::PLAIN,
        );
        assert!(!out.contains("extended"));
    }

    #[test]
    fn test_verdicts_on_difference() {
        let modified = FuseLockSnapshot::new(0xE0, 0xD9, 0xFF, 0xFF);

        let (out, cmp) = rendered(0x1E9514, modified, Verdict::Inspect, Palette::PLAIN);
        assert_eq!(cmp, Comparison::Differs);
        assert!(out.ends_with(
            "warning   \tFound differences to factory defaults, use 'fuse reset' to restore\n"
        ));

        let (out, cmp) = rendered(0x1E9514, modified, Verdict::PreReset, Palette::PLAIN);
        assert_eq!(cmp, Comparison::Differs);
        assert!(out.lines().last().unwrap().starts_with("lock"));

        let (out, cmp) = rendered(0x1E9514, modified, Verdict::PostReset, Palette::PLAIN);
        assert_eq!(cmp, Comparison::Differs);
        assert!(out.ends_with("error     \tFound differences to factory defaults, reset failed\n"));
    }

    #[test]
    fn test_colors_mark_deviations() {
        let (out, _) = rendered(
            0x1E9307,
            FuseLockSnapshot::new(0xE0, 0xD9, 0xFF, 0xFF),
            Verdict::Inspect,
            Palette::COLOR,
        );
        let low = out.lines().next().unwrap();

        // High nibble unchanged, low nibble deviates
        assert!(low.starts_with("low       \t\x1b[0mE\x1b[31m0\x1b[0m\t"));
        // Binary digits, bit 0 is the only deviation
        assert!(low.contains("\x1b[0m0\x1b[31m0\t"));
        assert!(low.contains("\t\x1b[31mCKSEL0    = 0"));
        assert!(low.contains("\t\x1b[32mCKSEL1    = 0"));
        assert!(low.contains("\t\x1b[0mSUT1      = 1"));
        assert!(low.ends_with("\x1b[0m"));
    }

    #[test]
    fn test_plain_has_no_escapes() {
        let (out, _) = rendered(
            0x1E950F,
            FuseLockSnapshot::new(0x00, 0x00, 0x00, 0x00),
            Verdict::Inspect,
            Palette::PLAIN,
        );
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn test_unsupported_prints_raw_bytes() {
        let (out, cmp) = rendered(
            0x1E930A,
            FuseLockSnapshot::new(0x62, 0xDF, 0xF9, 0xFF),
            Verdict::Inspect,
            Palette::COLOR,
        );
        assert_eq!(cmp, Comparison::Unknown);
        assert_eq!(
            out,
            "low       \t62\t01100010\n\
             high      \tDF\t11011111\n\
             extended  \tF9\t11111001\n\
             lock      \tFF\t11111111\n\
             warning   \tDatabase record incomplete for this device, cannot compare to factory defaults\n"
        );
    }
}
