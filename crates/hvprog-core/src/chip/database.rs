//! Compiled-in AVR device database
//!
//! Factory defaults and bit names follow the Microchip datasheets of each
//! family. Parts with identical fuse layouts share their bit-name arrays.
//!
//! Lookup is a linear scan in table order and the first match wins. The
//! table intentionally keeps two signature collisions (0x1E930A and
//! 0x1E9406): the older ATmega88/ATmega168 records are unsupported and
//! shadow the fully described ATmega88A/ATmega168A records that follow.

use super::flags::DeviceFlags;
use super::types::{BitNames, DeviceDescriptor};

const NONE: DeviceFlags = DeviceFlags::empty();
const SUPPORTED: DeviceFlags = DeviceFlags::SUPPORTED;
const SUPPORTED_EXT: DeviceFlags = DeviceFlags::SUPPORTED.union(DeviceFlags::FUSE_EXTENDED);

// ATmega48A/48PA has no separate boot loader section
const BASE_LOCK: BitNames = [
    Some("LB1"),
    Some("LB2"),
    None,
    None,
    None,
    None,
    None,
    None,
];
const STD_LOCK: BitNames = [
    Some("LB1"),
    Some("LB2"),
    Some("BLB01"),
    Some("BLB02"),
    Some("BLB11"),
    Some("BLB12"),
    None,
    None,
];

// ATmega8 / ATmega16 / ATmega32
const MEGA8_FUSE_LOW: BitNames = [
    Some("CKSEL0"),
    Some("CKSEL1"),
    Some("CKSEL2"),
    Some("CKSEL3"),
    Some("SUT0"),
    Some("SUT1"),
    Some("BODEN"),
    Some("BODLEVEL"),
];
const MEGA8_FUSE_HIGH: BitNames = [
    Some("BOOTRST"),
    Some("BOOTSZ0"),
    Some("BOOTSZ1"),
    Some("EESAVE"),
    Some("CKOPT"),
    Some("SPIEN"),
    Some("WDTON"),
    Some("RSTDISBL"),
];
const MEGA32_FUSE_HIGH: BitNames = [
    Some("BOOTRST"),
    Some("BOOTSZ0"),
    Some("BOOTSZ1"),
    Some("EESAVE"),
    Some("CKOPT"),
    Some("SPIEN"),
    Some("JTAGEN"),
    Some("OCDEN"),
];

// ATmega48A/88A/168A/328 family
const MEGA48A_FUSE_LOW: BitNames = [
    Some("CKSEL0"),
    Some("CKSEL1"),
    Some("CKSEL2"),
    Some("CKSEL3"),
    Some("SUT0"),
    Some("SUT1"),
    Some("CKOUT"),
    Some("CKDIV8"),
];
const MEGA48A_FUSE_HIGH: BitNames = [
    Some("BODLEVEL0"),
    Some("BODLEVEL1"),
    Some("BODLEVEL2"),
    Some("EESAVE"),
    Some("WDTON"),
    Some("SPIEN"),
    Some("DWEN"),
    Some("RSTDISBL"),
];
const MEGA48A_FUSE_EXTENDED: BitNames = [
    Some("SELFPRGEN"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];
const MEGA88A_FUSE_EXTENDED: BitNames = [
    Some("BOOTRST"),
    Some("BOOTSZ0"),
    Some("BOOTSZ1"),
    None,
    None,
    None,
    None,
    None,
];
const MEGA328A_FUSE_HIGH: BitNames = [
    Some("BOOTRST"),
    Some("BOOTSZ0"),
    Some("BOOTSZ1"),
    Some("EESAVE"),
    Some("WDTON"),
    Some("SPIEN"),
    Some("DWEN"),
    Some("RSTDISBL"),
];
const MEGA328A_FUSE_EXTENDED: BitNames = [
    Some("BODLEVEL0"),
    Some("BODLEVEL1"),
    Some("BODLEVEL2"),
    None,
    None,
    None,
    None,
    None,
];

// ATmega164/324/644/1284 family
const MEGAX4_FUSE_HIGH: BitNames = [
    Some("BOOTRST"),
    Some("BOOTSZ0"),
    Some("BOOTSZ1"),
    Some("EESAVE"),
    Some("WDTON"),
    Some("SPIEN"),
    Some("JTAGEN"),
    Some("OCDEN"),
];

/// ATmega8/16/32 style record: no extended fuse byte
const fn classic(
    signature: u32,
    name: &'static str,
    fuse_low: u8,
    fuse_high: u8,
    fuse_high_bits: &'static BitNames,
) -> DeviceDescriptor {
    DeviceDescriptor {
        signature,
        name,
        flags: SUPPORTED,
        fuse_low,
        fuse_high,
        fuse_extended: 0xFF,
        lock: 0xFF,
        fuse_low_bits: &MEGA8_FUSE_LOW,
        fuse_high_bits,
        fuse_extended_bits: None,
        lock_bits: &STD_LOCK,
    }
}

/// ATmega48A..328P style record
#[allow(clippy::too_many_arguments)]
const fn mega_x8(
    signature: u32,
    name: &'static str,
    flags: DeviceFlags,
    fuse_high: u8,
    fuse_extended: u8,
    fuse_high_bits: &'static BitNames,
    fuse_extended_bits: &'static BitNames,
    lock_bits: &'static BitNames,
) -> DeviceDescriptor {
    DeviceDescriptor {
        signature,
        name,
        flags,
        fuse_low: 0x62,
        fuse_high,
        fuse_extended,
        lock: 0xFF,
        fuse_low_bits: &MEGA48A_FUSE_LOW,
        fuse_high_bits,
        fuse_extended_bits: Some(fuse_extended_bits),
        lock_bits,
    }
}

/// ATmega164/324/644/1284 record, all variants share one definition
const fn mega_x4(signature: u32, name: &'static str) -> DeviceDescriptor {
    DeviceDescriptor {
        signature,
        name,
        flags: SUPPORTED_EXT,
        fuse_low: 0x62,
        fuse_high: 0x99,
        fuse_extended: 0xFF,
        lock: 0xFF,
        fuse_low_bits: &MEGA48A_FUSE_LOW,
        fuse_high_bits: &MEGAX4_FUSE_HIGH,
        fuse_extended_bits: Some(&MEGA328A_FUSE_EXTENDED),
        lock_bits: &STD_LOCK,
    }
}

/// All known devices, in lookup order
pub static DEVICES: &[DeviceDescriptor] = &[
    classic(0x1E9307, "ATmega8/ATmega8A", 0xE1, 0xD9, &MEGA8_FUSE_HIGH),
    classic(
        0x1E9403,
        "ATmega16/ATmega16A",
        0xE1,
        0x99,
        &MEGA32_FUSE_HIGH,
    ),
    classic(
        0x1E9502,
        "ATmega32/ATmega32A",
        0xE1,
        0x99,
        &MEGA32_FUSE_HIGH,
    ),
    // Automotive ATmega88/168: defaults not verified
    mega_x8(
        0x1E930A,
        "ATmega88",
        NONE,
        0xDF,
        0xF9,
        &MEGA48A_FUSE_HIGH,
        &MEGA88A_FUSE_EXTENDED,
        &STD_LOCK,
    ),
    mega_x8(
        0x1E9406,
        "ATmega168",
        NONE,
        0xDF,
        0xF9,
        &MEGA48A_FUSE_HIGH,
        &MEGA88A_FUSE_EXTENDED,
        &STD_LOCK,
    ),
    mega_x8(
        0x1E9205,
        "ATmega48A",
        SUPPORTED_EXT,
        0xDF,
        0xFF,
        &MEGA48A_FUSE_HIGH,
        &MEGA48A_FUSE_EXTENDED,
        &BASE_LOCK,
    ),
    mega_x8(
        0x1E920A,
        "ATmega48PA",
        SUPPORTED_EXT,
        0xDF,
        0xFF,
        &MEGA48A_FUSE_HIGH,
        &MEGA48A_FUSE_EXTENDED,
        &BASE_LOCK,
    ),
    mega_x8(
        0x1E930A,
        "ATmega88A",
        SUPPORTED_EXT,
        0xDF,
        0xF9,
        &MEGA48A_FUSE_HIGH,
        &MEGA88A_FUSE_EXTENDED,
        &STD_LOCK,
    ),
    mega_x8(
        0x1E930F,
        "ATmega88PA",
        SUPPORTED_EXT,
        0xDF,
        0xF9,
        &MEGA48A_FUSE_HIGH,
        &MEGA88A_FUSE_EXTENDED,
        &STD_LOCK,
    ),
    mega_x8(
        0x1E9406,
        "ATmega168A",
        SUPPORTED_EXT,
        0xDF,
        0xF9,
        &MEGA48A_FUSE_HIGH,
        &MEGA88A_FUSE_EXTENDED,
        &STD_LOCK,
    ),
    mega_x8(
        0x1E940B,
        "ATmega168PA",
        SUPPORTED_EXT,
        0xDF,
        0xF9,
        &MEGA48A_FUSE_HIGH,
        &MEGA88A_FUSE_EXTENDED,
        &STD_LOCK,
    ),
    mega_x8(
        0x1E9514,
        "ATmega328",
        SUPPORTED_EXT,
        0xD9,
        0xFF,
        &MEGA328A_FUSE_HIGH,
        &MEGA328A_FUSE_EXTENDED,
        &STD_LOCK,
    ),
    mega_x8(
        0x1E950F,
        "ATmega328P",
        SUPPORTED_EXT,
        0xD9,
        0xFF,
        &MEGA328A_FUSE_HIGH,
        &MEGA328A_FUSE_EXTENDED,
        &STD_LOCK,
    ),
    mega_x4(0x1E940F, "ATmega164A"),
    mega_x4(0x1E940A, "ATmega164P/ATmega164PA"),
    mega_x4(0x1E9515, "ATmega324A"),
    mega_x4(0x1E9508, "ATmega324P"),
    mega_x4(0x1E9511, "ATmega324PA"),
    mega_x4(0x1E9609, "ATmega644/ATmega644A"),
    mega_x4(0x1E960A, "ATmega644P/ATmega644PA"),
    mega_x4(0x1E9706, "ATmega1284"),
    mega_x4(0x1E9705, "ATmega1284P"),
];

/// Find the first device whose signature matches exactly
pub fn lookup(signature: u32) -> Option<&'static DeviceDescriptor> {
    DEVICES.iter().find(|dev| dev.signature == signature)
}

/// Find a device by name (case-insensitive)
///
/// Records that cover several parts ("ATmega8/ATmega8A") match any of the
/// slash-separated names as well as the full record name.
pub fn find_by_name(name: &str) -> Option<&'static DeviceDescriptor> {
    DEVICES.iter().find(|dev| {
        dev.name.eq_ignore_ascii_case(name)
            || dev
                .name
                .split('/')
                .any(|part| part.eq_ignore_ascii_case(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_every_entry() {
        for dev in DEVICES {
            let found = lookup(dev.signature).expect("signature in table");
            assert_eq!(found.signature, dev.signature);
        }
    }

    #[test]
    fn test_lookup_first_match_wins() {
        let dev = lookup(0x1E930A).unwrap();
        assert_eq!(dev.name, "ATmega88");
        assert!(!dev.is_supported());

        let dev = lookup(0x1E9406).unwrap();
        assert_eq!(dev.name, "ATmega168");
        assert!(!dev.is_supported());
    }

    #[test]
    fn test_lookup_miss() {
        assert!(lookup(0xFFFFFF).is_none());
        assert!(lookup(0x000000).is_none());
        assert!(lookup(0x1E9999).is_none());
    }

    #[test]
    fn test_atmega328() {
        let dev = lookup(0x1E9514).unwrap();
        assert_eq!(dev.name, "ATmega328");
        assert!(dev.is_supported());
        assert!(dev.has_extended_fuse());
        assert_eq!(dev.defaults().0, [0x62, 0xD9, 0xFF, 0xFF]);
        assert_eq!(dev.fuse_high_bits[0], Some("BOOTRST"));
    }

    #[test]
    fn test_classic_has_no_extended_fuse() {
        let dev = lookup(0x1E9307).unwrap();
        assert!(dev.is_supported());
        assert!(!dev.has_extended_fuse());
        assert!(dev.fuse_extended_bits.is_none());
        assert_eq!(dev.fuse_extended, 0xFF);
    }

    #[test]
    fn test_find_by_name() {
        assert_eq!(find_by_name("atmega328p").unwrap().signature, 0x1E950F);
        assert_eq!(find_by_name("ATmega8A").unwrap().signature, 0x1E9307);
        assert_eq!(
            find_by_name("ATmega644P/ATmega644PA").unwrap().signature,
            0x1E960A
        );
        assert!(find_by_name("ATtiny85").is_none());
    }
}
