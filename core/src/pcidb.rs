//! PCI device and class name lookups.
//!
//! Device names come from a `pci.ids` database file (plain text, as shipped
//! with most operating systems); class and subclass names come from a small
//! built-in table.

use alloc::format;
use alloc::string::String;

/// A named PCI subclass within a base class.
pub struct SubclassName {
    pub code: u8,
    pub name: &'static str,
}

/// A named PCI base class and its known subclasses.
pub struct BaseClassName {
    pub code: u8,
    pub name: &'static str,
    pub subclasses: &'static [SubclassName],
}

/// The built-in table of known PCI classes.
pub const CLASSES: &[BaseClassName] = &[
    BaseClassName {
        code: 0x01,
        name: "Mass Storage Controller",
        subclasses: &[
            SubclassName { code: 0, name: "SCSI Controller" },
            SubclassName { code: 1, name: "IDE Controller" },
            SubclassName { code: 2, name: "Floppy Disk Controller" },
            SubclassName { code: 4, name: "RAID Controller" },
            SubclassName { code: 5, name: "ATA Controller" },
            SubclassName { code: 6, name: "SATA Controller" },
            SubclassName { code: 7, name: "SAS Controller" },
            SubclassName { code: 0x80, name: "Other" },
        ],
    },
    BaseClassName {
        code: 0x02,
        name: "Network Controller",
        subclasses: &[SubclassName { code: 0, name: "Ethernet" }],
    },
    BaseClassName {
        code: 0x03,
        name: "Display Controller",
        subclasses: &[
            SubclassName { code: 0, name: "VGA" },
            SubclassName { code: 1, name: "XGA" },
            SubclassName { code: 0x80, name: "Other" },
        ],
    },
    BaseClassName {
        code: 0x04,
        name: "Multimedia",
        subclasses: &[
            SubclassName { code: 0, name: "Video Device" },
            SubclassName { code: 1, name: "Audio Device" },
        ],
    },
    BaseClassName {
        code: 0x06,
        name: "Bridge Device",
        subclasses: &[
            SubclassName { code: 0, name: "Host/PCI" },
            SubclassName { code: 1, name: "PCI/ISA" },
            SubclassName { code: 2, name: "PCI/EISA" },
            SubclassName { code: 3, name: "PCI/Micro Channel" },
            SubclassName { code: 4, name: "PCI/PCI" },
            SubclassName { code: 5, name: "PCI/PCMCIA" },
            SubclassName { code: 6, name: "PCI/NuBus" },
            SubclassName { code: 7, name: "PCI/CardBus" },
            SubclassName { code: 0x80, name: "Other" },
        ],
    },
    BaseClassName {
        code: 0x08,
        name: "Base System Peripheral",
        subclasses: &[SubclassName { code: 0x80, name: "Other" }],
    },
    BaseClassName {
        code: 0x0c,
        name: "Serial Bus Controller",
        subclasses: &[
            SubclassName { code: 0, name: "IEEE 1394 Controller (FireWire)" },
            SubclassName { code: 3, name: "USB Controller" },
        ],
    },
];

/// Formats a 3-byte PCI class code as "base class, subclass", with
/// "unknown" standing in for entries missing from the built-in table.
/// The code bytes are ordered as in the configuration header: program
/// interface, subclass, base class.
pub fn class_label(class_code: &[u8; 3]) -> String {
    let base_class = class_code[2];
    let sub_class = class_code[1];

    let mut base_name = "unknown";
    let mut sub_name = "unknown";
    if let Some(base) = CLASSES.iter().find(|c| c.code == base_class) {
        base_name = base.name;
        if let Some(sub) = base.subclasses.iter().find(|s| s.code == sub_class) {
            sub_name = sub.name;
        }
    }
    format!("{base_name}, {sub_name}")
}

fn hex4(value: u16) -> [u8; 4] {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    [
        DIGITS[(value >> 12) as usize & 0xf],
        DIGITS[(value >> 8) as usize & 0xf],
        DIGITS[(value >> 4) as usize & 0xf],
        DIGITS[value as usize & 0xf],
    ]
}

/// Looks up a device name in `pci.ids` data and formats it as
/// "vendor, device".
///
/// Vendor lines start with 4 lowercase hex digits, device lines below them
/// with a tab. Comment lines are skipped; the first line that is neither a
/// comment nor a device entry ends the vendor's block. Unknown vendors
/// yield "(unknown)", unknown devices "vendor, unknown device".
/// Subsystem IDs are not resolved.
pub fn device_label(ids: &[u8], vendor_id: u16, device_id: u16) -> String {
    let vendor_hex = hex4(vendor_id);
    let device_hex = hex4(device_id);

    let mut lines = ids.split(|&b| b == b'\n');
    let mut vendor_name = None;
    for line in lines.by_ref() {
        if line.len() >= 6 && line[..4] == vendor_hex && line[4] == b' ' && line[5] == b' ' {
            vendor_name = Some(String::from_utf8_lossy(&line[6..]).into_owned());
            break;
        }
    }
    let Some(vendor_name) = vendor_name else {
        return String::from("(unknown)");
    };

    let mut device_name = String::from("unknown device");
    for line in lines {
        match line.first() {
            Some(b'#') => continue,
            Some(b'\t') => {}
            _ => break,
        }
        if line.len() >= 7 && line[1..5] == device_hex && line[5] == b' ' && line[6] == b' ' {
            device_name = String::from_utf8_lossy(&line[7..]).into_owned();
            break;
        }
    }
    format!("{vendor_name}, {device_name}")
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests {
    use super::*;

    const IDS: &[u8] = b"#\n# List of PCI ID's\n#\n\n8086  Intel Corporation\n\t1237  440FX - 82441FX PMC [Natoma]\n# a comment inside the block\n\t2415  82801AA AC'97 Audio Controller\n80ee  InnoTek Systemberatung GmbH\n\tbeef  VirtualBox Graphics Adapter\n";

    #[test]
    fn resolves_vendor_and_device() {
        assert_eq!(
            device_label(IDS, 0x8086, 0x2415),
            "Intel Corporation, 82801AA AC'97 Audio Controller"
        );
        assert_eq!(
            device_label(IDS, 0x80ee, 0xbeef),
            "InnoTek Systemberatung GmbH, VirtualBox Graphics Adapter"
        );
    }

    #[test]
    fn device_scan_stops_at_next_vendor() {
        // 0xbeef exists, but under another vendor
        assert_eq!(
            device_label(IDS, 0x8086, 0xbeef),
            "Intel Corporation, unknown device"
        );
    }

    #[test]
    fn unknown_vendor_yields_placeholder() {
        assert_eq!(device_label(IDS, 0x1234, 0x5678), "(unknown)");
    }

    #[test]
    fn comment_lines_are_skipped() {
        assert_eq!(
            device_label(IDS, 0x8086, 0x1237),
            "Intel Corporation, 440FX - 82441FX PMC [Natoma]"
        );
    }

    #[test]
    fn class_labels_resolve_from_builtin_table() {
        // prog_if, subclass, base class
        assert_eq!(class_label(&[0x00, 0x01, 0x04]), "Multimedia, Audio Device");
        assert_eq!(
            class_label(&[0x00, 0x03, 0x0c]),
            "Serial Bus Controller, USB Controller"
        );
        assert_eq!(class_label(&[0x00, 0x42, 0x03]), "Display Controller, unknown");
        assert_eq!(class_label(&[0x00, 0x00, 0xff]), "unknown, unknown");
    }

    #[test]
    fn hex4_is_lowercase() {
        assert_eq!(&hex4(0x80ee), b"80ee");
        assert_eq!(&hex4(0x0001), b"0001");
    }
}
