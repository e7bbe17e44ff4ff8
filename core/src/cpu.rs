//! CPUID leaf decoding.
//!
//! Takes the raw register values of the identification leaves and decodes
//! vendor string, processor signature and capability flags.

/// Builds the 12-character vendor ID from leaf 0: the bytes of ebx, edx
/// and ecx in that order, each register least significant byte first.
pub fn vendor_id(ebx: u32, edx: u32, ecx: u32) -> [u8; 12] {
    let mut id = [0u8; 12];
    id[0..4].copy_from_slice(&ebx.to_le_bytes());
    id[4..8].copy_from_slice(&edx.to_le_bytes());
    id[8..12].copy_from_slice(&ecx.to_le_bytes());
    id
}

/// The processor signature fields of leaf 1's eax.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub stepping: u8,
    pub model: u8,
    pub family: u8,
    pub processor_type: u8,
    pub extended_model: u8,
    pub extended_family: u8,
}

impl Signature {
    pub const fn from_eax(eax: u32) -> Signature {
        Signature {
            stepping: (eax & 0xf) as u8,
            model: ((eax >> 4) & 0xf) as u8,
            family: ((eax >> 8) & 0xf) as u8,
            processor_type: ((eax >> 12) & 0x3) as u8,
            extended_model: ((eax >> 16) & 0xf) as u8,
            extended_family: ((eax >> 20) & 0xff) as u8,
        }
    }
}

/// Which leaf 1 register a capability flag lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagRegister {
    Edx,
    Ecx,
}

/// A named leaf 1 capability flag.
pub struct Feature {
    pub name: &'static str,
    pub register: FlagRegister,
    pub bit: u8,
}

impl Feature {
    pub fn is_set(&self, edx: u32, ecx: u32) -> bool {
        let register = match self.register {
            FlagRegister::Edx => edx,
            FlagRegister::Ecx => ecx,
        };
        register & (1 << self.bit) != 0
    }
}

/// The capability flags reported, in output order.
pub const FEATURES: &[Feature] = &[
    Feature { name: "fpu", register: FlagRegister::Edx, bit: 0 },
    Feature { name: "msr", register: FlagRegister::Edx, bit: 5 },
    Feature { name: "apic", register: FlagRegister::Edx, bit: 9 },
    Feature { name: "mmx", register: FlagRegister::Edx, bit: 23 },
    Feature { name: "sse", register: FlagRegister::Edx, bit: 25 },
    Feature { name: "sse2", register: FlagRegister::Edx, bit: 26 },
    Feature { name: "htt", register: FlagRegister::Edx, bit: 28 },
    Feature { name: "sse3", register: FlagRegister::Ecx, bit: 0 },
    Feature { name: "ssse3", register: FlagRegister::Ecx, bit: 9 },
    Feature { name: "sse4.1", register: FlagRegister::Ecx, bit: 19 },
    Feature { name: "sse4.2", register: FlagRegister::Ecx, bit: 20 },
    Feature { name: "aes", register: FlagRegister::Ecx, bit: 25 },
    Feature { name: "avx", register: FlagRegister::Ecx, bit: 28 },
    Feature { name: "hypervisor", register: FlagRegister::Ecx, bit: 31 },
];

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_id_orders_register_bytes() {
        // "GenuineIntel" as returned in ebx/edx/ecx
        let id = vendor_id(0x756e_6547, 0x4965_6e69, 0x6c65_746e);
        assert_eq!(&id, b"GenuineIntel");
    }

    #[test]
    fn signature_splits_eax_fields() {
        let signature = Signature::from_eax(0x000a_06f3);
        assert_eq!(signature.stepping, 3);
        assert_eq!(signature.model, 0xf);
        assert_eq!(signature.family, 6);
        assert_eq!(signature.processor_type, 0);
        assert_eq!(signature.extended_model, 0xa);
        assert_eq!(signature.extended_family, 0);
    }

    #[test]
    fn features_check_the_right_register() {
        let sse2 = FEATURES.iter().find(|f| f.name == "sse2").unwrap();
        assert!(sse2.is_set(1 << 26, 0));
        assert!(!sse2.is_set(0, 1 << 26));

        let hypervisor = FEATURES.iter().find(|f| f.name == "hypervisor").unwrap();
        assert!(hypervisor.is_set(0, 1 << 31));
        assert!(!hypervisor.is_set(1 << 31, 0));
    }
}
