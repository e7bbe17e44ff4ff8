//! PCI device access through the firmware's PCI I/O protocol.
//!
//! The protocol is bound by hand: a `repr(C)` mirror of the function table
//! with the slots the demos use typed out and the rest left as opaque
//! pointers. Access always goes through the firmware, never raw port I/O,
//! so it works on any PCI root the firmware drives.

use alloc::string::String;
use alloc::vec::Vec;
use core::ffi::c_void;
use core::ptr;

use ignite_core::pcidb;
use uefi::boot::{self, OpenProtocolAttributes, OpenProtocolParams, ScopedProtocol};
use uefi::proto::unsafe_protocol;
use uefi::{Status, StatusExt, cstr16, print, println};

/// Access width for PCI I/O reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoWidth {
    U8,
    U16,
    U32,
}

impl IoWidth {
    fn code(self) -> u32 {
        match self {
            IoWidth::U8 => 0,
            IoWidth::U16 => 1,
            IoWidth::U32 => 2,
        }
    }
}

const OPERATION_BUS_MASTER_WRITE: u32 = 1;

type OpaqueFn = unsafe extern "efiapi" fn();
type BarAccessFn = unsafe extern "efiapi" fn(
    this: *mut PciIo,
    width: u32,
    bar_index: u8,
    offset: u64,
    count: usize,
    buffer: *mut c_void,
) -> Status;
type ConfigAccessFn = unsafe extern "efiapi" fn(
    this: *mut PciIo,
    width: u32,
    offset: u32,
    count: usize,
    buffer: *mut c_void,
) -> Status;
type MapFn = unsafe extern "efiapi" fn(
    this: *mut PciIo,
    operation: u32,
    host_address: *const c_void,
    bytes: *mut usize,
    device_address: *mut u64,
    mapping: *mut *mut c_void,
) -> Status;
type UnmapFn = unsafe extern "efiapi" fn(this: *mut PciIo, mapping: *mut c_void) -> Status;
type FlushFn = unsafe extern "efiapi" fn(this: *mut PciIo) -> Status;

#[repr(C)]
struct BarAccess {
    read: BarAccessFn,
    write: BarAccessFn,
}

#[repr(C)]
struct ConfigAccess {
    read: ConfigAccessFn,
    write: ConfigAccessFn,
}

/// `EFI_PCI_IO_PROTOCOL`, field order as in the UEFI specification.
#[repr(C)]
#[unsafe_protocol("4cf5b200-68b8-4ca5-9eec-b23e3f50029a")]
pub struct PciIo {
    poll_mem: OpaqueFn,
    poll_io: OpaqueFn,
    mem: BarAccess,
    io: BarAccess,
    pci: ConfigAccess,
    copy_mem: OpaqueFn,
    map: MapFn,
    unmap: UnmapFn,
    allocate_buffer: OpaqueFn,
    free_buffer: OpaqueFn,
    flush: FlushFn,
    get_location: OpaqueFn,
    attributes: OpaqueFn,
    get_bar_attributes: OpaqueFn,
    set_bar_attributes: OpaqueFn,
    rom_size: u64,
    rom_image: *const c_void,
}

/// A DMA mapping handed out by [`PciIo::map_bus_master_write`].
pub struct Mapping {
    pub device_address: u64,
    pub bytes: usize,
    handle: *mut c_void,
}

impl PciIo {
    /// Reads the first 64 bytes of the device's configuration space.
    pub fn read_config_header(&mut self) -> uefi::Result<ConfigHeader> {
        let mut header = ConfigHeader::default();
        let read = self.pci.read;
        let this = ptr::from_mut(self);
        unsafe {
            read(
                this,
                IoWidth::U8.code(),
                0,
                size_of::<ConfigHeader>(),
                ptr::from_mut(&mut header).cast(),
            )
        }
        .to_result_with_val(|| header)
    }

    /// Reads one register from the I/O space behind `bar`.
    pub fn io_read(&mut self, bar: u8, offset: u64, width: IoWidth) -> uefi::Result<u32> {
        let mut value = 0u32;
        let read = self.io.read;
        let this = ptr::from_mut(self);
        unsafe { read(this, width.code(), bar, offset, 1, ptr::from_mut(&mut value).cast()) }
            .to_result_with_val(|| value)
    }

    /// Writes one register in the I/O space behind `bar`.
    pub fn io_write(&mut self, bar: u8, offset: u64, width: IoWidth, value: u32) -> uefi::Result {
        let mut value = value;
        let write = self.io.write;
        let this = ptr::from_mut(self);
        unsafe { write(this, width.code(), bar, offset, 1, ptr::from_mut(&mut value).cast()) }
            .to_result()
    }

    /// Maps host memory for bus-master writes (device to memory would be
    /// reads; the audio device streams *from* memory, which the protocol
    /// calls a write operation by the bus master).
    pub fn map_bus_master_write(&mut self, host: *const u8, bytes: usize) -> uefi::Result<Mapping> {
        let mut mapped = bytes;
        let mut device_address = 0u64;
        let mut handle = ptr::null_mut();
        let map = self.map;
        let this = ptr::from_mut(self);
        unsafe {
            map(
                this,
                OPERATION_BUS_MASTER_WRITE,
                host.cast(),
                &mut mapped,
                &mut device_address,
                &mut handle,
            )
        }
        .to_result_with_val(|| Mapping {
            device_address,
            bytes: mapped,
            handle,
        })
    }

    pub fn unmap(&mut self, mapping: &Mapping) -> uefi::Result {
        let unmap = self.unmap;
        let this = ptr::from_mut(self);
        unsafe { unmap(this, mapping.handle) }.to_result()
    }

    /// Flushes posted writes to the device.
    pub fn flush(&mut self) -> uefi::Result {
        let flush = self.flush;
        let this = ptr::from_mut(self);
        unsafe { flush(this) }.to_result()
    }
}

/// A type 00h configuration space header.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigHeader {
    pub vendor_id: u16,
    pub device_id: u16,
    pub command: u16,
    pub status: u16,
    pub revision_id: u8,
    /// program interface, subclass, base class
    pub class_code: [u8; 3],
    pub cache_line_size: u8,
    pub latency_timer: u8,
    pub header_type: u8,
    pub bist: u8,
    pub bars: [u32; 6],
    pub cardbus_cis: u32,
    pub subsystem_vendor_id: u16,
    pub subsystem_id: u16,
    pub expansion_rom_base: u32,
    pub capabilities: u8,
    reserved: [u8; 7],
    pub interrupt_line: u8,
    pub interrupt_pin: u8,
    pub min_grant: u8,
    pub max_latency: u8,
}

/// One enumerated PCI device: the open protocol and its cached
/// configuration header.
pub struct PciDevice {
    pub io: ScopedProtocol<PciIo>,
    pub config: ConfigHeader,
}

/// Opens every PCI I/O handle in the system. The protocol is opened
/// non-exclusively: these devices usually have firmware drivers attached,
/// and an exclusive open would disconnect them.
pub fn enumerate() -> Vec<PciDevice> {
    let handles = match boot::find_handles::<PciIo>() {
        Ok(handles) => handles,
        Err(err) => {
            log::error!("could not locate PCI I/O handles: {err:?}");
            return Vec::new();
        }
    };
    log::debug!("found {} PCI I/O handle(s)", handles.len());

    let mut devices = Vec::new();
    for handle in handles {
        let params = OpenProtocolParams {
            handle,
            agent: boot::image_handle(),
            controller: None,
        };
        let mut io =
            match unsafe { boot::open_protocol::<PciIo>(params, OpenProtocolAttributes::GetProtocol) } {
                Ok(io) => io,
                Err(err) => {
                    log::warn!("could not open PCI I/O protocol: {err:?}");
                    continue;
                }
            };
        match io.read_config_header() {
            Ok(config) => devices.push(PciDevice { io, config }),
            Err(err) => log::warn!("could not read configuration header: {err:?}"),
        }
    }
    devices
}

/// Finds a device by vendor and device ID.
pub fn find_device(devices: &mut [PciDevice], vendor_id: u16, device_id: u16) -> Option<&mut PciDevice> {
    devices
        .iter_mut()
        .find(|device| device.config.vendor_id == vendor_id && device.config.device_id == device_id)
}

/// Loads the optional `pci.ids` device name database from the boot volume.
pub fn load_device_names() -> Option<Vec<u8>> {
    crate::files::read(cstr16!("\\pci.ids"))
}

/// Prints a device's identity and configuration summary.
pub fn describe_device(config: &ConfigHeader, names: Option<&[u8]>) {
    let name = match names {
        Some(names) => pcidb::device_label(names, config.vendor_id, config.device_id),
        None => String::from("(unknown)"),
    };
    println!("[{:04X}:{:04X}] {}", config.vendor_id, config.device_id, name);
    println!("       type: {}", pcidb::class_label(&config.class_code));
    println!("       status={:04X}, command={:04X}", config.status, config.command);
    println!(
        "       prog_if={:02X}, baseclass_code={:02X}, subclass_code={:02X}, revision_id={:02X}",
        config.class_code[0], config.class_code[2], config.class_code[1], config.revision_id
    );
}

/// Prints all enumerated devices.
pub fn print_devices(devices: &[PciDevice], names: Option<&[u8]>) {
    for (index, device) in devices.iter().enumerate() {
        print!("  #{index:02}: ");
        describe_device(&device.config, names);
    }
}

/// Prints the built-in class and subclass name tables.
pub fn print_known_classes() {
    for class in pcidb::CLASSES {
        println!("PCI class {:02X}: {}", class.code, class.name);
        if class.subclasses.is_empty() {
            println!("  (no subclass entries)");
            continue;
        }
        for subclass in class.subclasses {
            println!("  subclass {:02X}: {}", subclass.code, subclass.name);
        }
    }
}
