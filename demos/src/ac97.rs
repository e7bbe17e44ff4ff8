//! AC'97 playback driver.
//!
//! Talks to an Intel 82801AA compatible audio controller (the device QEMU
//! and VirtualBox emulate) through the PCI I/O protocol: a 32-entry buffer
//! descriptor ring in low memory, the mixer behind BAR 0 and the bus
//! master registers behind BAR 1.

use alloc::string::String;
use core::ptr::NonNull;
use core::time::Duration;

use ignite_core::ac97::{
    BUFFER_COUNT, BufferDescriptor, BusmasterStatus, CIV_PCM_OUT, CONTROL_PCM_OUT,
    DESCRIPTOR_PCM_OUT, LVI_PCM_OUT, MIXER_MASTER, MIXER_PCM_OUT, PCM_RATE_FRONT, PCM_RATE_LFE,
    PCM_RATE_SURROUND, RegisterWidth, STATUS_PCM_OUT, busmaster_register_width, mixer_value,
};
use ignite_core::args::{self, Arg, Value};
use uefi::{boot, println};

use crate::mem;
use crate::pci::{IoWidth, Mapping, PciDevice};

/// The 82801AA AC'97 audio controller.
pub const VENDOR_ID: u16 = 0x8086;
pub const DEVICE_ID: u16 = 0x2415;

/// 16-bit samples one ring buffer can hold (64Ki samples, 128 KiB).
pub const SAMPLES_PER_RING_BUFFER: usize = 65536;

/// The descriptor ring sits at the start of the DMA area, sample data
/// right behind it.
const DATA_OFFSET: usize = BUFFER_COUNT * size_of::<BufferDescriptor>();
const DMA_BYTES: usize = DATA_OFFSET + BUFFER_COUNT * SAMPLES_PER_RING_BUFFER * 2;

const AUX_OUT_VOLUME: u64 = 0x04;
const MONO_VOLUME: u64 = 0x06;
const VENDOR_ID1: u64 = 0x7c;
const VENDOR_ID2: u64 = 0x7e;

pub const GROUP_TITLE: &str = "Audio options";

fn validate_volume(value: &Value) -> Result<(), String> {
    args::validate_double_range(value, "-volume", 0.0, 1.0)
}

fn validate_sample_rate(value: &Value) -> Result<(), String> {
    match value {
        Value::Int(rate) if (1..65535).contains(rate) => Ok(()),
        _ => Err(String::from("-sample-rate must be below 65535, double-rate audio is not supported")),
    }
}

/// The audio argument group: `-mute`, `-volume` and `-sample-rate`, in
/// that order.
pub fn argument_list() -> [Arg; 3] {
    [
        Arg::flag("-mute", "mutes output"),
        Arg::double("-volume", 0.66, "sets output volume min=0.0, max=1.0").validated_by(validate_volume),
        Arg::int("-sample-rate", 44100, "sets sample rate (only 48000 guaranteed by AC'97 specs)")
            .validated_by(validate_sample_rate),
    ]
}

#[derive(Debug)]
pub enum AudioError {
    OutOfMemory,
    /// The firmware mapped the DMA area above the 32-bit boundary the
    /// device can address.
    Unmappable,
    Firmware(uefi::Status),
}

/// An initialized controller: descriptor ring programmed, DMA area mapped.
pub struct Ac97<'d> {
    device: &'d mut PciDevice,
    base: NonNull<u8>,
    pages: usize,
    mapping: Option<Mapping>,
    device_address: u32,
    max_master_volume: u8,
}

impl<'d> Ac97<'d> {
    /// Allocates the DMA area, maps it for bus mastering and programs the
    /// descriptor ring base register.
    pub fn init(device: &'d mut PciDevice) -> Result<Ac97<'d>, AudioError> {
        let pages = DMA_BYTES / mem::PAGE_SIZE + 1;
        let base = mem::allocate_pages_below(u64::from(u32::MAX), pages).ok_or(AudioError::OutOfMemory)?;
        unsafe { core::ptr::write_bytes(base.as_ptr(), 0, pages * mem::PAGE_SIZE) };

        let mapping = match device.io.map_bus_master_write(base.as_ptr(), DMA_BYTES) {
            Ok(mapping) => mapping,
            Err(err) => {
                mem::free_pages(base, pages);
                return Err(AudioError::Firmware(err.status()));
            }
        };
        log::debug!(
            "mapped {} bytes for playback, device address {:#010x}",
            mapping.bytes,
            mapping.device_address
        );
        if mapping.device_address > u64::from(u32::MAX) {
            let _ = device.io.unmap(&mapping);
            mem::free_pages(base, pages);
            return Err(AudioError::Unmappable);
        }
        let device_address = mapping.device_address as u32;

        let mut driver = Ac97 {
            device,
            base,
            pages,
            mapping: Some(mapping),
            device_address,
            max_master_volume: 0x1f,
        };
        driver.init_descriptors();
        if let Err(err) = driver.write_busmaster(DESCRIPTOR_PCM_OUT, device_address) {
            let status = err.status();
            driver.close();
            return Err(AudioError::Firmware(status));
        }
        driver.determine_maximum_master_volume();
        Ok(driver)
    }

    fn init_descriptors(&mut self) {
        let device_address = self.device_address;
        for (index, descriptor) in self.descriptors_mut().iter_mut().enumerate() {
            *descriptor = BufferDescriptor {
                address: device_address + (DATA_OFFSET + index * SAMPLES_PER_RING_BUFFER * 2) as u32,
                length: 0,
                control: 0,
            };
        }
    }

    fn descriptors_mut(&mut self) -> &mut [BufferDescriptor] {
        unsafe { core::slice::from_raw_parts_mut(self.base.as_ptr().cast(), BUFFER_COUNT) }
    }

    /// One ring buffer's sample storage, interleaved stereo.
    pub fn buffer_mut(&mut self, index: usize) -> &mut [i16] {
        let offset = DATA_OFFSET + index * SAMPLES_PER_RING_BUFFER * 2;
        unsafe {
            core::slice::from_raw_parts_mut(
                self.base.as_ptr().add(offset).cast(),
                SAMPLES_PER_RING_BUFFER,
            )
        }
    }

    /// Sets how many 16-bit samples the device plays from one ring entry.
    pub fn set_buffer_length(&mut self, index: usize, samples: u16) {
        self.descriptors_mut()[index].length = samples;
    }

    pub fn read_mixer(&mut self, reg: u64) -> uefi::Result<u16> {
        self.device.io.io_read(0, reg, IoWidth::U16).map(|value| value as u16)
    }

    pub fn write_mixer(&mut self, reg: u64, value: u16) -> uefi::Result {
        self.device.io.io_write(0, reg, IoWidth::U16, u32::from(value))
    }

    fn busmaster_width(reg: u64) -> IoWidth {
        match busmaster_register_width(reg) {
            RegisterWidth::Byte => IoWidth::U8,
            RegisterWidth::Word => IoWidth::U16,
            RegisterWidth::DoubleWord => IoWidth::U32,
        }
    }

    pub fn read_busmaster(&mut self, reg: u64) -> uefi::Result<u32> {
        self.device.io.io_read(1, reg, Self::busmaster_width(reg))
    }

    pub fn write_busmaster(&mut self, reg: u64, value: u32) -> uefi::Result {
        self.device.io.io_write(1, reg, Self::busmaster_width(reg), value)
    }

    /// Probes whether the codec's master volume has 5 or 6 significant
    /// bits: write a value with bit 5 set and see if it sticks.
    fn determine_maximum_master_volume(&mut self) {
        let probe = mixer_value(0x20, 0x20, true);
        if self.write_mixer(MIXER_MASTER, probe).is_err() {
            return;
        }
        match self.read_mixer(MIXER_MASTER) {
            Ok(read) if read == probe => self.max_master_volume = 0x3f,
            _ => self.max_master_volume = 0x1f,
        }
        log::debug!("maximum master volume attenuation: {:#04x}", self.max_master_volume);
    }

    pub fn max_master_volume(&self) -> u8 {
        self.max_master_volume
    }

    /// Programs the master and PCM OUT volumes from a level between 0.0
    /// and 1.0. The mixer registers hold attenuation, so 0 is loudest;
    /// PCM OUT stays at full volume and the master does the scaling.
    pub fn set_volume(&mut self, volume: f64, mute: bool) -> uefi::Result {
        let volume = volume.clamp(0.0, 1.0);
        let master = self.max_master_volume - (volume * f64::from(self.max_master_volume)) as u8;
        log::debug!("master attenuation {master}, mute={mute}");
        self.write_mixer(MIXER_MASTER, mixer_value(master, master, mute))?;
        self.write_mixer(MIXER_PCM_OUT, mixer_value(0, 0, mute))
    }

    /// Sets the DAC sample rate on all PCM OUT channels. Some codecs
    /// reset the mute flag on a rate change, so set the volume afterwards.
    pub fn set_sample_rate(&mut self, rate: u16) -> uefi::Result {
        self.write_mixer(PCM_RATE_FRONT, rate)?;
        self.write_mixer(PCM_RATE_SURROUND, rate)?;
        self.write_mixer(PCM_RATE_LFE, rate)
    }

    /// Flushes posted writes, making sure descriptor and sample updates
    /// reached memory before the device reads them.
    pub fn flush(&mut self) -> uefi::Result {
        self.device.io.flush()
    }

    /// Marks the last ring entry the device should play.
    pub fn set_last_valid_index(&mut self, index: u8) -> uefi::Result {
        self.write_busmaster(LVI_PCM_OUT, u32::from(index))
    }

    /// The ring entry the device is currently playing.
    pub fn current_index(&mut self) -> uefi::Result<u8> {
        self.read_busmaster(CIV_PCM_OUT).map(|value| value as u8)
    }

    /// Clears the status flags and starts the PCM OUT DMA engine.
    pub fn play(&mut self) -> uefi::Result {
        if self.write_busmaster(STATUS_PCM_OUT, 0x1c).is_err() {
            log::warn!("could not reset PCM OUT status flags");
        }
        self.write_busmaster(CONTROL_PCM_OUT, 0x15)
    }

    /// Polls the PCM OUT status until the last valid buffer finished, at
    /// most `timeout_ms` milliseconds.
    pub fn wait_until_last_buffer_sent(&mut self, timeout_ms: usize) {
        const POLL_INTERVAL_US: usize = 30_000;
        for _ in 0..timeout_ms * 1000 / POLL_INTERVAL_US {
            let Ok(raw) = self.read_busmaster(STATUS_PCM_OUT) else {
                return;
            };
            let status = BusmasterStatus::from_raw(raw as u16);
            log::trace!("PCM OUT status {raw:04x}: {status:?}");
            if status.last_valid_interrupt {
                break;
            }
            boot::stall(Duration::from_micros(POLL_INTERVAL_US as u64));
        }
    }

    /// Prints the mixer's volume registers, DAC rates and codec identity.
    pub fn dump_registers(&mut self) {
        println!("audio device:");
        for (name, reg) in [
            ("master_vol", MIXER_MASTER),
            ("aux_out_vol", AUX_OUT_VOLUME),
            ("pcm_out_vol", MIXER_PCM_OUT),
        ] {
            if let Ok(value) = self.read_mixer(reg) {
                let left = (value >> 8) & 0x3f;
                let right = value & 0x3f;
                println!(
                    "  {name}={value:04X}: l={}%,r={}%{}",
                    100 - 100 * left / 63,
                    100 - 100 * right / 63,
                    mute_suffix(value)
                );
            }
        }
        if let Ok(value) = self.read_mixer(MONO_VOLUME) {
            println!(
                "  mono_vol={value:04X}: vol={}%{}",
                100 - 100 * (value & 0x3f) / 63,
                mute_suffix(value)
            );
        }
        for (name, reg) in [
            ("PCM Front DAC Rate", PCM_RATE_FRONT),
            ("PCM Surround DAC Rate", PCM_RATE_SURROUND),
            ("PCM LFE DAC Rate", PCM_RATE_LFE),
        ] {
            if let Ok(value) = self.read_mixer(reg) {
                println!("  {name}: {value}Hz");
            }
        }
        if let (Ok(id1), Ok(id2)) = (self.read_mixer(VENDOR_ID1), self.read_mixer(VENDOR_ID2)) {
            println!(
                "  vendor_id={}{}{}, device_id={:02X}",
                (id1 >> 8) as u8 as char,
                (id1 & 0xff) as u8 as char,
                (id2 >> 8) as u8 as char,
                id2 & 0xff
            );
        }
    }

    /// Unmaps the DMA area and frees it. Failures are logged; there is
    /// nothing more to do about them at this point.
    pub fn close(mut self) {
        if let Some(mapping) = self.mapping.take() {
            if self.device.io.unmap(&mapping).is_err() {
                log::warn!("could not unmap audio transfer buffer");
            }
        }
        if !mem::free_pages(self.base, self.pages) {
            log::warn!("could not free audio sample memory");
        }
    }
}

fn mute_suffix(value: u16) -> &'static str {
    if value & 0x8000 != 0 { " (muted)" } else { "" }
}
