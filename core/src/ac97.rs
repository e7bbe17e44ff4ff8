//! AC'97 codec definitions and tone generation.
//!
//! Register layout and semantics follow the AC'97 specification and Intel's
//! ICH programmer's reference. The hardware access itself lives with the
//! UEFI-facing code; this module holds everything that can be computed
//! without a device.

/// Number of entries in the buffer descriptor ring, the maximum AC'97
/// supports.
pub const BUFFER_COUNT: usize = 32;

// mixer (NAM) registers
pub const MIXER_RESET: u64 = 0x00;
pub const MIXER_MASTER: u64 = 0x02;
pub const MIXER_PCM_OUT: u64 = 0x18;
pub const PCM_RATE_FRONT: u64 = 0x2c;
pub const PCM_RATE_SURROUND: u64 = 0x2e;
pub const PCM_RATE_LFE: u64 = 0x30;

// bus master (NABM) registers
pub const DESCRIPTOR_PCM_OUT: u64 = 0x10;
pub const CIV_PCM_OUT: u64 = 0x14;
pub const LVI_PCM_OUT: u64 = 0x15;
pub const STATUS_PCM_OUT: u64 = 0x16;
pub const CONTROL_PCM_OUT: u64 = 0x1b;
pub const GLOBAL_CONTROL: u64 = 0x2c;

/// Access width of a bus master register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterWidth {
    Byte,
    Word,
    DoubleWord,
}

/// Selects the access width for a bus master register. The descriptor base
/// and global control registers are 32 bits wide, the status register 16,
/// everything else 8.
pub fn busmaster_register_width(reg: u64) -> RegisterWidth {
    match reg {
        DESCRIPTOR_PCM_OUT | GLOBAL_CONTROL => RegisterWidth::DoubleWord,
        STATUS_PCM_OUT => RegisterWidth::Word,
        _ => RegisterWidth::Byte,
    }
}

/// Assembles a stereo mixer register value from two 6-bit channel levels
/// and the mute bit.
pub const fn mixer_value(left: u8, right: u8, mute: bool) -> u16 {
    (((left & 0x3f) as u16) << 8) | (right & 0x3f) as u16 | if mute { 0x8000 } else { 0 }
}

/// One entry of the buffer descriptor ring, as transferred to the device.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct BufferDescriptor {
    /// physical address of the sample data, must be reachable in 32 bits
    pub address: u32,
    /// length of the sample data in bytes
    pub length: u16,
    /// bit 15: interrupt on completion, bit 14: buffer underrun policy
    pub control: u16,
}

/// Decoded PCM OUT status register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusmasterStatus {
    pub dma_halted: bool,
    pub current_equals_last_valid: bool,
    pub last_valid_interrupt: bool,
    pub completion_interrupt: bool,
    pub fifo_error: bool,
}

impl BusmasterStatus {
    pub const fn from_raw(raw: u16) -> BusmasterStatus {
        BusmasterStatus {
            dma_halted: raw & 0x01 != 0,
            current_equals_last_valid: raw & 0x02 != 0,
            last_valid_interrupt: raw & 0x04 != 0,
            completion_interrupt: raw & 0x08 != 0,
            fifo_error: raw & 0x10 != 0,
        }
    }
}

/// One octave of the harmonic major scale, as frequency ratios.
pub const HARMONIC_SCALE: [f32; 8] = [
    1.0,
    1.12246204830937,
    1.25992104989487,
    1.33483985417003,
    1.49830707687668,
    1.68179283050743,
    1.88774862536339,
    2.0,
];

/// samples over which a note fades in, avoids clicking between buffers
const ATTACK_SAMPLES: usize = 500;

fn sawtooth(sample: usize, period: usize) -> i16 {
    (((sample % period) * 60000 / period) as i32 - 30000) as i16
}

/// Fills one interleaved stereo buffer with a rising sawtooth on the left
/// channel and a falling one on the right, pitched by the buffer's index in
/// the ring. Not a harmonic scale, so this sounds fairly rough.
pub fn fill_cross_scale(samples: &mut [i16], buffer_index: usize) {
    let left_period = 31 + buffer_index * 3;
    let right_period = 128 - buffer_index * 3;
    for (sample, frame) in samples.chunks_exact_mut(2).enumerate() {
        frame[0] = sawtooth(sample, left_period);
        frame[1] = sawtooth(sample, right_period);
    }
}

/// Fills one interleaved stereo buffer with a note of the harmonic scale.
///
/// The ring plays the scale up and back down across 16 buffers; one channel
/// runs an octave below the other and they swap halfway through. Notes are
/// sawtooth waves around
/// A-440 at the given sample rate, with a short attack ramp.
pub fn fill_harmonic_scale(samples: &mut [i16], buffer_index: usize, sample_rate: u32) {
    let a3 = sample_rate as f32 / 440.0;
    let descending = buffer_index % 16 > 7;
    let scale = if descending {
        HARMONIC_SCALE[7 - buffer_index % 8]
    } else {
        HARMONIC_SCALE[buffer_index % 8]
    };

    let shape = |value: f32, sample: usize| -> i16 {
        let mut value = value * scale;
        value -= value as i64 as f32;
        value -= 0.5;
        value *= 30000.0;
        if sample < ATTACK_SAMPLES {
            value *= sample as f32 / ATTACK_SAMPLES as f32;
        }
        value as i16
    };

    for (sample, frame) in samples.chunks_exact_mut(2).enumerate() {
        let position = sample as f32 / a3;
        let (left, right) = if buffer_index % 16 < 8 {
            (position, position / 2.0)
        } else {
            (position / 2.0, position)
        };
        frame[0] = shape(left, sample);
        frame[1] = shape(right, sample);
    }
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn mixer_value_packs_channels_and_mute() {
        assert_eq!(mixer_value(0, 0, false), 0x0000);
        assert_eq!(mixer_value(0x3f, 0x3f, false), 0x3f3f);
        assert_eq!(mixer_value(8, 8, false), 0x0808);
        assert_eq!(mixer_value(0x20, 0x20, true), 0xa020);
        // out-of-range levels are masked to 6 bits
        assert_eq!(mixer_value(0xff, 0xff, false), 0x3f3f);
    }

    #[test]
    fn busmaster_widths_match_register_layout() {
        assert_eq!(busmaster_register_width(DESCRIPTOR_PCM_OUT), RegisterWidth::DoubleWord);
        assert_eq!(busmaster_register_width(GLOBAL_CONTROL), RegisterWidth::DoubleWord);
        assert_eq!(busmaster_register_width(STATUS_PCM_OUT), RegisterWidth::Word);
        assert_eq!(busmaster_register_width(CIV_PCM_OUT), RegisterWidth::Byte);
        assert_eq!(busmaster_register_width(LVI_PCM_OUT), RegisterWidth::Byte);
        assert_eq!(busmaster_register_width(CONTROL_PCM_OUT), RegisterWidth::Byte);
    }

    #[test]
    fn buffer_descriptor_is_8_bytes() {
        assert_eq!(core::mem::size_of::<BufferDescriptor>(), 8);
    }

    #[test]
    fn status_decodes_bits() {
        let status = BusmasterStatus::from_raw(0x1c);
        assert!(!status.dma_halted);
        assert!(!status.current_equals_last_valid);
        assert!(status.last_valid_interrupt);
        assert!(status.completion_interrupt);
        assert!(status.fifo_error);
    }

    #[test]
    fn cross_scale_generates_sawtooth_periods() {
        let mut samples = vec![0i16; 200];
        fill_cross_scale(&mut samples, 0);
        // left channel: period 31, right channel: period 128
        assert_eq!(samples[0], -30000);
        assert_eq!(samples[1], -30000);
        assert_eq!(samples[2], (60000 / 31 - 30000) as i16);
        assert_eq!(samples[2 * 31], -30000); // wrapped around
        assert!(samples[2 * 30] > 25000);
    }

    #[test]
    fn cross_scale_period_grows_with_buffer_index() {
        let mut low = vec![0i16; 400];
        let mut high = vec![0i16; 400];
        fill_cross_scale(&mut low, 0);
        fill_cross_scale(&mut high, 16);
        // shorter period wraps earlier: index 16 left period is 31+48=79
        assert_eq!(low[2 * 31], -30000);
        assert_ne!(high[2 * 31], -30000);
        assert_eq!(high[2 * 79], -30000);
    }

    #[test]
    fn harmonic_scale_starts_with_attack_ramp() {
        let mut samples = vec![0i16; 4000];
        fill_harmonic_scale(&mut samples, 0, 44100);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[1], 0);
        // well past the ramp the sawtooth spans most of the signed range
        let peak = samples[1000..].iter().map(|&s| s.unsigned_abs()).max().unwrap();
        assert!(peak > 10000 && peak <= 15000);
    }

    #[test]
    fn harmonic_scale_right_channel_is_an_octave_lower() {
        // the right channel runs at half frequency in the first ring half:
        // frame 2k on the right matches frame k on the left once both are
        // past the attack ramp
        let mut samples = vec![0i16; 8000];
        fill_harmonic_scale(&mut samples, 0, 44100);
        for k in 500..1000 {
            assert_eq!(samples[2 * k], samples[2 * (2 * k) + 1]);
        }
    }

    #[test]
    fn harmonic_scale_mirrors_descending_indices() {
        // index 15 maps to the same scale step as index 0
        let mut first = vec![0i16; 2000];
        let mut mirrored = vec![0i16; 2000];
        fill_harmonic_scale(&mut first, 0, 44100);
        fill_harmonic_scale(&mut mirrored, 15, 44100);
        // left of buffer 0 equals right of buffer 15 (same pitch, full volume)
        for (a, b) in first.chunks_exact(2).zip(mirrored.chunks_exact(2)) {
            assert_eq!(a[0], b[1]);
        }
    }
}
