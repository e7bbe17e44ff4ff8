//! CPU timestamps, calibrated against the firmware timer.

use core::arch::asm;
use core::sync::atomic::{AtomicU64, Ordering};

use uefi::ResultExt;
use uefi::boot::{self, EventType, TimerTrigger, Tpl};

static TICKS_PER_SECOND: AtomicU64 = AtomicU64::new(0);

/// Reads the CPU's timestamp counter.
pub fn timestamp() -> u64 {
    let high: u32;
    let low: u32;
    unsafe {
        asm!("rdtsc", out("edx") high, out("eax") low, options(nomem, nostack));
    }
    (u64::from(high) << 32) | u64::from(low)
}

/// Measures the timestamp frequency against a periodic 1 s firmware timer.
/// Takes up to 2 seconds; must run before [`ticks_per_second`] or
/// [`diff_seconds`] mean anything.
pub fn calibrate() -> uefi::Result {
    let event = unsafe { boot::create_event(EventType::TIMER, Tpl::CALLBACK, None, None) }?;
    boot::set_timer(&event, TimerTrigger::Periodic(1_000 * 1_000 * 10))?;

    boot::wait_for_event(&mut [unsafe { event.unsafe_clone() }]).discard_errdata()?;
    let start = timestamp();
    boot::wait_for_event(&mut [unsafe { event.unsafe_clone() }]).discard_errdata()?;
    let end = timestamp();

    boot::set_timer(&event, TimerTrigger::Cancel)?;
    TICKS_PER_SECOND.store(end - start, Ordering::Relaxed);
    log::debug!("timestamp counter runs at {} ticks per second", end - start);
    Ok(())
}

pub fn ticks_per_second() -> u64 {
    TICKS_PER_SECOND.load(Ordering::Relaxed)
}

/// Seconds elapsed between two [`timestamp`] readings.
pub fn diff_seconds(start: u64, end: u64) -> f64 {
    end.wrapping_sub(start) as f64 / ticks_per_second() as f64
}
