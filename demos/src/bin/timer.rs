//! Timer demo: the firmware clock, timestamp counter statistics and timer
//! events with notification callbacks.

#![no_std]
#![no_main]

use core::ffi::c_void;
use core::ptr::NonNull;

use ignite_demos::{Startup, shutdown, startup, time};
use uefi::boot::{self, EventType, TimerTrigger, Tpl};
use uefi::prelude::*;
use uefi::{Event, ResultExt, print, println, runtime};

/// Prints the firmware's wall clock and its capabilities.
fn test_get_time() {
    let (now, caps) = match runtime::get_time_and_caps() {
        Ok(result) => result,
        Err(err) => {
            log::error!("could not read the firmware clock: {err:?}");
            return;
        }
    };
    println!(
        "time: {:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:09} (tz={}, dst={})",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.nanosecond(),
        now.time_zone().unwrap_or(0),
        now.daylight().bits(),
    );
    println!(
        "date: resolution={}Hz, accuracy={}ppm, tozero={}",
        caps.resolution,
        caps.accuracy / 1_000_000,
        u8::from(caps.sets_to_zero),
    );
}

/// Measures the timestamp counter against 10 one-second timer intervals
/// and reports the spread.
fn test_timestamps() -> uefi::Result {
    let event = unsafe { boot::create_event(EventType::TIMER, Tpl::CALLBACK, None, None) }?;
    boot::set_timer(&event, TimerTrigger::Periodic(1_000 * 1_000 * 10))?;

    boot::wait_for_event(&mut [unsafe { event.unsafe_clone() }]).discard_errdata()?;
    let mut previous = time::timestamp();
    let mut min = u64::MAX;
    let mut max = 0u64;
    for _ in 0..10 {
        boot::wait_for_event(&mut [unsafe { event.unsafe_clone() }]).discard_errdata()?;
        let now = time::timestamp();
        let diff = now - previous;
        println!("interval: {now:016X} ({diff})");
        min = min.min(diff);
        max = max.max(diff);
        previous = now;
    }
    boot::set_timer(&event, TimerTrigger::Cancel)?;
    boot::close_event(event)?;

    let middle = (max + min) / 2;
    println!(
        "ticks per second: min={min}, max={max}, diff={} => timer accuracy: +-{}%",
        max - min,
        100 * (max - min) / middle,
    );
    Ok(())
}

unsafe extern "efiapi" fn notify_tick(_event: Event, _context: Option<NonNull<c_void>>) {
    print!(" 2c\n");
}

/// Runs a waited-on 100 ms timer alongside a 500 ms timer with a notify
/// callback, showing both delivery styles interleaved.
fn test_events() -> uefi::Result {
    if time::calibrate().is_err() {
        log::warn!("could not calibrate timestamps, elapsed time will be nonsense");
    }

    let waited = unsafe { boot::create_event(EventType::TIMER, Tpl::CALLBACK, None, None) }?;
    boot::set_timer(&waited, TimerTrigger::Periodic(100 * 1_000 * 10))?;

    let notified = unsafe {
        boot::create_event(
            EventType::TIMER | EventType::NOTIFY_SIGNAL,
            Tpl::CALLBACK,
            Some(notify_tick),
            None,
        )
    }?;
    boot::set_timer(&notified, TimerTrigger::Periodic(500 * 1_000 * 10))?;

    let start = time::timestamp();
    for iteration in 0..20 {
        boot::wait_for_event(&mut [unsafe { waited.unsafe_clone() }]).discard_errdata()?;
        print!(" {iteration}w");
    }
    let end = time::timestamp();
    println!();
    println!("waited for {:.3}s", time::diff_seconds(start, end));

    boot::set_timer(&waited, TimerTrigger::Cancel)?;
    boot::set_timer(&notified, TimerTrigger::Cancel)?;
    boot::close_event(waited)?;
    boot::close_event(notified)?;
    Ok(())
}

#[entry]
fn main() -> Status {
    if let Startup::Exit(status) = startup(&mut []) {
        return status;
    }

    test_get_time();
    if let Err(err) = test_timestamps() {
        log::error!("timestamp test failed: {err:?}");
    }
    if let Err(err) = test_events() {
        log::error!("event test failed: {err:?}");
    }

    shutdown()
}
