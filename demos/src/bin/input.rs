//! Keyboard input demo: blocking reads, reads through an explicitly
//! chosen input handle, and a polled burst-typing window.

#![no_std]
#![no_main]

use core::time::Duration;

use ignite_core::args::{Arg, ArgGroup};
use ignite_demos::{Startup, console, shutdown, startup};
use uefi::boot::{self, OpenProtocolAttributes, OpenProtocolParams};
use uefi::proto::console::text::{Input, Key};
use uefi::prelude::*;
use uefi::{print, println};

fn print_key(key: Option<Key>) {
    match key {
        Some(Key::Printable(chr)) => {
            let value = u16::from(chr);
            println!("done: scancode=0000, char={} ({value:04X})", char::from(chr));
        }
        Some(Key::Special(scan)) => println!("done: scancode={:04X}, char= (0000)", scan.0),
        None => println!("done: no key data"),
    }
}

fn is_quit(key: &Option<Key>) -> bool {
    matches!(key, Some(Key::Printable(chr)) if char::from(*chr) == 'q')
}

/// Blocking reads through the system console input.
fn test_simple_input() {
    for _ in 0..1000 {
        print!("waiting for key (q to exit)... ");
        let event = uefi::system::with_stdin(|stdin| unsafe { stdin.wait_for_key_event() });
        if let Some(event) = event {
            let _ = boot::wait_for_event(&mut [event]);
        }
        let key = console::read_key();
        print_key(key);
        if is_quit(&key) {
            break;
        }
    }
}

/// Reads through the nth text input handle in the system instead of the
/// console's. With `-other-wait-event` the blocking wait still uses the
/// console event, exercising the case where wait and read disagree.
fn test_handle_input(handle_index: i64, other_wait_event: bool) {
    let handles = match boot::find_handles::<Input>() {
        Ok(handles) => handles,
        Err(err) => {
            log::error!("could not locate text input handles: {err:?}");
            return;
        }
    };
    println!("{} input handle(s), using #{handle_index}", handles.len());
    let Some(&handle) = handles.get(handle_index as usize) else {
        log::error!("there is no input handle #{handle_index}");
        return;
    };

    let params = OpenProtocolParams {
        handle,
        agent: boot::image_handle(),
        controller: None,
    };
    let mut input =
        match unsafe { boot::open_protocol::<Input>(params, OpenProtocolAttributes::GetProtocol) } {
            Ok(input) => input,
            Err(err) => {
                log::error!("could not open text input protocol: {err:?}");
                return;
            }
        };

    loop {
        print!("any key, or q to quit... ");
        let event = if other_wait_event {
            uefi::system::with_stdin(|stdin| unsafe { stdin.wait_for_key_event() })
        } else {
            unsafe { input.wait_for_key_event() }
        };
        if let Some(event) = event {
            let _ = boot::wait_for_event(&mut [event]);
        }
        let key = input.read_key().ok().flatten();
        print_key(key);
        if is_quit(&key) {
            break;
        }
    }
}

/// Counts `q` presses in a 10 second polling window. The firmware's
/// key-notify callbacks would do this without polling, but a 100 ms poll
/// is indistinguishable at typing speed.
fn test_polled_input() {
    println!("waiting for 10s, press the 'q' key as often as you want...");
    let mut presses = 0;
    for _ in 0..100 {
        boot::stall(Duration::from_millis(100));
        while let Some(key) = console::read_key() {
            if matches!(key, Key::Printable(chr) if char::from(chr) == 'q') {
                presses += 1;
            }
        }
    }
    println!("counted {presses} 'q' press(es)");
    console::drain_key_buffer();
}

#[entry]
fn main() -> Status {
    let mut options = [
        Arg::int("-handle", 0, "Use (zero-based) nth handle"),
        Arg::flag("-other-wait-event", "Use alternate wait event"),
    ];
    let mut groups = [ArgGroup {
        title: "Application-specific options",
        args: &mut options,
    }];
    if let Startup::Exit(status) = startup(&mut groups) {
        return status;
    }
    let handle_index = groups[0].args[0].as_int();
    let other_wait_event = groups[0].args[1].as_bool();

    test_simple_input();
    test_handle_input(handle_index, other_wait_event);
    test_polled_input();

    shutdown()
}
