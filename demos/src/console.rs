//! Text console helpers.
//!
//! Wraps the system table's text input/output protocols: load-option
//! tokenizing, mode selection, colored output and keyboard access. The
//! `with_stdout`/`with_stdin` closures must not nest, so anything printed
//! about console state is collected first and written afterwards.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use uefi::boot;
use uefi::proto::console::text::{Color, Key};
use uefi::proto::loaded_image::LoadedImage;
use uefi::{print, println, system};

/// Splits the image's load options into whitespace-separated tokens,
/// dropping the leading program name. Images started without options
/// yield an empty list.
pub fn load_options() -> Vec<String> {
    let Ok(loaded) = boot::open_protocol_exclusive::<LoadedImage>(boot::image_handle()) else {
        return Vec::new();
    };
    let Ok(options) = loaded.load_options_as_cstr16() else {
        return Vec::new();
    };
    options
        .to_string()
        .split_whitespace()
        .skip(1)
        .map(str::to_string)
        .collect()
}

/// Switches to the console mode with the most cells, usually the last one
/// listed. Does nothing if that mode is already active.
pub fn set_best_text_mode() -> uefi::Result {
    system::with_stdout(|stdout| {
        let Some(best) = stdout.modes().max_by_key(|m| m.columns() * m.rows()) else {
            return Ok(());
        };
        if let Ok(Some(current)) = stdout.current_mode() {
            if current.index() == best.index() {
                return Ok(());
            }
        }
        stdout.set_mode(best)?;
        stdout.clear()
    })
}

/// Lists the available text modes, 5 per line.
pub fn print_text_modes() {
    let modes: Vec<(usize, usize, usize)> = system::with_stdout(|stdout| {
        stdout
            .modes()
            .map(|m| (m.index(), m.columns(), m.rows()))
            .collect()
    });
    println!("number of console modes: {}", modes.len());
    for (slot, (index, columns, rows)) in modes.iter().enumerate() {
        print!("  {index:02}: {columns:3}x{rows:3}");
        if slot % 5 == 4 {
            println!();
        }
    }
    if modes.len() % 5 != 0 {
        println!();
    }
}

/// The active text mode's size in character cells.
pub fn text_resolution() -> Option<(usize, usize)> {
    system::with_stdout(|stdout| {
        let mode = stdout.current_mode().ok().flatten()?;
        Some((mode.columns(), mode.rows()))
    })
}

pub fn clear() {
    system::with_stdout(|stdout| {
        let _ = stdout.clear();
    });
}

pub fn set_cursor_position(column: usize, row: usize) -> uefi::Result {
    system::with_stdout(|stdout| stdout.set_cursor_position(column, row))
}

pub fn enable_cursor(visible: bool) {
    system::with_stdout(|stdout| {
        let _ = stdout.enable_cursor(visible);
    });
}

/// Prints `text` in the given color, then restores the usual light gray.
pub fn color_print(color: Color, text: &str) {
    use core::fmt::Write;

    system::with_stdout(|stdout| {
        let _ = stdout.set_color(color, Color::Black);
        let _ = stdout.write_str(text);
        let _ = stdout.set_color(Color::LightGray, Color::Black);
    });
}

/// Discards any keystrokes still queued in the input buffer.
pub fn drain_key_buffer() {
    system::with_stdin(|stdin| {
        for _ in 0..50 {
            if !matches!(stdin.read_key(), Ok(Some(_))) {
                break;
            }
        }
    });
}

/// Blocks until a key is pressed, then empties the input buffer.
pub fn wait_for_key() {
    let event = system::with_stdin(|stdin| unsafe { stdin.wait_for_key_event() });
    if let Some(event) = event {
        let _ = boot::wait_for_event(&mut [event]);
    }
    drain_key_buffer();
}

/// A single keystroke, if one is pending.
pub fn read_key() -> Option<Key> {
    system::with_stdin(|stdin| stdin.read_key().ok().flatten())
}

/// The last keystroke of a pending burst. Terminal emulators can turn one
/// physical keypress into several input events (escape sequences); callers
/// that only care about the final key use this.
pub fn read_last_key() -> Option<Key> {
    system::with_stdin(|stdin| {
        let mut last = None;
        for _ in 0..10 {
            match stdin.read_key() {
                Ok(Some(key)) => last = Some(key),
                _ => break,
            }
        }
        last
    })
}
