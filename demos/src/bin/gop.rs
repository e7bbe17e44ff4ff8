//! Graphics output demo: color bars, image display, font blending, moving
//! sprites and a prepared scrolling animation.

#![no_std]
#![no_main]

extern crate alloc;

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use core::arch::asm;

use ignite_core::args::{Arg, ArgGroup};
use ignite_core::font::Font;
use ignite_core::pixel::Pixel;
use ignite_demos::graphics::{self, Screen};
use ignite_demos::{Startup, console, shutdown, startup, time};
use uefi::prelude::*;
use uefi::{cstr16, println};

fn draw_bars(screen: &mut Screen) -> uefi::Result {
    let (width, height) = (screen.width(), screen.height());
    let hspan = width / 130;
    let bar_width = width / 72;
    let left = (width - 38 * bar_width - 37 * hspan) / 2;
    let bar_height = height / 5 * 3;
    let step = bar_height / 60;
    let top = (height - bar_height) / 2;

    screen.fill_rect(0, 0, width, height, Pixel::BLACK)?;
    for bar in 0..38 {
        let color = Pixel::new((bar * 6) as u8, (222 - bar * 6) as u8, 0);
        screen.fill_rect(
            left + (bar_width + hspan) * bar,
            top + bar * step,
            bar_width,
            bar_height - bar * step,
            color,
        )?;
    }
    Ok(())
}

fn draw_image(screen: &mut Screen) -> uefi::Result {
    let Some(image) = graphics::load_image(cstr16!("\\demoimg.ppm")) else {
        return Ok(());
    };
    screen.blit_buffer(&image.pixels, (0, 0), (image.width, image.height))
}

/// Triangular 0..255 ramp over `value`.
fn ramp(value: i64) -> u8 {
    let mut ramped = value % 256;
    if value % 512 >= 256 {
        ramped -= 2 * (value % 256) + 1;
    }
    ((ramped + 256) % 256) as u8
}

fn draw_font_test(screen: &mut Screen, font: &Font) -> uefi::Result {
    let (width, height) = (screen.width(), screen.height());

    {
        let buffer = screen.buffer();
        for pixel in &mut buffer[..16 * width] {
            *pixel = Pixel::BLACK;
        }
        for y in 16..height {
            for x in 0..width {
                buffer[y * width + x] = Pixel::new(
                    ((y + x) % 128) as u8,
                    ((512 - y - x) % 128) as u8,
                    ((256 + y - x) % 128) as u8,
                );
            }
        }
        // solid areas to judge the blending against; skip/take instead of
        // slicing keeps narrow modes from running past the row
        for y in 85..235.min(height) {
            let row = &mut buffer[y * width..(y + 1) * width];
            for pixel in row.iter_mut().skip(230).take(140) {
                *pixel = Pixel::BLACK;
            }
            for pixel in row.iter_mut().skip(380).take(140) {
                *pixel = Pixel::WHITE;
            }
        }

        font.draw_text(buffer, width, 1, 1, Pixel::WHITE, "font blending test:");

        // the whole glyph sheet, three times, over the different backgrounds
        let cols = font.glyph_count() / 8 + 1;
        for (index, glyph) in font.glyphs().iter().enumerate() {
            let x = index % cols;
            let y = index / cols;
            let color = Pixel::new(
                (255 * x / cols) as u8,
                (255 - 31 * y) as u8,
                (128 - 15 * y as i64 + 15 * x as i64) as u8,
            );
            for offset in [100, 250, 400] {
                font.draw_glyph(buffer, width, offset + x * 8, 100 + y * 15, glyph, color);
            }
        }
    }
    screen.blit()?;

    console::wait_for_key();

    // bonus: a well-deserved break from all the excitement
    screen.fill_rect(0, 0, width, height, Pixel::new(0, 0, 128))?;
    screen.read_back()?;
    let (rax, rbx, rcx, rdx) = capture_registers();
    let text = format!(
        "A problem has been detected and Sunlight has been shut down to prevent damage\n\
to your planet.\n\
\n\
The problem seems to be caused by the following file: GOP.EFI\n\
\n\
BLUE_SCREEN_IN_WINDOWS_FREE_AREA\n\
\n\
If this is the first time you've seen a Stop error screen,\n\
what have you been doing all this time? If this screen\n\
appears again, follow these steps:\n\
\n\
 1. find someone to show this screen to\n\
 2. watch their confusion\n\
\n\
Technical information:\n\
\n\
*** STOP: 0x499602D2   (rax={rax:016X}\n\
  rbx={rbx:016X}, rcx={rcx:016X}, rdx={rdx:016X})"
    );
    font.draw_text(screen.buffer(), width, 1, 1, Pixel::WHITE, &text);
    screen.blit()
}

fn capture_registers() -> (u64, u64, u64, u64) {
    let (rax, rbx, rcx, rdx): (u64, u64, u64, u64);
    unsafe {
        asm!("", out("rax") rax, out("rcx") rcx, out("rdx") rdx, options(nomem, nostack, preserves_flags));
        asm!("mov {0}, rbx", out(reg) rbx, options(nomem, nostack, preserves_flags));
    }
    (rax, rbx, rcx, rdx)
}

const SPRITE_SIZE: usize = 64;

fn draw_moving_objects(screen: &mut Screen) -> uefi::Result {
    let mut sprite = vec![Pixel::BLACK; SPRITE_SIZE * SPRITE_SIZE];
    for y in 10..54 {
        for x in 10..54 {
            sprite[y * SPRITE_SIZE + x] = Pixel::WHITE;
        }
    }

    let (width, height) = (screen.width(), screen.height());
    screen.fill_rect(0, 0, width, height, Pixel::BLACK)?;

    let limit = width.min(height) - SPRITE_SIZE;
    let mut previous = time::timestamp();
    for tc in 0..limit {
        screen.limit_framerate(&mut previous);
        for (x, y) in [
            (tc, tc),
            (tc + 100, tc),
            (tc, height - SPRITE_SIZE - tc),
            (tc + 100, height - SPRITE_SIZE - tc),
        ] {
            screen.blit_buffer(&sprite, (x, y), (SPRITE_SIZE, SPRITE_SIZE))?;
        }
    }
    Ok(())
}

/// Extra rows below the visible frame so the animation can scroll through
/// the buffer without wrapping.
const SCROLL_ROWS: usize = 512;

fn draw_progress(screen: &mut Screen, value: f64) -> uefi::Result {
    let (width, height) = (screen.width(), screen.height());
    screen.fill_rect(width / 2 - 100, height / 2 - 20, 200, 40, Pixel::new(255, 128, 0))?;
    if value >= 0.005 {
        let filled = (200.0 * value) as usize;
        screen.fill_rect(width / 2 - 98, height / 2 - 18, filled.min(196), 36, Pixel::new(0, 255, 0))?;
    }
    Ok(())
}

fn draw_prepared_animation(screen: &mut Screen) -> uefi::Result {
    let (width, height) = (screen.width(), screen.height());
    let mut buffer: Vec<Pixel> = vec![Pixel::BLACK; width * (height + SCROLL_ROWS)];

    draw_progress(screen, 0.2)?;
    let prepare_start = time::timestamp();
    for x in 0..width {
        if x % (width / 10).max(1) == 0 {
            draw_progress(screen, 0.2 + x as f64 / width as f64 * 0.8)?;
        }
        for y in 0..height + SCROLL_ROWS {
            let value = (y * 2 + x) as i64;
            buffer[y * width + x] = Pixel::new(
                ramp(value),
                ramp(value + 25 + y as i64),
                ramp(value + 50 - y as i64),
            );
        }
    }

    let run_start = time::timestamp();
    let mut previous = run_start;
    let frames = 1000;
    for frame in 0..frames {
        screen.limit_framerate(&mut previous);
        let offset = (frame % SCROLL_ROWS) * width;
        screen.blit_buffer(&buffer[offset..offset + width * height], (0, 0), (width, height))?;
    }
    let run_end = time::timestamp();

    let _ = console::set_cursor_position(0, 0);
    let prepare_time = time::diff_seconds(prepare_start, run_start);
    let run_time = time::diff_seconds(run_start, run_end);
    println!(
        "took {prepare_time:.2}s to prepare image, {run_time:.2}s to run {frames} frames ({:.1} fps)",
        frames as f64 / run_time,
    );
    Ok(())
}

fn run_demos(screen: &mut Screen, skips: &[bool; 5]) -> uefi::Result {
    println!("(if you can read this you're probably in a text console - just hit a few random keys over the next ~20s)");

    if !skips[0] {
        draw_bars(screen)?;
        console::wait_for_key();
    }
    if !skips[1] {
        draw_image(screen)?;
        console::wait_for_key();
    }
    if !skips[2] {
        if let Some(font) = graphics::load_font() {
            draw_font_test(screen, &font)?;
        }
        console::wait_for_key();
    }
    if !skips[3] {
        draw_moving_objects(screen)?;
        console::wait_for_key();
    }
    if !skips[4] {
        draw_prepared_animation(screen)?;
        console::wait_for_key();
    }
    Ok(())
}

#[entry]
fn main() -> Status {
    let mut graphics_options = graphics::argument_list();
    let mut app_options = [
        Arg::flag("-skip-bars", "Skip bars test"),
        Arg::flag("-skip-images", "Skip images test"),
        Arg::flag("-skip-font", "Skip font test"),
        Arg::flag("-skip-objects", "Skip moving objects test"),
        Arg::flag("-skip-anim", "Skip animation test"),
    ];
    let mut groups = [
        ArgGroup { title: graphics::GROUP_TITLE, args: &mut graphics_options },
        ArgGroup { title: "Application-specific options", args: &mut app_options },
    ];
    if let Startup::Exit(status) = startup(&mut groups) {
        return status;
    }
    let (mode, vsync, fps) = (
        groups[0].args[0].as_int(),
        groups[0].args[1].as_int(),
        groups[0].args[2].as_int(),
    );
    let mut skips = [false; 5];
    for (skip, arg) in skips.iter_mut().zip(groups[1].args.iter()) {
        *skip = arg.as_bool();
    }

    graphics::print_modes();
    println!("press any key...");
    console::wait_for_key();

    if time::calibrate().is_err() {
        log::warn!("could not calibrate timestamps, frame pacing will be off");
    }

    let mut screen = match Screen::init(mode, vsync, fps) {
        Ok(screen) => screen,
        Err(err) => {
            log::error!("could not initialize graphics: {err:?}");
            graphics::print_modes();
            return shutdown();
        }
    };
    if let Err(err) = run_demos(&mut screen, &skips) {
        log::error!("graphics demo failed: {err:?}");
    }
    drop(screen);

    shutdown()
}
