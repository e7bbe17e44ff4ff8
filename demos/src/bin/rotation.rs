//! Image rotation and bilinear interpolation demo: a spinning disc, then
//! an animated full-screen gradient.

#![no_std]
#![no_main]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use ignite_core::args::{Arg, ArgGroup};
use ignite_core::interp::{interpolate_4px, max_disc_radius, rotate_image};
use ignite_core::pixel::Pixel;
use ignite_demos::graphics::{self, Screen};
use ignite_demos::{Startup, console, shutdown, startup, time};
use uefi::prelude::*;
use uefi::print;

/// Draws the disc to be rotated into the screen buffer, packed with the
/// disc's diameter as row width.
fn draw_disc(screen: &mut Screen, radius: i64) -> uefi::Result {
    let ring = Pixel::new(92, 92, 92);
    let gray = Pixel::new(25, 25, 25);
    let orange = Pixel::new(255, 128, 0);

    let outer_max = radius;
    let outer_min = (radius as f64 * 0.975) as i64;
    let outer_max_sq = outer_max * outer_max;
    let outer_min_sq = outer_min * outer_min;
    let diameter = (2 * radius + 1) as usize;

    let buffer = screen.buffer();
    for pixel in &mut buffer[..diameter * diameter] {
        *pixel = Pixel::BLACK;
    }
    for y in -outer_max..outer_max {
        for x in -outer_max..outer_max {
            let r_sq = x * x + y * y;
            if r_sq > outer_max_sq {
                continue;
            }
            let color = if r_sq >= outer_min_sq {
                ring
            } else if (x <= 0 && y <= 0) || (x > 0 && y > 0) {
                orange
            } else {
                gray
            };
            buffer[((radius + y) as usize) * diameter + (radius + x) as usize] = color;
        }
    }
    screen.blit_at(0, 0, diameter, diameter)
}

/// Spins the disc through five full turns.
fn rotate_disc(screen: &mut Screen, radius: i64) -> uefi::Result {
    let diameter = (2 * radius + 1) as usize;
    let mut rotated = vec![Pixel::BLACK; diameter * diameter];

    let mut previous = time::timestamp();
    let mut theta = 0.0f32;
    while theta <= 10.0 * core::f32::consts::PI {
        rotate_image(&screen.buffer()[..diameter * diameter], &mut rotated, radius, theta);
        screen.blit_buffer(&rotated, (0, 0), (diameter, diameter))?;
        let _ = console::set_cursor_position(0, 0);
        screen.limit_framerate(&mut previous);
        theta += core::f32::consts::PI / 128.0;
    }

    console::wait_for_key();
    Ok(())
}

/// Animates a bilinear interpolation between the four screen corners.
fn draw_gradient(screen: &mut Screen) -> uefi::Result {
    let (width, height) = (screen.width(), screen.height());

    let rel_xs: Vec<f32> = (0..width).map(|x| x as f32 / width as f32).collect();
    let rel_ys: Vec<f32> = (0..height).map(|y| y as f32 / height as f32).collect();

    let mut corners = [Pixel::BLACK; 4];
    corners[0].red = 255;
    corners[1].blue = 255;
    corners[2].green = 255;

    let mut previous = time::timestamp();
    for frame in 0..=255u8 {
        corners[0].green = frame;
        corners[1].red = frame;
        corners[2].blue = frame;

        let buffer = screen.buffer();
        for y in 0..height {
            for x in 0..width {
                buffer[y * width + x] = interpolate_4px(&corners, 2, rel_xs[x], rel_ys[y]);
            }
        }
        screen.blit()?;

        let now = time::timestamp();
        let _ = console::set_cursor_position(0, 0);
        print!("{}ms", (time::diff_seconds(previous, now) * 1000.0) as i64);
        previous = now;
    }

    console::wait_for_key();
    Ok(())
}

#[entry]
fn main() -> Status {
    let mut graphics_options = graphics::argument_list();
    let mut app_options = [Arg::int("-radius", 50, "circle radius [px]")];
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
    let radius = groups[1].args[0].as_int().max(1);

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

    let max_radius = max_disc_radius(screen.width(), screen.height());
    if radius > max_radius {
        log::warn!(
            "-radius {radius} does not fit the {}x{} mode, drawing with {max_radius}",
            screen.width(),
            screen.height()
        );
    }
    let radius = radius.min(max_radius);

    let result = draw_disc(&mut screen, radius)
        .and_then(|()| rotate_disc(&mut screen, radius))
        .and_then(|()| draw_gradient(&mut screen));
    if let Err(err) = result {
        log::error!("rotation demo failed: {err:?}");
    }
    drop(screen);

    shutdown()
}
