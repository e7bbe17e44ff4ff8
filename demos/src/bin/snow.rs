//! Animated snow in text mode.
//!
//! The left/right arrow keys add wind, `q` quits. Flakes that reach the
//! bottom row stay there for a while: they are never erased during the
//! animation, only overdrawn once their ground lifetime expires.

#![no_std]
#![no_main]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use ignite_core::args::{Arg, ArgGroup};
use ignite_demos::{Startup, console, shutdown, startup, time};
use uefi::boot::{self, EventType, TimerTrigger, Tpl};
use uefi::prelude::*;
use uefi::proto::console::text::{Color, Key, ScanCode};
use uefi::{Event, ResultExt, print};

/// xorshift64; plenty random for falling snow.
struct Rng(u64);

impl Rng {
    fn seeded() -> Rng {
        let seed = time::timestamp();
        Rng(if seed == 0 { 0x5eed } else { seed })
    }

    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x as u32
    }
}

struct Flake {
    /// current column, fractional so wind moves flakes smoothly
    column: f64,
    speed: f64,
    previous_x: i64,
    previous_y: i64,
    y_offset: i64,
    /// frame number the flake was (re)created at
    time_offset: i64,
}

impl Flake {
    fn new(rng: &mut Rng, width: i64, time_offset: i64) -> Flake {
        let flake = Flake {
            column: f64::from(rng.next() % (2 * width as u32)) - width as f64 / 2.0,
            speed: f64::from(rng.next() % 60 + 40) / 100.0,
            previous_x: -10000,
            previous_y: -10000,
            y_offset: i64::from(rng.next() % 20),
            time_offset,
        };
        log::debug!(
            "initialized flake: col={:.1}, speed={:.2}, y_offset={}",
            flake.column,
            flake.speed,
            flake.y_offset
        );
        flake
    }
}

struct Weather {
    width: i64,
    /// canvas height; the bottom row of the canvas is the ground
    height: i64,
    ground_lifetime_frames: i64,
}

/// Moves and redraws every flake for one frame. Flakes falling off the
/// bottom respawn above the screen; landing flakes record their landing
/// frame per column so the ground can be aged. Returns how many flakes
/// are still in motion.
fn update_flakes(
    flakes: &mut [Flake],
    rng: &mut Rng,
    weather: &Weather,
    iteration: i64,
    cross_speed: f64,
    land_times: &mut [i64],
) -> usize {
    let mut active = 0;
    for flake in flakes.iter_mut() {
        flake.column += cross_speed * flake.speed * flake.speed;
        let y_abs = (flake.speed * (iteration - flake.time_offset) as f64) as i64;
        if y_abs > weather.height + flake.y_offset {
            *flake = Flake::new(rng, weather.width, iteration);
            continue;
        }
        active += 1;
        if y_abs < flake.y_offset {
            flake.previous_y = y_abs;
            continue;
        }
        let y = y_abs - flake.y_offset;
        let x = flake.column as i64;
        if y_abs == flake.previous_y && x == flake.previous_x {
            continue;
        }

        // erase the previous position if it was on screen
        if flake.previous_y >= flake.y_offset
            && flake.previous_y < weather.height + flake.y_offset
            && flake.previous_x >= 0
            && flake.previous_x < weather.width
        {
            let erase_y = flake.previous_y - flake.y_offset;
            if console::set_cursor_position(flake.previous_x as usize, erase_y as usize).is_ok() {
                print!(" ");
            }
        }

        if x >= 0 && x < weather.width {
            if console::set_cursor_position(x as usize, y as usize).is_ok() {
                // fast flakes are close and bright, slow ones further away
                if flake.speed > 0.9 {
                    console::color_print(Color::White, "*");
                } else {
                    console::color_print(Color::LightGray, "*");
                }
            }
            if y == weather.height {
                land_times[x as usize] = iteration;
                log::debug!("flake landed in column {x}");
            }
        }

        flake.previous_y = y + flake.y_offset;
        flake.previous_x = x;
    }
    active
}

/// Overdraws landed flakes whose ground lifetime just expired.
fn update_ground(weather: &Weather, iteration: i64, land_times: &[i64]) {
    for (column, landed) in land_times.iter().enumerate() {
        if iteration - landed != weather.ground_lifetime_frames {
            continue;
        }
        if console::set_cursor_position(column, weather.height as usize).is_ok() {
            print!(" ");
        }
    }
}

struct WindArgs {
    step: f64,
    max_speed: f64,
    falloff: f64,
    base_speed: f64,
}

fn animate(
    weather: &Weather,
    flake_count: usize,
    duration_frames: i64,
    interval_ms: u64,
    wind: &WindArgs,
) -> uefi::Result {
    let mut rng = Rng::seeded();
    let mut flakes: Vec<Flake> = (0..flake_count)
        .map(|_| Flake::new(&mut rng, weather.width, 0))
        .collect();
    let mut land_times = vec![-100_000i64; weather.width as usize];
    let mut cross_speed = wind.base_speed;

    let timer = unsafe { boot::create_event(EventType::TIMER, Tpl::CALLBACK, None, None) }?;
    boot::set_timer(&timer, TimerTrigger::Periodic(interval_ms * 1_000 * 10))?;
    let key_event = uefi::system::with_stdin(|stdin| unsafe { stdin.wait_for_key_event() });

    console::enable_cursor(false);
    console::set_cursor_position(0, (weather.height + 1) as usize)?;
    print!("[Q]uit, [L/Rarr] wind");

    let mut events: Vec<Event> = Vec::new();
    events.extend(key_event);
    events.push(timer);
    let key_slot = if events.len() == 2 { Some(0) } else { None };

    let mut frame = 0i64;
    while frame < duration_frames {
        let index = boot::wait_for_event(&mut events).discard_errdata()?;
        if Some(index) == key_slot {
            match console::read_last_key() {
                Some(Key::Printable(chr)) if char::from(chr) == 'q' => break,
                Some(Key::Special(ScanCode::LEFT)) => {
                    cross_speed = (cross_speed - wind.step).max(-wind.max_speed);
                }
                Some(Key::Special(ScanCode::RIGHT)) => {
                    cross_speed = (cross_speed + wind.step).min(wind.max_speed);
                }
                _ => {}
            }
            continue;
        }
        if update_flakes(&mut flakes, &mut rng, weather, frame, cross_speed, &mut land_times) < 1 {
            break;
        }
        update_ground(weather, frame, &land_times);
        cross_speed = (cross_speed - wind.base_speed) * wind.falloff + wind.base_speed;
        frame += 1;
    }
    log::debug!("finished after {} frame(s)", frame + 1);

    console::set_cursor_position(0, (weather.height + 1) as usize)?;
    console::enable_cursor(true);
    Ok(())
}

#[entry]
fn main() -> Status {
    let mut options = [
        Arg::int("-duration", 60, "Duration (in seconds) snow should fall"),
        Arg::int("-count", 100, "Number of flakes generated (about half of them on screen)"),
        Arg::int("-interval", 100, "Interval (in milliseconds) between frames"),
        Arg::int("-lifetime", 10, "Lifetime (in seconds) of flakes on ground"),
        Arg::double("-cross-step", 0.3, "Crosswind increment step"),
        Arg::double("-max-cross-speed", 2.0, "Maximum crosswind speed"),
        Arg::double("-cross-falloff-multi", 0.8, "Crosswind speed falloff multiplier (keep <=1.0)"),
        Arg::double("-base-cross-speed", 0.1, "Base crosswind speed"),
    ];
    let mut groups = [ArgGroup {
        title: "Weather options (in a UEFI boot time executable, mind you)",
        args: &mut options,
    }];
    if let Startup::Exit(status) = startup(&mut groups) {
        return status;
    }
    let args = &groups[0].args;
    let interval_ms = args[2].as_int().max(1) as u64;
    let wind = WindArgs {
        step: args[4].as_double(),
        max_speed: args[5].as_double(),
        falloff: args[6].as_double(),
        base_speed: args[7].as_double(),
    };

    let Some((columns, rows)) = console::text_resolution() else {
        log::error!("could not query the text resolution");
        return Status::UNSUPPORTED;
    };
    let weather = Weather {
        width: columns as i64,
        height: rows as i64 - 2,
        ground_lifetime_frames: args[3].as_int() * 1000 / interval_ms as i64,
    };
    let duration_frames = args[0].as_int() * 1000 / interval_ms as i64;
    let flake_count = args[1].as_int().max(1) as usize;

    console::clear();
    if let Err(err) = animate(&weather, flake_count, duration_frames, interval_ms, &wind) {
        log::error!("animation failed: {err:?}");
    }

    shutdown()
}
