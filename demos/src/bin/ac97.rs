//! AC'97 audio demo: plays a harmonic scale through the emulated Intel
//! 82801AA controller, then refills the buffer ring mid-playback while
//! sweeping the channel balance.

#![no_std]
#![no_main]

use ignite_core::ac97::{BUFFER_COUNT, MIXER_MASTER, fill_cross_scale, fill_harmonic_scale, mixer_value};
use ignite_demos::ac97::{self, Ac97};
use ignite_demos::{Startup, console, pci, shutdown, startup};
use uefi::boot::{self, EventType, TimerTrigger, Tpl};
use uefi::prelude::*;
use uefi::{ResultExt, println};

/// Stereo frames filled per ring buffer; at 44.1kHz one buffer lasts
/// roughly 227ms.
const FRAMES_PER_BUFFER: usize = 10_000;
const SAMPLES_PER_BUFFER: usize = FRAMES_PER_BUFFER * 2;

struct Playback {
    mute: bool,
    volume: f64,
    sample_rate: u16,
}

/// Fills the whole ring with the harmonic scale and starts the DMA
/// engine.
fn output_audio(driver: &mut Ac97, playback: &Playback) -> uefi::Result {
    for index in 0..BUFFER_COUNT {
        let samples = &mut driver.buffer_mut(index)[..SAMPLES_PER_BUFFER];
        fill_harmonic_scale(samples, index, u32::from(playback.sample_rate));
        driver.set_buffer_length(index, SAMPLES_PER_BUFFER as u16);
    }
    driver.flush()?;
    driver.set_last_valid_index((BUFFER_COUNT - 1) as u8)?;
    driver.play()?;
    if playback.mute {
        log::info!("starting playback... (muted)");
    } else {
        log::info!("starting playback...");
    }
    Ok(())
}

fn refill_half(driver: &mut Ac97, first: usize) {
    for index in first..first + BUFFER_COUNT / 2 {
        let samples = &mut driver.buffer_mut(index)[..SAMPLES_PER_BUFFER];
        fill_cross_scale(samples, index);
    }
    if let Err(err) = driver.flush() {
        log::warn!("could not flush refilled buffers: {err:?}");
    }
}

/// Follows the device's current index around the ring: refills the half
/// of the ring the device just left and sweeps the master balance left
/// to right as the index advances.
fn follow_ring(driver: &mut Ac97, playback: &Playback) -> uefi::Result {
    let timer = unsafe { boot::create_event(EventType::TIMER, Tpl::CALLBACK, None, None) }?;
    boot::set_timer(&timer, TimerTrigger::Periodic(50 * 1_000 * 10))?;

    let max_volume = driver.max_master_volume();
    let mut last_index = 0xffu8;
    for round in 0..64 {
        for _ in 0..20 {
            boot::wait_for_event(&mut [unsafe { timer.unsafe_clone() }]).discard_errdata()?;
            let index = driver.current_index()?;
            if index == last_index {
                continue;
            }
            last_index = index;
            log::debug!("round {round}, current index {index}");

            let mut pending_last_valid = None;
            if index == 31 && round < 40 {
                refill_half(driver, 0);
                pending_last_valid = Some((BUFFER_COUNT / 2 - 1) as u8);
            }
            if index == 0 && round > 1 && round < 40 {
                refill_half(driver, BUFFER_COUNT / 2);
                pending_last_valid = Some((BUFFER_COUNT - 1) as u8);
            }

            if (16u8..31).contains(&index) {
                let mut left = (index - 16) * 4 + 3;
                let mut right = 66 - left;
                if max_volume < 63 {
                    left /= 2;
                    right /= 2;
                }
                driver.write_mixer(MIXER_MASTER, mixer_value(left, right, playback.mute))?;
            } else if index == 31 {
                driver.write_mixer(MIXER_MASTER, mixer_value(8, 8, playback.mute))?;
            }

            if let Some(last_valid) = pending_last_valid {
                driver.set_last_valid_index(last_valid)?;
            }
            break;
        }
    }
    boot::set_timer(&timer, TimerTrigger::Cancel)?;
    boot::close_event(timer)?;

    println!("Press any key to continue...");
    console::wait_for_key();
    Ok(())
}

fn run(playback: &Playback) -> Status {
    let mut devices = pci::enumerate();
    let Some(device) = pci::find_device(&mut devices, ac97::VENDOR_ID, ac97::DEVICE_ID) else {
        log::error!(
            "no AC'97 device ({:04x}:{:04x}) in this system",
            ac97::VENDOR_ID,
            ac97::DEVICE_ID
        );
        return Status::UNSUPPORTED;
    };

    let mut driver = match Ac97::init(device) {
        Ok(driver) => driver,
        Err(err) => {
            log::error!("could not initialize the audio device: {err:?}");
            return Status::DEVICE_ERROR;
        }
    };

    // set the rate before the volume, a rate change resets the mute flag
    if driver.set_sample_rate(playback.sample_rate).is_err() {
        log::warn!("could not set sample rate {}", playback.sample_rate);
    }
    if driver.set_volume(playback.volume, playback.mute).is_err() {
        log::warn!("could not set volume");
    }
    driver.dump_registers();

    let status = match output_audio(&mut driver, playback).and_then(|()| follow_ring(&mut driver, playback)) {
        Ok(()) => Status::SUCCESS,
        Err(err) => {
            log::error!("playback failed: {err:?}");
            err.status()
        }
    };
    driver.wait_until_last_buffer_sent(1_000);
    driver.close();
    status
}

#[entry]
fn main() -> Status {
    let mut audio_options = ac97::argument_list();
    let mut groups = [ignite_core::args::ArgGroup {
        title: ac97::GROUP_TITLE,
        args: &mut audio_options,
    }];
    if let Startup::Exit(status) = startup(&mut groups) {
        return status;
    }
    let playback = Playback {
        mute: groups[0].args[0].as_bool(),
        volume: groups[0].args[1].as_double(),
        sample_rate: groups[0].args[2].as_int() as u16,
    };

    let status = run(&playback);
    let shutdown_status = shutdown();
    if status != Status::SUCCESS {
        return status;
    }
    shutdown_status
}
