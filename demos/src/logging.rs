//! Maps the command-line verbosity onto the global logger.
//!
//! The logger itself is the firmware console logger installed by
//! `uefi::helpers::init`; this only moves the threshold.

use ignite_core::args::Verbosity;
use log::LevelFilter;

pub fn apply(verbosity: Verbosity) {
    log::set_max_level(level_filter(verbosity));
}

fn level_filter(verbosity: Verbosity) -> LevelFilter {
    match verbosity {
        Verbosity::Trace => LevelFilter::Trace,
        Verbosity::Debug => LevelFilter::Debug,
        Verbosity::Info => LevelFilter::Info,
        Verbosity::Warn => LevelFilter::Warn,
        Verbosity::Error => LevelFilter::Error,
        Verbosity::Off => LevelFilter::Off,
    }
}
