//! Shared runtime for the demo applications.
//!
//! Every binary follows the same shape: declare its argument groups, call
//! [`startup`], do its thing, call [`shutdown`]. Startup initializes the
//! firmware helpers, parses the command line and picks the largest text
//! mode; shutdown reports page allocations that were never freed.

#![no_std]

extern crate alloc;

pub mod ac97;
pub mod console;
pub mod files;
pub mod graphics;
pub mod logging;
pub mod mem;
pub mod pci;
pub mod time;

use ignite_core::args::{self, ArgGroup, Outcome};
use uefi::Status;

/// How an application should proceed after [`startup`].
pub enum Startup {
    /// Arguments parsed, console ready.
    Run,
    /// Help was printed or the command line was rejected; exit with this
    /// status.
    Exit(Status),
}

/// Common application startup: firmware helpers, command-line parsing,
/// log threshold, console text mode.
pub fn startup(groups: &mut [ArgGroup]) -> Startup {
    if uefi::helpers::init().is_err() {
        return Startup::Exit(Status::ABORTED);
    }
    mem::reset();

    let tokens = console::load_options();
    match args::parse(&tokens, groups) {
        Ok(Outcome::Run(verbosity)) => logging::apply(verbosity),
        Ok(Outcome::Help) => {
            uefi::print!("{}", args::help_text(groups));
            return Startup::Exit(Status::SUCCESS);
        }
        Err(err) => {
            log::error!("{err}");
            return Startup::Exit(Status::INVALID_PARAMETER);
        }
    }

    if console::set_best_text_mode().is_err() {
        log::warn!("could not set text mode");
        console::print_text_modes();
    }
    Startup::Run
}

/// Common application teardown. Leaked page allocations are reported and
/// turn the exit status into an error.
pub fn shutdown() -> Status {
    if mem::shutdown() > 0 {
        return Status::ABORTED;
    }
    Status::SUCCESS
}
