//! Halts the machine. QEMU exits back to the host shell, VirtualBox
//! powers the VM off.

#![no_std]
#![no_main]

use ignite_demos::{Startup, startup};
use uefi::prelude::*;
use uefi::println;
use uefi::runtime::{self, ResetType};

#[entry]
fn main() -> Status {
    if let Startup::Exit(status) = startup(&mut []) {
        return status;
    }

    println!("shutting down...");
    runtime::reset(ResetType::SHUTDOWN, Status::SUCCESS, None);
}
