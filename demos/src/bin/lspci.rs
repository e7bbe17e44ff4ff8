//! Lists PCI devices.
//!
//! Device names come from a `pci.ids` file in the boot volume's root, if
//! present; drop in the full database from <https://pci-ids.ucw.cz/> for
//! complete names.

#![no_std]
#![no_main]

use ignite_core::args::{Arg, ArgGroup};
use ignite_demos::{Startup, pci, shutdown, startup};
use uefi::prelude::*;

#[entry]
fn main() -> Status {
    let mut options = [Arg::flag("-print-classes", "Prints known PCI device classes")];
    let mut groups = [ArgGroup {
        title: "Application-specific options",
        args: &mut options,
    }];
    if let Startup::Exit(status) = startup(&mut groups) {
        return status;
    }

    if groups[0].args[0].as_bool() {
        pci::print_known_classes();
    }

    let devices = pci::enumerate();
    let names = pci::load_device_names();
    pci::print_devices(&devices, names.as_deref());

    shutdown()
}
