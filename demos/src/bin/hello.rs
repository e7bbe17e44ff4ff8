//! Minimal demo: command-line arguments and console output.

#![no_std]
#![no_main]

extern crate alloc;

use alloc::string::String;

use ignite_core::args::{Arg, ArgGroup, Value};
use ignite_demos::{Startup, shutdown, startup};
use uefi::prelude::*;
use uefi::println;

fn at_least_two(value: &Value) -> Result<(), String> {
    match value {
        Value::Int(v) if *v >= 2 => Ok(()),
        _ => Err(String::from("-int must be >=2")),
    }
}

#[entry]
fn main() -> Status {
    println!("Greetings, non-spherical habitation rock!");

    let mut group1 = [
        Arg::flag("-bool", "boolean parameter"),
        Arg::double("-dbl", 0.66, "double parameter"),
    ];
    let mut group2 = [Arg::int("-int", 2, "integer parameter").validated_by(at_least_two)];
    let mut groups = [
        ArgGroup { title: "Group 1", args: &mut group1 },
        ArgGroup { title: "Group 2", args: &mut group2 },
    ];
    if let Startup::Exit(status) = startup(&mut groups) {
        return status;
    }

    println!("\nThere's a  -help  parameter that'll show command line options!\n");

    println!("effective argument values after defaults:");
    println!("  -bool: {}", groups[0].args[0].as_bool());
    println!("  -dbl:  {}", groups[0].args[1].as_double());
    println!("  -int:  {}\n", groups[1].args[0].as_int());

    shutdown()
}
