//! Hardware-independent building blocks for the demo applications:
//! pixel math, netpbm parsing, command-line handling and register-level
//! helpers that can be exercised on the host.

#![no_std]

extern crate alloc;

pub mod ac97;
pub mod args;
pub mod cpu;
pub mod font;
pub mod interp;
pub mod pcidb;
pub mod pixel;
pub mod pnm;
