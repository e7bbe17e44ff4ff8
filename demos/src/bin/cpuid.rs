//! Prints CPU identification: vendor, signature, capability flags and the
//! APIC base MSR.

#![no_std]
#![no_main]

use core::arch::asm;

use ignite_core::cpu::{self, FEATURES, Signature};
use ignite_demos::{Startup, shutdown, startup};
use uefi::prelude::*;
use uefi::println;

struct CpuidResult {
    eax: u32,
    ebx: u32,
    ecx: u32,
    edx: u32,
}

fn cpuid(leaf: u32) -> CpuidResult {
    let (eax, ecx, edx): (u32, u32, u32);
    let ebx: u64;
    unsafe {
        // rbx is reserved by the compiler, bounce it through another register
        asm!(
            "mov {tmp}, rbx",
            "cpuid",
            "xchg {tmp}, rbx",
            tmp = out(reg) ebx,
            inout("eax") leaf => eax,
            inout("ecx") 0u32 => ecx,
            out("edx") edx,
            options(nomem, nostack),
        );
    }
    CpuidResult { eax, ebx: ebx as u32, ecx, edx }
}

fn rdmsr(register: u32) -> u64 {
    let (high, low): (u32, u32);
    unsafe {
        asm!(
            "rdmsr",
            in("ecx") register,
            out("edx") high,
            out("eax") low,
            options(nomem, nostack),
        );
    }
    (u64::from(high) << 32) | u64::from(low)
}

fn print_vendor_and_flags() {
    let leaf0 = cpuid(0);
    let vendor = cpu::vendor_id(leaf0.ebx, leaf0.edx, leaf0.ecx);
    println!("vendor id: {}", core::str::from_utf8(&vendor).unwrap_or("(invalid)"));

    let leaf1 = cpuid(1);
    let signature = Signature::from_eax(leaf1.eax);
    println!("stepping: {}", signature.stepping);
    println!("model: {}", signature.model);
    println!("family: {}", signature.family);
    println!("processor type: {}", signature.processor_type);
    println!("extended model: {}", signature.extended_model);
    println!("extended family: {}", signature.extended_family);

    for feature in FEATURES {
        println!("{}: {}", feature.name, u8::from(feature.is_set(leaf1.edx, leaf1.ecx)));
    }
}

fn print_msrs() {
    println!("MSRs:");
    println!("  1B: {:016X} (APIC base address)", rdmsr(0x1b));
}

#[entry]
fn main() -> Status {
    if let Startup::Exit(status) = startup(&mut []) {
        return status;
    }

    print_vendor_and_flags();
    print_msrs();

    shutdown()
}
