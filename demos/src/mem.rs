//! Tracked page allocations.
//!
//! Applications route page allocations through here so anything still
//! outstanding at shutdown can be reported as a leak. The table is a fixed
//! array; boot services run single-threaded, so plain statics are fine.

use core::ptr::NonNull;

use arrayvec::ArrayVec;
use uefi::boot::{self, AllocateType, MemoryType};

pub const PAGE_SIZE: usize = 4096;

const MAX_TRACKED: usize = 256;

#[derive(Clone, Copy)]
struct Allocation {
    address: usize,
    pages: usize,
}

static mut ALLOCATIONS: ArrayVec<Allocation, MAX_TRACKED> = ArrayVec::new_const();

/// The only access path to the table; the closure holds the sole live
/// reference and must not call back into this module.
fn with_allocations<R>(f: impl FnOnce(&mut ArrayVec<Allocation, MAX_TRACKED>) -> R) -> R {
    f(unsafe { &mut *(&raw mut ALLOCATIONS) })
}

/// Clears the tracking table, called once at application startup.
pub fn reset() {
    with_allocations(|table| table.clear());
}

fn allocate(ty: AllocateType, pages: usize) -> Option<NonNull<u8>> {
    if with_allocations(|table| table.is_full()) {
        log::error!("allocation table is full, cannot track another allocation");
        return None;
    }
    match boot::allocate_pages(ty, MemoryType::LOADER_DATA, pages) {
        Ok(address) => {
            log::debug!("allocated {pages} page(s) at {:#018x}", address.as_ptr() as usize);
            with_allocations(|table| {
                table.push(Allocation {
                    address: address.as_ptr() as usize,
                    pages,
                });
            });
            Some(address)
        }
        Err(err) => {
            log::error!("could not allocate {pages} page(s): {err:?}");
            None
        }
    }
}

/// Allocates tracked pages anywhere in memory.
pub fn allocate_pages(pages: usize) -> Option<NonNull<u8>> {
    allocate(AllocateType::AnyPages, pages)
}

/// Allocates tracked pages at or below `max_address`, for devices that
/// cannot address the full 64-bit space.
pub fn allocate_pages_below(max_address: u64, pages: usize) -> Option<NonNull<u8>> {
    allocate(AllocateType::MaxAddress(max_address), pages)
}

/// Frees a tracked allocation. Freeing an address that was never tracked
/// is an error and leaves memory untouched.
pub fn free_pages(address: NonNull<u8>, pages: usize) -> bool {
    let key = address.as_ptr() as usize;
    let Some(index) = with_allocations(|table| table.iter().position(|a| a.address == key)) else {
        log::error!("trying to free memory with no tracking entry: {key:#018x}");
        return false;
    };
    let tracked = with_allocations(|table| table[index].pages);
    if tracked != pages {
        log::warn!("trying to free {pages} page(s) at {key:#018x}, but it had {tracked} page(s)");
    }
    if let Err(err) = unsafe { boot::free_pages(address, pages) } {
        log::error!("could not free {pages} page(s) at {key:#018x}: {err:?}");
        return false;
    }
    with_allocations(|table| {
        table.swap_remove(index);
    });
    log::debug!("freed {pages} page(s) at {key:#018x}");
    true
}

/// Reports every allocation still outstanding and returns the leak count.
pub fn shutdown() -> usize {
    with_allocations(|table| {
        for entry in table.iter() {
            log::error!("unfreed memory at {:#018x} ({} page(s))", entry.address, entry.pages);
        }
        let leaked = table.len();
        table.clear();
        leaked
    })
}
