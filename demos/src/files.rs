//! Whole-file reads from the volume this image was loaded from.

use alloc::vec::Vec;

use uefi::fs::{FileSystem, Path};
use uefi::{CStr16, boot};

/// Reads a file from the boot volume into memory. Failures are logged and
/// reported as `None`; a missing file is not fatal for any of the demos.
pub fn read(path: &CStr16) -> Option<Vec<u8>> {
    let proto = match boot::get_image_file_system(boot::image_handle()) {
        Ok(proto) => proto,
        Err(err) => {
            log::error!("could not open the boot volume: {err:?}");
            return None;
        }
    };
    let mut fs = FileSystem::new(proto);
    match fs.read(Path::new(path)) {
        Ok(data) => {
            log::debug!("read {} bytes from {path}", data.len());
            Some(data)
        }
        Err(err) => {
            log::warn!("could not read {path}: {err}");
            None
        }
    }
}
