//! Graphics output: mode selection, a full-screen drawing buffer and frame
//! pacing.
//!
//! Drawing happens in an off-screen buffer of [`Pixel`]s that is pushed to
//! the display with a BLT; [`Pixel`] has the exact BLT pixel layout, so the
//! pure drawing code and the firmware interface share buffers without
//! conversion.

use alloc::string::String;
use alloc::vec::Vec;
use core::arch::asm;
use core::ptr::NonNull;
use core::time::Duration;

use ignite_core::args::{self, Arg, Value};
use ignite_core::font::{self, Font};
use ignite_core::pixel::Pixel;
use ignite_core::pnm::{self, Image};
use uefi::proto::console::gop::{BltOp, BltPixel, BltRegion, GraphicsOutput};
use uefi::{boot, cstr16, print, println};

pub const GROUP_TITLE: &str = "Graphics options";

fn validate_vsync(value: &Value) -> Result<(), String> {
    args::validate_int_range(value, "-vsync", 0, 3)
}

fn validate_fps(value: &Value) -> Result<(), String> {
    match value {
        Value::Int(fps) if *fps > 0 => Ok(()),
        _ => Err(String::from("-fps must be greater than 0")),
    }
}

/// The argument group shared by the graphical demos: `-mode`, `-vsync`
/// and `-fps`, in that order.
pub fn argument_list() -> [Arg; 3] {
    [
        Arg::int("-mode", 2, "Select graphics mode"),
        Arg::int("-vsync", 0, "Select vsync mode: 0=off, 1,2=either, 3=both").validated_by(validate_vsync),
        Arg::int("-fps", 100, "Set approximate frames per second limit").validated_by(validate_fps),
    ]
}

#[derive(Debug)]
pub enum GraphicsError {
    /// No graphics output protocol on this system.
    MissingProtocol,
    /// The requested mode number is not offered by the firmware.
    UnsupportedMode(i64),
    /// The firmware rejected an operation.
    Firmware(uefi::Status),
    OutOfMemory,
}

/// Lists the available graphics modes, 4 per line.
pub fn print_modes() {
    let modes = mode_list();
    println!("number of modes: {}", modes.len());
    for (index, (width, height)) in modes.iter().enumerate() {
        print!("  {index:02}: {width:4}x{height:4}");
        if index % 4 == 3 {
            println!();
        }
    }
    if modes.len() % 4 != 0 {
        println!();
    }
}

fn mode_list() -> Vec<(usize, usize)> {
    let Ok(handle) = boot::get_handle_for_protocol::<GraphicsOutput>() else {
        return Vec::new();
    };
    let Ok(gop) = boot::open_protocol_exclusive::<GraphicsOutput>(handle) else {
        return Vec::new();
    };
    gop.modes().map(|m| m.info().resolution()).collect()
}

/// The opened graphics output plus a zeroed full-screen buffer.
pub struct Screen {
    gop: boot::ScopedProtocol<GraphicsOutput>,
    width: usize,
    height: usize,
    buffer: NonNull<Pixel>,
    pages: usize,
    vsync: i64,
    fps: i64,
}

impl Screen {
    /// Opens the graphics output, switches to mode number `mode` and
    /// allocates the drawing buffer. `vsync` and `fps` configure
    /// [`Screen::wait_vsync`] and [`Screen::limit_framerate`].
    pub fn init(mode: i64, vsync: i64, fps: i64) -> Result<Screen, GraphicsError> {
        let handle =
            boot::get_handle_for_protocol::<GraphicsOutput>().map_err(|_| GraphicsError::MissingProtocol)?;
        let mut gop = boot::open_protocol_exclusive::<GraphicsOutput>(handle)
            .map_err(|_| GraphicsError::MissingProtocol)?;

        let Some(requested) = gop.modes().nth(mode as usize) else {
            let max_mode = gop.modes().count();
            log::error!("requested mode {mode} above maximum ({})", max_mode.saturating_sub(1));
            return Err(GraphicsError::UnsupportedMode(mode));
        };
        gop.set_mode(&requested)
            .map_err(|err| GraphicsError::Firmware(err.status()))?;

        let (width, height) = gop.current_mode_info().resolution();
        log::debug!("graphics resolution: {width}x{height}");

        let pages = (width * height * size_of::<Pixel>() - 1) / crate::mem::PAGE_SIZE + 1;
        let buffer = crate::mem::allocate_pages(pages).ok_or(GraphicsError::OutOfMemory)?;
        unsafe { core::ptr::write_bytes(buffer.as_ptr(), 0, pages * crate::mem::PAGE_SIZE) };

        Ok(Screen {
            gop,
            width,
            height,
            buffer: buffer.cast(),
            pages,
            vsync,
            fps,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The full-screen drawing buffer, row-major.
    pub fn buffer(&mut self) -> &mut [Pixel] {
        unsafe { core::slice::from_raw_parts_mut(self.buffer.as_ptr(), self.width * self.height) }
    }

    /// Pushes the whole drawing buffer to the display.
    pub fn blit(&mut self) -> uefi::Result {
        let (width, height) = (self.width, self.height);
        self.blit_at(0, 0, width, height)
    }

    /// Pushes the first `width * height` pixels of the drawing buffer to
    /// the display at (`x`, `y`).
    pub fn blit_at(&mut self, x: usize, y: usize, width: usize, height: usize) -> uefi::Result {
        let buffer =
            unsafe { core::slice::from_raw_parts(self.buffer.as_ptr().cast::<BltPixel>(), width * height) };
        self.gop.blt(BltOp::BufferToVideo {
            buffer,
            src: BltRegion::Full,
            dest: (x, y),
            dims: (width, height),
        })
    }

    /// Pushes an external pixel buffer (tightly packed, `width` pixels per
    /// row) to the display.
    pub fn blit_buffer(
        &mut self,
        pixels: &[Pixel],
        dest: (usize, usize),
        dims: (usize, usize),
    ) -> uefi::Result {
        let buffer =
            unsafe { core::slice::from_raw_parts(pixels.as_ptr().cast::<BltPixel>(), pixels.len()) };
        self.gop.blt(BltOp::BufferToVideo {
            buffer,
            src: BltRegion::Full,
            dest,
            dims,
        })
    }

    /// Fills a rectangle directly on the display, bypassing the buffer.
    pub fn fill_rect(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        color: Pixel,
    ) -> uefi::Result {
        self.gop.blt(BltOp::VideoFill {
            color: BltPixel::new(color.red, color.green, color.blue),
            dest: (x, y),
            dims: (width, height),
        })
    }

    /// Reads the current display contents back into the drawing buffer.
    pub fn read_back(&mut self) -> uefi::Result {
        let (width, height) = (self.width, self.height);
        let buffer = unsafe {
            core::slice::from_raw_parts_mut(self.buffer.as_ptr().cast::<BltPixel>(), width * height)
        };
        self.gop.blt(BltOp::VideoToBltBuffer {
            buffer,
            src: (0, 0),
            dest: BltRegion::Full,
            dims: (width, height),
        })
    }

    /// Waits for the configured vertical retrace condition: bit 0 of the
    /// `-vsync` value waits for retrace to start, bit 1 for it to end.
    pub fn wait_vsync(&self) {
        if self.vsync & 1 != 0 {
            while !vga_in_retrace() {
                boot::stall(Duration::from_micros(100));
            }
        }
        if self.vsync & 2 != 0 {
            while vga_in_retrace() {
                boot::stall(Duration::from_micros(100));
            }
        }
    }

    /// Sleeps until the minimum frame time has passed since `previous`,
    /// then waits for vsync. `previous` is updated to the current
    /// timestamp; requires [`crate::time::calibrate`].
    pub fn limit_framerate(&self, previous: &mut u64) {
        let minimum = crate::time::ticks_per_second() / self.fps as u64;
        let mut current = crate::time::timestamp();
        while current.wrapping_sub(*previous) < minimum {
            boot::stall(Duration::from_micros(500));
            current = crate::time::timestamp();
        }
        *previous = current;
        self.wait_vsync();
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        crate::mem::free_pages(self.buffer.cast(), self.pages);
    }
}

/// Reads the vertical retrace bit from the VGA input status port.
fn vga_in_retrace() -> bool {
    let value: u8;
    unsafe {
        asm!("in al, dx", in("dx") 0x3dau16, out("al") value, options(nomem, nostack, preserves_flags));
    }
    value & 8 != 0
}

/// Loads the bundled 8x15 font sheet from the boot volume.
pub fn load_font() -> Option<Font> {
    let data = crate::files::read(cstr16!("\\font815.pgm"))?;
    let sheet = match pnm::decode(&data) {
        Ok(sheet) => sheet,
        Err(err) => {
            log::error!("could not parse font sheet: {err:?}");
            return None;
        }
    };
    match Font::parse(&sheet, font::SHEET_TEXT) {
        Ok(font) => Some(font),
        Err(err) => {
            log::error!("could not cut glyphs from font sheet: {err:?}");
            None
        }
    }
}

/// Loads a netpbm image from the boot volume.
pub fn load_image(path: &uefi::CStr16) -> Option<Image> {
    let data = crate::files::read(path)?;
    match pnm::decode(&data) {
        Ok(image) => Some(image),
        Err(err) => {
            log::error!("could not parse image {path}: {err:?}");
            None
        }
    }
}
