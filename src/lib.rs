//! P-Touch Printer Driver
//!
//! This crate provides a printer driver for Brother P-touch PT series label
//! printers attached as a raw character device (for example `/dev/usb/lp0`).
//!
//! The driver speaks the P-touch raster command protocol: it decodes the
//! 32-byte status frames the printer emits asynchronously, encodes the
//! control and raster graphics commands, and keeps the two sides in sync so
//! a caller can block until a fresh status or the end of a print job has
//! been observed.
//!
//! # Example
//!
//! ```rust,no_run
//! use pt_label::{Config, Printer};
//! use std::time::Duration;
//!
//! let config = Config::new("/dev/usb/lp0");
//! let mut printer = Printer::open(config).unwrap();
//! let reader = printer.start_status_reader().unwrap();
//!
//! printer.invalidate().unwrap();
//! printer.initialize().unwrap();
//! printer.request_status().unwrap();
//! if printer.wait_for_status(Duration::from_secs(2)) {
//!     printer.show_info();
//! }
//! printer.close();
//! reader.join().unwrap();
//! ```

mod error;
mod media;
mod model;
mod printer;
mod raster;
mod status;

pub use crate::{
    error::{Error, FrameError},
    media::{
        max_pixel_for_media, media_type_description, MEDIA_TYPE_HEAT_SHRINK,
        MEDIA_TYPE_INCOMPATIBLE, MEDIA_TYPE_LAMINATED, MEDIA_TYPE_NON_LAMINATED,
        MEDIA_TYPE_NO_TAPE,
    },
    model::{ModelInfo, MODEL_PT_E500, MODEL_PT_H500, MODEL_PT_P1230PC, MODEL_PT_P700},
    printer::{CommandMode, Config, Printer},
    raster::{line_to_ascii, pack_line, unpack_line},
    status::{
        ErrorFlags, StatusFrame, FRAME_LEN, PHASE_EDITING, PHASE_PRINTING, STATUS_ERROR_OCCURRED,
        STATUS_PHASE_CHANGE, STATUS_PRINTING_COMPLETED, STATUS_REPLY_TO_REQUEST,
    },
};

/// Pixels in one raster line.
///
/// The raster graphics command always carries a full 128-pixel line even on
/// narrow tape; unused columns at either end stay zero.
pub const LINE_PIXELS: usize = 128;

/// Bytes in one packed raster line (128 pixels / 8).
pub const LINE_BYTES: usize = 16;
