//! Decoder for the 32-byte status frame the printer emits asynchronously.
//!
//! The frame layout is fixed and little-endian for multi-byte fields. The
//! printer streams frames on its own schedule (replies to status requests,
//! phase changes, errors), so decoding is kept free of side effects; the
//! background reader in [`crate::printer`] owns accumulation and retry.

use crate::error::FrameError;
use crate::media::media_type_description;
use bitflags::bitflags;

/// Exact size of a status frame on the wire.
pub const FRAME_LEN: usize = 32;

// Status codes (byte 18).
pub const STATUS_REPLY_TO_REQUEST: u8 = 0x00;
pub const STATUS_PRINTING_COMPLETED: u8 = 0x01;
pub const STATUS_ERROR_OCCURRED: u8 = 0x02;
pub const STATUS_PHASE_CHANGE: u8 = 0x06;

// Phase types (byte 19).
pub const PHASE_EDITING: u8 = 0x00;
pub const PHASE_PRINTING: u8 = 0x01;

bitflags! {
    /// Error bits reported in bytes 8-9 of the status frame.
    pub struct ErrorFlags: u16 {
        const NO_MEDIA = 0x0001;
        const CUTTER_JAM = 0x0004;
        const WEAK_BATTERIES = 0x0008;
        const HIGH_VOLTAGE_ADAPTER = 0x0040;
        const WRONG_MEDIA = 0x0100;
        const COVER_OPEN = 0x1000;
        const OVERHEATING = 0x2000;
    }
}

const ERROR_DESCRIPTIONS: &[(ErrorFlags, &str)] = &[
    (ErrorFlags::NO_MEDIA, "No media"),
    (ErrorFlags::CUTTER_JAM, "Cutter jam"),
    (ErrorFlags::WEAK_BATTERIES, "Weak batteries"),
    (ErrorFlags::HIGH_VOLTAGE_ADAPTER, "High-voltage adapter"),
    (ErrorFlags::WRONG_MEDIA, "Wrong media"),
    (ErrorFlags::COVER_OPEN, "Cover open"),
    (ErrorFlags::OVERHEATING, "Overheating"),
];

/// Status received from the printer decoded to a Rust friendly type.
///
/// Reserved filler bytes (6-7 and 30-31) are validated as part of the frame
/// length but not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusFrame {
    pub print_head_mark: u8,
    pub size: u8,
    pub manufacturer_code: u8,
    pub series_code: u8,
    pub model_code: u8,
    pub country_code: u8,
    pub error_code: u16,
    /// Installed tape width in millimeters.
    pub media_width: u8,
    pub media_type: u8,
    pub ncol: u8,
    pub fonts: u8,
    pub jp_fonts: u8,
    pub mode: u8,
    pub density: u8,
    /// Die-cut label length in millimeters, 0 for continuous tape.
    pub media_length: u8,
    pub status_code: u8,
    pub phase_type: u8,
    pub phase_number: u16,
    pub notification_code: u8,
    pub expansion_area: u8,
    pub tape_color: u8,
    pub text_color: u8,
    pub hw_setting: u32,
}

impl StatusFrame {
    /// Decode one frame from a raw device read.
    ///
    /// The input must be exactly [`FRAME_LEN`] bytes; callers accumulate
    /// partial reads until a full frame is available.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() != FRAME_LEN {
            return Err(FrameError::Length(buf.len()));
        }

        Ok(StatusFrame {
            print_head_mark: buf[0],
            size: buf[1],
            manufacturer_code: buf[2],
            series_code: buf[3],
            model_code: buf[4],
            country_code: buf[5],
            error_code: u16::from_le_bytes([buf[8], buf[9]]),
            media_width: buf[10],
            media_type: buf[11],
            ncol: buf[12],
            fonts: buf[13],
            jp_fonts: buf[14],
            mode: buf[15],
            density: buf[16],
            media_length: buf[17],
            status_code: buf[18],
            phase_type: buf[19],
            phase_number: u16::from_le_bytes([buf[20], buf[21]]),
            notification_code: buf[22],
            expansion_area: buf[23],
            tape_color: buf[24],
            text_color: buf[25],
            hw_setting: u32::from_le_bytes([buf[26], buf[27], buf[28], buf[29]]),
        })
    }

    /// A frame is genuine iff the signature bytes match.
    ///
    /// Anything else means the stream is desynchronized or the device is not
    /// a P-touch printer; such frames must never reach driver state.
    pub fn is_valid(&self) -> bool {
        self.print_head_mark == 0x80 && self.size == 0x20 && self.manufacturer_code == 0x42
    }

    pub fn error_flags(&self) -> ErrorFlags {
        ErrorFlags::from_bits_truncate(self.error_code)
    }

    /// All reported error conditions joined into one line.
    pub fn error_description(&self) -> String {
        let flags = self.error_flags();
        let parts: Vec<&str> = ERROR_DESCRIPTIONS
            .iter()
            .filter(|(flag, _)| flags.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        parts.join(", ")
    }

    pub fn status_description(&self) -> &'static str {
        match self.status_code {
            0x00 => "Reply to status request",
            0x01 => "Printing completed",
            0x02 => "Error occurred",
            0x03 => "Exit IF mode",
            0x04 => "Turned off",
            0x05 => "Notification",
            0x06 => "Phase change",
            _ => "Unknown",
        }
    }

    pub fn phase_type_description(&self) -> &'static str {
        match self.phase_type {
            0x00 => "Editing",
            0x01 => "Printing",
            _ => "Unknown",
        }
    }

    pub fn phase_description(&self) -> &'static str {
        match self.phase_number {
            0x0000 => "Editing",
            0x0001 => "Printing",
            0x000a => "Not used",
            0x0014 => "Cover open while receiving",
            0x0019 => "Not used",
            _ => "Unknown",
        }
    }

    pub fn notification_description(&self) -> &'static str {
        match self.notification_code {
            0x00 => "Not available",
            0x01 => "Cover open",
            0x02 => "Cover closed",
            _ => "Unknown",
        }
    }

    pub fn media_type_description(&self) -> &'static str {
        media_type_description(self.media_type)
    }

    pub fn tape_color_description(&self) -> &'static str {
        color_description(self.tape_color)
    }

    pub fn text_color_description(&self) -> &'static str {
        color_description(self.text_color)
    }
}

// Tape and text colors share one code space; the text color table in the
// reference documentation is a strict subset.
fn color_description(code: u8) -> &'static str {
    match code {
        0x01 => "White",
        0x02 => "Other",
        0x03 => "Clear",
        0x04 => "Red",
        0x05 => "Blue",
        0x06 => "Yellow",
        0x07 => "Green",
        0x08 => "Black",
        0x09 => "Clear(White text)",
        0x20 => "Matte White",
        0x21 => "Matte Clear",
        0x22 => "Matte Silver",
        0x23 => "Satin Gold",
        0x24 => "Satin Silver",
        0x30 => "Blue(D)",
        0x31 => "Red(D)",
        0x40 => "Fluorescent Orange",
        0x41 => "Fluorescent Yellow",
        0x50 => "Berry Pink(S)",
        0x51 => "Light Gray(S)",
        0x52 => "Lime Green(S)",
        0x60 => "Yellow(F)",
        0x61 => "Pink(F)",
        0x62 => "Blue(F)",
        0x70 => "White(Heat-shrink Tube)",
        0x90 => "White(Flex. ID)",
        0x91 => "Yellow(Flex. ID)",
        0xf0 => "Cleaning",
        0xf1 => "Stencil",
        0xff => "Incompatible",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_frame_bytes() -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[0] = 0x80; // print head mark
        buf[1] = 0x20; // size
        buf[2] = 0x42; // manufacturer code "B"
        buf[3] = 0x30;
        buf[4] = 0x64; // PT-H500
        buf[10] = 24; // media width
        buf[11] = 0x01; // laminated
        buf[18] = STATUS_PHASE_CHANGE;
        buf[19] = PHASE_PRINTING;
        buf
    }

    #[test]
    fn decode_rejects_short_and_long_input() {
        for len in [0usize, 1, 16, 31, 33, 64].iter() {
            let buf = vec![0u8; *len];
            assert_eq!(StatusFrame::decode(&buf), Err(FrameError::Length(*len)));
        }
    }

    #[test]
    fn decode_maps_field_offsets() {
        let mut buf = valid_frame_bytes();
        buf[8] = 0x01; // error low byte
        buf[9] = 0x20; // error high byte
        buf[17] = 42;
        buf[20] = 0x01;
        buf[21] = 0x00;
        buf[22] = 0x02;
        buf[24] = 0x08;
        buf[25] = 0x01;
        buf[26] = 0x78;
        buf[27] = 0x56;
        buf[28] = 0x34;
        buf[29] = 0x12;

        let frame = StatusFrame::decode(&buf).unwrap();
        assert_eq!(frame.model_code, 0x64);
        assert_eq!(frame.error_code, 0x2001);
        assert_eq!(frame.media_width, 24);
        assert_eq!(frame.media_type, 0x01);
        assert_eq!(frame.media_length, 42);
        assert_eq!(frame.status_code, STATUS_PHASE_CHANGE);
        assert_eq!(frame.phase_type, PHASE_PRINTING);
        assert_eq!(frame.phase_number, 0x0001);
        assert_eq!(frame.notification_code, 0x02);
        assert_eq!(frame.tape_color, 0x08);
        assert_eq!(frame.text_color, 0x01);
        assert_eq!(frame.hw_setting, 0x1234_5678);
    }

    #[test]
    fn validation_requires_all_signature_bytes() {
        let frame = StatusFrame::decode(&valid_frame_bytes()).unwrap();
        assert!(frame.is_valid());

        for offset in [0usize, 1, 2].iter() {
            let mut buf = valid_frame_bytes();
            buf[*offset] ^= 0xFF;
            let mutated = StatusFrame::decode(&buf).unwrap();
            assert!(!mutated.is_valid(), "byte {} should break validation", offset);
        }
    }

    #[test]
    fn error_description_collects_set_bits() {
        let mut buf = valid_frame_bytes();
        buf[8] = 0x01; // no media
        buf[9] = 0x10; // cover open
        let frame = StatusFrame::decode(&buf).unwrap();
        assert_eq!(frame.error_description(), "No media, Cover open");

        let clean = StatusFrame::decode(&valid_frame_bytes()).unwrap();
        assert_eq!(clean.error_description(), "");
    }

    #[test]
    fn descriptions_fall_back_to_unknown() {
        let mut buf = valid_frame_bytes();
        buf[18] = 0x7F;
        buf[19] = 0x7F;
        buf[22] = 0x7F;
        buf[24] = 0xEE;
        let frame = StatusFrame::decode(&buf).unwrap();
        assert_eq!(frame.status_description(), "Unknown");
        assert_eq!(frame.phase_type_description(), "Unknown");
        assert_eq!(frame.notification_description(), "Unknown");
        assert_eq!(frame.tape_color_description(), "Unknown");
    }
}
