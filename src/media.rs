//! Tape media geometry and type codes.

pub const MEDIA_TYPE_NO_TAPE: u8 = 0x00;
pub const MEDIA_TYPE_LAMINATED: u8 = 0x01;
pub const MEDIA_TYPE_NON_LAMINATED: u8 = 0x03;
pub const MEDIA_TYPE_HEAT_SHRINK: u8 = 0x11;
pub const MEDIA_TYPE_INCOMPATIBLE: u8 = 0xff;

/// Maximum printable pixel width for a tape width at a given resolution.
///
/// Only 180 dpi is tabulated. A result of 0 means "no known cap": the
/// driver must fall back to the model's native pixel width instead of
/// constraining it further.
pub fn max_pixel_for_media(media_width_mm: u8, dpi: u16) -> u16 {
    if dpi != 180 {
        return 0;
    }

    match media_width_mm {
        12 => 70,
        18 => 112,
        24 => 128,
        _ => 0,
    }
}

pub fn media_type_description(code: u8) -> &'static str {
    match code {
        MEDIA_TYPE_NO_TAPE => "No media",
        MEDIA_TYPE_LAMINATED => "Laminated tape",
        MEDIA_TYPE_NON_LAMINATED => "Non-laminated tape",
        MEDIA_TYPE_HEAT_SHRINK => "Heat-Shrink Tube",
        MEDIA_TYPE_INCOMPATIBLE => "Incompatible tape",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabulated_widths_at_180_dpi() {
        assert_eq!(max_pixel_for_media(4, 180), 0);
        assert_eq!(max_pixel_for_media(6, 180), 0);
        assert_eq!(max_pixel_for_media(12, 180), 70);
        assert_eq!(max_pixel_for_media(18, 180), 112);
        assert_eq!(max_pixel_for_media(24, 180), 128);
    }

    #[test]
    fn unknown_width_or_resolution_is_uncapped() {
        assert_eq!(max_pixel_for_media(9, 180), 0);
        assert_eq!(max_pixel_for_media(36, 180), 0);
        assert_eq!(max_pixel_for_media(24, 360), 0);
        assert_eq!(max_pixel_for_media(12, 0), 0);
    }

    #[test]
    fn media_type_codes_describe() {
        assert_eq!(media_type_description(0x01), "Laminated tape");
        assert_eq!(media_type_description(0x11), "Heat-Shrink Tube");
        assert_eq!(media_type_description(0x42), "Unknown");
    }
}
