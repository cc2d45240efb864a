//! Bit packing for raster graphics lines.
//!
//! One raster line is 128 pixel columns packed into 16 bytes, MSB first
//! within each byte. Narrow tape uses a zero-padded full-width buffer; the
//! printer centers the printable region itself.

use crate::{LINE_BYTES, LINE_PIXELS};

/// Pack up to 128 black/white columns into the wire representation.
///
/// `true` means black. Inputs shorter than a full line leave the remaining
/// columns white.
pub fn pack_line(pixels: &[bool]) -> [u8; LINE_BYTES] {
    let mut packed = [0u8; LINE_BYTES];
    for (column, &black) in pixels.iter().take(LINE_PIXELS).enumerate() {
        if black {
            packed[column / 8] |= 0x80 >> (column % 8);
        }
    }
    packed
}

/// Inverse of [`pack_line`] over a full-width buffer.
pub fn unpack_line(packed: &[u8; LINE_BYTES]) -> [bool; LINE_PIXELS] {
    let mut pixels = [false; LINE_PIXELS];
    for (column, pixel) in pixels.iter_mut().enumerate() {
        *pixel = packed[column / 8] & (0x80 >> (column % 8)) != 0;
    }
    pixels
}

/// Render a packed line as terminal art, bytes high to low and bits LSB
/// first, matching the orientation of the print head.
pub fn line_to_ascii(packed: &[u8]) -> String {
    let mut out = String::with_capacity(packed.len() * 8 * 3);
    for octet in packed.iter().rev() {
        for bit in 0..8 {
            if octet & (1 << bit) != 0 {
                out.push('█');
            } else {
                out.push(' ');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternating_columns_pack_msb_first() {
        let pixels: Vec<bool> = (0..LINE_PIXELS).map(|i| i % 2 == 0).collect();
        let packed = pack_line(&pixels);
        for byte in packed.iter() {
            assert_eq!(*byte, 0b1010_1010);
        }
    }

    #[test]
    fn short_input_pads_with_white() {
        let packed = pack_line(&[true]);
        assert_eq!(packed[0], 0b1000_0000);
        assert!(packed[1..].iter().all(|b| *b == 0));

        assert_eq!(pack_line(&[]), [0u8; LINE_BYTES]);
    }

    #[test]
    fn pack_unpack_round_trips() {
        // pseudo-random but deterministic pattern, plus both extremes
        let patterns: Vec<Vec<bool>> = vec![
            vec![true; LINE_PIXELS],
            vec![false; LINE_PIXELS],
            (0..LINE_PIXELS).map(|i| (i * 7 + 3) % 5 < 2).collect(),
            (0..77).map(|i| i % 3 == 0).collect(),
        ];

        for pattern in patterns {
            let packed = pack_line(&pattern);
            let unpacked = unpack_line(&packed);
            for (column, &black) in pattern.iter().enumerate() {
                assert_eq!(unpacked[column], black, "column {}", column);
            }
            for column in pattern.len()..LINE_PIXELS {
                assert!(!unpacked[column]);
            }
        }
    }

    #[test]
    fn ascii_art_reverses_byte_order() {
        let mut packed = [0u8; LINE_BYTES];
        packed[LINE_BYTES - 1] = 0x01;
        let art = line_to_ascii(&packed);
        let glyphs: Vec<char> = art.chars().collect();
        assert_eq!(glyphs.len(), LINE_PIXELS);
        assert_eq!(glyphs[0], '█');
        assert!(glyphs[1..].iter().all(|c| *c == ' '));
    }
}
