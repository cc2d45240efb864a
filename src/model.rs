//! Static catalog of supported printer models.

pub const MODEL_PT_P1230PC: u8 = 0x59;
pub const MODEL_PT_H500: u8 = 0x64;
pub const MODEL_PT_E500: u8 = 0x65;
pub const MODEL_PT_P700: u8 = 0x67;

/// Physical capabilities of one printer model.
///
/// Resolved once per session from the model code of the first valid status
/// frame and held fixed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub code: u8,
    pub is_valid: bool,
    pub name: &'static str,
    /// Print head width in pixels.
    pub pixel_width: u16,
    pub resolution: u16,
    /// Whether raster lines use the compressed-mode framing.
    pub compression: bool,
    pub min_tape_width: u8,
    pub max_tape_width: u8,
}

impl ModelInfo {
    /// Look up a model by its status frame code.
    ///
    /// Total: unknown codes yield a placeholder with `is_valid` false and
    /// zeroed capabilities instead of failing, so an unrecognized printer
    /// still reports status.
    pub fn from_code(code: u8) -> ModelInfo {
        match code {
            MODEL_PT_P1230PC => ModelInfo {
                code,
                is_valid: true,
                name: "PT-P1230PC",
                pixel_width: 64,
                resolution: 180,
                compression: false,
                min_tape_width: 4,
                max_tape_width: 12,
            },
            MODEL_PT_H500 => ModelInfo {
                code,
                is_valid: true,
                name: "PT-H500",
                pixel_width: 128,
                resolution: 180,
                compression: true,
                min_tape_width: 4,
                max_tape_width: 24,
            },
            MODEL_PT_E500 => ModelInfo {
                code,
                is_valid: true,
                name: "PT-E500",
                pixel_width: 128,
                resolution: 180,
                compression: true,
                min_tape_width: 4,
                max_tape_width: 24,
            },
            MODEL_PT_P700 => ModelInfo {
                code,
                is_valid: true,
                name: "PT-P700",
                pixel_width: 128,
                resolution: 180,
                compression: true,
                min_tape_width: 4,
                max_tape_width: 24,
            },
            _ => ModelInfo {
                code,
                is_valid: false,
                name: "Unknown",
                pixel_width: 0,
                resolution: 0,
                compression: false,
                min_tape_width: 0,
                max_tape_width: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_reference_table() {
        let p1230 = ModelInfo::from_code(0x59);
        assert!(p1230.is_valid);
        assert_eq!(p1230.name, "PT-P1230PC");
        assert_eq!(p1230.pixel_width, 64);
        assert_eq!(p1230.resolution, 180);
        assert!(!p1230.compression);
        assert_eq!((p1230.min_tape_width, p1230.max_tape_width), (4, 12));

        for (code, name) in [(0x64, "PT-H500"), (0x65, "PT-E500"), (0x67, "PT-P700")].iter() {
            let model = ModelInfo::from_code(*code);
            assert!(model.is_valid);
            assert_eq!(model.name, *name);
            assert_eq!(model.pixel_width, 128);
            assert_eq!(model.resolution, 180);
            assert!(model.compression);
            assert_eq!((model.min_tape_width, model.max_tape_width), (4, 24));
        }
    }

    #[test]
    fn unknown_codes_yield_placeholder() {
        for code in [0x00u8, 0x58, 0x66, 0xFF].iter() {
            let model = ModelInfo::from_code(*code);
            assert!(!model.is_valid);
            assert_eq!(model.code, *code);
            assert_eq!(model.name, "Unknown");
            assert_eq!(model.pixel_width, 0);
            assert!(!model.compression);
        }
    }
}
