/// Font-level metrics in font units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    /// Ascent above baseline (positive).
    pub ascent: f32,
    /// Descent below baseline (positive).
    pub descent: f32,
    /// Line gap (leading).
    pub line_gap: f32,
    pub units_per_em: u16,
    /// Underline position relative to the baseline; negative below it.
    pub underline_position: f32,
    pub underline_thickness: f32,
}

impl FontMetrics {
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }

    /// Scale to a pixel size, where `font_size` is in pixels per em.
    pub fn scale_to_pixels(&self, font_size: f32) -> ScaledFontMetrics {
        let scale = if self.units_per_em != 0 {
            font_size / self.units_per_em as f32
        } else {
            1.0
        };
        ScaledFontMetrics {
            ascender: self.ascent * scale,
            descender: -self.descent * scale,
            line_gap: self.line_gap * scale,
            underline_position: self.underline_position * scale,
            underline_thickness: self.underline_thickness * scale,
            font_size,
        }
    }

    /// Scale for a size in points at a given DPI (`px = pt * dpi / 72`).
    pub fn scale_from_points(&self, font_size_pt: f32, dpi: f32) -> ScaledFontMetrics {
        self.scale_to_pixels(font_size_pt * dpi / 72.0)
    }
}

/// Font metrics in pixels, the way layout and the typesetter consume them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScaledFontMetrics {
    /// Distance above the baseline (positive).
    pub ascender: f32,
    /// Distance below the baseline (negative).
    pub descender: f32,
    pub line_gap: f32,
    /// Negative below the baseline.
    pub underline_position: f32,
    pub underline_thickness: f32,
    pub font_size: f32,
}

impl ScaledFontMetrics {
    pub fn height(&self) -> f32 {
        self.ascender - self.descender
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_by_units_per_em() {
        let metrics = FontMetrics {
            ascent: 800.0,
            descent: 200.0,
            line_gap: 100.0,
            units_per_em: 1000,
            underline_position: -100.0,
            underline_thickness: 50.0,
        };
        let scaled = metrics.scale_to_pixels(20.0);
        assert_eq!(scaled.ascender, 16.0);
        assert_eq!(scaled.descender, -4.0);
        assert_eq!(scaled.height(), 20.0);
        assert_eq!(scaled.underline_position, -2.0);
        assert_eq!(scaled.underline_thickness, 1.0);
        assert_eq!(metrics.scale_from_points(15.0, 96.0).font_size, 20.0);
    }
}
