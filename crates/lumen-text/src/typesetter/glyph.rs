use super::Style;
use super::compose::multiply_and_normalize_color;
use super::pixel::{PixelData, PixelFormat};
use crate::font::{BitmapFormat, GlyphBitmap};

/// Blit one glyph bitmap into `target` with its top-left corner at
/// `(x_offset, y_offset)`, clipped to the target.
///
/// `color` is premultiplied RGBA. Coverage glyphs never lower the alpha
/// already written by an overlapping glyph. Color glyphs are copied with
/// their alpha scaled by the color alpha; the mask and outline passes
/// clear their area instead.
pub fn typeset_glyph(
    target: &mut PixelData,
    bitmap: &GlyphBitmap,
    x_offset: i32,
    y_offset: i32,
    color: [u8; 4],
    style: Style,
) {
    if bitmap.width == 0 || bitmap.height == 0 {
        return;
    }

    let row_min = (-y_offset).max(0);
    let row_max = (bitmap.height as i32).min(target.height() as i32 - y_offset);
    let column_min = (-x_offset).max(0);
    let column_max = (bitmap.width as i32).min(target.width() as i32 - x_offset);
    if row_max <= row_min || column_max <= column_min {
        return;
    }

    let glyph_bpp = bitmap.format.bytes_per_pixel();
    let alpha_index = glyph_bpp - 1;
    let stride = bitmap.width as usize * glyph_bpp;
    let x_start = (x_offset + column_min) as u32;
    let x_end = (x_offset + column_max) as u32;
    let format = target.format();

    for row in row_min..row_max {
        let y = (y_offset + row) as u32;
        let source_start = row as usize * stride + column_min as usize * glyph_bpp;
        let source_end = row as usize * stride + column_max as usize * glyph_bpp;
        let Some(source) = bitmap.buffer.get(source_start..source_end) else {
            return;
        };
        let destination = target.row_mut(y, x_start, x_end);

        match format {
            PixelFormat::Rgba8888 if bitmap.is_color_bitmap => {
                if matches!(style, Style::Mask | Style::Outline) {
                    destination.fill(0);
                    continue;
                }
                for (out, glyph) in destination.chunks_exact_mut(4).zip(source.chunks_exact(glyph_bpp)) {
                    out.copy_from_slice(&color_glyph_pixel(glyph, bitmap.format, color, style));
                }
            }
            PixelFormat::Rgba8888 => {
                for (out, glyph) in destination.chunks_exact_mut(4).zip(source.chunks_exact(glyph_bpp)) {
                    let alpha = glyph[alpha_index];
                    if alpha == 0 {
                        continue;
                    }
                    let coverage = out[3].max(alpha);
                    if coverage == 255 {
                        out.copy_from_slice(&color);
                    } else {
                        for (channel, &input) in out.iter_mut().zip(&color) {
                            *channel = multiply_and_normalize_color(input, coverage);
                        }
                    }
                }
            }
            PixelFormat::A8 => {
                if bitmap.is_color_bitmap {
                    return;
                }
                for (out, glyph) in destination.iter_mut().zip(source.chunks_exact(glyph_bpp)) {
                    *out = (*out).max(glyph[alpha_index]);
                }
            }
        }
    }
}

fn color_glyph_pixel(glyph: &[u8], format: BitmapFormat, color: [u8; 4], style: Style) -> [u8; 4] {
    let [mut red, green, mut blue, alpha] = [glyph[0], glyph[1], glyph[2], glyph[3]];
    if format == BitmapFormat::Bgra {
        core::mem::swap(&mut red, &mut blue);
    }
    let alpha = multiply_and_normalize_color(color[3], alpha);
    if style == Style::Shadow {
        // The shadow of a color glyph takes the shadow color.
        return [
            multiply_and_normalize_color(color[0], alpha),
            multiply_and_normalize_color(color[1], alpha),
            multiply_and_normalize_color(color[2], alpha),
            alpha,
        ];
    }
    [
        multiply_and_normalize_color(red, alpha),
        multiply_and_normalize_color(green, alpha),
        multiply_and_normalize_color(blue, alpha),
        alpha,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn alpha_bitmap(width: u32, height: u32, coverage: u8) -> GlyphBitmap {
        GlyphBitmap {
            buffer: vec![coverage; (width * height) as usize],
            width,
            height,
            format: BitmapFormat::Alpha,
            is_color_bitmap: false,
            outline_offset_x: 0,
            outline_offset_y: 0,
        }
    }

    fn blue_emoji() -> GlyphBitmap {
        GlyphBitmap {
            buffer: [255, 0, 0, 255].repeat(4),
            width: 2,
            height: 2,
            format: BitmapFormat::Bgra,
            is_color_bitmap: true,
            outline_offset_x: 0,
            outline_offset_y: 0,
        }
    }

    #[test]
    fn coverage_glyphs_are_written_in_the_input_color() {
        let mut target = PixelData::new(4, 4, PixelFormat::Rgba8888);
        typeset_glyph(&mut target, &alpha_bitmap(2, 2, 255), 1, 1, RED, Style::None);
        assert_eq!(target.pixel(1, 1), Some(&RED[..]));
        assert_eq!(target.pixel(2, 2), Some(&RED[..]));
        assert_eq!(target.alpha(0, 0), 0);
        assert_eq!(target.alpha(3, 3), 0);
    }

    #[test]
    fn overlapping_glyphs_keep_the_higher_alpha() {
        let mut target = PixelData::new(2, 1, PixelFormat::Rgba8888);
        typeset_glyph(&mut target, &alpha_bitmap(2, 1, 200), 0, 0, RED, Style::None);
        typeset_glyph(&mut target, &alpha_bitmap(1, 1, 100), 0, 0, RED, Style::None);
        assert_eq!(target.pixel(0, 0), Some(&[200, 0, 0, 200][..]));
    }

    #[test]
    fn glyphs_are_clipped_at_the_edges() {
        let mut target = PixelData::new(2, 2, PixelFormat::A8);
        typeset_glyph(&mut target, &alpha_bitmap(3, 3, 90), -1, -2, RED, Style::None);
        assert_eq!(target.as_bytes(), [90, 90, 0, 0]);
    }

    #[test]
    fn color_glyphs_swap_bgra_and_scale_alpha() {
        let mut target = PixelData::new(2, 2, PixelFormat::Rgba8888);
        typeset_glyph(&mut target, &blue_emoji(), 0, 0, [0, 0, 0, 255], Style::None);
        assert_eq!(target.pixel(0, 0), Some(&[0, 0, 255, 255][..]));

        let mut target = PixelData::new(2, 2, PixelFormat::Rgba8888);
        typeset_glyph(&mut target, &blue_emoji(), 0, 0, [0, 0, 0, 0], Style::None);
        assert_eq!(target.pixel(0, 0), Some(&[0, 0, 0, 0][..]));
    }

    #[test]
    fn color_glyph_shadows_take_the_shadow_color() {
        let mut target = PixelData::new(2, 2, PixelFormat::Rgba8888);
        typeset_glyph(&mut target, &blue_emoji(), 0, 0, RED, Style::Shadow);
        assert_eq!(target.pixel(1, 1), Some(&RED[..]));
    }

    #[test]
    fn mask_pass_clears_color_glyphs() {
        let mut target = PixelData::new(2, 2, PixelFormat::Rgba8888);
        target.fill_rect(0, 2, 0, 2, &RED);
        typeset_glyph(&mut target, &blue_emoji(), 0, 0, RED, Style::Mask);
        assert!(target.as_bytes().iter().all(|&byte| byte == 0));
    }

    #[test]
    fn alpha_targets_skip_color_glyphs() {
        let mut target = PixelData::new(2, 2, PixelFormat::A8);
        typeset_glyph(&mut target, &blue_emoji(), 0, 0, RED, Style::None);
        assert!(target.as_bytes().iter().all(|&byte| byte == 0));
    }
}
