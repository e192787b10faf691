//! Whole-buffer compositing of the rendered layers.

use super::pixel::{PixelData, PixelFormat};

/// `x * y / 255` without a division, exact for all byte inputs.
#[inline]
pub fn multiply_and_normalize_color(x: u8, y: u8) -> u8 {
    let xy = u32::from(x) * u32::from(y);
    (((xy << 15) + (xy << 7) + xy) >> 23) as u8
}

/// Composite `top` over `bottom`, both premultiplied RGBA.
///
/// Where the top pixel is transparent the bottom one shows, where it is
/// opaque it wins, and in between the bottom is attenuated by the top alpha.
/// The result is written into `top` when `store_into_top` is set, otherwise
/// into `bottom`. Buffers of different shapes leave `top` as the result.
pub fn combine_image_buffer(top: PixelData, bottom: PixelData, store_into_top: bool) -> PixelData {
    if bottom.is_empty() {
        return top;
    }
    if top.is_empty() {
        return bottom;
    }
    if !top.same_shape(&bottom) || top.format() != PixelFormat::Rgba8888 {
        tracing::warn!(
            top_width = top.width(),
            bottom_width = bottom.width(),
            "cannot combine image buffers of different shapes"
        );
        return top;
    }

    let (mut target, source, source_is_top) = if store_into_top {
        (top, bottom, false)
    } else {
        (bottom, top, true)
    };

    for (target, source) in target
        .bytes_mut()
        .chunks_exact_mut(4)
        .zip(source.as_bytes().chunks_exact(4))
    {
        let (top_pixel, bottom_pixel): ([u8; 4], [u8; 4]) = if source_is_top {
            (pixel(source), pixel(target))
        } else {
            (pixel(target), pixel(source))
        };
        target.copy_from_slice(&over(top_pixel, bottom_pixel));
    }
    target
}

/// Cut the alpha of `top` out of `bottom`.
///
/// Every channel of a bottom pixel is scaled by the inverse of the top
/// alpha, weighted by `origin_alpha`, so opaque text punches a fully
/// transparent hole into the layer under it.
pub fn set_mask_for_image_buffer(top: &PixelData, bottom: &mut PixelData, origin_alpha: f32) {
    if !top.same_shape(bottom) || top.format() != PixelFormat::Rgba8888 {
        tracing::warn!("mask and masked buffer differ in shape");
        return;
    }
    let strength = (origin_alpha.clamp(0.0, 1.0) * 255.0) as u8;
    for (bottom, top) in bottom
        .bytes_mut()
        .chunks_exact_mut(4)
        .zip(top.as_bytes().chunks_exact(4))
    {
        let keep = 255 - multiply_and_normalize_color(top[3], strength);
        for channel in bottom.iter_mut() {
            *channel = multiply_and_normalize_color(*channel, keep);
        }
    }
}

fn pixel(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn over(top: [u8; 4], bottom: [u8; 4]) -> [u8; 4] {
    match top[3] {
        0 => bottom,
        255 => top,
        alpha => {
            let inverse = 255 - alpha;
            core::array::from_fn(|index| {
                top[index].saturating_add(multiply_and_normalize_color(bottom[index], inverse))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(pixel: [u8; 4]) -> PixelData {
        let mut buffer = PixelData::new(1, 1, PixelFormat::Rgba8888);
        buffer.fill_rect(0, 1, 0, 1, &pixel);
        buffer
    }

    #[test]
    fn multiply_and_normalize_matches_division() {
        for x in 0..=255u8 {
            for y in [0u8, 1, 127, 128, 254, 255] {
                let expected = (u32::from(x) * u32::from(y) / 255) as u8;
                assert_eq!(multiply_and_normalize_color(x, y), expected, "{x} * {y}");
            }
        }
    }

    #[test]
    fn transparent_top_shows_the_bottom() {
        let result = combine_image_buffer(single([0; 4]), single([10, 20, 30, 255]), true);
        assert_eq!(result.pixel(0, 0), Some(&[10, 20, 30, 255][..]));
    }

    #[test]
    fn opaque_top_wins() {
        let result = combine_image_buffer(single([255, 0, 0, 255]), single([0, 0, 255, 255]), false);
        assert_eq!(result.pixel(0, 0), Some(&[255, 0, 0, 255][..]));
    }

    #[test]
    fn translucent_top_blends_over_the_bottom() {
        let result = combine_image_buffer(single([0, 128, 0, 128]), single([0, 0, 255, 255]), true);
        assert_eq!(result.pixel(0, 0), Some(&[0, 128, 127, 255][..]));
    }

    #[test]
    fn mismatched_buffers_keep_the_top() {
        let top = single([1, 2, 3, 4]);
        let bottom = PixelData::new(2, 1, PixelFormat::Rgba8888);
        assert_eq!(combine_image_buffer(top.clone(), bottom, false), top);
    }

    #[test]
    fn mask_clears_under_opaque_pixels() {
        let mut background = single([255; 4]);
        set_mask_for_image_buffer(&single([0, 0, 0, 255]), &mut background, 1.0);
        assert_eq!(background.alpha(0, 0), 0);

        let mut background = single([255; 4]);
        set_mask_for_image_buffer(&single([0, 0, 0, 0]), &mut background, 1.0);
        assert_eq!(background.pixel(0, 0), Some(&[255, 255, 255, 255][..]));
    }
}
