//! Per-line decorations: underline, strikethrough and background fills.

use super::pixel::{PixelData, premultiplied};
use crate::model::{
    Color, ColorIndex, GlyphIndex, GlyphInfo, LineRun, StrikethroughGlyphRun, UnderlineStyleProperties,
    UnderlineType, UnderlinedGlyphRun, Vector2, VisualModel,
};

const ONE_AND_A_HALF: f32 = 1.5;

/// Horizontal extent of the drawn glyphs of one line and its baseline, in
/// buffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineExtent {
    pub left: f32,
    pub right: f32,
    pub baseline: f32,
}

impl LineExtent {
    /// An extent that any glyph widens.
    pub fn empty(baseline: f32) -> Self {
        Self {
            left: f32::MAX,
            right: f32::MIN,
            baseline,
        }
    }

    pub fn include(&mut self, position: Vector2, glyph: &GlyphInfo) {
        self.left = self.left.min(position.x - glyph.x_bearing);
        self.right = self.right.max(position.x - glyph.x_bearing + glyph.advance);
    }

    pub fn is_empty(&self) -> bool {
        self.right < self.left
    }

    /// Columns covered, with the right edge included.
    fn columns(&self, width: u32) -> (u32, u32) {
        let min = self.left.max(0.0) as u32;
        let max = ((self.right + 1.0).max(0.0) as u32).min(width);
        (min, max)
    }
}

/// The underline style of `glyph_index`: the markup run covering it
/// overrides the control-level style property by property.
pub fn underline_properties_of(
    glyph_index: GlyphIndex,
    runs: &[UnderlinedGlyphRun],
    common: &UnderlineStyleProperties,
) -> Option<UnderlineStyleProperties> {
    let run = runs.iter().find(|run| run.glyph_run.contains(glyph_index))?;
    let own = &run.properties;
    Some(UnderlineStyleProperties {
        underline_type: if own.type_defined { own.underline_type } else { common.underline_type },
        color: if own.color_defined { own.color } else { common.color },
        height: if own.height_defined { own.height } else { common.height },
        dash_gap: if own.dash_gap_defined { own.dash_gap } else { common.dash_gap },
        dash_width: if own.dash_width_defined { own.dash_width } else { common.dash_width },
        ..*common
    })
}

/// The strikethrough color of `glyph_index` when a markup run covers it.
pub fn strikethrough_color_of(
    glyph_index: GlyphIndex,
    runs: &[StrikethroughGlyphRun],
    common: Color,
) -> Option<Color> {
    runs.iter()
        .find(|run| run.glyph_run.contains(glyph_index))
        .map(|run| if run.is_color_set { run.color } else { common })
}

/// Fill the line box from its ascender to its descender over `extent`.
pub fn draw_background_color(target: &mut PixelData, color: Color, line: &LineRun, extent: &LineExtent) {
    if extent.is_empty() {
        return;
    }
    let y_min = (extent.baseline - line.ascender).max(0.0) as u32;
    let y_max = ((extent.baseline - line.descender).max(0.0) as u32).min(target.height());
    let (x_min, x_max) = extent.columns(target.width());
    if y_max <= y_min || x_max <= x_min {
        return;
    }
    target.fill_rect(x_min, x_max, y_min, y_max, &premultiplied(color));
}

/// Draw an underline `height` pixels thick whose top sits at `underline_y`.
///
/// Dashed underlines alternate `dash_width` painted and `dash_gap` skipped
/// columns; double underlines add a second line one and a half heights
/// above the first.
pub fn draw_underline(
    target: &mut PixelData,
    properties: &UnderlineStyleProperties,
    underline_y: f32,
    height: f32,
    extent: &LineExtent,
) {
    if extent.is_empty() {
        return;
    }
    let (x_min, x_max) = extent.columns(target.width());
    let y_min = underline_y.max(0.0) as u32;
    let y_max = y_min.saturating_add(height.max(0.0) as u32).min(target.height());
    if x_max <= x_min || (properties.underline_type != UnderlineType::Double && y_max <= y_min) {
        return;
    }

    let pixel = premultiplied(properties.color);
    match properties.underline_type {
        UnderlineType::Solid => target.fill_rect(x_min, x_max, y_min, y_max, &pixel),
        UnderlineType::Dashed => {
            for y in y_min..y_max {
                let row = target.row_mut(y, x_min, x_max);
                for (column, out) in row.chunks_exact_mut(4).enumerate() {
                    if is_dash(column, properties.dash_width, properties.dash_gap) {
                        out.copy_from_slice(&pixel);
                    }
                }
            }
        }
        UnderlineType::Double => {
            target.fill_rect(x_min, x_max, y_min, y_max, &pixel);
            let second = underline_y - ONE_AND_A_HALF * height;
            let second_min = second.max(0.0) as u32;
            let second_max = ((second + height).max(0.0) as u32).min(target.height());
            target.fill_rect(x_min, x_max, second_min, second_max, &pixel);
        }
    }
}

/// Whether `column` of a dashed line is painted: `dash_width` columns on,
/// then `dash_gap` off, then one reset column.
fn is_dash(column: usize, dash_width: f32, dash_gap: f32) -> bool {
    let width = dash_width.max(0.0) as usize;
    let period = width + dash_gap.max(0.0) as usize + 1;
    width > 0 && column % period < width
}

/// Draw a strikethrough `height` pixels thick starting at `strikethrough_y`.
pub fn draw_strikethrough(
    target: &mut PixelData,
    color: Color,
    strikethrough_y: f32,
    height: f32,
    extent: &LineExtent,
) {
    if extent.is_empty() {
        return;
    }
    let (x_min, x_max) = extent.columns(target.width());
    let y_min = strikethrough_y.max(0.0) as u32;
    let y_max = ((strikethrough_y + height).max(0.0) as u32).min(target.height());
    if y_max <= y_min || x_max <= x_min {
        return;
    }
    target.fill_rect(x_min, x_max, y_min, y_max, &premultiplied(color));
}

/// Paint the markup background colors of every line.
///
/// Consecutive glyphs sharing a background color index form one box;
/// glyphs with index 0 have no background.
pub fn draw_glyphs_background(
    target: &mut PixelData,
    visual: &VisualModel,
    ignore_horizontal_alignment: bool,
    horizontal_offset: f32,
    vertical_offset: f32,
) {
    if visual.background_colors.is_empty() {
        return;
    }

    let mut line_top = vertical_offset;
    for line in &visual.lines {
        let x_offset = horizontal_offset + if ignore_horizontal_alignment { 0.0 } else { line.alignment_offset };
        let baseline = line_top + line.ascender;

        let mut current: Option<(ColorIndex, LineExtent)> = None;
        for glyph_index in line.glyph_run.glyph_index..line.glyph_run.end() {
            let (Some(glyph), Some(&position)) =
                (visual.glyphs.get(glyph_index), visual.glyph_positions.get(glyph_index))
            else {
                break;
            };
            if glyph.width <= f32::EPSILON || glyph.height <= f32::EPSILON {
                continue;
            }
            let index = visual.background_color_indices.get(glyph_index).copied().unwrap_or(0);
            if current.as_ref().is_some_and(|&(open, _)| open != index) {
                if let Some((open, extent)) = current.take() {
                    draw_indexed_background(target, visual, open, line, &extent);
                }
            }
            if index == 0 {
                continue;
            }
            let (_, extent) = current.get_or_insert_with(|| (index, LineExtent::empty(baseline)));
            extent.include(Vector2::new(position.x + x_offset, position.y), glyph);
        }
        if let Some((open, extent)) = current {
            draw_indexed_background(target, visual, open, line, &extent);
        }

        line_top += crate::layout::line_height(line);
    }
}

fn draw_indexed_background(
    target: &mut PixelData,
    visual: &VisualModel,
    index: ColorIndex,
    line: &LineRun,
    extent: &LineExtent,
) {
    if let Some(&color) = visual.background_colors.get(usize::from(index) - 1) {
        draw_background_color(target, color, line, extent);
    }
}
