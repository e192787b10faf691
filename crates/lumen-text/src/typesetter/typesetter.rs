use super::Style;
use super::compose::{combine_image_buffer, set_mask_for_image_buffer};
use super::decorations::{
    LineExtent, draw_background_color, draw_glyphs_background, draw_strikethrough, draw_underline,
    strikethrough_color_of, underline_properties_of,
};
use super::glyph::typeset_glyph;
use super::pixel::{PixelData, PixelFormat, premultiplied};
use crate::bidi::LayoutDirection;
use crate::font::FontClient;
use crate::layout::line_height;
use crate::model::{
    Color, FontId, GlyphIndex, Size, UnderlineStyleProperties, Vector2, VerticalAlignment, VisualModel,
};

/// Which layers [`Typesetter::render`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderBehaviour {
    /// The text with every enabled style.
    #[default]
    TextAndStyles,
    /// The styles without the text itself.
    NoText,
    /// The text without styles.
    NoStyles,
    /// The text as a coverage mask.
    Mask,
    /// Only the underline and strikethrough layers.
    OverlayStyle,
}

/// Draws the glyphs and decorations of a laid-out [`VisualModel`].
pub struct Typesetter<'a> {
    model: &'a VisualModel,
}

/// Offsets shared by every line of one image buffer pass.
#[derive(Debug, Clone, Copy)]
struct Pass {
    style: Style,
    format: PixelFormat,
    ignore_horizontal_alignment: bool,
    horizontal_offset: f32,
    vertical_offset: f32,
    from_glyph: GlyphIndex,
    to_glyph: GlyphIndex,
}

impl<'a> Typesetter<'a> {
    pub fn new(model: &'a VisualModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &VisualModel {
        self.model
    }

    /// Render the text into a `size` image.
    ///
    /// Layers are composited bottom to top: markup underline and
    /// strikethrough, background, shadow, outline, the text, then the
    /// control-level underline and strikethrough. Alpha-only output carries
    /// the text alone. A zero size gives an empty image.
    pub fn render(
        &self,
        font_client: &mut dyn FontClient,
        size: Size,
        direction: LayoutDirection,
        behaviour: RenderBehaviour,
        ignore_horizontal_alignment: bool,
        format: PixelFormat,
    ) -> PixelData {
        let width = size.width.max(0.0) as u32;
        let height = size.height.max(0.0) as u32;
        if width == 0 || height == 0 {
            return PixelData::empty(format);
        }

        let model = self.model;
        let layout = model.layout_size();
        let outline_width = f32::from(model.outline_width());

        let pen_x = if ignore_horizontal_alignment && direction == LayoutDirection::RightToLeft {
            (size.width - layout.width - outline_width).max(0.0)
        } else {
            outline_width
        };
        let pen_y = outline_width
            + match model.vertical_alignment() {
                VerticalAlignment::Top => 0.0,
                VerticalAlignment::Center => ((size.height - layout.height) / 2.0).floor(),
                VerticalAlignment::Bottom => size.height - layout.height,
            };

        let pass = |style: Style| Pass {
            style,
            format,
            ignore_horizontal_alignment,
            horizontal_offset: pen_x,
            vertical_offset: pen_y,
            from_glyph: 0,
            to_glyph: model.glyphs.len().saturating_sub(1),
        };

        tracing::trace!(width, height, ?behaviour, ?format, "rendering text");

        let text_style = if behaviour == RenderBehaviour::Mask { Style::Mask } else { Style::None };
        let mut image = match behaviour {
            RenderBehaviour::NoText | RenderBehaviour::OverlayStyle => PixelData::new(width, height, format),
            _ => self.create_image_buffer(font_client, width, height, pass(text_style)),
        };

        if format == PixelFormat::A8 || matches!(behaviour, RenderBehaviour::NoStyles | RenderBehaviour::Mask) {
            return image;
        }

        if behaviour != RenderBehaviour::OverlayStyle {
            if model.outline_width() > 0 {
                let outline = self.create_image_buffer(font_client, width, height, pass(Style::Outline));
                image = combine_image_buffer(image, outline, true);
            }

            let shadow_offset = model.shadow_offset();
            let has_shadow = shadow_offset.x.abs() > f32::EPSILON || shadow_offset.y.abs() > f32::EPSILON;
            if has_shadow && model.shadow_color().a > f32::EPSILON {
                let shadow = self.create_image_buffer(font_client, width, height, pass(Style::Shadow));
                image = combine_image_buffer(image, shadow, true);
            }

            if model.is_background_enabled() {
                let mut background = self.create_image_buffer(font_client, width, height, pass(Style::Background));
                if model.is_cutout_enabled() {
                    set_mask_for_image_buffer(&image, &mut background, 1.0);
                    image = background;
                } else {
                    image = combine_image_buffer(image, background, true);
                }
            }

            if model.is_markup_background_color_set() {
                let mut backgrounds = PixelData::new(width, height, format);
                draw_glyphs_background(&mut backgrounds, model, ignore_horizontal_alignment, pen_x, pen_y);
                image = combine_image_buffer(image, backgrounds, true);
            }
        }

        if model.is_underline_enabled() {
            let underline = self.create_image_buffer(font_client, width, height, pass(Style::Underline));
            image = combine_image_buffer(underline, image, false);
        } else {
            image = self.apply_underline_markup_image_buffer(font_client, image, width, height, pass(Style::Underline));
        }

        if model.is_strikethrough_enabled() {
            let strikethrough = self.create_image_buffer(font_client, width, height, pass(Style::Strikethrough));
            image = combine_image_buffer(strikethrough, image, false);
        } else {
            image = self.apply_strikethrough_markup_image_buffer(
                font_client,
                image,
                width,
                height,
                pass(Style::Strikethrough),
            );
        }

        image
    }

    /// Draw the glyphs `[from_glyph, to_glyph]` of every line in `style`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_image_buffer_range(
        &self,
        font_client: &mut dyn FontClient,
        width: u32,
        height: u32,
        style: Style,
        ignore_horizontal_alignment: bool,
        format: PixelFormat,
        horizontal_offset: i32,
        vertical_offset: i32,
        from_glyph: GlyphIndex,
        to_glyph: GlyphIndex,
    ) -> PixelData {
        let pass = Pass {
            style,
            format,
            ignore_horizontal_alignment,
            horizontal_offset: horizontal_offset as f32,
            vertical_offset: vertical_offset as f32,
            from_glyph,
            to_glyph,
        };
        self.create_image_buffer(font_client, width, height, pass)
    }

    /// Markup underline runs go under everything drawn so far.
    fn apply_underline_markup_image_buffer(
        &self,
        font_client: &mut dyn FontClient,
        mut image: PixelData,
        width: u32,
        height: u32,
        pass: Pass,
    ) -> PixelData {
        for run in &self.model.underline_runs {
            if run.glyph_run.number_of_glyphs == 0 {
                continue;
            }
            let layer = self.create_image_buffer(
                font_client,
                width,
                height,
                Pass {
                    from_glyph: run.glyph_run.glyph_index,
                    to_glyph: run.glyph_run.end() - 1,
                    ..pass
                },
            );
            image = combine_image_buffer(image, layer, true);
        }
        image
    }

    fn apply_strikethrough_markup_image_buffer(
        &self,
        font_client: &mut dyn FontClient,
        mut image: PixelData,
        width: u32,
        height: u32,
        pass: Pass,
    ) -> PixelData {
        for run in &self.model.strikethrough_runs {
            if run.glyph_run.number_of_glyphs == 0 {
                continue;
            }
            let layer = self.create_image_buffer(
                font_client,
                width,
                height,
                Pass {
                    from_glyph: run.glyph_run.glyph_index,
                    to_glyph: run.glyph_run.end() - 1,
                    ..pass
                },
            );
            image = combine_image_buffer(image, layer, true);
        }
        image
    }

    fn create_image_buffer(
        &self,
        font_client: &mut dyn FontClient,
        width: u32,
        height: u32,
        pass: Pass,
    ) -> PixelData {
        let model = self.model;
        let mut target = PixelData::new(width, height, pass.format);

        let outline_width = f32::from(model.outline_width());
        let style_shift = match pass.style {
            Style::Outline => {
                let offset = model.outline_offset();
                Vector2::new(offset.x - outline_width, offset.y - outline_width)
            }
            Style::Shadow => {
                let offset = model.shadow_offset();
                Vector2::new(offset.x - outline_width, offset.y - outline_width)
            }
            _ => Vector2::ZERO,
        };
        let default_color = match pass.style {
            Style::Outline => model.outline_color(),
            Style::Shadow => model.shadow_color(),
            Style::Background => model.background_color(),
            _ => model.text_color(),
        };
        let common_underline = UnderlineStyleProperties {
            underline_type: model.underline_type(),
            color: model.underline_color(),
            height: model.underline_height(),
            dash_gap: model.dashed_underline_gap(),
            dash_width: model.dashed_underline_width(),
            type_defined: true,
            color_defined: true,
            height_defined: true,
            dash_gap_defined: true,
            dash_width_defined: true,
        };
        let bitmap_outline = match pass.style {
            Style::Outline | Style::Shadow => model.outline_width(),
            _ => 0,
        };
        let draws_glyphs = matches!(pass.style, Style::None | Style::Mask | Style::Outline | Style::Shadow);

        let mut line_top = pass.vertical_offset + style_shift.y;
        for line in &model.lines {
            let horizontal = pass.horizontal_offset
                + style_shift.x
                + if pass.ignore_horizontal_alignment { 0.0 } else { line.alignment_offset };
            let line_baseline = line_top + line.ascender;

            let mut baseline: f32 = 0.0;
            let mut extent = LineExtent::empty(0.0);
            let mut underline = None;
            let mut max_underline_height = common_underline.height;
            let mut strikethrough = None;
            let mut max_strikethrough_height = model.strikethrough_height();
            let mut underline_position = 0.0;
            let mut last_font: Option<FontId> = None;

            let first = line.glyph_run.glyph_index.max(pass.from_glyph);
            let last = line.glyph_run.end().min(pass.to_glyph.saturating_add(1));
            for glyph_index in first..last {
                let (Some(glyph), Some(&position)) =
                    (model.glyphs.get(glyph_index), model.glyph_positions.get(glyph_index))
                else {
                    break;
                };
                if glyph.width < f32::EPSILON || glyph.height < f32::EPSILON {
                    continue;
                }

                let glyph_underline = if model.is_underline_enabled() {
                    Some(underline_properties_of(glyph_index, &model.underline_runs, &common_underline).unwrap_or(common_underline))
                } else {
                    underline_properties_of(glyph_index, &model.underline_runs, &common_underline)
                };
                let glyph_strikethrough = if model.is_strikethrough_enabled() {
                    Some(
                        strikethrough_color_of(glyph_index, &model.strikethrough_runs, model.strikethrough_color())
                            .unwrap_or(model.strikethrough_color()),
                    )
                } else {
                    strikethrough_color_of(glyph_index, &model.strikethrough_runs, model.strikethrough_color())
                };

                if last_font != Some(glyph.font_id) && (glyph_underline.is_some() || glyph_strikethrough.is_some()) {
                    let metrics = font_client.font_metrics(glyph.font_id);
                    underline_position = metrics.underline_position.abs().ceil();
                    if let Some(properties) = &glyph_underline {
                        let thickness = if properties.height.abs() < f32::EPSILON {
                            metrics.underline_thickness.ceil().max(1.0)
                        } else {
                            properties.height
                        };
                        max_underline_height = max_underline_height.max(thickness);
                    }
                    if glyph_strikethrough.is_some() {
                        max_strikethrough_height = max_strikethrough_height.max(1.0);
                    }
                    last_font = Some(glyph.font_id);
                }
                if glyph_underline.is_some() {
                    underline = glyph_underline;
                }
                if glyph_strikethrough.is_some() {
                    strikethrough = glyph_strikethrough;
                }

                baseline = baseline.max(position.y + glyph.y_bearing);
                extent.include(Vector2::new(position.x + horizontal, position.y), glyph);

                if !draws_glyphs {
                    continue;
                }

                let mut color = match pass.style {
                    Style::Outline | Style::Shadow => default_color,
                    _ => glyph_color(model, glyph_index, default_color),
                };
                if pass.style == Style::None && model.is_cutout_enabled() {
                    color.a = 1.0;
                }

                let Some(bitmap) = font_client.create_bitmap(
                    glyph.font_id,
                    glyph.index,
                    glyph.is_italic_required,
                    glyph.is_bold_required,
                    bitmap_outline,
                ) else {
                    tracing::warn!(font_id = glyph.font_id, glyph = glyph.index, "glyph bitmap unavailable; skipped");
                    continue;
                };

                let (shift_x, shift_y) = if pass.style == Style::Outline {
                    (bitmap.outline_offset_x, bitmap.outline_offset_y)
                } else {
                    (0, 0)
                };
                typeset_glyph(
                    &mut target,
                    &bitmap,
                    (horizontal + position.x) as i32 - shift_x,
                    (line_baseline + position.y) as i32 - shift_y,
                    premultiplied(color),
                    pass.style,
                );
            }

            extent.baseline = line_baseline + baseline;
            match pass.style {
                Style::Underline => {
                    if let Some(properties) = &underline {
                        let underline_y = extent.baseline + underline_position;
                        draw_underline(&mut target, properties, underline_y, max_underline_height, &extent);
                    }
                }
                Style::Background => draw_background_color(&mut target, default_color, line, &extent),
                Style::Strikethrough => {
                    if let Some(color) = strikethrough {
                        let strikethrough_y = extent.baseline + underline_position - line.ascender * 0.5;
                        draw_strikethrough(&mut target, color, strikethrough_y, max_strikethrough_height, &extent);
                    }
                }
                _ => {}
            }

            line_top += line_height(line);
        }

        target
    }
}

/// The markup color of a glyph, or `default_color` for index 0.
fn glyph_color(model: &VisualModel, glyph_index: GlyphIndex, default_color: Color) -> Color {
    match model.color_indices.get(glyph_index).copied().unwrap_or(0) {
        0 => default_color,
        index => model.colors.get(usize::from(index) - 1).copied().unwrap_or(default_color),
    }
}
