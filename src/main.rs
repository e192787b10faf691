//! lumen - render a paragraph of text to a PNG.
//!
//! Usage: `lumen [--config lumen.toml] [--output out.png] <text>...`
//!
//! Settings come from the config file; `RUST_LOG` controls logging.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use lumen_config::{
    Behaviour, Format, HorizontalAlign, LumenConfig, Rgba, UnderlineKind, VerticalAlign, Wrap,
};
use lumen_text::{
    Color, FontFace, FontId, FontRegistry, HarfrustShaper, HorizontalAlignment, LayoutDirection,
    LayoutEngine, OperationsMask, PixelData, PixelFormat, RenderBehaviour, Size, SwashFontClient,
    TextModel, Typesetter, UnderlineType, Vector2, VerticalAlignment, VisualModel, WrapMode,
};
use tracing_subscriber::EnvFilter;

struct Args {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    text: String,
}

fn parse_args() -> Result<Args> {
    let mut config = None;
    let mut output = None;
    let mut words = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(PathBuf::from(args.next().context("--config needs a path")?));
            }
            "--output" => {
                output = Some(PathBuf::from(args.next().context("--output needs a path")?));
            }
            _ => words.push(arg),
        }
    }
    if words.is_empty() {
        bail!("usage: lumen [--config lumen.toml] [--output out.png] <text>...");
    }
    Ok(Args {
        config,
        output,
        text: words.join(" "),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = parse_args()?;
    let config = LumenConfig::load(args.config.as_deref()).map_err(|e| anyhow!(e))?;

    let mut registry = FontRegistry::new();
    let font_id = load_font(&mut registry, &config)?;
    register_system_fallbacks(&mut registry, config.text.pixel_size());

    let mut model = TextModel::new(font_id);
    if let Some(right_to_left) = config.layout.right_to_left {
        let direction = if right_to_left {
            LayoutDirection::RightToLeft
        } else {
            LayoutDirection::LeftToRight
        };
        model.set_layout_direction(direction, true);
    }
    apply_style(&mut model.visual, &config);
    model.set_text_utf8(args.text.as_bytes());

    let mut shaper = HarfrustShaper::new(&registry);
    let mut font_client = SwashFontClient::new(&registry);
    if !model.update(OperationsMask::ALL_OPERATIONS, &mut shaper, &mut font_client) {
        tracing::warn!("text model update did nothing");
    }

    let wrap = match config.layout.wrap {
        Wrap::None => WrapMode::NoWrap,
        Wrap::Word => WrapMode::BreakWord,
        Wrap::All => WrapMode::BreakAll,
    };
    let engine = LayoutEngine::new(wrap).with_line_spacing(config.layout.line_spacing);
    let size = Size::new(config.layout.width, config.layout.height);
    let layout_size = model.relayout(&engine, &mut font_client, size);
    tracing::info!(
        lines = model.visual.lines.len(),
        width = layout_size.width,
        height = layout_size.height,
        "laid out text"
    );

    let direction = if config.layout.right_to_left == Some(true) {
        LayoutDirection::RightToLeft
    } else {
        LayoutDirection::LeftToRight
    };
    let behaviour = match config.render.behaviour {
        Behaviour::TextAndStyles => RenderBehaviour::TextAndStyles,
        Behaviour::NoText => RenderBehaviour::NoText,
        Behaviour::NoStyles => RenderBehaviour::NoStyles,
        Behaviour::Mask => RenderBehaviour::Mask,
        Behaviour::OverlayStyle => RenderBehaviour::OverlayStyle,
    };
    let format = match config.render.pixel_format {
        Format::A8 => PixelFormat::A8,
        Format::Rgba8888 => PixelFormat::Rgba8888,
    };
    let pixels = Typesetter::new(&model.visual).render(
        &mut font_client,
        size,
        direction,
        behaviour,
        config.render.ignore_horizontal_alignment,
        format,
    );

    let output = args.output.unwrap_or_else(|| config.render.output.clone());
    write_png(pixels, &output)?;
    tracing::info!(path = %output.display(), "wrote image");
    Ok(())
}

/// The configured font file, or a system sans-serif font found through fontdb.
fn load_font(registry: &mut FontRegistry, config: &LumenConfig) -> Result<FontId> {
    let size = config.text.pixel_size();
    if let Some(path) = &config.text.font {
        return registry
            .load(path, 0, size)
            .with_context(|| format!("failed to load font {}", path.display()));
    }

    use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};

    let mut db = Database::new();
    db.load_system_fonts();

    let named = config.text.family.as_deref().map(Family::Name);
    let families: Vec<Family> = named
        .into_iter()
        .chain([Family::SansSerif, Family::Name("DejaVu Sans"), Family::Name("Arial")])
        .collect();
    let id = db
        .query(&Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        })
        .ok_or_else(|| anyhow!("no suitable system font found; set text.font in lumen.toml"))?;
    let face = db
        .face(id)
        .ok_or_else(|| anyhow!("fontdb face missing for system font id"))?;

    let bytes: Vec<u8> = match &face.source {
        Source::File(path) => std::fs::read(path)?,
        Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
    };
    tracing::debug!(family = ?face.families.first(), "using system font");

    let font = FontFace::from_vec(bytes, face.index as usize)?;
    Ok(registry.register(Arc::new(font), size))
}

/// Register a few system fonts with wide script coverage for fallback.
fn register_system_fallbacks(registry: &mut FontRegistry, size: f32) {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    for family in ["Noto Sans", "Noto Sans Arabic", "Noto Sans Hebrew", "Noto Color Emoji"] {
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            ..fontdb::Query::default()
        };
        let Some(id) = db.query(&query) else {
            continue;
        };
        let loaded = db.with_face_data(id, |data, index| {
            FontFace::from_vec(data.to_vec(), index as usize)
        });
        match loaded {
            Some(Ok(face)) => {
                let font_id = registry.register(Arc::new(face), size);
                tracing::debug!(family, font_id, "registered fallback font");
            }
            Some(Err(err)) => tracing::warn!(family, %err, "skipping fallback font"),
            None => {}
        }
    }
}

fn color(rgba: Rgba) -> Color {
    Color::new(rgba[0], rgba[1], rgba[2], rgba[3])
}

/// Copy the configured alignment and decorations onto the visual model.
fn apply_style(visual: &mut VisualModel, config: &LumenConfig) {
    let style = &config.style;

    visual.set_text_color(color(config.text.color));
    visual.set_horizontal_alignment(match config.layout.horizontal_alignment {
        HorizontalAlign::Begin => HorizontalAlignment::Begin,
        HorizontalAlign::Center => HorizontalAlignment::Center,
        HorizontalAlign::End => HorizontalAlignment::End,
    });
    visual.set_vertical_alignment(match config.layout.vertical_alignment {
        VerticalAlign::Top => VerticalAlignment::Top,
        VerticalAlign::Center => VerticalAlignment::Center,
        VerticalAlign::Bottom => VerticalAlignment::Bottom,
    });

    visual.set_underline_enabled(style.underline);
    visual.set_underline_type(match style.underline_kind {
        UnderlineKind::Solid => UnderlineType::Solid,
        UnderlineKind::Dashed => UnderlineType::Dashed,
        UnderlineKind::Double => UnderlineType::Double,
    });
    visual.set_underline_color(color(style.underline_color));
    visual.set_underline_height(style.underline_height);
    visual.set_dashed_underline_width(style.dash_width);
    visual.set_dashed_underline_gap(style.dash_gap);

    visual.set_strikethrough_enabled(style.strikethrough);
    visual.set_strikethrough_color(color(style.strikethrough_color));
    visual.set_strikethrough_height(style.strikethrough_height);

    visual.set_shadow_offset(Vector2::new(style.shadow_offset[0], style.shadow_offset[1]));
    visual.set_shadow_color(color(style.shadow_color));
    visual.set_outline_width(style.outline_width);
    visual.set_outline_color(color(style.outline_color));

    visual.set_background_enabled(style.background);
    visual.set_background_color(color(style.background_color));
    visual.set_cutout_enabled(style.cutout);
}

/// Write premultiplied RGBA as straight-alpha PNG, or A8 as grayscale.
fn write_png(pixels: PixelData, path: &Path) -> Result<()> {
    let (width, height, format) = (pixels.width(), pixels.height(), pixels.format());
    if pixels.is_empty() {
        bail!("nothing to write: the image is {width}x{height}");
    }

    match format {
        PixelFormat::Rgba8888 => {
            let mut bytes = pixels.into_bytes();
            for pixel in bytes.chunks_exact_mut(4) {
                let alpha = u32::from(pixel[3]);
                if alpha != 0 && alpha != 255 {
                    for channel in &mut pixel[..3] {
                        *channel = (u32::from(*channel) * 255 / alpha).min(255) as u8;
                    }
                }
            }
            let image = image::RgbaImage::from_raw(width, height, bytes)
                .ok_or_else(|| anyhow!("pixel buffer does not match {width}x{height}"))?;
            image.save(path)
        }
        PixelFormat::A8 => {
            let image = image::GrayImage::from_raw(width, height, pixels.into_bytes())
                .ok_or_else(|| anyhow!("pixel buffer does not match {width}x{height}"))?;
            image.save(path)
        }
    }
    .with_context(|| format!("failed to write {}", path.display()))
}
