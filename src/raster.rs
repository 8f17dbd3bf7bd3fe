//! CPU rasterization of scene snapshots.
//!
//! One `vello_cpu` render context is the shared drawing surface for the whole
//! run; each snapshot is drawn over an opaque white background and read back
//! as premultiplied RGBA8. Titles are shaped with `parley` against a system
//! sans-serif face; a machine without fonts still renders every frame, just
//! untitled.

use std::path::Path;

use kurbo::Shape as _;

use crate::{
    error::{FieldframeError, FieldframeResult},
    geometry::Viewport,
    scene::{Primitive, Rgba8, SceneSnapshot},
};

const TITLE_SIZE_PX: f32 = 16.0;
const TITLE_TOP_PX: f64 = 14.0;

/// Premultiplied RGBA8 pixels of one rendered frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const TITLE_BRUSH: TextBrushRgba8 = TextBrushRgba8 {
    r: 0,
    g: 0,
    b: 0,
    a: 255,
};

pub struct CpuRasterizer {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    titles: TitlePainter,
}

impl CpuRasterizer {
    pub fn new(width: u32, height: u32) -> FieldframeResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| FieldframeError::render("canvas width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| FieldframeError::render("canvas height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(FieldframeError::render("canvas width/height must be > 0"));
        }

        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            titles: TitlePainter::new(),
        })
    }

    /// Draw one snapshot onto the surface and read the pixels back.
    pub fn render(
        &mut self,
        viewport: &Viewport,
        snap: &SceneSnapshot,
    ) -> FieldframeResult<FrameRGBA> {
        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));

        for prim in &snap.primitives {
            draw_primitive(ctx, viewport, prim);
        }
        let width = f64::from(self.width);
        self.titles.draw(ctx, &snap.title, width);

        ctx.flush();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut self.pixmap);

        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
        })
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn draw_primitive(ctx: &mut vello_cpu::RenderContext, viewport: &Viewport, prim: &Primitive) {
    match prim {
        Primitive::Marker { at, style } => {
            let circle = kurbo::Circle::new(viewport.map(*at), style.radius_px);
            let mut path = vello_cpu::kurbo::BezPath::new();
            for el in circle.path_elements(0.1) {
                path.push(path_el_to_cpu(el));
            }
            ctx.set_paint(color_to_cpu(style.color));
            ctx.fill_path(&path);
        }
        Primitive::Segment { from, to, style } => {
            let mut path = vello_cpu::kurbo::BezPath::new();
            path.move_to(point_to_cpu(viewport.map(*from)));
            path.line_to(point_to_cpu(viewport.map(*to)));

            let mut stroke = vello_cpu::kurbo::Stroke::new(style.width_px);
            if let Some([on, off]) = style.dash {
                stroke = stroke.with_dashes(0.0, [on, off]);
            }
            ctx.set_stroke(stroke);
            ctx.set_paint(color_to_cpu(style.color));
            ctx.stroke_path(&path);
        }
        Primitive::Polygon { points, fill } => {
            let Some((first, rest)) = points.split_first() else {
                return;
            };
            let mut path = vello_cpu::kurbo::BezPath::new();
            path.move_to(point_to_cpu(viewport.map(*first)));
            for p in rest {
                path.line_to(point_to_cpu(viewport.map(*p)));
            }
            path.close_path();
            ctx.set_paint(color_to_cpu(fill.color));
            ctx.fill_path(&path);
        }
    }
}

fn path_el_to_cpu(el: kurbo::PathEl) -> vello_cpu::kurbo::PathEl {
    use kurbo::PathEl;

    match el {
        PathEl::MoveTo(p) => vello_cpu::kurbo::PathEl::MoveTo(point_to_cpu(p)),
        PathEl::LineTo(p) => vello_cpu::kurbo::PathEl::LineTo(point_to_cpu(p)),
        PathEl::QuadTo(p1, p2) => {
            vello_cpu::kurbo::PathEl::QuadTo(point_to_cpu(p1), point_to_cpu(p2))
        }
        PathEl::CurveTo(p1, p2, p3) => vello_cpu::kurbo::PathEl::CurveTo(
            point_to_cpu(p1),
            point_to_cpu(p2),
            point_to_cpu(p3),
        ),
        PathEl::ClosePath => vello_cpu::kurbo::PathEl::ClosePath,
    }
}

struct TitleFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Shapes and draws frame titles, centered near the top of the canvas.
struct TitlePainter {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    font: Option<TitleFont>,
}

impl TitlePainter {
    fn new() -> Self {
        let mut font_ctx = parley::FontContext::default();
        let font = resolve_system_sans(&mut font_ctx);
        if font.is_none() {
            tracing::warn!("no system font found; frames will have no titles");
        }
        Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            font,
        }
    }

    fn draw(&mut self, ctx: &mut vello_cpu::RenderContext, title: &str, canvas_width: f64) {
        if title.is_empty() {
            return;
        }
        let Some(font) = &self.font else { return };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, title, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(TITLE_SIZE_PX));
        builder.push_default(parley::style::StyleProperty::Brush(TITLE_BRUSH));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(title);
        layout.break_all_lines(Some(canvas_width as f32));
        layout.align(
            Some(canvas_width as f32),
            parley::Alignment::Center,
            parley::AlignmentOptions::default(),
        );

        ctx.set_transform(vello_cpu::kurbo::Affine::translate((0.0, TITLE_TOP_PX)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font.data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}

/// Find a usable system face via fontdb and register it with Parley.
///
/// Titles have no per-asset font file, so the first sans-serif (or any serif
/// fallback) face on the machine is used for the whole run.
fn resolve_system_sans(font_ctx: &mut parley::FontContext) -> Option<TitleFont> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif, fontdb::Family::Serif],
        ..fontdb::Query::default()
    };
    let id = db.query(&query).or_else(|| db.faces().next().map(|f| f.id))?;
    let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;

    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
    let family_id = families.first().map(|(id, _)| *id)?;
    let family = font_ctx.collection.family_name(family_id)?.to_string();

    let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), index);
    Some(TitleFont { family, data })
}

/// PNG-encode one frozen frame. The canvas is opaque, so premultiplied and
/// straight RGBA8 coincide.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> FieldframeResult<()> {
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| {
        FieldframeError::render(format!("failed to write frame '{}': {e}", path.display()))
    })?;
    tracing::debug!(path = %path.display(), "wrote frame");
    Ok(())
}
